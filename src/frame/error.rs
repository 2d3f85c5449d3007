//! Errors raised while decoding or encoding frames and their extensions.

use thiserror::Error;

/// Failure to interpret or produce the wire form of a frame.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    /// The type id does not name a known frame kind.
    #[error("unknown frame type id {0:#010x}")]
    UnknownType(u32),
    /// The buffer ended before the frame was complete.
    #[error("frame truncated: needed {needed} bytes, {remaining} remaining")]
    Truncated {
        /// Bytes required by the next field.
        needed: usize,
        /// Bytes left in the buffer.
        remaining: usize,
    },
    /// Bytes remained after the frame was fully decoded.
    #[error("{0} trailing bytes after frame")]
    TrailingBytes(usize),
    /// A variable-length field does not fit its length prefix.
    #[error("{field} length {len} exceeds {max}")]
    TooLong {
        /// Field that overflowed.
        field: &'static str,
        /// Length that was attempted.
        len: usize,
        /// Largest length the prefix can express.
        max: usize,
    },
    /// A header name or value is not UTF-8.
    #[error("header {field} is not valid UTF-8")]
    InvalidUtf8 {
        /// Either `"name"` or `"value"`.
        field: &'static str,
    },
    /// A header carried an empty name.
    #[error("header name must not be empty")]
    EmptyHeaderName,
}
