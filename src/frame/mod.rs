//! Stream frames exchanged with the framed transport.
//!
//! Every frame is addressed to a [`StreamId`]. Stream frames (`Begin`,
//! `Data`, `End`) flow from a producer to a consumer; throttle frames
//! (`Window`, `Reset`) flow back along the same stream to grant credit or
//! abort it. [`Frame`] borrows its payload from the transport buffer so
//! decoding and forwarding never copy body bytes.

pub mod codec;
pub mod error;
pub mod extension;

use std::fmt;

pub use codec::{decode, encode};
pub use error::FrameError;
pub use extension::{Header, decode_headers, encode_headers};

/// Identifies one logical duplex stream within a transport channel.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct StreamId(pub u64);

impl From<u64> for StreamId {
    fn from(value: u64) -> Self { Self(value) }
}

impl From<StreamId> for u64 {
    fn from(value: StreamId) -> Self { value.0 }
}

impl StreamId {
    /// Return the inner `u64` representation.
    #[must_use]
    pub const fn as_u64(self) -> u64 { self.0 }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{:016x}", self.0) }
}

/// Links a request stream to the response stream that answers it.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct CorrelationId(pub u64);

impl From<u64> for CorrelationId {
    fn from(value: u64) -> Self { Self(value) }
}

impl From<CorrelationId> for u64 {
    fn from(value: CorrelationId) -> Self { value.0 }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// Type id of a [`BeginFrame`].
pub const BEGIN_TYPE_ID: u32 = 0x0000_0001;
/// Type id of a [`DataFrame`].
pub const DATA_TYPE_ID: u32 = 0x0000_0002;
/// Type id of an [`EndFrame`].
pub const END_TYPE_ID: u32 = 0x0000_0003;
/// Type id of a [`ResetFrame`].
pub const RESET_TYPE_ID: u32 = 0x4000_0001;
/// Type id of a [`WindowFrame`].
pub const WINDOW_TYPE_ID: u32 = 0x4000_0002;

/// Opens a stream.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BeginFrame<'a> {
    /// Stream being opened.
    pub stream_id: StreamId,
    /// Static route reference, or `0` when the stream must be resolved via
    /// its correlation id.
    pub reference_id: u64,
    /// Correlation id assigned when the request stream was accepted.
    pub correlation_id: CorrelationId,
    /// Protocol extension; for HTTP this carries the encoded header list.
    pub extension: &'a [u8],
}

/// Carries payload bytes for an open stream.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DataFrame<'a> {
    /// Stream the payload belongs to.
    pub stream_id: StreamId,
    /// Payload borrowed from the transport buffer.
    pub payload: &'a [u8],
}

/// Ends a stream normally.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct EndFrame {
    /// Stream being ended.
    pub stream_id: StreamId,
}

/// Grants additional send credit on a stream.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct WindowFrame {
    /// Stream receiving the credit.
    pub stream_id: StreamId,
    /// Number of additional payload bytes the sender may transmit.
    pub update: u32,
}

/// Aborts a stream.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ResetFrame {
    /// Stream being aborted.
    pub stream_id: StreamId,
}

/// One typed unit of the framed transport.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Frame<'a> {
    /// See [`BeginFrame`].
    Begin(BeginFrame<'a>),
    /// See [`DataFrame`].
    Data(DataFrame<'a>),
    /// See [`EndFrame`].
    End(EndFrame),
    /// See [`WindowFrame`].
    Window(WindowFrame),
    /// See [`ResetFrame`].
    Reset(ResetFrame),
}

impl Frame<'_> {
    /// Stream the frame is addressed to.
    #[must_use]
    pub const fn stream_id(&self) -> StreamId {
        match self {
            Self::Begin(frame) => frame.stream_id,
            Self::Data(frame) => frame.stream_id,
            Self::End(frame) => frame.stream_id,
            Self::Window(frame) => frame.stream_id,
            Self::Reset(frame) => frame.stream_id,
        }
    }

    /// Wire type id of the frame.
    #[must_use]
    pub const fn type_id(&self) -> u32 {
        match self {
            Self::Begin(_) => BEGIN_TYPE_ID,
            Self::Data(_) => DATA_TYPE_ID,
            Self::End(_) => END_TYPE_ID,
            Self::Window(_) => WINDOW_TYPE_ID,
            Self::Reset(_) => RESET_TYPE_ID,
        }
    }

    /// Short name of the frame kind, used in diagnostics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Begin(_) => "begin",
            Self::Data(_) => "data",
            Self::End(_) => "end",
            Self::Window(_) => "window",
            Self::Reset(_) => "reset",
        }
    }
}
