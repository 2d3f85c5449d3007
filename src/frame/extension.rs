//! HTTP `Begin` extension carrying an ordered header list.
//!
//! Layout: `count: u16`, then for each header a `u8` length-prefixed name
//! followed by a `u16` length-prefixed value. Names may repeat and every
//! occurrence is kept in order.

use bytes::{BufMut, BytesMut};

use super::{FrameError, codec::Reader};

/// One `(name, value)` pair borrowed from an extension buffer.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Header<'a> {
    /// Header name as sent by the producer, including pseudo-headers such as
    /// `:status`.
    pub name: &'a str,
    /// Header value.
    pub value: &'a str,
}

impl<'a> Header<'a> {
    /// Create a header from borrowed parts.
    #[must_use]
    pub const fn new(name: &'a str, value: &'a str) -> Self { Self { name, value } }
}

/// Decode the header list carried by a `Begin` extension.
///
/// An empty extension yields an empty list.
///
/// # Errors
///
/// Returns a [`FrameError`] if the extension is truncated, has trailing
/// bytes, carries an empty name or contains non-UTF-8 text.
pub fn decode_headers(extension: &[u8]) -> Result<Vec<Header<'_>>, FrameError> {
    if extension.is_empty() {
        return Ok(Vec::new());
    }
    let mut reader = Reader::new(extension);
    let count = usize::from(reader.u16()?);
    let mut headers = Vec::with_capacity(count);
    for _ in 0..count {
        let name_len = usize::from(reader.u8()?);
        if name_len == 0 {
            return Err(FrameError::EmptyHeaderName);
        }
        let name = utf8(reader.bytes(name_len)?, "name")?;
        let value_len = usize::from(reader.u16()?);
        let value = utf8(reader.bytes(value_len)?, "value")?;
        headers.push(Header { name, value });
    }
    reader.finish()?;
    Ok(headers)
}

/// Append the extension encoding of `headers` to `dst`.
///
/// # Errors
///
/// Returns [`FrameError::TooLong`] if there are more than `u16::MAX`
/// headers, a name is longer than 255 bytes or a value is longer than
/// `u16::MAX` bytes, and [`FrameError::EmptyHeaderName`] for an empty name.
/// `dst` is left untouched on error.
pub fn encode_headers(headers: &[Header<'_>], dst: &mut BytesMut) -> Result<(), FrameError> {
    let count = u16::try_from(headers.len()).map_err(|_| FrameError::TooLong {
        field: "header count",
        len: headers.len(),
        max: usize::from(u16::MAX),
    })?;
    let mut encoded = BytesMut::with_capacity(2 + headers.len() * 8);
    encoded.put_u16(count);
    for header in headers {
        if header.name.is_empty() {
            return Err(FrameError::EmptyHeaderName);
        }
        let name_len = u8::try_from(header.name.len()).map_err(|_| FrameError::TooLong {
            field: "header name",
            len: header.name.len(),
            max: usize::from(u8::MAX),
        })?;
        let value_len = u16::try_from(header.value.len()).map_err(|_| FrameError::TooLong {
            field: "header value",
            len: header.value.len(),
            max: usize::from(u16::MAX),
        })?;
        encoded.put_u8(name_len);
        encoded.put_slice(header.name.as_bytes());
        encoded.put_u16(value_len);
        encoded.put_slice(header.value.as_bytes());
    }
    dst.extend_from_slice(&encoded);
    Ok(())
}

fn utf8<'a>(bytes: &'a [u8], field: &'static str) -> Result<&'a str, FrameError> {
    std::str::from_utf8(bytes).map_err(|_| FrameError::InvalidUtf8 { field })
}
