//! Wire layout of transport frames.
//!
//! All integers are big-endian and every frame starts with its `u64` stream
//! id:
//!
//! | Frame  | Fields after the stream id                                  |
//! | ------ | ----------------------------------------------------------- |
//! | Begin  | `reference_id: u64`, `correlation_id: u64`, `u16` extension |
//! | Data   | `u16` length-prefixed payload                               |
//! | End    | none                                                        |
//! | Window | `update: u32`                                               |
//! | Reset  | none                                                        |
//!
//! Decoding borrows variable-length fields from the input buffer.

use bytes::{Buf, BufMut, BytesMut};

use super::{
    BEGIN_TYPE_ID,
    BeginFrame,
    CorrelationId,
    DATA_TYPE_ID,
    DataFrame,
    END_TYPE_ID,
    EndFrame,
    Frame,
    FrameError,
    RESET_TYPE_ID,
    ResetFrame,
    StreamId,
    WINDOW_TYPE_ID,
    WindowFrame,
};

/// Cursor over a borrowed buffer that reports truncation as [`FrameError`].
pub(crate) struct Reader<'a> {
    buf: &'a [u8],
}

impl<'a> Reader<'a> {
    pub(crate) const fn new(buf: &'a [u8]) -> Self { Self { buf } }

    fn ensure(&self, needed: usize) -> Result<(), FrameError> {
        if self.buf.len() < needed {
            return Err(FrameError::Truncated {
                needed,
                remaining: self.buf.len(),
            });
        }
        Ok(())
    }

    pub(crate) fn u8(&mut self) -> Result<u8, FrameError> {
        self.ensure(1)?;
        Ok(self.buf.get_u8())
    }

    pub(crate) fn u16(&mut self) -> Result<u16, FrameError> {
        self.ensure(2)?;
        Ok(self.buf.get_u16())
    }

    pub(crate) fn u32(&mut self) -> Result<u32, FrameError> {
        self.ensure(4)?;
        Ok(self.buf.get_u32())
    }

    pub(crate) fn u64(&mut self) -> Result<u64, FrameError> {
        self.ensure(8)?;
        Ok(self.buf.get_u64())
    }

    pub(crate) fn bytes(&mut self, len: usize) -> Result<&'a [u8], FrameError> {
        self.ensure(len)?;
        let (head, tail) = self.buf.split_at(len);
        self.buf = tail;
        Ok(head)
    }

    pub(crate) fn finish(self) -> Result<(), FrameError> {
        if self.buf.is_empty() {
            Ok(())
        } else {
            Err(FrameError::TrailingBytes(self.buf.len()))
        }
    }
}

/// Decode one frame of kind `type_id` occupying all of `buf`.
///
/// # Errors
///
/// Returns [`FrameError::UnknownType`] for an unrecognised type id,
/// [`FrameError::Truncated`] when `buf` is too short and
/// [`FrameError::TrailingBytes`] when it is too long.
///
/// # Examples
///
/// ```
/// use wireframe_http::frame::{DATA_TYPE_ID, Frame, decode};
///
/// let buf = [0, 0, 0, 0, 0, 0, 0, 7, 0, 2, b'h', b'i'];
/// let Frame::Data(data) = decode(DATA_TYPE_ID, &buf).expect("valid data frame") else {
///     panic!("expected data");
/// };
/// assert_eq!(data.stream_id.as_u64(), 7);
/// assert_eq!(data.payload, b"hi");
/// ```
pub fn decode(type_id: u32, buf: &[u8]) -> Result<Frame<'_>, FrameError> {
    let mut reader = Reader::new(buf);
    let stream_id = StreamId(reader.u64()?);
    let frame = match type_id {
        BEGIN_TYPE_ID => {
            let reference_id = reader.u64()?;
            let correlation_id = CorrelationId(reader.u64()?);
            let len = usize::from(reader.u16()?);
            Frame::Begin(BeginFrame {
                stream_id,
                reference_id,
                correlation_id,
                extension: reader.bytes(len)?,
            })
        }
        DATA_TYPE_ID => {
            let len = usize::from(reader.u16()?);
            Frame::Data(DataFrame {
                stream_id,
                payload: reader.bytes(len)?,
            })
        }
        END_TYPE_ID => Frame::End(EndFrame { stream_id }),
        WINDOW_TYPE_ID => Frame::Window(WindowFrame {
            stream_id,
            update: reader.u32()?,
        }),
        RESET_TYPE_ID => Frame::Reset(ResetFrame { stream_id }),
        other => return Err(FrameError::UnknownType(other)),
    };
    reader.finish()?;
    Ok(frame)
}

/// Append the wire form of `frame` to `dst`.
///
/// The type id is not written; callers carry it alongside the bytes, as the
/// transport does.
///
/// # Errors
///
/// Returns [`FrameError::TooLong`] when a payload or extension does not fit
/// its `u16` length prefix. Nothing is written in that case.
pub fn encode(frame: &Frame<'_>, dst: &mut BytesMut) -> Result<(), FrameError> {
    match frame {
        Frame::Begin(begin) => {
            let len = prefix_len("extension", begin.extension.len())?;
            dst.reserve(26 + begin.extension.len());
            dst.put_u64(begin.stream_id.as_u64());
            dst.put_u64(begin.reference_id);
            dst.put_u64(begin.correlation_id.0);
            dst.put_u16(len);
            dst.put_slice(begin.extension);
        }
        Frame::Data(data) => {
            let len = prefix_len("payload", data.payload.len())?;
            dst.reserve(10 + data.payload.len());
            dst.put_u64(data.stream_id.as_u64());
            dst.put_u16(len);
            dst.put_slice(data.payload);
        }
        Frame::End(EndFrame { stream_id }) | Frame::Reset(ResetFrame { stream_id }) => {
            dst.put_u64(stream_id.as_u64());
        }
        Frame::Window(window) => {
            dst.put_u64(window.stream_id.as_u64());
            dst.put_u32(window.update);
        }
    }
    Ok(())
}

fn prefix_len(field: &'static str, len: usize) -> Result<u16, FrameError> {
    u16::try_from(len).map_err(|_| FrameError::TooLong {
        field,
        len,
        max: usize::from(u16::MAX),
    })
}
