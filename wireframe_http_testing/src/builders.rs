//! Shorthand constructors for frames, messages and correlations.

use std::collections::HashMap;

use bytes::BytesMut;
use wireframe_http::{
    correlation::Correlation,
    driver::Message,
    frame::{
        BeginFrame,
        CorrelationId,
        DataFrame,
        EndFrame,
        Frame,
        Header,
        ResetFrame,
        StreamId,
        WindowFrame,
        encode_headers,
    },
};

/// Encode `headers` as a Begin extension.
///
/// # Panics
///
/// Panics if a header does not fit the extension's length prefixes.
#[must_use]
pub fn http_begin(headers: &[(&str, &str)]) -> Vec<u8> {
    let headers: Vec<Header<'_>> = headers
        .iter()
        .map(|(name, value)| Header::new(name, value))
        .collect();
    let mut dst = BytesMut::new();
    encode_headers(&headers, &mut dst).expect("headers fit the extension format");
    dst.to_vec()
}

/// `Begin` with reference id `0`.
#[must_use]
pub fn begin(stream_id: u64, correlation_id: u64, extension: &[u8]) -> Frame<'_> {
    Frame::Begin(BeginFrame {
        stream_id: StreamId(stream_id),
        reference_id: 0,
        correlation_id: CorrelationId(correlation_id),
        extension,
    })
}

/// `Data` carrying `payload`.
#[must_use]
pub fn data(stream_id: u64, payload: &[u8]) -> Frame<'_> {
    Frame::Data(DataFrame {
        stream_id: StreamId(stream_id),
        payload,
    })
}

/// `End`.
#[must_use]
pub fn end(stream_id: u64) -> Frame<'static> {
    Frame::End(EndFrame {
        stream_id: StreamId(stream_id),
    })
}

/// `Window` granting `update` bytes.
#[must_use]
pub fn window(stream_id: u64, update: u32) -> Frame<'static> {
    Frame::Window(WindowFrame {
        stream_id: StreamId(stream_id),
        update,
    })
}

/// `Reset`.
#[must_use]
pub fn reset(stream_id: u64) -> Frame<'static> {
    Frame::Reset(ResetFrame {
        stream_id: StreamId(stream_id),
    })
}

/// Encode `frame` as a transport message.
///
/// # Panics
///
/// Panics if the frame exceeds a wire length limit.
#[must_use]
pub fn message(frame: &Frame<'_>) -> Message {
    Message::encode(frame).expect("frame fits the wire format")
}

/// Correlation answering requests from channel `source`.
///
/// The outbound correlation id is `id + 1000` and the request stream is
/// `id`, so assertions can tell them apart from the inbound id.
#[must_use]
pub fn correlation(id: u64, source: &str) -> Correlation {
    Correlation {
        id: CorrelationId(id + 1000),
        source: source.to_owned(),
        source_id: StreamId(id),
    }
}

/// Correlation map keyed by inbound correlation id.
#[must_use]
pub fn correlations(entries: &[(u64, &str)]) -> HashMap<CorrelationId, Correlation> {
    entries
        .iter()
        .map(|(id, source)| (CorrelationId(*id), correlation(*id, source)))
        .collect()
}
