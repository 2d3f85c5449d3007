//! HTTP/1.1 response preamble synthesis.
//!
//! The preamble is the status line followed by one line per header and a
//! blank line. The status defaults to `200 OK`; a `:status` pseudo-header
//! overrides the code, and `101` is the only code given its own reason
//! phrase. Header names have only their first character upper-cased, so
//! `content-type` is written as `Content-type`.

use bytes::{BufMut, BytesMut};

use crate::frame::Header;

/// Fixed reply sent when the preamble does not fit a slab slot.
pub const INSUFFICIENT_STORAGE_RESPONSE: &[u8] = b"HTTP/1.1 507 Insufficient Storage\r\n\r\n";

/// Pseudo-header carrying the response status code.
pub const STATUS_HEADER: &str = ":status";

const DEFAULT_STATUS: &str = "200";
const DEFAULT_REASON: &str = "OK";
const SWITCHING_PROTOCOLS_STATUS: &str = "101";
const SWITCHING_PROTOCOLS_REASON: &str = "Switching Protocols";
const CRLF: &[u8] = b"\r\n";

/// Append the HTTP/1.1 preamble for `headers` to `dst`.
///
/// Every non-status header is emitted in order, including repeated names.
/// When several `:status` headers are present the last one wins.
///
/// # Examples
///
/// ```
/// use bytes::BytesMut;
/// use wireframe_http::{frame::Header, response::encode_preamble};
///
/// let mut dst = BytesMut::new();
/// encode_preamble(
///     &[
///         Header::new(":status", "200"),
///         Header::new("content-type", "text/plain"),
///     ],
///     &mut dst,
/// );
/// assert_eq!(&dst[..], b"HTTP/1.1 200 OK\r\nContent-type: text/plain\r\n\r\n");
/// ```
pub fn encode_preamble(headers: &[Header<'_>], dst: &mut BytesMut) {
    let status = headers
        .iter()
        .rev()
        .find(|header| header.name == STATUS_HEADER)
        .map_or(DEFAULT_STATUS, |header| header.value);
    let reason = if status == SWITCHING_PROTOCOLS_STATUS {
        SWITCHING_PROTOCOLS_REASON
    } else {
        DEFAULT_REASON
    };

    dst.put_slice(b"HTTP/1.1 ");
    dst.put_slice(status.as_bytes());
    dst.put_u8(b' ');
    dst.put_slice(reason.as_bytes());
    dst.put_slice(CRLF);

    for header in headers.iter().filter(|header| header.name != STATUS_HEADER) {
        put_capitalised(header.name, dst);
        dst.put_slice(b": ");
        dst.put_slice(header.value.as_bytes());
        dst.put_slice(CRLF);
    }

    dst.put_slice(CRLF);
}

fn put_capitalised(name: &str, dst: &mut BytesMut) {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return;
    };
    let mut utf8 = [0u8; 4];
    for upper in first.to_uppercase() {
        dst.put_slice(upper.encode_utf8(&mut utf8).as_bytes());
    }
    dst.put_slice(chars.as_str().as_bytes());
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;
    use proptest::{collection::vec, prelude::*};
    use rstest::rstest;

    use super::{INSUFFICIENT_STORAGE_RESPONSE, encode_preamble};
    use crate::frame::Header;

    fn preamble(headers: &[(&str, &str)]) -> String {
        let headers: Vec<Header<'_>> = headers
            .iter()
            .map(|(name, value)| Header::new(name, value))
            .collect();
        let mut dst = BytesMut::new();
        encode_preamble(&headers, &mut dst);
        String::from_utf8(dst.to_vec()).expect("ascii preamble")
    }

    #[rstest]
    #[case::no_headers(&[], "HTTP/1.1 200 OK\r\n\r\n")]
    #[case::status_and_header(
        &[(":status", "200"), ("content-type", "text/plain")],
        "HTTP/1.1 200 OK\r\nContent-type: text/plain\r\n\r\n"
    )]
    #[case::status_override_keeps_ok(&[(":status", "404")], "HTTP/1.1 404 OK\r\n\r\n")]
    #[case::switching_protocols(
        &[(":status", "101"), ("upgrade", "websocket")],
        "HTTP/1.1 101 Switching Protocols\r\nUpgrade: websocket\r\n\r\n"
    )]
    #[case::only_first_letter(&[("x-CUSTOM-header", "v")], "HTTP/1.1 200 OK\r\nX-CUSTOM-header: v\r\n\r\n")]
    #[case::status_after_headers(
        &[("server", "wf"), (":status", "204")],
        "HTTP/1.1 204 OK\r\nServer: wf\r\n\r\n"
    )]
    #[case::repeated_names(
        &[("set-cookie", "a=1"), ("set-cookie", "b=2")],
        "HTTP/1.1 200 OK\r\nSet-cookie: a=1\r\nSet-cookie: b=2\r\n\r\n"
    )]
    #[case::last_status_wins(&[(":status", "101"), (":status", "200")], "HTTP/1.1 200 OK\r\n\r\n")]
    fn encodes_preamble(#[case] headers: &[(&str, &str)], #[case] expected: &str) {
        assert_eq!(preamble(headers), expected);
    }

    #[rstest]
    fn insufficient_storage_payload_is_fixed() {
        assert_eq!(
            INSUFFICIENT_STORAGE_RESPONSE,
            b"HTTP/1.1 507 Insufficient Storage\r\n\r\n"
        );
        assert_eq!(INSUFFICIENT_STORAGE_RESPONSE.len(), 37);
    }

    fn header_strategy() -> impl Strategy<Value = (String, String)> {
        ("[a-z][a-z0-9-]{0,15}", "[ -~]{0,24}")
    }

    proptest! {
        #[test]
        fn preamble_matches_line_rule(headers in vec(header_strategy(), 0..12)) {
            let borrowed: Vec<(&str, &str)> = headers
                .iter()
                .map(|(name, value)| (name.as_str(), value.as_str()))
                .collect();
            let mut expected = String::from("HTTP/1.1 200 OK\r\n");
            for (name, value) in &headers {
                let (first, rest) = name.split_at(1);
                expected.push_str(&format!("{}{rest}: {value}\r\n", first.to_ascii_uppercase()));
            }
            expected.push_str("\r\n");
            prop_assert_eq!(preamble(&borrowed), expected);
        }
    }
}
