//! Property tests for send-window accounting on established streams.

use proptest::{collection::vec, prelude::*};
use wireframe_http::{
    config::EncodeConfig,
    frame::{Header, StreamId},
    response::{ResponseStreamFactory, encode_preamble},
};
use wireframe_http_testing::{
    Recorded,
    Recorder,
    begin,
    correlations,
    data,
    http_begin,
    window,
};

const SOURCE: u64 = 1;
const TARGET: u64 = 100;

#[derive(Clone, Debug)]
enum Op {
    Data(usize),
    Window(u32),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..96).prop_map(Op::Data),
        (0u32..96).prop_map(Op::Window),
    ]
}

fn header_strategy() -> impl Strategy<Value = (String, String)> {
    ("[a-z][a-z-]{0,11}", "[a-zA-Z0-9 ]{0,20}")
}

proptest! {
    #[test]
    fn body_bytes_never_exceed_credit(ops in vec(op_strategy(), 0..48)) {
        let recorder = Recorder::new();
        let mut factory = ResponseStreamFactory::new(
            recorder.source("app"),
            recorder.router(TARGET),
            correlations(&[(7, "http")]),
            &EncodeConfig::default(),
        );
        factory.handle_stream(&begin(SOURCE, 7, &[]));
        let preamble_len = b"HTTP/1.1 200 OK\r\n\r\n".len();
        factory.handle_throttle(&window(TARGET, 19));
        prop_assert_eq!(recorder.target_bytes(StreamId(TARGET)).len(), preamble_len);

        let mut model: i64 = 0;
        let mut granted: u64 = 0;
        let mut sent: usize = 0;
        let mut reset = false;
        let body = [0x5a_u8; 96];
        for op in ops {
            match op {
                Op::Window(update) => {
                    factory.handle_throttle(&window(TARGET, update));
                    model += i64::from(update);
                    granted += u64::from(update);
                }
                Op::Data(len) => {
                    factory.handle_stream(&data(SOURCE, &body[..len]));
                    let len_i64 = i64::try_from(len).expect("small payload");
                    if model < len_i64 {
                        reset = true;
                        break;
                    }
                    model -= len_i64;
                    sent += len;
                }
            }
        }

        let delivered = recorder.target_bytes(StreamId(TARGET)).len() - preamble_len;
        prop_assert_eq!(delivered, sent);
        prop_assert!(u64::try_from(sent).expect("fits") <= granted);
        prop_assert_eq!(recorder.credit_granted(StreamId(SOURCE)), granted);
        let resets = recorder
            .source_frames()
            .iter()
            .filter(|frame| matches!(frame, Recorded::Reset { .. }))
            .count();
        if reset {
            prop_assert_eq!(resets, 1);
        } else {
            prop_assert_eq!(resets, 0);
            prop_assert_eq!(factory.window(StreamId(SOURCE)), Some(model));
        }
    }

    #[test]
    fn flushed_preamble_matches_encoding(
        headers in vec(header_strategy(), 0..8),
        grants in vec(1u32..64, 1..64),
    ) {
        let borrowed: Vec<(&str, &str)> = headers
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
            .collect();
        let extension = http_begin(&borrowed);
        let parsed: Vec<Header<'_>> = borrowed
            .iter()
            .map(|(name, value)| Header::new(name, value))
            .collect();
        let mut expected = bytes::BytesMut::new();
        encode_preamble(&parsed, &mut expected);

        let recorder = Recorder::new();
        let mut factory = ResponseStreamFactory::new(
            recorder.source("app"),
            recorder.router(TARGET),
            correlations(&[(7, "http")]),
            &EncodeConfig::default(),
        );
        factory.handle_stream(&begin(SOURCE, 7, &extension));

        let mut credit: u64 = 0;
        for grant in grants {
            factory.handle_throttle(&window(TARGET, grant));
            credit += u64::from(grant);
            let flushed = recorder.target_bytes(StreamId(TARGET));
            prop_assert!(expected.starts_with(&flushed));
            let flushed_len = u64::try_from(flushed.len()).expect("fits");
            prop_assert_eq!(flushed_len, credit.min(u64::try_from(expected.len()).expect("fits")));
        }
        let drained = credit >= u64::try_from(expected.len()).expect("fits");
        prop_assert_eq!(factory.slab().in_use(), usize::from(!drained));
    }
}

#[test]
fn correlation_is_consumed_once() {
    let recorder = Recorder::new();
    let mut factory = ResponseStreamFactory::new(
        recorder.source("app"),
        recorder.router(TARGET),
        correlations(&[(7, "http")]),
        &EncodeConfig::default(),
    );
    factory.handle_stream(&begin(1, 7, &[]));
    factory.handle_stream(&begin(2, 7, &[]));

    assert_eq!(recorder.target_names(), ["http"]);
    assert_eq!(
        recorder.source_frames(),
        vec![Recorded::Reset {
            stream_id: StreamId(2),
        }]
    );
}
