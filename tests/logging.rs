//! Tests for log output emitted by response streams.

use rstest::rstest;
use wireframe_http::{config::EncodeConfig, response::ResponseStreamFactory};
use wireframe_http_testing::{
    LoggerHandle,
    Recorder,
    begin,
    correlations,
    data,
    http_begin,
    logger,
};

fn warnings_containing(logger: &mut LoggerHandle, needle: &str) -> usize {
    let mut found = 0;
    while let Some(record) = logger.pop() {
        if record.level() == log::Level::Warn && record.args().contains(needle) {
            found += 1;
        }
    }
    found
}

#[rstest]
fn oversized_preamble_is_warned(mut logger: LoggerHandle) {
    let recorder = Recorder::new();
    let mut factory = ResponseStreamFactory::new(
        recorder.source("app"),
        recorder.router(100),
        correlations(&[(7, "http")]),
        &EncodeConfig::default(),
    );
    let big = "c".repeat(1100);
    let extension = http_begin(&[("x-big", &big)]);
    factory.handle_stream(&begin(1, 7, &extension));

    assert_eq!(
        warnings_containing(&mut logger, "response preamble exceeds slot capacity"),
        1
    );
}

#[rstest]
fn unknown_stream_is_logged_at_debug(mut logger: LoggerHandle) {
    let recorder = Recorder::new();
    let mut factory = ResponseStreamFactory::new(
        recorder.source("app"),
        recorder.router(100),
        correlations(&[]),
        &EncodeConfig::default(),
    );
    factory.handle_stream(&data(5, b"stray"));

    let messages = logger.messages();
    assert!(
        messages
            .iter()
            .any(|message| message.contains("dropping data frame for unknown stream")),
        "missing drop message in {messages:?}"
    );
}

#[rstest]
fn opened_stream_reports_request_stream(mut logger: LoggerHandle) {
    let recorder = Recorder::new();
    let mut factory = ResponseStreamFactory::new(
        recorder.source("app"),
        recorder.router(100),
        correlations(&[(7, "http")]),
        &EncodeConfig::default(),
    );
    factory.handle_stream(&begin(1, 7, &[]));

    let messages = logger.messages();
    assert!(
        messages.iter().any(|message| {
            message.contains("response stream opened")
                && message.contains("request_id=0000000000000007")
        }),
        "missing open message in {messages:?}"
    );
}
