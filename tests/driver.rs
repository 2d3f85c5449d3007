//! Tests for the async dispatch loop.

use std::collections::HashMap;

use async_stream::stream;
use futures::stream::{self as futures_stream, BoxStream};
use rstest::rstest;
use tokio_util::sync::CancellationToken;
use wireframe_http::{
    Error,
    config::EncodeConfig,
    correlation::Correlation,
    driver::{Message, StreamDriver},
    frame::{CorrelationId, FrameError, StreamId},
    response::ResponseStreamFactory,
};
use wireframe_http_testing::{
    Recorded,
    Recorder,
    RecordingRouter,
    RecordingSource,
    begin,
    correlations,
    data,
    end,
    http_begin,
    message,
    window,
};

type Factory =
    ResponseStreamFactory<RecordingSource, RecordingRouter, HashMap<CorrelationId, Correlation>>;

fn factory(recorder: &Recorder) -> Factory {
    ResponseStreamFactory::new(
        recorder.source("app"),
        recorder.router(100),
        correlations(&[(7, "http")]),
        &EncodeConfig::default(),
    )
}

#[rstest]
#[tokio::test]
async fn drains_rejected_stream_until_end() {
    let recorder = Recorder::new();
    let stream_rx = futures_stream::iter(vec![
        message(&begin(1, 42, &[])),
        message(&data(1, b"hi")),
        message(&end(1)),
    ]);
    let throttle_rx = futures_stream::iter(Vec::<Message>::new());

    let mut driver = StreamDriver::new(
        factory(&recorder),
        stream_rx,
        throttle_rx,
        CancellationToken::new(),
    );
    driver.run().await.expect("all messages decode");

    assert_eq!(driver.factory().stream_count(), 0);
    assert_eq!(
        recorder.source_frames(),
        vec![
            Recorded::Reset {
                stream_id: StreamId(1),
            },
            Recorded::Window {
                stream_id: StreamId(1),
                update: 2,
            },
        ]
    );
}

#[rstest]
#[tokio::test]
async fn interleaved_inputs_complete_response() {
    let recorder = Recorder::new();
    let extension = http_begin(&[("content-type", "text/plain")]);
    let (begun_tx, begun_rx) = tokio::sync::oneshot::channel::<()>();
    let (credit_tx, credit_rx) = tokio::sync::oneshot::channel::<()>();
    let stream_rx: BoxStream<'static, Message> = Box::pin(stream! {
        yield message(&begin(1, 7, &extension));
        let _ = begun_tx.send(());
        let _ = credit_rx.await;
        yield message(&data(1, b"body"));
        yield message(&end(1));
    });
    let throttle_rx: BoxStream<'static, Message> = Box::pin(stream! {
        let _ = begun_rx.await;
        yield message(&window(100, 64));
        let _ = credit_tx.send(());
    });

    let mut driver = StreamDriver::new(
        factory(&recorder),
        stream_rx,
        throttle_rx,
        CancellationToken::new(),
    );
    driver.run().await.expect("all messages decode");

    assert_eq!(
        recorder.target_bytes(StreamId(100)),
        b"HTTP/1.1 200 OK\r\nContent-type: text/plain\r\n\r\nbody"
    );
    assert_eq!(recorder.credit_granted(StreamId(1)), 19);
    assert_eq!(driver.factory().stream_count(), 0);
}

#[rstest]
#[tokio::test]
async fn malformed_message_stops_the_driver() {
    let recorder = Recorder::new();
    let stream_rx = futures_stream::iter(vec![
        Message::new(42, vec![0; 8]),
        message(&begin(1, 7, &[])),
    ]);
    let throttle_rx = futures_stream::iter(Vec::<Message>::new());

    let mut driver = StreamDriver::new(
        factory(&recorder),
        stream_rx,
        throttle_rx,
        CancellationToken::new(),
    );
    let err = driver.run().await.expect_err("unknown type id");

    assert_eq!(err, Error::Frame(FrameError::UnknownType(42)));
    assert_eq!(driver.factory().stream_count(), 0);
}

#[rstest]
#[tokio::test]
async fn shutdown_stops_pending_inputs() {
    let recorder = Recorder::new();
    let token = CancellationToken::new();
    let mut driver = StreamDriver::new(
        factory(&recorder),
        futures_stream::pending::<Message>(),
        futures_stream::pending::<Message>(),
        token.clone(),
    );

    let cancel = tokio::spawn(async move {
        tokio::task::yield_now().await;
        token.cancel();
    });
    driver.run().await.expect("shutdown is not an error");
    cancel.await.expect("cancel task");

    assert_eq!(driver.into_factory().stream_count(), 0);
}

#[rstest]
#[tokio::test]
async fn cancelled_before_start_reads_nothing() {
    let recorder = Recorder::new();
    let token = CancellationToken::new();
    token.cancel();
    let stream_rx = futures_stream::iter(vec![message(&begin(1, 7, &[]))]);
    let mut driver = StreamDriver::new(
        factory(&recorder),
        stream_rx,
        futures_stream::iter(Vec::<Message>::new()),
        token,
    );

    driver.run().await.expect("shutdown is not an error");

    assert!(recorder.target_frames().is_empty());
    assert!(driver.shutdown_token().is_cancelled());
}
