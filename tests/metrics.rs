#![cfg(feature = "metrics")]
//! Tests for `wireframe_http` metrics.
//!
//! These tests verify that counters and gauges update as expected using
//! `metrics_util::debugging::DebuggingRecorder`.

use metrics_util::debugging::{DebugValue, DebuggingRecorder, Snapshotter};
use rstest::rstest;
use wireframe_http::{
    config::EncodeConfig,
    metrics::{
        Direction,
        FRAMES_PROCESSED,
        INSUFFICIENT_STORAGE_TOTAL,
        RESETS_SENT,
        SLAB_EXHAUSTED_TOTAL,
        STREAMS_ACTIVE,
    },
    response::ResponseStreamFactory,
};
use wireframe_http_testing::{Recorder, begin, correlations, end, http_begin, window};

/// Creates a debugging recorder and snapshotter for metrics testing.
fn debugging_recorder_setup() -> (Snapshotter, DebuggingRecorder) {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    (snapshotter, recorder)
}

type Entries = Vec<(
    metrics_util::CompositeKey,
    Option<metrics::Unit>,
    Option<metrics::SharedString>,
    DebugValue,
)>;

fn counter(entries: &Entries, name: &str, label: Option<(&str, &str)>) -> u64 {
    entries
        .iter()
        .filter(|(key, _, _, _)| {
            key.key().name() == name
                && label.is_none_or(|(k, v)| {
                    key.key()
                        .labels()
                        .any(|l| l.key() == k && l.value() == v)
                })
        })
        .map(|(_, _, _, value)| match value {
            DebugValue::Counter(count) => *count,
            _ => 0,
        })
        .sum()
}

fn gauge(entries: &Entries, name: &str) -> Option<f64> {
    entries
        .iter()
        .find(|(key, _, _, _)| key.key().name() == name)
        .and_then(|(_, _, _, value)| match value {
            DebugValue::Gauge(gauge) => Some(gauge.into_inner()),
            _ => None,
        })
}

#[rstest]
#[case(Direction::Stream, "stream")]
#[case(Direction::Throttle, "throttle")]
fn frame_metric_is_labelled(#[case] direction: Direction, #[case] label: &str) {
    let (snapshotter, recorder) = debugging_recorder_setup();
    metrics::with_local_recorder(&recorder, || {
        wireframe_http::metrics::inc_frames(direction);
    });

    let entries = snapshotter.snapshot().into_vec();
    assert_eq!(
        counter(&entries, FRAMES_PROCESSED, Some(("direction", label))),
        1
    );
}

#[test]
fn response_lifecycle_updates_metrics() {
    let (snapshotter, recorder) = debugging_recorder_setup();
    let log = Recorder::new();

    metrics::with_local_recorder(&recorder, || {
        let mut factory = ResponseStreamFactory::new(
            log.source("app"),
            log.router(100),
            correlations(&[(7, "http")]),
            &EncodeConfig::default(),
        );
        factory.handle_stream(&begin(1, 7, &[]));
        factory.handle_stream(&begin(2, 99, &[]));
        factory.handle_throttle(&window(100, 64));
        factory.handle_stream(&end(1));
    });

    let entries = snapshotter.snapshot().into_vec();
    assert_eq!(
        counter(&entries, FRAMES_PROCESSED, Some(("direction", "stream"))),
        3
    );
    assert_eq!(
        counter(&entries, FRAMES_PROCESSED, Some(("direction", "throttle"))),
        1
    );
    assert_eq!(counter(&entries, RESETS_SENT, None), 1);
    assert_eq!(gauge(&entries, STREAMS_ACTIVE), Some(1.0));
}

#[test]
fn insufficient_storage_is_counted() {
    let (snapshotter, recorder) = debugging_recorder_setup();
    let log = Recorder::new();

    metrics::with_local_recorder(&recorder, || {
        let mut factory = ResponseStreamFactory::new(
            log.source("app"),
            log.router(100),
            correlations(&[(7, "http")]),
            &EncodeConfig::default(),
        );
        let big = "b".repeat(1500);
        let extension = http_begin(&[("x-big", &big)]);
        factory.handle_stream(&begin(1, 7, &extension));
    });

    let entries = snapshotter.snapshot().into_vec();
    assert_eq!(counter(&entries, INSUFFICIENT_STORAGE_TOTAL, None), 1);
    assert_eq!(counter(&entries, SLAB_EXHAUSTED_TOTAL, None), 0);
    assert_eq!(counter(&entries, RESETS_SENT, None), 1);
    assert_eq!(gauge(&entries, STREAMS_ACTIVE), Some(0.0));
}
