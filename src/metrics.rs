//! Metric helpers for `wireframe_http`.
//!
//! This module defines metric names and simple helper functions
//! wrapping the [`metrics`](https://docs.rs/metrics) crate. Without the
//! `metrics` feature the helpers compile to no-ops.

#[cfg(feature = "metrics")]
use metrics::{counter, gauge};

/// Name of the counter tracking dispatched frames.
pub const FRAMES_PROCESSED: &str = "wireframe_http_frames_processed_total";
/// Name of the counter tracking `Reset` frames sent upstream.
pub const RESETS_SENT: &str = "wireframe_http_resets_sent_total";
/// Name of the counter tracking `507 Insufficient Storage` responses.
pub const INSUFFICIENT_STORAGE_TOTAL: &str = "wireframe_http_insufficient_storage_total";
/// Name of the counter tracking failed slot acquisitions.
pub const SLAB_EXHAUSTED_TOTAL: &str = "wireframe_http_slab_exhausted_total";
/// Name of the gauge tracking registered response streams.
pub const STREAMS_ACTIVE: &str = "wireframe_http_streams_active";

/// Channel a frame was dispatched from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Begin, Data and End frames from the response producer.
    Stream,
    /// Window and Reset frames from the response consumer.
    Throttle,
}

impl Direction {
    #[cfg_attr(not(feature = "metrics"), allow(dead_code))]
    fn as_str(self) -> &'static str {
        match self {
            Direction::Stream => "stream",
            Direction::Throttle => "throttle",
        }
    }
}

/// Record a dispatched frame for the given direction.
pub fn inc_frames(direction: Direction) {
    #[cfg(feature = "metrics")]
    counter!(FRAMES_PROCESSED, "direction" => direction.as_str()).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = direction;
}

/// Record a `Reset` sent upstream.
pub fn inc_resets() {
    #[cfg(feature = "metrics")]
    counter!(RESETS_SENT).increment(1);
}

/// Record an emergency `507 Insufficient Storage` response.
pub fn inc_insufficient_storage() {
    #[cfg(feature = "metrics")]
    counter!(INSUFFICIENT_STORAGE_TOTAL).increment(1);
}

/// Record a failed slot acquisition.
pub fn inc_slab_exhausted() {
    #[cfg(feature = "metrics")]
    counter!(SLAB_EXHAUSTED_TOTAL).increment(1);
}

/// Increment the active streams gauge.
pub fn inc_streams() {
    #[cfg(feature = "metrics")]
    gauge!(STREAMS_ACTIVE).increment(1.0);
}

/// Decrement the active streams gauge.
pub fn dec_streams() {
    #[cfg(feature = "metrics")]
    gauge!(STREAMS_ACTIVE).decrement(1.0);
}
