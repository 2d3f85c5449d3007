//! Collaborator interfaces onto the framed transport.
//!
//! The transport itself (ring buffers, broadcast channels) lives outside
//! this crate. Response streams only need to write frames:
//!
//! - a [`Source`] is the channel the response producer writes to; throttle
//!   frames (`Window`, `Reset`) travel back along it;
//! - a [`Target`] is the channel toward the original requester; stream
//!   frames (`Begin`, `Data`) are written to it;
//! - a [`Router`] resolves targets by name and allocates fresh stream ids.

use crate::{
    frame::{BeginFrame, CorrelationId, DataFrame, Frame, ResetFrame, StreamId, WindowFrame},
    metrics,
};

/// Channel the response producer writes to.
pub trait Source {
    /// Routable name of the channel.
    fn name(&self) -> &str;

    /// Write a throttle frame back toward the producer.
    fn write_throttle(&mut self, frame: &Frame<'_>);

    /// Grant `update` bytes of credit on `stream_id`.
    fn do_window(&mut self, stream_id: StreamId, update: u32) {
        self.write_throttle(&Frame::Window(WindowFrame { stream_id, update }));
    }

    /// Abort `stream_id`.
    fn do_reset(&mut self, stream_id: StreamId) {
        metrics::inc_resets();
        self.write_throttle(&Frame::Reset(ResetFrame { stream_id }));
    }
}

/// Channel toward the original requester.
pub trait Target {
    /// Routable name of the channel.
    fn name(&self) -> &str;

    /// Write a stream frame toward the requester.
    fn write(&mut self, frame: &Frame<'_>);

    /// Open `stream_id`, echoing `correlation_id` so the peer can match it.
    fn do_begin(&mut self, stream_id: StreamId, reference_id: u64, correlation_id: CorrelationId) {
        self.write(&Frame::Begin(BeginFrame {
            stream_id,
            reference_id,
            correlation_id,
            extension: &[],
        }));
    }

    /// Send `payload` on `stream_id`.
    fn do_data(&mut self, stream_id: StreamId, payload: &[u8]) {
        self.write(&Frame::Data(DataFrame { stream_id, payload }));
    }
}

/// Resolves targets and allocates stream ids.
pub trait Router {
    /// Handle type for resolved targets.
    type Target: Target;

    /// Resolve the target channel called `name`.
    fn supply_target(&mut self, name: &str) -> Self::Target;

    /// Allocate a stream id that has never been used on this channel.
    fn supply_stream_id(&mut self) -> StreamId;
}
