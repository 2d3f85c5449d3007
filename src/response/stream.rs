//! Stream half of a response stream: Begin, Data and End from the producer.

use std::{fmt, mem};

use bytes::BytesMut;
use log::{debug, warn};

use super::{
    Disposition,
    Env,
    preamble::{INSUFFICIENT_STORAGE_RESPONSE, encode_preamble},
    state::{StreamState, ThrottleState},
};
use crate::{
    correlation::{CorrelatableFrame, Correlation},
    frame::{BeginFrame, DataFrame, Frame, StreamId, decode_headers},
    metrics,
    slab::{Slab, SlabError, Slot},
    transport::Target,
};

/// Outbound stream opened toward the requester.
pub(super) struct Binding<T> {
    pub(super) target: T,
    pub(super) id: StreamId,
}

/// One response stream: its producer-facing and requester-facing states
/// plus the flow-control window they share.
pub(crate) struct ResponseStream<T> {
    pub(super) source_id: StreamId,
    pub(super) binding: Option<Binding<T>>,
    pub(super) window: i64,
    pub(super) state: StreamState,
    pub(super) throttle: ThrottleState,
}

impl<T: Target> fmt::Display for ResponseStream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ResponseStream[source_id={}, window={}, target_id={}, state={}, throttle={}]",
            self.source_id,
            self.window,
            self.target_id().map_or_else(|| "-".to_owned(), |id| id.to_string()),
            self.state.name(),
            self.throttle.name(),
        )
    }
}

impl<T: Target> ResponseStream<T> {
    pub(crate) const fn new(source_id: StreamId) -> Self {
        Self {
            source_id,
            binding: None,
            window: 0,
            state: StreamState::BeforeBegin,
            throttle: ThrottleState::BeforeBegin,
        }
    }

    /// Outbound stream id, once the response has been opened.
    pub(crate) fn target_id(&self) -> Option<StreamId> {
        self.binding.as_ref().map(|binding| binding.id)
    }

    /// Current send window toward the requester.
    pub(crate) const fn window(&self) -> i64 { self.window }

    /// Handle a frame from the response producer.
    pub(crate) fn on_stream(&mut self, frame: &Frame<'_>, env: &mut Env<'_, T>) -> Disposition {
        match &mut self.state {
            StreamState::BeforeBegin => match frame {
                Frame::Begin(begin) => self.process_begin(begin, env),
                Frame::Data(_) | Frame::End(_) | Frame::Window(_) | Frame::Reset(_) => {
                    self.process_unexpected(frame, env)
                }
            },
            StreamState::BeforeHeadersWritten { end_deferred, .. } => match frame {
                Frame::End(_) => {
                    *end_deferred = true;
                    Disposition::Open
                }
                Frame::Begin(_) | Frame::Data(_) | Frame::Window(_) | Frame::Reset(_) => {
                    self.process_unexpected(frame, env)
                }
            },
            StreamState::AfterBeginOrData => match frame {
                Frame::Data(data) => self.process_data(data, env),
                Frame::End(_) => self.do_end(),
                Frame::Begin(_) | Frame::Window(_) | Frame::Reset(_) => {
                    self.process_unexpected(frame, env)
                }
            },
            StreamState::AfterRejectOrReset => match frame {
                Frame::Data(data) => {
                    env.source
                        .do_window(data.stream_id, payload_credit(data.payload));
                    Disposition::Open
                }
                Frame::End(_) => {
                    self.state = StreamState::AfterEnd;
                    Disposition::Closed
                }
                Frame::Begin(_) | Frame::Window(_) | Frame::Reset(_) => Disposition::Open,
            },
            StreamState::AfterEnd => self.process_unexpected(frame, env),
        }
    }

    fn process_begin(&mut self, begin: &BeginFrame<'_>, env: &mut Env<'_, T>) -> Disposition {
        let correlation = env.correlations.correlate(begin.correlation_id);
        let Some(correlation) = correlation.filter(|_| begin.reference_id == 0) else {
            debug!(
                "response begin not correlated: stream={}, reference={}, correlation={}",
                begin.stream_id, begin.reference_id, begin.correlation_id
            );
            return self.reject(begin.stream_id, env);
        };

        let headers = match decode_headers(begin.extension) {
            Ok(headers) => headers,
            Err(error) => {
                debug!(
                    "response begin has malformed headers: stream={}, error={error}",
                    begin.stream_id
                );
                return self.reject(begin.stream_id, env);
            }
        };
        let mut preamble = BytesMut::new();
        encode_preamble(&headers, &mut preamble);

        let target = env.router.supply_target(&correlation.source);
        let target_id = env.router.supply_stream_id();

        if preamble.len() > env.slab.slot_capacity() {
            return self.reject_insufficient_storage(
                Binding {
                    target,
                    id: target_id,
                },
                &correlation,
                preamble.len(),
                env,
            );
        }

        let mut slot = match env.slab.acquire(target_id) {
            Ok(slot) => slot,
            Err(error) => {
                if matches!(error, SlabError::Exhausted { .. }) {
                    metrics::inc_slab_exhausted();
                }
                warn!(
                    "response stream rejected: stream={}, error={error}",
                    begin.stream_id
                );
                return self.reject(begin.stream_id, env);
            }
        };
        if let Err(error) = env.slab.stage(&mut slot, &preamble) {
            warn!(
                "response preamble not staged: stream={}, error={error}",
                begin.stream_id
            );
            release_slot(env.slab, slot);
            return self.reject(begin.stream_id, env);
        }

        let mut binding = Binding {
            target,
            id: target_id,
        };
        binding
            .target
            .do_begin(target_id, 0, correlation.id);
        debug!(
            "response stream opened: source_id={}, target={}, target_id={}, request_id={}, \
             preamble_len={}",
            self.source_id,
            binding.target.name(),
            target_id,
            correlation.source_id,
            slot.written()
        );
        self.binding = Some(binding);
        self.state = StreamState::BeforeHeadersWritten {
            slot,
            end_deferred: false,
        };
        self.throttle = ThrottleState::BeforeHeadersWritten;
        Disposition::Throttled(target_id)
    }

    /// Reply with the fixed `507` response and tear the stream down without
    /// staging anything.
    fn reject_insufficient_storage(
        &mut self,
        mut binding: Binding<T>,
        correlation: &Correlation,
        preamble_len: usize,
        env: &mut Env<'_, T>,
    ) -> Disposition {
        warn!(
            "response preamble exceeds slot capacity: source_id={}, target_id={}, len={}, \
             capacity={}",
            self.source_id,
            binding.id,
            preamble_len,
            env.slab.slot_capacity()
        );
        metrics::inc_insufficient_storage();
        binding
            .target
            .do_begin(binding.id, 0, correlation.id);
        binding
            .target
            .do_data(binding.id, INSUFFICIENT_STORAGE_RESPONSE);
        env.source.do_reset(self.source_id);
        self.binding = Some(binding);
        self.state = StreamState::AfterEnd;
        Disposition::Closed
    }

    fn process_data(&mut self, data: &DataFrame<'_>, env: &mut Env<'_, T>) -> Disposition {
        self.window -= i64::try_from(data.payload.len()).unwrap_or(i64::MAX);
        if self.window < 0 {
            debug!(
                "response data exceeds window: stream={}, len={}, window={}",
                data.stream_id,
                data.payload.len(),
                self.window
            );
            return self.reject(data.stream_id, env);
        }
        if let Some(binding) = self.binding.as_mut() {
            binding.target.do_data(binding.id, data.payload);
        }
        Disposition::Open
    }

    /// Normal teardown: both registrations are dropped by the factory.
    pub(super) fn do_end(&mut self) -> Disposition {
        tracing::debug!(
            source_id = %self.source_id,
            target_id = ?self.target_id(),
            window = self.window,
            "response stream ended"
        );
        self.state = StreamState::AfterEnd;
        Disposition::Closed
    }

    fn process_unexpected(&mut self, frame: &Frame<'_>, env: &mut Env<'_, T>) -> Disposition {
        debug!(
            "unexpected {} frame: stream={}, correlation={:?}, context={self}",
            frame.kind(),
            frame.stream_id(),
            frame.correlation_id()
        );
        self.reject(frame.stream_id(), env)
    }

    /// Reset `stream_id`, release any staged preamble and drain whatever the
    /// producer still has in flight.
    pub(super) fn reject(&mut self, stream_id: StreamId, env: &mut Env<'_, T>) -> Disposition {
        env.source.do_reset(stream_id);
        if let StreamState::BeforeHeadersWritten { slot, .. } =
            mem::replace(&mut self.state, StreamState::AfterRejectOrReset)
        {
            release_slot(env.slab, slot);
        }
        if self.binding.is_some() {
            self.throttle = ThrottleState::AfterReject;
        }
        Disposition::Open
    }
}

/// Credit returned for a drained payload; payloads never exceed the `u16`
/// wire limit, so saturation is unreachable in practice.
fn payload_credit(payload: &[u8]) -> u32 { u32::try_from(payload.len()).unwrap_or(u32::MAX) }

pub(super) fn release_slot(slab: &mut Slab, slot: Slot) {
    if let Err(error) = slab.release(slot) {
        warn!("slot release failed: error={error}");
    }
}
