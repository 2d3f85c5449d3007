//! Throttle half of a response stream: Window and Reset from the requester.
//!
//! Until the staged preamble has drained, credit is spent flushing it.
//! Afterwards every grant is relayed one hop upstream so body bytes keep
//! flowing end to end.

use std::mem;

use log::debug;

use super::{
    Disposition,
    Env,
    state::{StreamState, ThrottleState},
    stream::{ResponseStream, release_slot},
};
use crate::{frame::Frame, transport::Target};

impl<T: Target> ResponseStream<T> {
    /// Handle a throttle frame addressed to the outbound stream.
    pub(crate) fn on_throttle(&mut self, frame: &Frame<'_>, env: &mut Env<'_, T>) -> Disposition {
        match self.throttle {
            ThrottleState::BeforeBegin => match frame {
                Frame::Reset(_) => self.process_reset(env),
                Frame::Begin(_) | Frame::Data(_) | Frame::End(_) | Frame::Window(_) => {
                    Disposition::Open
                }
            },
            ThrottleState::BeforeHeadersWritten => match frame {
                Frame::Window(window) => self.process_window_to_write_headers(window.update, env),
                Frame::Reset(_) => self.process_reset(env),
                Frame::Begin(_) | Frame::Data(_) | Frame::End(_) => Disposition::Open,
            },
            ThrottleState::NextWindow => match frame {
                Frame::Window(window) => {
                    self.do_window(window.update, env);
                    Disposition::Open
                }
                Frame::Reset(_) => self.process_reset(env),
                Frame::Begin(_) | Frame::Data(_) | Frame::End(_) => Disposition::Open,
            },
            ThrottleState::AfterReject | ThrottleState::AfterReset => match frame {
                Frame::Begin(_)
                | Frame::Data(_)
                | Frame::End(_)
                | Frame::Window(_)
                | Frame::Reset(_) => Disposition::Open,
            },
        }
    }

    fn process_window_to_write_headers(&mut self, update: u32, env: &mut Env<'_, T>) -> Disposition {
        let state = mem::replace(&mut self.state, StreamState::AfterBeginOrData);
        let StreamState::BeforeHeadersWritten {
            mut slot,
            end_deferred,
        } = state
        else {
            self.state = state;
            return Disposition::Open;
        };

        let writable = slot.remaining().min(usize::try_from(update).unwrap_or(usize::MAX));
        if writable > 0 {
            let pending = match env.slab.pending(&slot) {
                Ok(pending) => pending,
                Err(error) => {
                    debug!("staged preamble unavailable: source_id={}, error={error}", self.source_id);
                    release_slot(env.slab, slot);
                    return self.reject(self.source_id, env);
                }
            };
            if let Some(binding) = self.binding.as_mut() {
                binding.target.do_data(binding.id, &pending[..writable]);
            }
            slot.advance(writable);
        }

        if !slot.is_drained() {
            self.state = StreamState::BeforeHeadersWritten { slot, end_deferred };
            return Disposition::Open;
        }

        release_slot(env.slab, slot);
        if end_deferred {
            return self.do_end();
        }

        self.throttle = ThrottleState::NextWindow;
        // writable <= update, so the leftover always fits in u32
        let leftover = update - u32::try_from(writable).unwrap_or(update);
        if leftover > 0 {
            self.do_window(leftover, env);
        }
        Disposition::Open
    }

    fn do_window(&mut self, update: u32, env: &mut Env<'_, T>) {
        self.window += i64::from(update);
        env.source.do_window(self.source_id, update);
    }

    fn process_reset(&mut self, env: &mut Env<'_, T>) -> Disposition {
        debug!(
            "response stream reset by requester: source_id={}, state={}",
            self.source_id,
            self.state.name()
        );
        let ended = match mem::replace(&mut self.state, StreamState::AfterRejectOrReset) {
            StreamState::BeforeHeadersWritten { slot, end_deferred } => {
                release_slot(env.slab, slot);
                end_deferred
            }
            StreamState::AfterEnd => true,
            StreamState::BeforeBegin
            | StreamState::AfterBeginOrData
            | StreamState::AfterRejectOrReset => false,
        };
        env.source.do_reset(self.source_id);
        self.throttle = ThrottleState::AfterReset;
        // the producer's End was already consumed, so nothing else closes it
        if ended {
            return self.do_end();
        }
        Disposition::Open
    }
}
