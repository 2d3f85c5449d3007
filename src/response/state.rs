//! States of the two cooperating halves of a response stream.

use crate::slab::Slot;

/// Stream half: reacts to Begin, Data and End from the response producer.
#[derive(Debug)]
pub(crate) enum StreamState {
    /// Waiting for the `Begin` that opens the response.
    BeforeBegin,
    /// The preamble is staged in `slot` and waiting for credit.
    BeforeHeadersWritten {
        /// Slot holding the encoded preamble.
        slot: Slot,
        /// An `End` arrived before the preamble drained.
        end_deferred: bool,
    },
    /// Preamble flushed; body bytes pass through against the window.
    AfterBeginOrData,
    /// The producer was told to stop; in-flight frames are drained.
    AfterRejectOrReset,
    /// Terminal.
    AfterEnd,
}

impl StreamState {
    pub(crate) const fn name(&self) -> &'static str {
        match self {
            Self::BeforeBegin => "before-begin",
            Self::BeforeHeadersWritten { .. } => "before-headers-written",
            Self::AfterBeginOrData => "after-begin-or-data",
            Self::AfterRejectOrReset => "after-reject-or-reset",
            Self::AfterEnd => "after-end",
        }
    }
}

/// Throttle half: reacts to Window and Reset from the requester.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ThrottleState {
    /// No outbound stream exists yet.
    BeforeBegin,
    /// Credit is spent draining the staged preamble.
    BeforeHeadersWritten,
    /// Steady state: credit is relayed to the producer.
    NextWindow,
    /// This side rejected the stream; throttle frames are ignored.
    AfterReject,
    /// The requester reset the stream; throttle frames are ignored.
    AfterReset,
}

impl ThrottleState {
    pub(crate) const fn name(self) -> &'static str {
        match self {
            Self::BeforeBegin => "before-begin",
            Self::BeforeHeadersWritten => "before-headers-written",
            Self::NextWindow => "next-window",
            Self::AfterReject => "after-reject",
            Self::AfterReset => "after-reset",
        }
    }
}
