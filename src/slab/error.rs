//! Error types for slab slot management.

use thiserror::Error;

use crate::frame::StreamId;

/// Errors returned by [`Slab`](super::Slab) operations.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum SlabError {
    /// Every slot is checked out.
    #[error("no free slot for stream {owner}; all {slots} slots in use")]
    Exhausted {
        /// Stream that asked for a slot.
        owner: StreamId,
        /// Number of slots in the slab.
        slots: usize,
    },
    /// The owner already holds a slot.
    #[error("stream {owner} already holds slot {index}")]
    AlreadyAcquired {
        /// Stream that asked for a second slot.
        owner: StreamId,
        /// Slot it currently holds.
        index: usize,
    },
    /// Staged bytes would exceed the slot capacity.
    #[error("slot overflow: {attempted} bytes > {capacity} bytes")]
    Overflow {
        /// Total staged length that was attempted.
        attempted: usize,
        /// Fixed slot capacity.
        capacity: usize,
    },
    /// The slot was issued by a different slab.
    #[error("slot {index} does not belong to this slab")]
    ForeignSlot {
        /// Index carried by the foreign slot.
        index: usize,
    },
}
