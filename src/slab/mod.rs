//! Bounded pool of fixed-capacity encoding buffers.
//!
//! A [`Slab`] stages encoded bytes that are waiting for flow-control credit.
//! Its memory is carved into equal-size slots. [`Slab::acquire`] hands out a
//! move-only [`Slot`] that records which buffer it addresses, the generation
//! of that buffer, and how many bytes were staged and flushed. Because
//! [`Slab::release`] consumes the `Slot`, a released slot cannot be used or
//! released again. The generation check rejects slots issued by another
//! slab.
//!
//! The slab performs no internal synchronisation. It is owned by one
//! dispatch loop, matching the single-threaded frame delivery of a transport
//! channel.

mod error;

use std::{
    collections::{HashMap, hash_map::Entry},
    num::NonZeroUsize,
    sync::atomic::{AtomicU64, Ordering},
};

pub use error::SlabError;

use crate::{config::EncodeConfig, frame::StreamId};

static NEXT_SLAB_ID: AtomicU64 = AtomicU64::new(1);

/// Per-buffer bookkeeping.
#[derive(Debug, Default)]
struct SlotEntry {
    generation: u32,
    owner: Option<StreamId>,
}

/// Checked-out slab buffer plus its staging cursors.
///
/// Invariant: `flushed <= written <= capacity`.
#[derive(Debug)]
#[must_use = "a slot must be released back to its slab"]
pub struct Slot {
    slab: u64,
    index: usize,
    generation: u32,
    owner: StreamId,
    written: usize,
    flushed: usize,
}

impl Slot {
    /// Index of the buffer inside the slab.
    #[must_use]
    pub const fn index(&self) -> usize { self.index }

    /// Stream the slot was acquired for.
    #[must_use]
    pub const fn owner(&self) -> StreamId { self.owner }

    /// Bytes staged so far.
    #[must_use]
    pub const fn written(&self) -> usize { self.written }

    /// Bytes already handed to the transport.
    #[must_use]
    pub const fn flushed(&self) -> usize { self.flushed }

    /// Bytes staged but not yet flushed.
    #[must_use]
    pub const fn remaining(&self) -> usize { self.written - self.flushed }

    /// Returns `true` once every staged byte has been flushed.
    #[must_use]
    pub const fn is_drained(&self) -> bool { self.flushed == self.written }

    /// Mark `len` more staged bytes as flushed.
    pub fn advance(&mut self, len: usize) {
        debug_assert!(len <= self.remaining(), "advance past staged bytes");
        self.flushed = self.flushed.saturating_add(len).min(self.written);
    }
}

/// Fixed-capacity pool of equal-size buffers.
///
/// # Examples
///
/// ```
/// use std::num::NonZeroUsize;
///
/// use wireframe_http::{frame::StreamId, slab::Slab};
///
/// let mut slab = Slab::new(
///     NonZeroUsize::new(64).expect("non-zero"),
///     NonZeroUsize::new(2).expect("non-zero"),
/// );
/// let mut slot = slab.acquire(StreamId(1)).expect("free slot");
/// slab.stage(&mut slot, b"HTTP/1.1 200 OK\r\n\r\n")
///     .expect("fits");
/// assert_eq!(slab.pending(&slot).expect("own slot"), b"HTTP/1.1 200 OK\r\n\r\n");
/// slab.release(slot).expect("own slot");
/// assert_eq!(slab.in_use(), 0);
/// ```
#[derive(Debug)]
pub struct Slab {
    id: u64,
    slot_capacity: usize,
    memory: Box<[u8]>,
    entries: Vec<SlotEntry>,
    free: Vec<usize>,
    owners: HashMap<StreamId, usize>,
}

impl Slab {
    /// Create a slab of `slot_count` buffers of `slot_capacity` bytes each.
    #[must_use]
    pub fn new(slot_capacity: NonZeroUsize, slot_count: NonZeroUsize) -> Self {
        let slot_capacity = slot_capacity.get();
        let slot_count = slot_count.get();
        let entries = (0..slot_count).map(|_| SlotEntry::default()).collect();
        Self {
            id: NEXT_SLAB_ID.fetch_add(1, Ordering::Relaxed),
            slot_capacity,
            memory: vec![0u8; slot_capacity.saturating_mul(slot_count)].into_boxed_slice(),
            entries,
            free: (0..slot_count).rev().collect(),
            owners: HashMap::new(),
        }
    }

    /// Create a slab sized by an [`EncodeConfig`].
    #[must_use]
    pub fn from_config(config: &EncodeConfig) -> Self {
        Self::new(config.maximum_headers_size(), config.slot_count())
    }

    /// Capacity of every slot in bytes.
    #[must_use]
    pub const fn slot_capacity(&self) -> usize { self.slot_capacity }

    /// Number of slots in the slab.
    #[must_use]
    pub fn slot_count(&self) -> usize { self.entries.len() }

    /// Number of slots currently checked out.
    #[must_use]
    pub fn in_use(&self) -> usize { self.entries.len() - self.free.len() }

    /// Check out a free slot for `owner`.
    ///
    /// # Errors
    ///
    /// Returns [`SlabError::AlreadyAcquired`] if `owner` already holds a slot
    /// and [`SlabError::Exhausted`] if every slot is in use. Both leave the
    /// slab unchanged.
    pub fn acquire(&mut self, owner: StreamId) -> Result<Slot, SlabError> {
        let vacant = match self.owners.entry(owner) {
            Entry::Occupied(held) => {
                return Err(SlabError::AlreadyAcquired {
                    owner,
                    index: *held.get(),
                });
            }
            Entry::Vacant(vacant) => vacant,
        };
        let Some(index) = self.free.pop() else {
            return Err(SlabError::Exhausted {
                owner,
                slots: self.entries.len(),
            });
        };
        vacant.insert(index);
        let entry = &mut self.entries[index];
        entry.owner = Some(owner);
        Ok(Slot {
            slab: self.id,
            index,
            generation: entry.generation,
            owner,
            written: 0,
            flushed: 0,
        })
    }

    /// Whole fixed-capacity buffer addressed by `slot`.
    ///
    /// # Errors
    ///
    /// Returns [`SlabError::ForeignSlot`] if `slot` was not issued by this
    /// slab.
    pub fn buffer(&self, slot: &Slot) -> Result<&[u8], SlabError> {
        let range = self.range(slot)?;
        Ok(&self.memory[range])
    }

    /// Mutable view of the fixed-capacity buffer addressed by `slot`.
    ///
    /// # Errors
    ///
    /// Returns [`SlabError::ForeignSlot`] if `slot` was not issued by this
    /// slab.
    pub fn buffer_mut(&mut self, slot: &Slot) -> Result<&mut [u8], SlabError> {
        let range = self.range(slot)?;
        Ok(&mut self.memory[range])
    }

    /// Append `bytes` after the bytes already staged in `slot`.
    ///
    /// # Errors
    ///
    /// Returns [`SlabError::Overflow`] if the slot would exceed its capacity
    /// and [`SlabError::ForeignSlot`] for a slot from another slab. Nothing
    /// is staged on error.
    pub fn stage(&mut self, slot: &mut Slot, bytes: &[u8]) -> Result<(), SlabError> {
        let start = slot.written;
        let end = start.saturating_add(bytes.len());
        if end > self.slot_capacity {
            return Err(SlabError::Overflow {
                attempted: end,
                capacity: self.slot_capacity,
            });
        }
        self.buffer_mut(slot)?[start..end].copy_from_slice(bytes);
        slot.written = end;
        Ok(())
    }

    /// Staged bytes not yet flushed.
    ///
    /// # Errors
    ///
    /// Returns [`SlabError::ForeignSlot`] if `slot` was not issued by this
    /// slab.
    pub fn pending(&self, slot: &Slot) -> Result<&[u8], SlabError> {
        Ok(&self.buffer(slot)?[slot.flushed..slot.written])
    }

    /// Return `slot` to the pool.
    ///
    /// # Errors
    ///
    /// Returns [`SlabError::ForeignSlot`] if `slot` was not issued by this
    /// slab; the slab is left unchanged.
    pub fn release(&mut self, slot: Slot) -> Result<(), SlabError> {
        self.check(&slot)?;
        let entry = &mut self.entries[slot.index];
        entry.generation = entry.generation.wrapping_add(1);
        entry.owner = None;
        self.owners.remove(&slot.owner);
        self.free.push(slot.index);
        Ok(())
    }

    fn check(&self, slot: &Slot) -> Result<(), SlabError> {
        let owned = slot.slab == self.id
            && self.entries.get(slot.index).is_some_and(|entry| {
                entry.generation == slot.generation && entry.owner == Some(slot.owner)
            });
        if owned {
            Ok(())
        } else {
            Err(SlabError::ForeignSlot { index: slot.index })
        }
    }

    fn range(&self, slot: &Slot) -> Result<std::ops::Range<usize>, SlabError> {
        self.check(slot)?;
        let start = slot.index * self.slot_capacity;
        Ok(start..start + self.slot_capacity)
    }
}
