//! Encoding budget configuration.
//!
//! [`EncodeConfig`] sizes the [`Slab`](crate::slab::Slab) that stages
//! response preambles: every slot holds at most `maximum_headers_size`
//! bytes and the slab owns `memory_for_encode` bytes in total.

use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default capacity of one preamble slot in bytes.
pub const DEFAULT_MAXIMUM_HEADERS_SIZE: usize = 1024;
/// Default total memory reserved for preamble slots in bytes.
pub const DEFAULT_MEMORY_FOR_ENCODE: usize = 64 * 1024;

/// Errors returned when validating an [`EncodeConfig`].
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The encode memory cannot hold a single slot.
    #[error(
        "memory_for_encode ({memory}) must be at least maximum_headers_size ({headers})"
    )]
    MemoryBelowSlotSize {
        /// Configured total encode memory.
        memory: usize,
        /// Configured slot capacity.
        headers: usize,
    },
}

/// Sizing for preamble staging buffers.
///
/// # Examples
///
/// ```
/// use std::num::NonZeroUsize;
///
/// use wireframe_http::config::EncodeConfig;
///
/// let config = EncodeConfig::new(
///     NonZeroUsize::new(512).expect("non-zero"),
///     NonZeroUsize::new(4096).expect("non-zero"),
/// )
/// .expect("valid budgets");
/// assert_eq!(config.slot_count().get(), 8);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawEncodeConfig", into = "RawEncodeConfig")]
pub struct EncodeConfig {
    maximum_headers_size: NonZeroUsize,
    memory_for_encode: NonZeroUsize,
}

impl EncodeConfig {
    /// Create a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MemoryBelowSlotSize`] when
    /// `memory_for_encode` is smaller than `maximum_headers_size`.
    pub const fn new(
        maximum_headers_size: NonZeroUsize,
        memory_for_encode: NonZeroUsize,
    ) -> Result<Self, ConfigError> {
        if memory_for_encode.get() < maximum_headers_size.get() {
            return Err(ConfigError::MemoryBelowSlotSize {
                memory: memory_for_encode.get(),
                headers: maximum_headers_size.get(),
            });
        }
        Ok(Self {
            maximum_headers_size,
            memory_for_encode,
        })
    }

    /// Largest encoded preamble that can be staged.
    #[must_use]
    pub const fn maximum_headers_size(&self) -> NonZeroUsize { self.maximum_headers_size }

    /// Total bytes reserved for staging preambles.
    #[must_use]
    pub const fn memory_for_encode(&self) -> NonZeroUsize { self.memory_for_encode }

    /// Number of slots the encode memory provides.
    #[must_use]
    pub const fn slot_count(&self) -> NonZeroUsize {
        match NonZeroUsize::new(self.memory_for_encode.get() / self.maximum_headers_size.get()) {
            Some(count) => count,
            None => NonZeroUsize::MIN,
        }
    }
}

impl Default for EncodeConfig {
    fn default() -> Self {
        Self {
            maximum_headers_size: NonZeroUsize::new(DEFAULT_MAXIMUM_HEADERS_SIZE)
                .unwrap_or(NonZeroUsize::MIN),
            memory_for_encode: NonZeroUsize::new(DEFAULT_MEMORY_FOR_ENCODE)
                .unwrap_or(NonZeroUsize::MIN),
        }
    }
}

/// Unvalidated serde representation of [`EncodeConfig`].
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
struct RawEncodeConfig {
    #[serde(default = "default_maximum_headers_size")]
    maximum_headers_size: NonZeroUsize,
    #[serde(default = "default_memory_for_encode")]
    memory_for_encode: NonZeroUsize,
}

fn default_maximum_headers_size() -> NonZeroUsize { EncodeConfig::default().maximum_headers_size }

fn default_memory_for_encode() -> NonZeroUsize { EncodeConfig::default().memory_for_encode }

impl TryFrom<RawEncodeConfig> for EncodeConfig {
    type Error = ConfigError;

    fn try_from(raw: RawEncodeConfig) -> Result<Self, Self::Error> {
        Self::new(raw.maximum_headers_size, raw.memory_for_encode)
    }
}

impl From<EncodeConfig> for RawEncodeConfig {
    fn from(config: EncodeConfig) -> Self {
        Self {
            maximum_headers_size: config.maximum_headers_size,
            memory_for_encode: config.memory_for_encode,
        }
    }
}
