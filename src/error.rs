//! Canonical error and result types for the crate.
//!
//! Protocol violations never surface here: they are answered on the wire
//! with a `Reset` frame. `Error` covers the failures a caller can act on,
//! namely undecodable transport messages, slab misuse and invalid
//! configuration.

use thiserror::Error;

use crate::{config::ConfigError, frame::FrameError, slab::SlabError};

/// Top-level error type exposed by `wireframe_http`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// A transport message could not be decoded into a frame.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),
    /// A slab operation failed.
    #[error("slab error: {0}")]
    Slab(#[from] SlabError),
    /// Configuration failed validation.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Canonical result alias used by `wireframe_http` public APIs.
pub type Result<T> = std::result::Result<T, Error>;
