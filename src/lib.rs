#![doc(html_root_url = "https://docs.rs/wireframe_http/latest")]
//! Public API for the `wireframe_http` library.
//!
//! This crate writes HTTP/1.1 responses onto a framed, credit-based stream
//! transport. A response producer streams `Begin`, `Data` and `End` frames;
//! the requester grants credit with `Window` and aborts with `Reset`. The
//! [`ResponseStreamFactory`] correlates each response with its request,
//! stages the encoded status line and headers in a bounded [`Slab`], and
//! relays body bytes and credit once the preamble has been flushed.

pub mod config;
pub mod correlation;
pub mod driver;
pub mod error;
pub mod frame;
pub mod metrics;
pub mod response;
pub mod slab;
pub mod transport;

pub use config::{ConfigError, EncodeConfig};
pub use correlation::{CorrelatableFrame, Correlate, Correlation, CorrelationTable};
pub use driver::{Message, StreamDriver};
pub use error::{Error, Result};
pub use frame::{CorrelationId, Frame, FrameError, StreamId};
pub use metrics::{Direction, FRAMES_PROCESSED, RESETS_SENT, STREAMS_ACTIVE};
pub use response::ResponseStreamFactory;
pub use slab::{Slab, SlabError, Slot};
pub use transport::{Router, Source, Target};
