//! Utilities for exercising a
//! [`ResponseStreamFactory`](wireframe_http::response::ResponseStreamFactory)
//! against in-memory channels during tests.
//!
//! The recording collaborators capture every frame the factory writes so
//! tests can assert on the exact wire traffic in each direction.
//!
//! ```rust
//! use wireframe_http::{config::EncodeConfig, response::ResponseStreamFactory};
//! use wireframe_http_testing::{Recorder, correlations, http_begin};
//!
//! let recorder = Recorder::new();
//! let mut factory = ResponseStreamFactory::new(
//!     recorder.source("app"),
//!     recorder.router(100),
//!     correlations(&[(7, "http")]),
//!     &EncodeConfig::default(),
//! );
//! let extension = http_begin(&[(":status", "200")]);
//! factory.handle_stream(&wireframe_http_testing::begin(1, 7, &extension));
//! assert_eq!(recorder.target_names(), ["http"]);
//! ```

pub mod builders;
pub mod logging;
pub mod recording;

pub use builders::{begin, correlation, correlations, data, end, http_begin, message, reset, window};
pub use logging::{LoggerHandle, logger};
pub use recording::{Recorded, Recorder, RecordingRouter, RecordingSource, RecordingTarget};
