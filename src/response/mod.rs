//! HTTP/1.1 response emission over the framed transport.
//!
//! A response producer opens a stream with `Begin`, carrying the response
//! headers in its extension. [`ResponseStreamFactory`] correlates the stream
//! with the request it answers, opens an outbound stream toward the
//! requester, and stages the encoded preamble in a [`Slab`] slot until the
//! requester grants credit with `Window`. Once the preamble has drained,
//! body `Data` passes straight through and further credit is relayed back
//! to the producer.
//!
//! Each stream is driven by two cooperating state machines held in one
//! context: the stream half consumes Begin, Data and End from the producer;
//! the throttle half consumes Window and Reset from the requester. Protocol
//! violations never escape a transition: the offending stream is reset and
//! its in-flight frames are drained.

mod preamble;
mod state;
mod stream;
mod throttle;

use std::collections::HashMap;

use log::debug;
pub use preamble::{INSUFFICIENT_STORAGE_RESPONSE, STATUS_HEADER, encode_preamble};
use stream::ResponseStream;

use crate::{
    config::EncodeConfig,
    correlation::Correlate,
    error::Result,
    frame::{self, Frame, StreamId},
    metrics::{self, Direction},
    slab::Slab,
    transport::{Router, Source},
};

/// Collaborators a transition may touch.
pub(crate) struct Env<'a, T> {
    pub(crate) source: &'a mut dyn Source,
    pub(crate) router: &'a mut dyn Router<Target = T>,
    pub(crate) correlations: &'a mut dyn Correlate,
    pub(crate) slab: &'a mut Slab,
}

/// Registration changes requested by a transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[must_use]
pub(crate) enum Disposition {
    /// Registrations are unchanged.
    Open,
    /// Route throttle frames for the outbound stream to this machine.
    Throttled(StreamId),
    /// Terminal: drop the machine and its throttle registration.
    Closed,
}

/// Entry point the transport calls with frames for response streams.
///
/// Stream frames arrive through [`handle_stream`](Self::handle_stream),
/// keyed by the producer's stream id. Throttle frames arrive through
/// [`handle_throttle`](Self::handle_throttle), keyed by the outbound stream
/// id this factory allocated. Dispatch is synchronous: each frame is fully
/// processed before the next one is accepted.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
///
/// use wireframe_http::{
///     config::EncodeConfig,
///     frame::{BeginFrame, CorrelationId, Frame, StreamId},
///     response::ResponseStreamFactory,
///     transport::{Router, Source, Target},
/// };
///
/// struct Discard;
///
/// impl Source for Discard {
///     fn name(&self) -> &str { "app" }
///     fn write_throttle(&mut self, _frame: &Frame<'_>) {}
/// }
///
/// impl Target for Discard {
///     fn name(&self) -> &str { "http" }
///     fn write(&mut self, _frame: &Frame<'_>) {}
/// }
///
/// struct Routes(u64);
///
/// impl Router for Routes {
///     type Target = Discard;
///     fn supply_target(&mut self, _name: &str) -> Discard { Discard }
///     fn supply_stream_id(&mut self) -> StreamId {
///         self.0 += 1;
///         StreamId(self.0)
///     }
/// }
///
/// let mut factory =
///     ResponseStreamFactory::new(Discard, Routes(100), HashMap::new(), &EncodeConfig::default());
/// factory.handle_stream(&Frame::Begin(BeginFrame {
///     stream_id: StreamId(1),
///     reference_id: 0,
///     correlation_id: CorrelationId(7),
///     extension: &[],
/// }));
/// // No correlation was recorded, so the stream was reset and is draining.
/// assert_eq!(factory.stream_count(), 1);
/// ```
pub struct ResponseStreamFactory<S, R: Router, C> {
    source: S,
    router: R,
    correlations: C,
    slab: Slab,
    streams: HashMap<StreamId, ResponseStream<R::Target>>,
    throttles: HashMap<StreamId, StreamId>,
}

impl<S, R, C> ResponseStreamFactory<S, R, C>
where
    S: Source,
    R: Router,
    C: Correlate,
{
    /// Create a factory writing throttle frames to `source`, resolving
    /// targets through `router` and consuming correlations from
    /// `correlations`.
    #[must_use]
    pub fn new(source: S, router: R, correlations: C, config: &EncodeConfig) -> Self {
        Self {
            source,
            router,
            correlations,
            slab: Slab::from_config(config),
            streams: HashMap::new(),
            throttles: HashMap::new(),
        }
    }

    /// Register a fresh response stream for `stream_id`.
    ///
    /// [`handle_stream`](Self::handle_stream) calls this for a `Begin` on an
    /// unknown stream; it is public for transports that announce streams
    /// before their first frame. An existing registration is kept.
    pub fn new_stream(&mut self, stream_id: StreamId) {
        self.streams.entry(stream_id).or_insert_with(|| {
            metrics::inc_streams();
            ResponseStream::new(stream_id)
        });
    }

    /// Dispatch a Begin, Data or End frame from the response producer.
    pub fn handle_stream(&mut self, frame: &Frame<'_>) {
        metrics::inc_frames(Direction::Stream);
        let stream_id = frame.stream_id();
        if matches!(frame, Frame::Begin(_)) {
            self.new_stream(stream_id);
        }
        let Self {
            source,
            router,
            correlations,
            slab,
            streams,
            throttles,
        } = self;
        let Some(stream) = streams.get_mut(&stream_id) else {
            debug!(
                "dropping {} frame for unknown stream: stream={stream_id}",
                frame.kind()
            );
            return;
        };
        let mut env = Env {
            source,
            router,
            correlations,
            slab,
        };
        let disposition = stream.on_stream(frame, &mut env);
        apply(streams, throttles, stream_id, disposition);
    }

    /// Dispatch a Window or Reset frame addressed to an outbound stream.
    pub fn handle_throttle(&mut self, frame: &Frame<'_>) {
        metrics::inc_frames(Direction::Throttle);
        let target_id = frame.stream_id();
        let Self {
            source,
            router,
            correlations,
            slab,
            streams,
            throttles,
        } = self;
        let Some(stream_id) = throttles.get(&target_id).copied() else {
            debug!(
                "dropping {} throttle for unknown stream: target_id={target_id}",
                frame.kind()
            );
            return;
        };
        let Some(stream) = streams.get_mut(&stream_id) else {
            throttles.remove(&target_id);
            return;
        };
        let mut env = Env {
            source,
            router,
            correlations,
            slab,
        };
        let disposition = stream.on_throttle(frame, &mut env);
        apply(streams, throttles, stream_id, disposition);
    }

    /// Decode a stream message from the transport and dispatch it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Frame`](crate::Error::Frame) if the message cannot
    /// be decoded; no state machine observes it.
    pub fn handle_stream_message(&mut self, type_id: u32, buf: &[u8]) -> Result<()> {
        let frame = frame::decode(type_id, buf)?;
        self.handle_stream(&frame);
        Ok(())
    }

    /// Decode a throttle message from the transport and dispatch it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Frame`](crate::Error::Frame) if the message cannot
    /// be decoded; no state machine observes it.
    pub fn handle_throttle_message(&mut self, type_id: u32, buf: &[u8]) -> Result<()> {
        let frame = frame::decode(type_id, buf)?;
        self.handle_throttle(&frame);
        Ok(())
    }

    /// Number of registered response streams.
    #[must_use]
    pub fn stream_count(&self) -> usize { self.streams.len() }

    /// Number of outbound streams receiving throttle frames.
    #[must_use]
    pub fn throttle_count(&self) -> usize { self.throttles.len() }

    /// Send window toward the requester for the response stream
    /// `stream_id`, if it is registered.
    #[must_use]
    pub fn window(&self, stream_id: StreamId) -> Option<i64> {
        self.streams.get(&stream_id).map(ResponseStream::window)
    }

    /// Slab staging response preambles.
    #[must_use]
    pub fn slab(&self) -> &Slab { &self.slab }

    /// Borrow the source channel.
    #[must_use]
    pub fn source(&self) -> &S { &self.source }

    /// Borrow the router.
    #[must_use]
    pub fn router(&self) -> &R { &self.router }
}

fn apply<T>(
    streams: &mut HashMap<StreamId, ResponseStream<T>>,
    throttles: &mut HashMap<StreamId, StreamId>,
    stream_id: StreamId,
    disposition: Disposition,
) {
    match disposition {
        Disposition::Open => {}
        Disposition::Throttled(target_id) => {
            throttles.insert(target_id, stream_id);
        }
        Disposition::Closed => {
            if let Some(stream) = streams.remove(&stream_id) {
                if let Some(binding) = stream.binding {
                    throttles.remove(&binding.id);
                }
                metrics::dec_streams();
            }
        }
    }
}
