//! Async dispatch loop feeding a [`ResponseStreamFactory`].
//!
//! The transport delivers stream and throttle messages on two independent
//! inputs. [`StreamDriver`] multiplexes them with a biased `tokio::select!`
//! so shutdown is observed first and throttle credit is applied before more
//! stream data is considered. Every message is handled to completion before
//! the next one is polled, preserving the single-threaded delivery the state
//! machines rely on.

use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt};
use log::debug;
use tokio_util::sync::CancellationToken;

use crate::{
    correlation::Correlate,
    error::Result,
    frame::{self, Frame, FrameError},
    response::ResponseStreamFactory,
    transport::{Router, Source},
};

/// A raw transport message: a frame type id plus its encoded body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    /// Frame type id.
    pub type_id: u32,
    /// Encoded frame body.
    pub payload: Bytes,
}

impl Message {
    /// Build a message from a type id and an encoded body.
    #[must_use]
    pub fn new(type_id: u32, payload: impl Into<Bytes>) -> Self {
        Self {
            type_id,
            payload: payload.into(),
        }
    }

    /// Encode `frame` into a transport message.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::TooLong`] if a length-prefixed field exceeds its
    /// wire limit.
    pub fn encode(frame: &Frame<'_>) -> std::result::Result<Self, FrameError> {
        let mut payload = BytesMut::new();
        frame::encode(frame, &mut payload)?;
        Ok(Self::new(frame.type_id(), payload.freeze()))
    }
}

/// Events returned by [`StreamDriver::next_event`].
#[derive(Debug)]
enum Event {
    Shutdown,
    Throttle(Option<Message>),
    Stream(Option<Message>),
    Idle,
}

/// Drives a [`ResponseStreamFactory`] from two message inputs.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
///
/// use futures::stream;
/// use tokio_util::sync::CancellationToken;
/// use wireframe_http::{
///     config::EncodeConfig,
///     driver::{Message, StreamDriver},
///     frame::{Frame, StreamId},
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
/// struct Routes;
///
/// impl Router for Routes {
///     type Target = Discard;
///     fn supply_target(&mut self, _name: &str) -> Discard { Discard }
///     fn supply_stream_id(&mut self) -> StreamId { StreamId(1) }
/// }
///
/// # tokio_test_run(async {
/// let factory =
///     ResponseStreamFactory::new(Discard, Routes, HashMap::new(), &EncodeConfig::default());
/// let mut driver = StreamDriver::new(
///     factory,
///     stream::iter(Vec::<Message>::new()),
///     stream::iter(Vec::<Message>::new()),
///     CancellationToken::new(),
/// );
/// driver.run().await.expect("no malformed messages");
/// # });
/// # fn tokio_test_run<F: std::future::Future>(f: F) {
/// #     tokio::runtime::Builder::new_current_thread()
/// #         .build()
/// #         .expect("runtime")
/// #         .block_on(f);
/// # }
/// ```
pub struct StreamDriver<S, R: Router, C, SI, TI> {
    factory: ResponseStreamFactory<S, R, C>,
    stream_rx: Option<SI>,
    throttle_rx: Option<TI>,
    shutdown: CancellationToken,
}

impl<S, R, C, SI, TI> StreamDriver<S, R, C, SI, TI>
where
    S: Source,
    R: Router,
    C: Correlate,
    SI: Stream<Item = Message> + Unpin,
    TI: Stream<Item = Message> + Unpin,
{
    /// Create a driver reading stream messages from `stream_rx` and throttle
    /// messages from `throttle_rx` until both end or `shutdown` fires.
    #[must_use]
    pub fn new(
        factory: ResponseStreamFactory<S, R, C>,
        stream_rx: SI,
        throttle_rx: TI,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            factory,
            stream_rx: Some(stream_rx),
            throttle_rx: Some(throttle_rx),
            shutdown,
        }
    }

    /// Get a clone of the shutdown token used by the driver.
    #[must_use]
    pub fn shutdown_token(&self) -> CancellationToken { self.shutdown.clone() }

    /// Borrow the factory.
    #[must_use]
    pub fn factory(&self) -> &ResponseStreamFactory<S, R, C> { &self.factory }

    /// Consume the driver, returning its factory.
    #[must_use]
    pub fn into_factory(self) -> ResponseStreamFactory<S, R, C> { self.factory }

    /// Dispatch messages until both inputs are exhausted or shutdown is
    /// triggered.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Frame`](crate::Error::Frame) for the first message
    /// that cannot be decoded. Messages after it are left unread.
    pub async fn run(&mut self) -> Result<()> {
        if self.shutdown.is_cancelled() {
            debug!("stream driver aborted before start");
            return Ok(());
        }
        loop {
            match self.next_event().await {
                Event::Shutdown => {
                    debug!(
                        "stream driver shut down: streams={}",
                        self.factory.stream_count()
                    );
                    return Ok(());
                }
                Event::Throttle(Some(message)) => self
                    .factory
                    .handle_throttle_message(message.type_id, &message.payload)?,
                Event::Throttle(None) => self.throttle_rx = None,
                Event::Stream(Some(message)) => self
                    .factory
                    .handle_stream_message(message.type_id, &message.payload)?,
                Event::Stream(None) => self.stream_rx = None,
                Event::Idle => {
                    debug!(
                        "stream driver inputs closed: streams={}",
                        self.factory.stream_count()
                    );
                    return Ok(());
                }
            }
        }
    }

    /// Await the next ready event using biased priority ordering.
    ///
    /// Shutdown is observed first, followed by throttle messages, then
    /// stream messages. Every guard is false once both inputs have ended, so
    /// the `else` branch fires instead of waiting on shutdown.
    #[expect(
        clippy::integer_division_remainder_used,
        reason = "tokio::select! expands to modulus operations internally"
    )]
    async fn next_event(&mut self) -> Event {
        let throttle_open = self.throttle_rx.is_some();
        let stream_open = self.stream_rx.is_some();
        let shutdown = self.shutdown.clone();

        tokio::select! {
            biased;

            () = shutdown.cancelled_owned(), if throttle_open || stream_open => Event::Shutdown,
            message = poll_input(self.throttle_rx.as_mut()), if throttle_open => {
                Event::Throttle(message)
            }
            message = poll_input(self.stream_rx.as_mut()), if stream_open => {
                Event::Stream(message)
            }
            else => Event::Idle,
        }
    }
}

/// Poll whichever input is provided, returning `None` when absent.
async fn poll_input<I>(input: Option<&mut I>) -> Option<Message>
where
    I: Stream<Item = Message> + Unpin,
{
    match input {
        Some(input) => input.next().await,
        None => None,
    }
}
