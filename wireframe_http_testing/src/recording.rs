//! In-memory collaborators that record every frame written to them.

use std::{cell::RefCell, rc::Rc};

use wireframe_http::{
    correlation::CorrelatableFrame,
    frame::{CorrelationId, Frame, StreamId},
    transport::{Router, Source, Target},
};

/// Owned copy of a frame written by the code under test.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Recorded {
    /// Stream open.
    Begin {
        /// Stream opened.
        stream_id: StreamId,
        /// Reference id carried on the frame.
        reference_id: u64,
        /// Correlation id carried on the frame.
        correlation_id: CorrelationId,
        /// Extension bytes.
        extension: Vec<u8>,
    },
    /// Payload bytes.
    Data {
        /// Stream the payload belongs to.
        stream_id: StreamId,
        /// Payload bytes.
        payload: Vec<u8>,
    },
    /// Stream close.
    End {
        /// Stream closed.
        stream_id: StreamId,
    },
    /// Credit grant.
    Window {
        /// Stream granted credit.
        stream_id: StreamId,
        /// Credit in bytes.
        update: u32,
    },
    /// Abort.
    Reset {
        /// Stream aborted.
        stream_id: StreamId,
    },
}

impl Recorded {
    /// Stream the frame addresses.
    #[must_use]
    pub fn stream_id(&self) -> StreamId {
        match self {
            Self::Begin { stream_id, .. }
            | Self::Data { stream_id, .. }
            | Self::End { stream_id }
            | Self::Window { stream_id, .. }
            | Self::Reset { stream_id } => *stream_id,
        }
    }
}

impl CorrelatableFrame for Recorded {
    fn correlation_id(&self) -> Option<CorrelationId> {
        match self {
            Self::Begin { correlation_id, .. } => Some(*correlation_id),
            Self::Data { .. } | Self::End { .. } | Self::Window { .. } | Self::Reset { .. } => None,
        }
    }
}

impl From<&Frame<'_>> for Recorded {
    fn from(frame: &Frame<'_>) -> Self {
        match frame {
            Frame::Begin(begin) => Self::Begin {
                stream_id: begin.stream_id,
                reference_id: begin.reference_id,
                correlation_id: begin.correlation_id,
                extension: begin.extension.to_vec(),
            },
            Frame::Data(data) => Self::Data {
                stream_id: data.stream_id,
                payload: data.payload.to_vec(),
            },
            Frame::End(end) => Self::End {
                stream_id: end.stream_id,
            },
            Frame::Window(window) => Self::Window {
                stream_id: window.stream_id,
                update: window.update,
            },
            Frame::Reset(reset) => Self::Reset {
                stream_id: reset.stream_id,
            },
        }
    }
}

#[derive(Debug, Default)]
struct Log {
    source: Vec<Recorded>,
    target: Vec<Recorded>,
    resolved: Vec<String>,
}

/// Shared log behind the recording collaborators.
///
/// Clones share the same log, so a test keeps one `Recorder` while the
/// collaborators it hands out are moved into the factory.
#[derive(Clone, Debug, Default)]
pub struct Recorder(Rc<RefCell<Log>>);

impl Recorder {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Source channel recording throttle frames.
    #[must_use]
    pub fn source(&self, name: &str) -> RecordingSource {
        RecordingSource {
            name: name.to_owned(),
            log: self.clone(),
        }
    }

    /// Router handing out recording targets and sequential stream ids
    /// starting at `first_stream_id`.
    #[must_use]
    pub fn router(&self, first_stream_id: u64) -> RecordingRouter {
        RecordingRouter {
            next_stream_id: first_stream_id,
            log: self.clone(),
        }
    }

    /// Throttle frames written back toward the producer.
    #[must_use]
    pub fn source_frames(&self) -> Vec<Recorded> { self.0.borrow().source.clone() }

    /// Stream frames written toward requesters, across all targets.
    #[must_use]
    pub fn target_frames(&self) -> Vec<Recorded> { self.0.borrow().target.clone() }

    /// Names passed to [`Router::supply_target`], in call order.
    #[must_use]
    pub fn target_names(&self) -> Vec<String> { self.0.borrow().resolved.clone() }

    /// Concatenated `Data` payloads written to `stream_id`.
    #[must_use]
    pub fn target_bytes(&self, stream_id: StreamId) -> Vec<u8> {
        self.0
            .borrow()
            .target
            .iter()
            .filter_map(|frame| match frame {
                Recorded::Data {
                    stream_id: id,
                    payload,
                } if *id == stream_id => Some(payload.as_slice()),
                _ => None,
            })
            .flatten()
            .copied()
            .collect()
    }

    /// Total credit granted upstream on `stream_id`.
    #[must_use]
    pub fn credit_granted(&self, stream_id: StreamId) -> u64 {
        self.0
            .borrow()
            .source
            .iter()
            .filter_map(|frame| match frame {
                Recorded::Window {
                    stream_id: id,
                    update,
                } if *id == stream_id => Some(u64::from(*update)),
                _ => None,
            })
            .sum()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        let mut log = self.0.borrow_mut();
        log.source.clear();
        log.target.clear();
        log.resolved.clear();
    }
}

/// [`Source`] that records throttle frames.
#[derive(Debug)]
pub struct RecordingSource {
    name: String,
    log: Recorder,
}

impl Source for RecordingSource {
    fn name(&self) -> &str { &self.name }

    fn write_throttle(&mut self, frame: &Frame<'_>) {
        self.log.0.borrow_mut().source.push(frame.into());
    }
}

/// [`Target`] that records stream frames.
#[derive(Debug)]
pub struct RecordingTarget {
    name: String,
    log: Recorder,
}

impl Target for RecordingTarget {
    fn name(&self) -> &str { &self.name }

    fn write(&mut self, frame: &Frame<'_>) { self.log.0.borrow_mut().target.push(frame.into()); }
}

/// [`Router`] resolving every name to a [`RecordingTarget`].
#[derive(Debug)]
pub struct RecordingRouter {
    next_stream_id: u64,
    log: Recorder,
}

impl Router for RecordingRouter {
    type Target = RecordingTarget;

    fn supply_target(&mut self, name: &str) -> RecordingTarget {
        self.log.0.borrow_mut().resolved.push(name.to_owned());
        RecordingTarget {
            name: name.to_owned(),
            log: self.log.clone(),
        }
    }

    fn supply_stream_id(&mut self) -> StreamId {
        let id = StreamId(self.next_stream_id);
        self.next_stream_id += 1;
        id
    }
}
