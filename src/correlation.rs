//! Correlation of response streams with the requests they answer.
//!
//! When a request stream is accepted, the control plane records a
//! [`Correlation`] under the correlation id it stamped on the request it
//! forwarded. The response producer echoes that id on its `Begin`, and the
//! response side looks the correlation up exactly once to learn where the
//! response must be written.
//!
//! [`CorrelatableFrame`] abstracts over frame types that may carry a
//! correlation id, so logging and test tooling can inspect it without
//! matching on the concrete representation.

use std::{collections::HashMap, sync::Arc};

use dashmap::DashMap;

use crate::frame::{CorrelationId, Frame, StreamId};

/// Context needed to route a response back to its request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Correlation {
    /// Correlation id stamped on the outbound `Begin` so the requester can
    /// match the reply.
    pub id: CorrelationId,
    /// Routable name of the channel that carried the request.
    pub source: String,
    /// Request stream the response answers.
    pub source_id: StreamId,
}

/// Access correlation identifiers on frames.
pub trait CorrelatableFrame {
    /// Return the correlation identifier carried by this frame, if any.
    fn correlation_id(&self) -> Option<CorrelationId>;
}

impl CorrelatableFrame for Frame<'_> {
    fn correlation_id(&self) -> Option<CorrelationId> {
        match self {
            Frame::Begin(begin) => Some(begin.correlation_id),
            Frame::Data(_) | Frame::End(_) | Frame::Window(_) | Frame::Reset(_) => None,
        }
    }
}

/// Consumes correlations by id.
///
/// A missing entry is an expected outcome: the response stream is rejected.
pub trait Correlate {
    /// Remove and return the correlation stored under `id`.
    fn correlate(&mut self, id: CorrelationId) -> Option<Correlation>;
}

impl Correlate for HashMap<CorrelationId, Correlation> {
    fn correlate(&mut self, id: CorrelationId) -> Option<Correlation> { self.remove(&id) }
}

/// Concurrent correlation table shared with the control plane.
///
/// Clones share the same entries, so the control plane may insert from
/// another thread while a dispatch loop consumes them.
///
/// # Examples
///
/// ```
/// use wireframe_http::{
///     correlation::{Correlate, Correlation, CorrelationTable},
///     frame::{CorrelationId, StreamId},
/// };
///
/// let table = CorrelationTable::new();
/// let mut reader = table.clone();
/// table.insert(
///     CorrelationId(7),
///     Correlation {
///         id: CorrelationId(70),
///         source: "http".into(),
///         source_id: StreamId(1),
///     },
/// );
/// assert!(reader.correlate(CorrelationId(7)).is_some());
/// assert!(reader.correlate(CorrelationId(7)).is_none());
/// ```
#[derive(Clone, Debug, Default)]
pub struct CorrelationTable(Arc<DashMap<CorrelationId, Correlation>>);

impl CorrelationTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Record `correlation` under `id`, returning any entry it replaced.
    pub fn insert(&self, id: CorrelationId, correlation: Correlation) -> Option<Correlation> {
        self.0.insert(id, correlation)
    }

    /// Drop the entry for `id` without consuming it through [`Correlate`],
    /// typically when the request stream is torn down first.
    pub fn remove(&self, id: CorrelationId) -> Option<Correlation> {
        self.0.remove(&id).map(|(_, correlation)| correlation)
    }

    /// Returns `true` if an entry exists for `id`.
    #[must_use]
    pub fn contains(&self, id: CorrelationId) -> bool { self.0.contains_key(&id) }

    /// Number of pending correlations.
    #[must_use]
    pub fn len(&self) -> usize { self.0.len() }

    /// Returns `true` when no correlations are pending.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
}

impl Correlate for CorrelationTable {
    fn correlate(&mut self, id: CorrelationId) -> Option<Correlation> { self.remove(id) }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, thread};

    use rstest::rstest;

    use super::{CorrelatableFrame, Correlate, Correlation, CorrelationTable};
    use crate::frame::{BeginFrame, CorrelationId, EndFrame, Frame, StreamId};

    fn correlation(id: u64) -> Correlation {
        Correlation {
            id: CorrelationId(id),
            source: "source".into(),
            source_id: StreamId(id),
        }
    }

    #[rstest]
    fn correlations_are_consumed_once() {
        let mut table = CorrelationTable::new();
        table.insert(CorrelationId(1), correlation(10));
        assert_eq!(table.correlate(CorrelationId(1)), Some(correlation(10)));
        assert_eq!(table.correlate(CorrelationId(1)), None);
        assert!(table.is_empty());
    }

    #[rstest]
    fn inserts_from_another_thread_are_visible() {
        let mut table = CorrelationTable::new();
        let writer = table.clone();
        thread::spawn(move || {
            writer.insert(CorrelationId(2), correlation(20));
        })
        .join()
        .expect("writer thread");
        assert!(table.contains(CorrelationId(2)));
        assert_eq!(table.len(), 1);
        assert_eq!(table.correlate(CorrelationId(2)), Some(correlation(20)));
    }

    #[rstest]
    fn hash_map_consumes_entries() {
        let mut map = HashMap::from([(CorrelationId(3), correlation(30))]);
        assert!(map.correlate(CorrelationId(3)).is_some());
        assert!(map.is_empty());
    }

    #[rstest]
    fn only_begin_frames_carry_correlation() {
        let begin = Frame::Begin(BeginFrame {
            stream_id: StreamId(1),
            reference_id: 0,
            correlation_id: CorrelationId(9),
            extension: &[],
        });
        let end = Frame::End(EndFrame {
            stream_id: StreamId(1),
        });
        assert_eq!(begin.correlation_id(), Some(CorrelationId(9)));
        assert_eq!(end.correlation_id(), None);
    }
}
