//! Holder of the latest published highlight.
//!
//! Every write is revision-checked under one lock, so a scan that
//! finishes after a newer request was issued can never overwrite the
//! newer state. Readers take the same lock briefly and copy the result.

use bracelight_buffer::SnapshotSpan;
use parking_lot::Mutex;
use tokio::sync::broadcast;

use crate::event::{EventBus, TagsChanged};
use crate::matcher::HighlightResult;
use crate::revision::{Revision, RevisionClock};

/// Where the controller is for the latest revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchPhase {
    /// No request handled yet.
    #[default]
    Idle,
    /// Searching within the viewport on the event thread.
    SynchronousScan,
    /// Results cleared; an unbounded scan is running in the background.
    AsynchronousScan,
    /// A result (possibly empty) is published for the latest revision.
    Published,
}

#[derive(Debug, Default)]
struct Published {
    result: HighlightResult,
    phase: MatchPhase,
}

/// Publishes highlight results and notifies subscribers.
pub struct TagPublisher {
    clock: RevisionClock,
    state: Mutex<Published>,
    events: EventBus<TagsChanged>,
}

impl TagPublisher {
    pub fn new(clock: RevisionClock) -> Self {
        Self {
            clock,
            state: Mutex::new(Published::default()),
            events: EventBus::new(),
        }
    }

    /// The last published result.
    pub fn tags(&self) -> HighlightResult {
        self.state.lock().result
    }

    pub fn phase(&self) -> MatchPhase {
        self.state.lock().phase
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TagsChanged> {
        self.events.subscribe()
    }

    /// Stores `result` if `revision` is still the latest, then notifies.
    pub fn try_publish(&self, revision: Revision, result: HighlightResult, changed: SnapshotSpan) -> bool {
        if !self.apply(revision, result, MatchPhase::Published) {
            return false;
        }
        tracing::debug!(%revision, empty = result.is_empty(), "tags published");
        self.events.emit(TagsChanged { span: changed });
        true
    }

    /// Clears the result ahead of a background scan for `revision`.
    pub fn try_defer(&self, revision: Revision, changed: SnapshotSpan) -> bool {
        if !self.apply(revision, HighlightResult::EMPTY, MatchPhase::AsynchronousScan) {
            return false;
        }
        tracing::trace!(%revision, "tags cleared, scan deferred");
        self.events.emit(TagsChanged { span: changed });
        true
    }

    /// Marks the start of the synchronous pass; leaves the result alone.
    pub fn try_begin(&self, revision: Revision) -> bool {
        let mut state = self.state.lock();
        if !self.clock.is_current(revision) {
            return false;
        }
        state.phase = MatchPhase::SynchronousScan;
        true
    }

    fn apply(&self, revision: Revision, result: HighlightResult, phase: MatchPhase) -> bool {
        let mut state = self.state.lock();
        if !self.clock.is_current(revision) {
            tracing::trace!(%revision, latest = %self.clock.latest(), "stale result dropped");
            return false;
        }
        state.result = result;
        state.phase = phase;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bracelight_buffer::{Snapshot, SnapshotSpan, Span, Version};

    fn span(at: usize) -> SnapshotSpan {
        SnapshotSpan::new(Version::INITIAL, Span::with_len(at, 1))
    }

    #[test]
    fn test_publish_current_revision() {
        let clock = RevisionClock::new();
        let publisher = TagPublisher::new(clock.clone());
        let mut rx = publisher.subscribe();
        let full = Snapshot::from_text("()").full_span();

        let rev = clock.advance();
        let result = HighlightResult::pair(span(0), span(1));
        assert!(publisher.try_publish(rev, result, full));
        assert_eq!(publisher.tags(), result);
        assert_eq!(publisher.phase(), MatchPhase::Published);
        assert_eq!(rx.try_recv().unwrap(), TagsChanged { span: full });
    }

    #[test]
    fn test_stale_revision_is_refused() {
        let clock = RevisionClock::new();
        let publisher = TagPublisher::new(clock.clone());
        let mut rx = publisher.subscribe();
        let full = Snapshot::from_text("()").full_span();

        let stale = clock.advance();
        let current = clock.advance();
        assert!(!publisher.try_publish(stale, HighlightResult::pair(span(0), span(1)), full));
        assert!(!publisher.try_defer(stale, full));
        assert!(!publisher.try_begin(stale));
        assert!(publisher.tags().is_empty());
        assert_eq!(publisher.phase(), MatchPhase::Idle);
        assert!(rx.try_recv().is_err());

        assert!(publisher.try_begin(current));
        assert_eq!(publisher.phase(), MatchPhase::SynchronousScan);
    }

    #[test]
    fn test_defer_clears_previous_result() {
        let clock = RevisionClock::new();
        let publisher = TagPublisher::new(clock.clone());
        let full = Snapshot::from_text("()").full_span();

        let first = clock.advance();
        publisher.try_publish(first, HighlightResult::pair(span(0), span(1)), full);

        let second = clock.advance();
        assert!(publisher.try_defer(second, full));
        assert!(publisher.tags().is_empty());
        assert_eq!(publisher.phase(), MatchPhase::AsynchronousScan);
    }
}
