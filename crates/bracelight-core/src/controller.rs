//! Revision-guarded brace matching driven by caret and layout events.
//!
//! ## Flow
//!
//! ```text
//!  caret moved / text changed
//!            │
//!      new revision R
//!            │
//!   caret resolves? ──no──► publish empty
//!            │yes
//!   scan within viewport
//!     │          │            │
//!   match      absent     bound hit
//!     │          │            │
//!   publish   publish     clear tags, spawn unbounded scan(R)
//!   pair      empty             │
//!                         R still latest? ──no──► discard
//!                               │yes
//!                            publish
//! ```
//!
//! ## Learning: Cooperative Cancellation
//!
//! Nothing ever aborts a running scan. Each scan polls the shared
//! [`RevisionClock`] per character and returns early once a newer
//! revision exists; the publisher refuses stale writes as a second guard.

use std::any::Any;
use std::sync::Arc;

use bracelight_buffer::{Snapshot, SnapshotPoint, Version};
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::classify::ClassificationOracle;
use crate::delimiter::DelimiterTable;
use crate::event::TagsChanged;
use crate::matcher::{HighlightResult, PairOutcome, ScanContext, find_pair};
use crate::publisher::{MatchPhase, TagPublisher};
use crate::revision::{Revision, RevisionClock};
use crate::view::TextView;

/// What a single update did.
#[derive(Debug)]
pub enum UpdateOutcome {
    /// Resolved on the event thread; the result is now published.
    Published(HighlightResult),
    /// The caret could not be mapped into the current snapshot.
    Unresolved,
    /// Tags were cleared and an unbounded scan is running.
    Deferred(BackgroundScan),
    /// A newer revision took over before this one could publish.
    Superseded,
}

/// Final report of a background scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanReport {
    Published(HighlightResult),
    /// Superseded by a newer revision; nothing was written.
    Discarded,
    /// The scan panicked; the tags stay cleared.
    Failed,
}

/// Handle to an unbounded scan running off the event thread.
///
/// Dropping the handle does not stop the scan.
#[derive(Debug)]
pub struct BackgroundScan {
    revision: Revision,
    handle: JoinHandle<ScanReport>,
}

impl BackgroundScan {
    pub fn revision(&self) -> Revision {
        self.revision
    }

    /// Waits for the scan to finish.
    pub async fn wait(self) -> ScanReport {
        self.handle.await.unwrap_or(ScanReport::Failed)
    }
}

/// Highlights the delimiter pair adjacent to the caret.
pub struct BraceMatcher {
    view: Arc<dyn TextView>,
    oracle: Arc<dyn ClassificationOracle>,
    table: Arc<DelimiterTable>,
    clock: RevisionClock,
    publisher: Arc<TagPublisher>,
    runtime: Handle,
}

impl BraceMatcher {
    /// Creates a matcher. Background scans are spawned on `runtime`.
    pub fn new(
        view: Arc<dyn TextView>,
        oracle: Arc<dyn ClassificationOracle>,
        table: DelimiterTable,
        runtime: Handle,
    ) -> Self {
        let clock = RevisionClock::new();
        Self {
            view,
            oracle,
            table: Arc::new(table),
            publisher: Arc::new(TagPublisher::new(clock.clone())),
            clock,
            runtime,
        }
    }

    /// The currently published highlight.
    pub fn tags(&self) -> HighlightResult {
        self.publisher.tags()
    }

    pub fn phase(&self) -> MatchPhase {
        self.publisher.phase()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TagsChanged> {
        self.publisher.subscribe()
    }

    pub fn delimiters(&self) -> &DelimiterTable {
        &self.table
    }

    /// Handles a caret move.
    pub fn on_caret_moved(&self, caret: SnapshotPoint) -> UpdateOutcome {
        self.update_at_caret(caret)
    }

    /// Handles a layout change; only a new snapshot version triggers work.
    pub fn on_layout_changed(&self, old: Version, new: Version) -> Option<UpdateOutcome> {
        if old == new {
            return None;
        }
        Some(self.update_at_caret(self.view.caret()))
    }

    /// Recomputes the highlight for `caret` under a fresh revision.
    pub fn update_at_caret(&self, caret: SnapshotPoint) -> UpdateOutcome {
        let revision = self.clock.advance();
        let snapshot = self.view.snapshot();
        let full = snapshot.full_span();

        let Some(offset) = resolve(&snapshot, caret) else {
            tracing::trace!(%revision, caret = caret.offset, "caret unresolved");
            return if self.publisher.try_publish(revision, HighlightResult::EMPTY, full) {
                UpdateOutcome::Unresolved
            } else {
                UpdateOutcome::Superseded
            };
        };

        if !self.publisher.try_begin(revision) {
            return UpdateOutcome::Superseded;
        }

        let max_lines = self.view.visible_line_count().max(1);
        let cx = ScanContext {
            snapshot: &snapshot,
            oracle: self.oracle.as_ref(),
            clock: &self.clock,
        };

        match find_pair(&cx, &self.table, revision, offset, max_lines) {
            PairOutcome::Resolved(result) => {
                if self.publisher.try_publish(revision, result, full) {
                    UpdateOutcome::Published(result)
                } else {
                    UpdateOutcome::Superseded
                }
            }
            PairOutcome::BoundExceeded => {
                if !self.publisher.try_defer(revision, full) {
                    return UpdateOutcome::Superseded;
                }
                tracing::debug!(%revision, max_lines, "match beyond viewport, deferring");
                UpdateOutcome::Deferred(self.queue_background(revision, snapshot, offset))
            }
            PairOutcome::Cancelled => UpdateOutcome::Superseded,
        }
    }

    fn queue_background(&self, revision: Revision, snapshot: Snapshot, caret: usize) -> BackgroundScan {
        let oracle = Arc::clone(&self.oracle);
        let table = Arc::clone(&self.table);
        let clock = self.clock.clone();
        let publisher = Arc::clone(&self.publisher);

        let work = self.runtime.spawn_blocking(move || {
            let cx = ScanContext {
                snapshot: &snapshot,
                oracle: oracle.as_ref(),
                clock: &clock,
            };
            match find_pair(&cx, &table, revision, caret, 0) {
                PairOutcome::Resolved(result)
                    if publisher.try_publish(revision, result, snapshot.full_span()) =>
                {
                    ScanReport::Published(result)
                }
                _ => ScanReport::Discarded,
            }
        });

        let handle = self.runtime.spawn(async move {
            match work.await {
                Ok(report) => {
                    tracing::trace!(%revision, ?report, "background scan finished");
                    report
                }
                Err(err) => {
                    if err.is_panic() {
                        let message = panic_message(err.into_panic());
                        tracing::warn!(%revision, %message, "background scan panicked");
                    } else {
                        tracing::warn!(%revision, "background scan cancelled by runtime");
                    }
                    ScanReport::Failed
                }
            }
        });

        BackgroundScan { revision, handle }
    }
}

/// Maps the caret into `snapshot`, if it was placed against that version.
fn resolve(snapshot: &Snapshot, caret: SnapshotPoint) -> Option<usize> {
    (caret.version == snapshot.version() && caret.offset <= snapshot.len_chars()).then_some(caret.offset)
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
