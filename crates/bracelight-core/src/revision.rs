//! Revision stamps for match requests.
//!
//! Every caret or layout change allocates a new revision. Work stamped
//! with an older revision is stale: scans poll the clock and stop early,
//! and publishers refuse to store their results.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identifies one match request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Revision(u64);

impl Revision {
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for Revision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// Shared, monotonically increasing revision counter.
///
/// Clones share the same counter.
#[derive(Debug, Default, Clone)]
pub struct RevisionClock {
    latest: Arc<AtomicU64>,
}

impl RevisionClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a revision strictly greater than every earlier one.
    pub fn advance(&self) -> Revision {
        Revision(self.latest.fetch_add(1, Ordering::AcqRel) + 1)
    }

    /// The most recently issued revision.
    pub fn latest(&self) -> Revision {
        Revision(self.latest.load(Ordering::Acquire))
    }

    #[inline]
    pub fn is_current(&self, revision: Revision) -> bool {
        self.latest.load(Ordering::Acquire) == revision.0
    }
}
