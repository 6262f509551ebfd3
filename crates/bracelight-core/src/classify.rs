//! The classification oracle the matcher consults.
//!
//! The matcher never lexes text itself. It asks an oracle whether a
//! position lies inside a comment or a string literal and skips those
//! characters entirely.

use bracelight_buffer::{Affinity, Snapshot};

/// Answers whether a position lies inside a comment or literal.
///
/// Implementations must be cheap to call once per scanned character and
/// safe to share with background scans.
pub trait ClassificationOracle: Send + Sync {
    /// `Affinity::Successor` asks about the character at `offset`,
    /// `Affinity::Predecessor` about the character before it.
    fn is_comment_or_literal(&self, snapshot: &Snapshot, offset: usize, affinity: Affinity) -> bool;
}

/// Oracle for unclassified text: nothing is a comment or literal.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainText;

impl ClassificationOracle for PlainText {
    fn is_comment_or_literal(&self, _snapshot: &Snapshot, _offset: usize, _affinity: Affinity) -> bool {
        false
    }
}

impl<F> ClassificationOracle for F
where
    F: Fn(&Snapshot, usize, Affinity) -> bool + Send + Sync,
{
    fn is_comment_or_literal(&self, snapshot: &Snapshot, offset: usize, affinity: Affinity) -> bool {
        self(snapshot, offset, affinity)
    }
}

/// Resolves an affinity to the character offset it refers to.
///
/// Returns `None` for `Predecessor` at offset 0.
pub fn affine_offset(offset: usize, affinity: Affinity) -> Option<usize> {
    match affinity {
        Affinity::Successor => Some(offset),
        Affinity::Predecessor => offset.checked_sub(1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_never_classifies() {
        let snapshot = Snapshot::from_text("// (");
        assert!(!PlainText.is_comment_or_literal(&snapshot, 3, Affinity::Successor));
    }

    #[test]
    fn test_closure_oracle() {
        let oracle = |_: &Snapshot, offset: usize, _: Affinity| offset >= 2;
        let snapshot = Snapshot::from_text("a // b");
        assert!(!oracle.is_comment_or_literal(&snapshot, 0, Affinity::Successor));
        assert!(oracle.is_comment_or_literal(&snapshot, 4, Affinity::Successor));
    }

    #[test]
    fn test_affine_offset() {
        assert_eq!(affine_offset(4, Affinity::Successor), Some(4));
        assert_eq!(affine_offset(4, Affinity::Predecessor), Some(3));
        assert_eq!(affine_offset(0, Affinity::Predecessor), None);
    }
}
