//! Forward and backward delimiter scans.
//!
//! ## Algorithm
//!
//! Both scans walk the snapshot one line at a time, keeping a nesting
//! depth. Scanning forward from an opener, every unclassified opener
//! raises the depth and every unclassified closer either lowers it or,
//! at depth zero, is the match. The backward scan mirrors this with the
//! roles swapped. Characters the oracle reports as comment or literal
//! never touch the depth.
//!
//! ```text
//!   ( ( ) )        scan_forward from 0
//!   0 1 2 3
//!     +1 -1 match  -> 3
//! ```
//!
//! A nonzero `max_lines` stops the walk that many lines past the start.
//! Running into that bound is reported separately from reaching the end
//! of the buffer, because only the latter proves the match is absent.

use bracelight_buffer::{Affinity, Snapshot, SnapshotLine, SnapshotSpan, Span};

use crate::classify::ClassificationOracle;
use crate::delimiter::DelimiterTable;
use crate::revision::{Revision, RevisionClock};

/// Result of a single directional scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// The matching delimiter, as a one-character span.
    Found(SnapshotSpan),
    /// The scan reached the buffer edge without a match.
    Absent,
    /// The line bound was reached before the buffer edge.
    BoundExceeded,
    /// The request was superseded mid-scan.
    Cancelled,
}

/// Parameters of one directional scan.
#[derive(Debug, Clone, Copy)]
pub struct ScanRequest {
    pub revision: Revision,
    /// Offset of the delimiter the scan starts from.
    pub start: usize,
    pub open: char,
    pub close: char,
    /// Maximum number of lines to cross; 0 means unbounded.
    pub max_lines: usize,
}

/// Shared inputs of a scan: what to read, who to ask, when to stop.
pub struct ScanContext<'a> {
    pub snapshot: &'a Snapshot,
    pub oracle: &'a dyn ClassificationOracle,
    pub clock: &'a RevisionClock,
}

impl ScanContext<'_> {
    fn is_skipped(&self, offset: usize) -> bool {
        self.oracle
            .is_comment_or_literal(self.snapshot, offset, Affinity::Successor)
    }

    fn line_chars(&self, line: &SnapshotLine) -> Vec<char> {
        self.snapshot.line_text(line).chars().collect()
    }
}

/// Searches forward from the opener at `request.start` for its closer.
pub fn scan_forward(cx: &ScanContext<'_>, request: &ScanRequest) -> ScanOutcome {
    let snapshot = cx.snapshot;
    let Ok(mut line) = snapshot.line_at(request.start) else {
        return ScanOutcome::Absent;
    };

    let last_line = snapshot.len_lines() - 1;
    let stop_line = if request.max_lines > 0 {
        last_line.min(line.number.saturating_add(request.max_lines))
    } else {
        last_line
    };

    let mut chars = cx.line_chars(&line);
    let mut column = request.start - line.start + 1;
    let mut depth = 0usize;

    loop {
        while column < chars.len() {
            if !cx.clock.is_current(request.revision) {
                return ScanOutcome::Cancelled;
            }

            let c = chars[column];
            let offset = line.start + column;
            if c == request.close && !cx.is_skipped(offset) {
                if depth == 0 {
                    return ScanOutcome::Found(SnapshotSpan::new(
                        snapshot.version(),
                        Span::with_len(offset, 1),
                    ));
                }
                depth -= 1;
            } else if c == request.open && !cx.is_skipped(offset) {
                depth += 1;
            }
            column += 1;
        }

        if line.number >= stop_line {
            return if stop_line < last_line {
                ScanOutcome::BoundExceeded
            } else {
                ScanOutcome::Absent
            };
        }
        if !cx.clock.is_current(request.revision) {
            return ScanOutcome::Cancelled;
        }

        line = match snapshot.line(line.number + 1) {
            Ok(next) => next,
            Err(_) => return ScanOutcome::Absent,
        };
        chars = cx.line_chars(&line);
        column = 0;
    }
}

/// Searches backward from the closer at `request.start` for its opener.
pub fn scan_backward(cx: &ScanContext<'_>, request: &ScanRequest) -> ScanOutcome {
    let snapshot = cx.snapshot;
    let Ok(mut line) = snapshot.line_at(request.start) else {
        return ScanOutcome::Absent;
    };

    // The closer is the first character on its line: continue from the
    // end of the previous one.
    let mut column = request.start - line.start;
    if column == 0 {
        if line.number == 0 {
            return ScanOutcome::Absent;
        }
        line = match snapshot.line(line.number - 1) {
            Ok(prev) => prev,
            Err(_) => return ScanOutcome::Absent,
        };
        column = line.len;
    }

    let stop_line = if request.max_lines > 0 {
        line.number.saturating_sub(request.max_lines)
    } else {
        0
    };

    let mut chars = cx.line_chars(&line);
    // A start on the line break itself scans the line's content.
    column = column.min(chars.len());
    let mut depth = 0usize;

    loop {
        while column > 0 {
            column -= 1;
            if !cx.clock.is_current(request.revision) {
                return ScanOutcome::Cancelled;
            }

            let c = chars[column];
            let offset = line.start + column;
            if c == request.open && !cx.is_skipped(offset) {
                if depth == 0 {
                    return ScanOutcome::Found(SnapshotSpan::new(
                        snapshot.version(),
                        Span::with_len(offset, 1),
                    ));
                }
                depth -= 1;
            } else if c == request.close && !cx.is_skipped(offset) {
                depth += 1;
            }
        }

        if line.number <= stop_line {
            return if stop_line > 0 {
                ScanOutcome::BoundExceeded
            } else {
                ScanOutcome::Absent
            };
        }
        if !cx.clock.is_current(request.revision) {
            return ScanOutcome::Cancelled;
        }

        line = match snapshot.line(line.number - 1) {
            Ok(prev) => prev,
            Err(_) => return ScanOutcome::Absent,
        };
        chars = cx.line_chars(&line);
        column = chars.len();
    }
}

/// A delimiter next to the caret together with its partner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BraceHighlight {
    /// The delimiter adjacent to the caret.
    pub delimiter: SnapshotSpan,
    /// Its matching partner.
    pub matched: SnapshotSpan,
}

/// Zero or two highlight spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HighlightResult {
    pair: Option<BraceHighlight>,
}

impl HighlightResult {
    pub const EMPTY: HighlightResult = HighlightResult { pair: None };

    pub fn pair(delimiter: SnapshotSpan, matched: SnapshotSpan) -> Self {
        Self {
            pair: Some(BraceHighlight { delimiter, matched }),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pair.is_none()
    }

    pub fn highlight(&self) -> Option<&BraceHighlight> {
        self.pair.as_ref()
    }

    /// The delimiter span followed by its match, or nothing.
    pub fn spans(&self) -> impl Iterator<Item = SnapshotSpan> + '_ {
        self.pair
            .iter()
            .flat_map(|pair| [pair.delimiter, pair.matched])
    }
}

/// Outcome of looking for a pair around the caret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairOutcome {
    /// The question is settled: a pair, or provably nothing to show.
    Resolved(HighlightResult),
    /// A delimiter is adjacent but its partner lies past the line bound.
    BoundExceeded,
    Cancelled,
}

/// Finds the pair adjacent to the caret at `caret`.
///
/// An opener *at* the caret wins over a closer just *before* it. Both
/// are ignored when the oracle classifies them as comment or literal.
pub fn find_pair(
    cx: &ScanContext<'_>,
    table: &DelimiterTable,
    revision: Revision,
    caret: usize,
    max_lines: usize,
) -> PairOutcome {
    if let Some((open, close)) = opener_at(cx, table, caret) {
        let request = ScanRequest {
            revision,
            start: caret,
            open,
            close,
            max_lines,
        };
        return settle(cx.snapshot, caret, scan_forward(cx, &request));
    }

    if let Some((before, open, close)) = closer_before(cx, table, caret) {
        let request = ScanRequest {
            revision,
            start: before,
            open,
            close,
            max_lines,
        };
        return settle(cx.snapshot, before, scan_backward(cx, &request));
    }

    PairOutcome::Resolved(HighlightResult::EMPTY)
}

/// The `(open, close)` pair whose unclassified opener sits at `caret`.
fn opener_at(cx: &ScanContext<'_>, table: &DelimiterTable, caret: usize) -> Option<(char, char)> {
    let open = cx.snapshot.char_at(caret).filter(|&c| table.is_open(c))?;
    if cx
        .oracle
        .is_comment_or_literal(cx.snapshot, caret, Affinity::Successor)
    {
        return None;
    }
    let close = table.close_of(open).ok()?;
    Some((open, close))
}

/// Offset and pair of an unclassified closer immediately before `caret`.
fn closer_before(
    cx: &ScanContext<'_>,
    table: &DelimiterTable,
    caret: usize,
) -> Option<(usize, char, char)> {
    let before = caret.checked_sub(1)?;
    let close = cx.snapshot.char_at(before).filter(|&c| table.is_close(c))?;
    if cx
        .oracle
        .is_comment_or_literal(cx.snapshot, caret, Affinity::Predecessor)
    {
        return None;
    }
    let open = table.open_of(close).ok()?;
    Some((before, open, close))
}

fn settle(snapshot: &Snapshot, at: usize, outcome: ScanOutcome) -> PairOutcome {
    let delimiter = SnapshotSpan::new(snapshot.version(), Span::with_len(at, 1));
    match outcome {
        ScanOutcome::Found(matched) => PairOutcome::Resolved(HighlightResult::pair(delimiter, matched)),
        ScanOutcome::Absent => PairOutcome::Resolved(HighlightResult::EMPTY),
        ScanOutcome::BoundExceeded => PairOutcome::BoundExceeded,
        ScanOutcome::Cancelled => PairOutcome::Cancelled,
    }
}
