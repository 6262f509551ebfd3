//! Positions and spans inside a versioned buffer.
//!
//! ## Learning: Partial Ordering
//!
//! A `SnapshotPoint` only has a meaningful order against points taken from
//! the same snapshot version. Implementing `PartialOrd` (and not `Ord`) lets
//! the compiler-facing API say exactly that: comparing points from two
//! versions yields `None`.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Monotonically increasing identifier of one buffer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Version(u64);

impl Version {
    /// The version of a freshly created buffer.
    pub const INITIAL: Version = Version(0);

    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    /// Returns the version that follows this one.
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Which neighbouring character a position leans toward.
///
/// At a delimiter boundary the caret sits *between* two characters;
/// `Successor` refers to the character at the offset, `Predecessor`
/// to the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Affinity {
    Predecessor,
    #[default]
    Successor,
}

/// An immutable `(version, offset)` pair into a versioned buffer.
///
/// Offsets are in characters, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SnapshotPoint {
    pub version: Version,
    pub offset: usize,
}

impl SnapshotPoint {
    pub const fn new(version: Version, offset: usize) -> Self {
        Self { version, offset }
    }
}

impl PartialOrd for SnapshotPoint {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.version != other.version {
            return None;
        }
        Some(self.offset.cmp(&other.offset))
    }
}

/// A half-open `[start, end)` range of character offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    /// Creates a span from its bounds, normalizing so `start <= end`.
    pub const fn from_bounds(start: usize, end: usize) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self { start: end, end: start }
        }
    }

    pub const fn with_len(start: usize, len: usize) -> Self {
        Self {
            start,
            end: start + len,
        }
    }

    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Returns true if `offset` lies inside the span (end excluded).
    pub const fn contains(&self, offset: usize) -> bool {
        offset >= self.start && offset < self.end
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// A span tied to the snapshot version it was computed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SnapshotSpan {
    pub version: Version,
    pub span: Span,
}

impl SnapshotSpan {
    pub const fn new(version: Version, span: Span) -> Self {
        Self { version, span }
    }
}

/// A position in the text buffer (line and column).
///
/// Both line and column are 0-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    /// Line number (0-indexed)
    pub line: usize,
    /// Column number (0-indexed, in characters not bytes)
    pub column: usize,
}

impl Position {
    /// Creates a new position.
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.line.cmp(&other.line) {
            Ordering::Equal => self.column.cmp(&other.column),
            other => other,
        }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Display as 1-indexed for user-facing output
        write!(f, "{}:{}", self.line + 1, self.column + 1)
    }
}

impl std::str::FromStr for Position {
    type Err = String;

    /// Parses the 1-indexed `LINE:COL` form produced by `Display`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (line, column) = s
            .split_once(':')
            .ok_or_else(|| format!("expected LINE:COL, got '{s}'"))?;
        let line: usize = line.trim().parse().map_err(|e| format!("bad line: {e}"))?;
        let column: usize = column
            .trim()
            .parse()
            .map_err(|e| format!("bad column: {e}"))?;
        if line == 0 || column == 0 {
            return Err("line and column are 1-indexed".to_string());
        }
        Ok(Position::new(line - 1, column - 1))
    }
}
