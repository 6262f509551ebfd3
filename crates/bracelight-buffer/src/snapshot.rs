//! Immutable views of a buffer at one version.
//!
//! ## Learning: Cheap Clones
//!
//! `ropey::Rope` shares its chunks behind reference counts, so cloning a
//! rope is O(1). A `Snapshot` is just a version number plus such a clone,
//! which makes it safe to hand to a background thread while the live
//! buffer keeps changing.

use ropey::Rope;
use std::borrow::Cow;

use crate::{BufferError, BufferResult, Position, SnapshotPoint, SnapshotSpan, Span, Version};

/// An immutable view of text content at one version.
#[derive(Debug, Clone)]
pub struct Snapshot {
    version: Version,
    rope: Rope,
}

/// Geometry of a single line inside a snapshot.
///
/// `len` excludes the line break, matching what a caret can sit on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotLine {
    /// Line number (0-indexed)
    pub number: usize,
    /// Character offset of the first character on the line
    pub start: usize,
    /// Length in characters, excluding the line break
    pub len: usize,
}

impl SnapshotLine {
    /// Offset one past the last non-break character.
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

impl Snapshot {
    pub(crate) fn new(version: Version, rope: Rope) -> Self {
        Self { version, rope }
    }

    /// Builds a standalone snapshot from text, at the initial version.
    pub fn from_text(text: &str) -> Self {
        Self::new(Version::INITIAL, Rope::from_str(text))
    }

    #[inline]
    pub fn version(&self) -> Version {
        self.version
    }

    /// Number of characters in the snapshot.
    #[inline]
    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }

    /// Number of lines. An empty snapshot has 1 line.
    #[inline]
    pub fn len_lines(&self) -> usize {
        self.rope.len_lines()
    }

    /// The whole snapshot text.
    pub fn text(&self) -> Cow<'_, str> {
        self.rope.slice(..).into()
    }

    /// Returns the character at `offset`, or `None` past the end.
    pub fn char_at(&self, offset: usize) -> Option<char> {
        (offset < self.rope.len_chars()).then(|| self.rope.char(offset))
    }

    /// Looks up a line by number in O(log n).
    pub fn line(&self, number: usize) -> BufferResult<SnapshotLine> {
        if number >= self.len_lines() {
            return Err(BufferError::PositionOutOfBounds {
                line: number,
                column: 0,
            });
        }
        let start = self.rope.line_to_char(number);
        let len = content_len(self.rope.line(number));
        Ok(SnapshotLine { number, start, len })
    }

    /// Returns the line containing `offset`.
    ///
    /// `offset == len_chars()` is accepted and resolves to the last line.
    pub fn line_at(&self, offset: usize) -> BufferResult<SnapshotLine> {
        if offset > self.len_chars() {
            return Err(BufferError::InvalidCharIndex(offset));
        }
        self.line(self.rope.char_to_line(offset))
    }

    /// Text of a line, without its line break.
    pub fn line_text(&self, line: &SnapshotLine) -> Cow<'_, str> {
        self.rope.slice(line.start..line.end()).into()
    }

    /// Creates a validated point into this snapshot.
    pub fn point(&self, offset: usize) -> BufferResult<SnapshotPoint> {
        if offset > self.len_chars() {
            return Err(BufferError::InvalidCharIndex(offset));
        }
        Ok(SnapshotPoint::new(self.version, offset))
    }

    /// The span covering the entire snapshot.
    pub fn full_span(&self) -> SnapshotSpan {
        SnapshotSpan::new(self.version, Span::with_len(0, self.len_chars()))
    }

    /// Converts a line/column position into a character offset.
    pub fn position_to_offset(&self, pos: Position) -> BufferResult<usize> {
        let line = self.line(pos.line).map_err(|_| BufferError::PositionOutOfBounds {
            line: pos.line,
            column: pos.column,
        })?;

        // Allow column to be at end of line
        if pos.column > line.len {
            return Err(BufferError::PositionOutOfBounds {
                line: pos.line,
                column: pos.column,
            });
        }
        Ok(line.start + pos.column)
    }

    /// Converts a character offset into a line/column position.
    pub fn offset_to_position(&self, offset: usize) -> BufferResult<Position> {
        let line = self.line_at(offset)?;
        Ok(Position::new(line.number, offset - line.start))
    }

    /// Character offset to UTF-8 byte offset.
    pub fn char_to_byte(&self, offset: usize) -> BufferResult<usize> {
        if offset > self.len_chars() {
            return Err(BufferError::InvalidCharIndex(offset));
        }
        Ok(self.rope.char_to_byte(offset))
    }

    /// UTF-8 byte offset to character offset.
    pub fn byte_to_char(&self, byte: usize) -> BufferResult<usize> {
        if byte > self.rope.len_bytes() {
            return Err(BufferError::InvalidByteIndex(byte));
        }
        Ok(self.rope.byte_to_char(byte))
    }
}

/// Length of a rope line once its trailing line break is removed.
fn content_len(line: ropey::RopeSlice<'_>) -> usize {
    let mut len = line.len_chars();
    if len > 0 && is_line_break(line.char(len - 1)) {
        let last = line.char(len - 1);
        len -= 1;
        if last == '\n' && len > 0 && line.char(len - 1) == '\r' {
            len -= 1;
        }
    }
    len
}

fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\u{000B}' | '\u{000C}' | '\u{0085}' | '\u{2028}' | '\u{2029}'
    )
}
