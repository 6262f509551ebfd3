//! # Bracelight Buffer
//!
//! Versioned text buffer using rope data structure.
//!
//! ## Key Concepts for Learning Rust
//!
//! ### Ownership & Borrowing
//! - `TextBuffer` owns the live rope and mutates it through `&mut self`
//! - `Snapshot` owns a cheap clone of the rope and never changes
//! - Background work borrows nothing from the live buffer, it owns a snapshot
//!
//! ### Versions
//! - Every edit bumps the buffer's `Version`
//! - Points and spans carry the version they were computed against

mod buffer;
mod point;
mod snapshot;

pub use buffer::TextBuffer;
pub use point::{Affinity, Position, SnapshotPoint, SnapshotSpan, Span, Version};
pub use snapshot::{Snapshot, SnapshotLine};

/// Result type for buffer operations
pub type BufferResult<T> = Result<T, BufferError>;

/// Errors that can occur during buffer operations
#[derive(Debug, thiserror::Error)]
pub enum BufferError {
    #[error("Position {line}:{column} is out of bounds")]
    PositionOutOfBounds { line: usize, column: usize },

    #[error("Invalid byte index: {0}")]
    InvalidByteIndex(usize),

    #[error("Invalid character index: {0}")]
    InvalidCharIndex(usize),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_creation() {
        let buffer = TextBuffer::new();
        assert!(buffer.is_empty());
        assert_eq!(buffer.len_chars(), 0);
        assert_eq!(buffer.version(), Version::INITIAL);
    }

    #[test]
    fn test_buffer_from_string() {
        let buffer = TextBuffer::from("Hello, World!");
        assert_eq!(buffer.len_chars(), 13);
        assert_eq!(buffer.text(), "Hello, World!");
    }

    #[test]
    fn test_edits_bump_version() {
        let mut buffer = TextBuffer::new();
        let v1 = buffer.insert(0, "Hello").unwrap();
        let v2 = buffer.insert(5, ", World!").unwrap();
        assert!(v2 > v1);

        buffer.delete(5..7).unwrap();
        assert_eq!(buffer.text(), "HelloWorld!");
        assert_eq!(buffer.version(), Version::new(3));

        buffer.replace(0..5, "Howdy").unwrap();
        assert_eq!(buffer.text(), "HowdyWorld!");
        assert_eq!(buffer.version(), Version::new(4));
    }

    #[test]
    fn test_failed_edit_keeps_version() {
        let mut buffer = TextBuffer::from("abc");
        assert!(buffer.insert(10, "x").is_err());
        assert!(buffer.delete(2..9).is_err());
        assert_eq!(buffer.version(), Version::INITIAL);
    }

    #[test]
    fn test_snapshot_is_isolated_from_later_edits() {
        let mut buffer = TextBuffer::from("(a)");
        let snapshot = buffer.snapshot();
        buffer.insert(0, "xx").unwrap();

        assert_eq!(snapshot.text(), "(a)");
        assert_eq!(snapshot.version(), Version::INITIAL);
        assert_eq!(buffer.snapshot().text(), "xx(a)");
    }

    #[test]
    fn test_line_operations() {
        let snapshot = TextBuffer::from("Line 1\nLine 2\nLine 3").snapshot();
        assert_eq!(snapshot.len_lines(), 3);
        let line = snapshot.line(1).unwrap();
        assert_eq!(snapshot.line_text(&line), "Line 2");
    }
}
