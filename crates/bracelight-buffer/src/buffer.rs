//! Live text buffer using rope data structure.
//!
//! ## Why Rope?
//!
//! Traditional text editors use gap buffers or arrays, but ropes excel at:
//! - **Large files**: O(log n) insertions/deletions vs O(n) for arrays
//! - **Line lookup**: O(log n) line-to-offset conversion
//! - **Snapshots**: Cloning shares the underlying chunks
//!
//! ## Learning: Ownership in Action
//!
//! ```rust,ignore
//! let mut buffer = TextBuffer::from("fn f() {}");
//! let snapshot = buffer.snapshot();   // snapshot OWNS a cheap rope clone
//! buffer.insert(0, "pub ")?;           // the live buffer moves on
//! assert_ne!(snapshot.version(), buffer.version());
//! ```

use ropey::Rope;
use std::ops::Range;
use std::path::Path;

use crate::{BufferError, BufferResult, Snapshot, Version};

/// A mutable text buffer whose every edit produces a new version.
///
/// # Thread Safety
///
/// `TextBuffer` is `Send` but is mutated through `&mut self`. Readers on
/// other threads should work from a [`Snapshot`] instead.
#[derive(Debug, Clone)]
pub struct TextBuffer {
    /// The rope holding our text content
    rope: Rope,

    /// Bumped on every successful mutation
    version: Version,
}

impl TextBuffer {
    /// Creates a new empty buffer.
    ///
    /// # Example
    /// ```
    /// use bracelight_buffer::TextBuffer;
    ///
    /// let buffer = TextBuffer::new();
    /// assert!(buffer.is_empty());
    /// ```
    pub fn new() -> Self {
        Self {
            rope: Rope::new(),
            version: Version::INITIAL,
        }
    }

    /// Loads a buffer from a file.
    pub fn from_file(path: impl AsRef<Path>) -> BufferResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Ok(Self::from(content))
    }

    /// Captures an immutable view of the current text.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::new(self.version, self.rope.clone())
    }

    #[inline]
    pub fn version(&self) -> Version {
        self.version
    }

    /// Returns the entire text content.
    #[inline]
    pub fn text(&self) -> std::borrow::Cow<'_, str> {
        self.rope.slice(..).into()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }

    /// Returns the number of characters in the buffer.
    #[inline]
    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    /// Returns the number of lines in the buffer.
    #[inline]
    pub fn len_lines(&self) -> usize {
        self.rope.len_lines()
    }

    // ==================== Mutations ====================

    /// Inserts text at a character index.
    pub fn insert(&mut self, char_idx: usize, text: &str) -> BufferResult<Version> {
        if char_idx > self.len_chars() {
            return Err(BufferError::InvalidCharIndex(char_idx));
        }
        self.rope.insert(char_idx, text);
        Ok(self.bump())
    }

    /// Deletes text in a character range, returning the removed text.
    pub fn delete(&mut self, range: Range<usize>) -> BufferResult<String> {
        if range.start > range.end || range.end > self.len_chars() {
            return Err(BufferError::InvalidCharIndex(range.end));
        }
        let deleted: String = self.rope.slice(range.clone()).into();
        self.rope.remove(range);
        self.bump();
        Ok(deleted)
    }

    /// Replaces text in a range with new text as a single version step.
    pub fn replace(&mut self, range: Range<usize>, text: &str) -> BufferResult<String> {
        if range.start > range.end || range.end > self.len_chars() {
            return Err(BufferError::InvalidCharIndex(range.end));
        }
        let deleted: String = self.rope.slice(range.clone()).into();
        self.rope.remove(range.clone());
        self.rope.insert(range.start, text);
        self.bump();
        Ok(deleted)
    }

    fn bump(&mut self) -> Version {
        self.version = self.version.next();
        self.version
    }
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for TextBuffer {
    fn from(s: &str) -> Self {
        Self {
            rope: Rope::from_str(s),
            version: Version::INITIAL,
        }
    }
}

impl From<String> for TextBuffer {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}
