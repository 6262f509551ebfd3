//! The host view the controller reads from.
//!
//! A real host (an editor widget) implements [`TextView`]; [`MemoryView`]
//! is a self-contained implementation over a [`TextBuffer`] used by the
//! command line and the tests.

use bracelight_buffer::{BufferResult, Snapshot, SnapshotPoint, TextBuffer, Version};
use parking_lot::RwLock;
use std::ops::Range;

/// What the controller needs from the host.
pub trait TextView: Send + Sync {
    /// The current text snapshot.
    fn snapshot(&self) -> Snapshot;

    /// The caret, stamped with the version it was placed against.
    fn caret(&self) -> SnapshotPoint;

    /// Number of lines currently on screen; bounds the synchronous scan.
    fn visible_line_count(&self) -> usize;
}

#[derive(Debug)]
struct ViewState {
    buffer: TextBuffer,
    caret: usize,
    visible_lines: usize,
}

/// A text view held entirely in memory.
///
/// Edits shift the caret like an editor would: text inserted at or
/// before the caret pushes it right, deleted text pulls it left.
#[derive(Debug)]
pub struct MemoryView {
    state: RwLock<ViewState>,
}

impl MemoryView {
    pub fn new(buffer: TextBuffer, visible_lines: usize) -> Self {
        Self {
            state: RwLock::new(ViewState {
                buffer,
                caret: 0,
                visible_lines,
            }),
        }
    }

    /// Moves the caret, returning the resolved point.
    pub fn set_caret(&self, offset: usize) -> BufferResult<SnapshotPoint> {
        let mut state = self.state.write();
        let point = state.buffer.snapshot().point(offset)?;
        state.caret = offset;
        Ok(point)
    }

    pub fn set_visible_lines(&self, lines: usize) {
        self.state.write().visible_lines = lines;
    }

    pub fn version(&self) -> Version {
        self.state.read().buffer.version()
    }

    /// Inserts text, shifting the caret when the insertion is at or before it.
    pub fn insert(&self, offset: usize, text: &str) -> BufferResult<Version> {
        let mut state = self.state.write();
        let version = state.buffer.insert(offset, text)?;
        if offset <= state.caret {
            state.caret += text.chars().count();
        }
        Ok(version)
    }

    /// Deletes a range, pulling the caret back by the removed amount.
    pub fn delete(&self, range: Range<usize>) -> BufferResult<Version> {
        let mut state = self.state.write();
        state.buffer.delete(range.clone())?;
        if state.caret >= range.end {
            state.caret -= range.len();
        } else if state.caret > range.start {
            state.caret = range.start;
        }
        Ok(state.buffer.version())
    }
}

impl TextView for MemoryView {
    fn snapshot(&self) -> Snapshot {
        self.state.read().buffer.snapshot()
    }

    fn caret(&self) -> SnapshotPoint {
        let state = self.state.read();
        SnapshotPoint::new(state.buffer.version(), state.caret)
    }

    fn visible_line_count(&self) -> usize {
        self.state.read().visible_lines
    }
}
