//! Change notifications.
//!
//! ## Learning: Observer Pattern in Rust
//!
//! Rust's ownership model makes traditional observer patterns tricky.
//! We use `tokio::sync::broadcast` for a safe, async-friendly event bus.
//!
//! Key differences from OOP observers:
//! - No object references to manage
//! - Events are values, not callbacks
//! - Subscribers receive copies (Clone)
//! - No lifetime complexity

use bracelight_buffer::SnapshotSpan;
use tokio::sync::broadcast;

/// Highlight tags changed somewhere inside `span`.
///
/// The span covers the whole snapshot; subscribers re-query the
/// publisher rather than trusting a narrower range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagsChanged {
    pub span: SnapshotSpan,
}

/// Event bus broadcasting values of type `E`.
///
/// ## Design
///
/// Using a broadcast channel allows:
/// - Multiple subscribers
/// - Async reception
/// - No direct coupling between components
/// - Lagged receivers don't block senders
pub struct EventBus<E> {
    sender: broadcast::Sender<E>,
}

impl<E: Clone> EventBus<E> {
    /// Creates a new event bus.
    pub fn new() -> Self {
        // Capacity of 256 events in the buffer
        let (sender, _) = broadcast::channel(256);
        Self { sender }
    }

    /// Emits an event to all subscribers.
    pub fn emit(&self, event: E) {
        // Ignore error if no receivers (not a problem)
        let _ = self.sender.send(event);
    }

    /// Subscribes to events.
    ///
    /// Returns a receiver that will get all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<E> {
        self.sender.subscribe()
    }
}

impl<E: Clone> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for EventBus<E> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}
