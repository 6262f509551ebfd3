//! # Bracelight Core
//!
//! Incremental brace matching for a live text buffer.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                      BraceMatcher                        │
//! │  caret / layout events ──► revision ──► sync scan        │
//! │                                 │           │            │
//! │                                 │     background scan    │
//! │                                 ▼           ▼            │
//! │  ┌──────────────┐  ┌────────────────┐  ┌─────────────┐   │
//! │  │DelimiterTable│  │ matcher scans  │  │TagPublisher │   │
//! │  └──────────────┘  └───────┬────────┘  └──────┬──────┘   │
//! │                            │                  │          │
//! │                 ClassificationOracle     TagsChanged     │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! The host supplies a [`TextView`] (snapshot, caret, viewport height)
//! and a [`ClassificationOracle`]; everything else lives here.

pub mod classify;
pub mod config;
pub mod controller;
pub mod delimiter;
pub mod event;
pub mod matcher;
pub mod publisher;
pub mod revision;
pub mod view;

pub use classify::{ClassificationOracle, PlainText};
pub use config::{Config, ConfigError};
pub use controller::{BackgroundScan, BraceMatcher, ScanReport, UpdateOutcome};
pub use delimiter::{DelimiterPair, DelimiterTable};
pub use event::{EventBus, TagsChanged};
pub use matcher::{BraceHighlight, HighlightResult, ScanOutcome};
pub use publisher::{MatchPhase, TagPublisher};
pub use revision::{Revision, RevisionClock};
pub use view::{MemoryView, TextView};

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in core operations
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Not a configured delimiter: {0:?}")]
    DelimiterNotFound(char),

    #[error("Delimiter {0:?} is used in more than one role")]
    OverlappingDelimiter(char),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}
