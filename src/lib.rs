//! # Devlore
//!
//! A local knowledge store for development plans, session logs, and
//! recurring learnings.
//!
//! Devlore indexes markdown plans and dated work-log sessions, answers
//! filtered and full-text queries against them, and mines session history
//! for recurring learnings that are worth writing down once and reusing.
//!
//! ## Features
//!
//! - Two interchangeable storage backends behind one trait: a
//!   git-friendly JSON file index and an embedded `SQLite` store with FTS5
//! - Lazy staleness detection with on-demand index rebuilds (no watcher)
//! - Keyword-signature clustering that groups noisy freeform learnings
//!   into stable patterns with long-term frequency tracking
//! - Idempotent materialization of document-worthy patterns as skill files
//!
//! ## Example
//!
//! ```rust,ignore
//! use devlore::storage::{BackendKind, open_adapter};
//! use devlore::{DevloreConfig, PlanFilter, PlanStatus};
//!
//! let config = DevloreConfig::default();
//! let adapter = open_adapter(BackendKind::FileIndex, &config);
//! adapter.init(config.knowledge_dir.as_path())?;
//! let active = adapter.query_plans(&PlanFilter::new().with_status(PlanStatus::Active))?;
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
// multiple_crate_versions is inherently crate-level (detects duplicate transitive dependencies).
#![allow(clippy::multiple_crate_versions)]

use std::path::PathBuf;
use thiserror::Error as ThisError;

// Module declarations
pub mod config;
pub mod mining;
pub mod models;
pub mod storage;

// Re-exports for convenience
pub use config::{DevloreConfig, MiningConfig};
pub use mining::{
    PatternTracker, SessionLog, create_learned_skill, detect_patterns, load_recent_sessions,
};
pub use models::{
    DetectedPattern, IndexCounts, MatchKind, Plan, PlanFilter, PlanQuery, PlanStatus, SearchMatch,
    SearchScope, Session, SessionFilter, SessionQuery, TrackedPattern,
};
pub use storage::{AutoIndexer, BackendKind, FileIndexBackend, SqliteBackend, StorageAdapter};

/// Error type for devlore operations.
///
/// Uses `thiserror` for automatic `Display` and `Error` trait implementations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidInput` | Empty search queries, malformed filter values, unsafe file names |
/// | `Initialization` | Storage location cannot be created or opened |
/// | `NotInitialized` | An adapter operation is called before `init` |
/// | `Storage` | A backend query or statement fails against an opened store |
/// | `OperationFailed` | Serialization, file I/O, or other non-store failures |
#[derive(Debug, ThisError)]
pub enum Error {
    /// Invalid input was provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The storage location could not be prepared.
    ///
    /// Raised when the index file's parent directory cannot be created,
    /// or the database file cannot be opened. These are the only failures
    /// that propagate out of setup; everything else recovers locally.
    #[error("failed to initialize storage at '{path}': {cause}")]
    Initialization {
        /// The location that could not be prepared.
        path: PathBuf,
        /// The underlying cause.
        cause: String,
    },

    /// An adapter operation was called before `init`.
    ///
    /// This is a programming error in the caller, surfaced loudly rather
    /// than silently returning empty results.
    #[error("storage adapter not initialized: call init() before '{operation}'")]
    NotInitialized {
        /// The operation that was attempted.
        operation: String,
    },

    /// A backend query or statement failed against an opened store.
    ///
    /// Carries the operation name and the store path so operators get
    /// actionable context instead of a bare driver message.
    #[error("storage operation '{operation}' failed for '{path}': {cause}")]
    Storage {
        /// The operation that failed.
        operation: String,
        /// Path of the index file or database.
        path: PathBuf,
        /// The underlying cause.
        cause: String,
    },

    /// An operation failed outside the storage engine.
    ///
    /// Raised when:
    /// - JSON serialization of a persisted document fails
    /// - A skill or history file cannot be written
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

impl Error {
    /// Wraps a storage engine failure with operation name and store path.
    pub(crate) fn storage(
        operation: impl Into<String>,
        path: impl Into<PathBuf>,
        cause: impl ToString,
    ) -> Self {
        Self::Storage {
            operation: operation.into(),
            path: path.into(),
            cause: cause.to_string(),
        }
    }

    /// Wraps a non-store failure with its operation name.
    pub(crate) fn operation(operation: impl Into<String>, cause: impl ToString) -> Self {
        Self::OperationFailed {
            operation: operation.into(),
            cause: cause.to_string(),
        }
    }
}

/// Result type alias for devlore operations.
pub type Result<T> = std::result::Result<T, Error>;
