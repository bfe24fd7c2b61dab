//! Storage layer abstraction.
//!
//! This module provides one contract with two interchangeable backends:
//! - **File index**: parses markdown sources into a JSON index document;
//!   zero-dependency state, git-friendly, single writer
//! - **Embedded SQL**: `SQLite` rows plus FTS5 full-text tables with sync
//!   triggers; supports multi-project partitioning and metadata-only
//!   query variants
//!
//! [`AutoIndexer`] wraps a backend to keep the derived index fresh
//! relative to its markdown sources without a file watcher.

// Allow cast precision loss for score calculations where exact precision is not critical.
#![allow(clippy::cast_precision_loss)]
// Allow significant_drop_tightening - dropping lock guards slightly early
// provides no meaningful benefit.
#![allow(clippy::significant_drop_tightening)]

pub mod adapter;
pub mod file_index;
pub mod freshness;
pub mod sqlite;

pub use adapter::{BackendKind, StorageAdapter, open_adapter};
pub use file_index::FileIndexBackend;
pub use freshness::{AutoIndexer, RefreshOptions, RefreshOutcome};
pub use sqlite::SqliteBackend;

use std::sync::{Mutex, MutexGuard};

/// Helper to acquire a mutex lock with poison recovery.
///
/// If the mutex is poisoned (due to a panic in a previous critical
/// section), we recover the inner value and log a warning. This prevents
/// cascading failures when one operation panics.
pub(crate) fn acquire_lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!("storage mutex was poisoned, recovering");
            metrics::counter!("storage_mutex_poison_recovery_total").increment(1);
            poisoned.into_inner()
        },
    }
}
