//! Storage adapter contract.
//!
//! Every backend implements the same five operations behind one trait so
//! callers can swap backends at construction time without code changes.
//!
//! # Available Implementations
//!
//! | Backend | Source of truth | Use Case |
//! |---------|-----------------|----------|
//! | [`FileIndexBackend`](super::FileIndexBackend) | Markdown tree + JSON index | Default; git-friendly, zero setup |
//! | [`SqliteBackend`](super::SqliteBackend) | `SQLite` rows + FTS5 | Multi-project stores, metadata-only queries |
//!
//! # Error Modes and Guarantees
//!
//! All operations return `Result<T>` with errors propagated via
//! [`crate::Error`]. Calling any operation before `init` fails with
//! [`crate::Error::NotInitialized`] naming the operation — never a silent
//! no-op.
//!
//! ## Consistency
//!
//! Both backends serve a **derived view**: the file index derives from
//! markdown files and must be resynchronized with `rebuild_index` (or the
//! [`AutoIndexer`](super::AutoIndexer) wrapper); the SQL backend keeps its
//! full-text tables in sync with triggers, so its `rebuild_index` only
//! reports counts.

use crate::config::DevloreConfig;
use crate::models::{
    IndexCounts, PlanFilter, PlanQuery, SearchMatch, SearchScope, SessionFilter, SessionQuery,
};
use crate::Result;
use std::path::Path;

/// Trait for storage backends.
///
/// # Implementor Notes
///
/// - Methods use `&self` to enable sharing via `Box<dyn StorageAdapter>`;
///   use interior mutability (e.g. `Mutex<Option<State>>`) for state
/// - `init` must be idempotent across repeated calls
/// - `close` must be safe to call multiple times
/// - Callers serialize access to one instance; no internal concurrency is
///   assumed beyond lock-protected state
pub trait StorageAdapter: Send + Sync {
    /// Prepares the backend for use at the given directory or file path.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Initialization`] if the location cannot be
    /// created or opened.
    fn init(&self, location: &Path) -> Result<()>;

    /// Returns plans matching all supplied filter predicates.
    ///
    /// Omitted predicates impose no constraint. Default order is
    /// most-recently-updated first.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is not initialized or the query fails.
    fn query_plans(&self, filter: &PlanFilter) -> Result<PlanQuery>;

    /// Returns sessions matching all supplied filter predicates.
    ///
    /// Default order is most-recent date first.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is not initialized or the query fails.
    fn query_sessions(&self, filter: &SessionFilter) -> Result<SessionQuery>;

    /// Full-text search across the entity kinds selected by `scope`.
    ///
    /// Results are ordered by descending relevance.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is not initialized, the query is
    /// empty, or the underlying search fails.
    fn search(&self, query: &str, scope: SearchScope) -> Result<Vec<SearchMatch>>;

    /// Resynchronizes derived state from the backend's source of truth.
    ///
    /// Returns the entity counts now indexed. For the SQL backend this is
    /// a count report only — new content arrives via explicit inserts,
    /// not by dropping files into a directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is not initialized or the rebuild fails.
    fn rebuild_index(&self) -> Result<IndexCounts>;

    /// Releases any held resources. Safe to call multiple times.
    ///
    /// # Errors
    ///
    /// Returns an error if releasing resources fails.
    fn close(&self) -> Result<()>;
}

impl<T: StorageAdapter + ?Sized> StorageAdapter for Box<T> {
    fn init(&self, location: &Path) -> Result<()> {
        (**self).init(location)
    }

    fn query_plans(&self, filter: &PlanFilter) -> Result<PlanQuery> {
        (**self).query_plans(filter)
    }

    fn query_sessions(&self, filter: &SessionFilter) -> Result<SessionQuery> {
        (**self).query_sessions(filter)
    }

    fn search(&self, query: &str, scope: SearchScope) -> Result<Vec<SearchMatch>> {
        (**self).search(query, scope)
    }

    fn rebuild_index(&self) -> Result<IndexCounts> {
        (**self).rebuild_index()
    }

    fn close(&self) -> Result<()> {
        (**self).close()
    }
}

/// Which storage backend to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// Markdown tree + JSON index document.
    #[default]
    FileIndex,
    /// Embedded `SQLite` store with FTS5.
    Sqlite,
}

impl BackendKind {
    /// Returns the kind as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::FileIndex => "file",
            Self::Sqlite => "sqlite",
        }
    }

    /// Parses a backend name, defaulting to the file index for unknown
    /// values.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "sqlite" | "sql" | "db" => Self::Sqlite,
            _ => Self::FileIndex,
        }
    }
}

/// Constructs the configured backend behind the adapter trait.
///
/// Callers depend only on [`StorageAdapter`]; the concrete backend is
/// chosen here and nowhere else. The returned adapter still needs
/// `init` before use.
#[must_use]
pub fn open_adapter(kind: BackendKind, config: &DevloreConfig) -> Box<dyn StorageAdapter> {
    match kind {
        BackendKind::FileIndex => Box::new(super::FileIndexBackend::new()),
        BackendKind::Sqlite => Box::new(super::SqliteBackend::new(&config.project)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_kind_parse() {
        assert_eq!(BackendKind::parse("sqlite"), BackendKind::Sqlite);
        assert_eq!(BackendKind::parse("SQL"), BackendKind::Sqlite);
        assert_eq!(BackendKind::parse("file"), BackendKind::FileIndex);
        assert_eq!(BackendKind::parse("unknown"), BackendKind::FileIndex);
    }

    #[test]
    fn test_factory_selects_backend() {
        let config = DevloreConfig::default();
        // Construction must not touch the filesystem; only init does.
        let _file = open_adapter(BackendKind::FileIndex, &config);
        let _sql = open_adapter(BackendKind::Sqlite, &config);
    }
}
