//! Lazy index freshness.
//!
//! Wraps a file-index-compatible storage adapter to decide, per access,
//! whether the derived index is stale relative to its markdown sources
//! and rebuild it if so. There is no background watcher: freshness is
//! only as good as the last `ensure_fresh_index` call.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::instrument;

use crate::config::INDEX_FILENAME;
use crate::models::IndexCounts;
use crate::storage::StorageAdapter;
use crate::Result;

/// Options for [`AutoIndexer::ensure_fresh_index`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RefreshOptions {
    /// Rebuild unconditionally, skipping the staleness check.
    pub force: bool,
}

/// Outcome of a freshness check.
#[derive(Debug, Clone, Copy)]
pub struct RefreshOutcome {
    /// Whether a rebuild ran.
    pub rebuilt: bool,
    /// Counts from the rebuild, when one ran.
    pub counts: Option<IndexCounts>,
}

/// Decides per access whether to rebuild the wrapped adapter's index.
pub struct AutoIndexer<S> {
    storage: S,
    base: PathBuf,
    index_path: PathBuf,
    personal_dir: Option<PathBuf>,
}

impl<S: StorageAdapter> AutoIndexer<S> {
    /// Wraps an initialized adapter whose index lives under `base`.
    ///
    /// `personal_dir` optionally adds a personal-patterns directory to the
    /// staleness scan.
    #[must_use]
    pub fn new(storage: S, base: impl Into<PathBuf>, personal_dir: Option<PathBuf>) -> Self {
        let base = base.into();
        let index_path = base.join(INDEX_FILENAME);
        Self {
            storage,
            base,
            index_path,
            personal_dir,
        }
    }

    /// Returns the wrapped adapter.
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Unwraps the adapter.
    pub fn into_inner(self) -> S {
        self.storage
    }

    /// Directories whose markdown files can invalidate the index.
    fn candidate_dirs(&self) -> Vec<PathBuf> {
        let mut dirs = vec![
            self.base.clone(),
            self.base.join("plans"),
            self.base.join("sessions"),
            self.base.join("learned"),
        ];
        if let Some(ref personal) = self.personal_dir {
            dirs.push(personal.clone());
        }
        dirs
    }

    /// Whether the index is older than at least one source file.
    ///
    /// An absent index is stale. A source directory that does not exist
    /// is skipped. Any unexpected error defaults to **assuming stale** —
    /// a wasted rebuild beats silently serving outdated data.
    #[instrument(skip(self), fields(operation = "is_index_stale"))]
    pub fn is_index_stale(&self) -> bool {
        match self.check_staleness() {
            Ok(stale) => stale,
            Err(e) => {
                tracing::warn!(error = %e, "staleness check failed, assuming stale");
                true
            },
        }
    }

    fn check_staleness(&self) -> std::io::Result<bool> {
        let index_mtime = match fs::metadata(&self.index_path) {
            Ok(metadata) => metadata.modified()?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(true),
            Err(e) => return Err(e),
        };

        for dir in self.candidate_dirs() {
            if !dir.exists() {
                continue;
            }
            if Self::dir_has_newer_file(&dir, &self.index_path, index_mtime)? {
                return Ok(true);
            }
        }

        Ok(false)
    }

    fn dir_has_newer_file(
        dir: &Path,
        index_path: &Path,
        index_mtime: SystemTime,
    ) -> std::io::Result<bool> {
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path == index_path || path.extension().is_none_or(|ext| ext != "md") {
                continue;
            }
            let modified = fs::metadata(&path)?.modified()?;
            if modified > index_mtime {
                tracing::debug!(path = %path.display(), "source newer than index");
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Rebuilds when forced or stale; reports whether a rebuild ran.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying rebuild fails.
    #[instrument(skip(self), fields(operation = "ensure_fresh_index", force = options.force))]
    pub fn ensure_fresh_index(&self, options: RefreshOptions) -> Result<RefreshOutcome> {
        if options.force || self.is_index_stale() {
            let counts = self.storage.rebuild_index()?;
            return Ok(RefreshOutcome {
                rebuilt: true,
                counts: Some(counts),
            });
        }

        Ok(RefreshOutcome {
            rebuilt: false,
            counts: None,
        })
    }
}
