//! File-index storage backend.
//!
//! Parses a markdown knowledge tree into a single JSON index document.
//! Simplest backend: no external engine, state lives in one git-friendly
//! file, and the whole document is rewritten on every mutation. Assumes a
//! single active process per project.

mod document;
mod scan;

pub use document::{ContextIndex, SCHEMA_VERSION};
pub use scan::{PointerRef, extract_plan_reference, extract_pointer};

use chrono::Utc;
use regex::Regex;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::instrument;

use crate::config::INDEX_FILENAME;
use crate::models::{
    IndexCounts, MatchKind, PlanFilter, PlanQuery, SearchMatch, SearchScope, SessionFilter,
    SessionQuery,
};
use crate::storage::{StorageAdapter, acquire_lock};
use crate::{Error, Result};

/// Maximum snippet length for search match context.
const SNIPPET_LEN: usize = 200;

struct FileIndexState {
    base: PathBuf,
    index_path: PathBuf,
    index: ContextIndex,
}

/// File-index backend over a markdown knowledge tree.
pub struct FileIndexBackend {
    state: Mutex<Option<FileIndexState>>,
}

impl Default for FileIndexBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl FileIndexBackend {
    /// Creates an unopened backend. Call `init` before use.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(None),
        }
    }

    /// Runs `f` against the initialized state, failing loudly otherwise.
    fn with_state<R>(
        &self,
        operation: &str,
        f: impl FnOnce(&FileIndexState) -> Result<R>,
    ) -> Result<R> {
        let guard = acquire_lock(&self.state);
        let state = guard.as_ref().ok_or_else(|| Error::NotInitialized {
            operation: operation.to_string(),
        })?;
        f(state)
    }

    /// Reads every markdown file directly under `dir` (flat, no recursion).
    ///
    /// A directory that does not exist contributes nothing; unreadable
    /// files are skipped.
    fn read_markdown_files(dir: &Path) -> Vec<(PathBuf, String)> {
        let mut files = Vec::new();

        let Ok(entries) = fs::read_dir(dir) else {
            return files;
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != "md") {
                continue;
            }
            match fs::read_to_string(&path) {
                Ok(content) => files.push((path, content)),
                Err(e) => {
                    tracing::debug!(path = %path.display(), error = %e, "skipping unreadable file");
                },
            }
        }

        files.sort_by(|a, b| a.0.cmp(&b.0));
        files
    }

    /// Source reference for a file, relative to the knowledge root when
    /// possible.
    fn source_ref(base: &Path, path: &Path) -> String {
        path.strip_prefix(base)
            .unwrap_or(path)
            .display()
            .to_string()
    }

    /// Directories scanned per scope, with the match kind each contributes.
    fn scope_dirs(base: &Path, scope: SearchScope) -> Vec<(PathBuf, MatchKind)> {
        let root = (base.to_path_buf(), MatchKind::Essentials);
        let plans = (base.join("plans"), MatchKind::Plan);
        let sessions = (base.join("sessions"), MatchKind::Session);
        let learned = (base.join("learned"), MatchKind::Learned);

        match scope {
            SearchScope::All => vec![root, plans, sessions, learned],
            SearchScope::Plans | SearchScope::Essentials => vec![root, plans],
            SearchScope::Sessions => vec![sessions],
            SearchScope::Learned => vec![learned],
        }
    }

    /// Re-derives the index from the markdown tree.
    fn scan_tree(base: &Path) -> ContextIndex {
        let mut index = ContextIndex::empty();

        let plans_dir = base.join("plans");
        let plan_files = Self::read_markdown_files(&plans_dir);
        let mut pointer_files: HashSet<PathBuf> = HashSet::new();
        let mut seen_ids: HashSet<String> = HashSet::new();

        // Pass 1: author pointer files. The pointer names the author; the
        // linked document supplies title and status. Pointer-derived
        // entries take precedence over standalone discovery.
        for (path, content) in &plan_files {
            let Some(pointer) = scan::extract_pointer(content) else {
                continue;
            };
            pointer_files.insert(path.clone());

            let author = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_string();
            let target = plans_dir.join(&pointer.target);
            let Some(id) = target.file_stem().and_then(|s| s.to_str()).map(String::from) else {
                tracing::debug!(path = %path.display(), "pointer target has no file stem, skipping");
                continue;
            };

            let Ok(target_content) = fs::read_to_string(&target) else {
                tracing::debug!(
                    pointer = %path.display(),
                    target = %target.display(),
                    "pointer target unreadable, skipping"
                );
                continue;
            };

            let (created_at, updated_at) = scan::file_times(&target);
            let source = Self::source_ref(base, &target);
            match scan::extract_plan_doc(
                &id,
                &source,
                &target_content,
                Some(&author),
                created_at,
                updated_at,
            ) {
                Some(plan) => {
                    seen_ids.insert(plan.id.clone());
                    index.plans.push(plan);
                },
                None => {
                    tracing::debug!(target = %target.display(), "linked plan unparsable, skipping");
                },
            }
        }

        // Pass 2: standalone plan documents not already discovered.
        for (path, content) in &plan_files {
            if pointer_files.contains(path) {
                continue;
            }
            let Some(id) = path.file_stem().and_then(|s| s.to_str()).map(String::from) else {
                continue;
            };
            if seen_ids.contains(&id) {
                continue;
            }

            let (created_at, updated_at) = scan::file_times(path);
            let source = Self::source_ref(base, path);
            match scan::extract_plan_doc(&id, &source, content, None, created_at, updated_at) {
                Some(plan) => {
                    seen_ids.insert(plan.id.clone());
                    index.plans.push(plan);
                },
                None => {
                    tracing::debug!(path = %path.display(), "not a plan document, skipping");
                },
            }
        }

        // Sessions: date-prefixed markdown files.
        let sessions_dir = base.join("sessions");
        for (path, content) in Self::read_markdown_files(&sessions_dir) {
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let (created_at, updated_at) = scan::file_times(&path);
            let source = Self::source_ref(base, &path);
            match scan::extract_session(stem, &source, &content, created_at, updated_at) {
                Some(session) => index.sessions.push(session),
                None => {
                    tracing::debug!(path = %path.display(), "not a session file, skipping");
                },
            }
        }

        index.updated = Utc::now();
        index
    }
}

impl StorageAdapter for FileIndexBackend {
    #[instrument(skip(self), fields(operation = "init", backend = "file_index", location = %location.display()))]
    fn init(&self, location: &Path) -> Result<()> {
        fs::create_dir_all(location).map_err(|e| Error::Initialization {
            path: location.to_path_buf(),
            cause: e.to_string(),
        })?;

        let index_path = location.join(INDEX_FILENAME);
        let index = ContextIndex::load_or_init(&index_path).map_err(|e| Error::Initialization {
            path: location.to_path_buf(),
            cause: e.to_string(),
        })?;

        let mut guard = acquire_lock(&self.state);
        *guard = Some(FileIndexState {
            base: location.to_path_buf(),
            index_path,
            index,
        });

        Ok(())
    }

    #[instrument(skip(self, filter), fields(operation = "query_plans", backend = "file_index"))]
    fn query_plans(&self, filter: &PlanFilter) -> Result<PlanQuery> {
        self.with_state("query_plans", |state| {
            let mut plans: Vec<_> = state
                .index
                .plans
                .iter()
                .filter(|p| filter.matches(p))
                .cloned()
                .collect();
            plans.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

            Ok(PlanQuery {
                count: plans.len(),
                plans,
            })
        })
    }

    #[instrument(skip(self, filter), fields(operation = "query_sessions", backend = "file_index"))]
    fn query_sessions(&self, filter: &SessionFilter) -> Result<SessionQuery> {
        self.with_state("query_sessions", |state| {
            let today = Utc::now().date_naive();
            let mut sessions: Vec<_> = state
                .index
                .sessions
                .iter()
                .filter(|s| filter.matches(s, today))
                .cloned()
                .collect();
            sessions.sort_by(|a, b| b.date.cmp(&a.date));

            Ok(SessionQuery {
                count: sessions.len(),
                sessions,
            })
        })
    }

    #[instrument(
        skip(self, query),
        fields(operation = "search", backend = "file_index", scope = scope.as_str())
    )]
    fn search(&self, query: &str, scope: SearchScope) -> Result<Vec<SearchMatch>> {
        if query.trim().is_empty() {
            return Err(Error::InvalidInput("search query is empty".to_string()));
        }

        self.with_state("search", |state| {
            // The query is a regex; one that fails to compile degrades to
            // a literal match instead of erroring.
            let re = Regex::new(&format!("(?i){query}")).or_else(|_| {
                Regex::new(&format!("(?i){}", regex::escape(query)))
            });
            let re = re.map_err(|e| Error::InvalidInput(format!("unusable search query: {e}")))?;

            let mut matches = Vec::new();
            for (dir, kind) in Self::scope_dirs(&state.base, scope) {
                // Root scans stay flat so sub-directory files are only
                // attributed once, by their own scope entry.
                for (path, content) in Self::read_markdown_files(&dir) {
                    if path == state.index_path {
                        continue;
                    }
                    let source = Self::source_ref(&state.base, &path);
                    for (line_idx, line) in content.lines().enumerate() {
                        let hits = re.find_iter(line).count();
                        if hits == 0 {
                            continue;
                        }
                        matches.push(SearchMatch {
                            source: source.clone(),
                            line: line_idx + 1,
                            context: snippet(line),
                            relevance: (hits * 10) as f32,
                            kind,
                        });
                    }
                }
            }

            matches.sort_by(|a, b| b.relevance.total_cmp(&a.relevance));
            Ok(matches)
        })
    }

    #[instrument(skip(self), fields(operation = "rebuild_index", backend = "file_index"))]
    fn rebuild_index(&self) -> Result<IndexCounts> {
        let mut guard = acquire_lock(&self.state);
        let state = guard.as_mut().ok_or_else(|| Error::NotInitialized {
            operation: "rebuild_index".to_string(),
        })?;

        let index = Self::scan_tree(&state.base);
        index.persist(&state.index_path)?;

        let counts = IndexCounts {
            plans: index.plans.len(),
            sessions: index.sessions.len(),
            learned: index.learned.len(),
        };
        state.index = index;

        tracing::debug!(
            plans = counts.plans,
            sessions = counts.sessions,
            learned = counts.learned,
            "index rebuilt"
        );
        Ok(counts)
    }

    #[instrument(skip(self), fields(operation = "close", backend = "file_index"))]
    fn close(&self) -> Result<()> {
        let mut guard = acquire_lock(&self.state);
        *guard = None;
        Ok(())
    }
}

/// Flattens and truncates a matched line for display.
fn snippet(line: &str) -> String {
    let trimmed = line.trim();
    if trimmed.len() <= SNIPPET_LEN {
        return trimmed.to_string();
    }
    let mut end = SNIPPET_LEN;
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    trimmed[..end].to_string()
}
