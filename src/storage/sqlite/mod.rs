//! Embedded `SQLite` storage backend.
//!
//! Persists plans and sessions as rows partitioned by project, with
//! external-content FTS5 tables kept in sync by triggers. Unlike the file
//! backend, content arrives through explicit inserts — `rebuild_index`
//! reports row counts and performs no directory scan.
//!
//! Two levels of query detail exist for both entities: the full variant
//! includes the heavy content column, the metadata variant excludes it
//! for token-efficient callers. A third path filters by content substring
//! directly, bypassing the FTS index.

mod rows;
mod sql;

pub use rows::{PlanRow, SessionRow};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, params, params_from_iter};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Instant;
use tracing::instrument;

use crate::config::{DB_FILENAME, DB_SUBDIR};
use crate::models::{
    IndexCounts, MatchKind, Plan, PlanFilter, PlanQuery, SearchMatch, SearchScope, Session,
    SessionFilter, SessionQuery,
};
use crate::storage::{StorageAdapter, acquire_lock};
use crate::{Error, Result};

/// Result cap per entity kind for full-text search.
const SEARCH_LIMIT: usize = 20;

/// Snippet length for search match context.
const SNIPPET_LEN: usize = 200;

/// Fixed relevance per FTS match. Ranking refinement is a known future
/// extension; callers should not read meaning into the value beyond
/// "matched the phrase".
const FTS_RELEVANCE: f32 = 1.0;

/// Formats a timestamp for storage. Fixed-width UTC so stored values
/// compare lexicographically.
pub(crate) fn format_timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

struct SqliteState {
    conn: Connection,
    db_path: PathBuf,
    project_id: i64,
}

/// `SQLite`-backed storage adapter.
pub struct SqliteBackend {
    state: Mutex<Option<SqliteState>>,
    project: String,
}

impl SqliteBackend {
    /// Creates an unopened backend scoped to a project. Call `init`
    /// before use.
    #[must_use]
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(None),
            project: project.into(),
        }
    }

    /// Returns the database path once initialized.
    #[must_use]
    pub fn db_path(&self) -> Option<PathBuf> {
        acquire_lock(&self.state)
            .as_ref()
            .map(|s| s.db_path.clone())
    }

    /// Resolves `init`'s location to a database file path.
    ///
    /// A path that names a database file is used directly; a directory
    /// gets the conventional subdirectory and filename appended.
    fn resolve_db_path(location: &Path) -> PathBuf {
        let looks_like_db = location
            .extension()
            .is_some_and(|ext| ext == "db" || ext == "sqlite" || ext == "sqlite3");
        if looks_like_db || location.is_file() {
            location.to_path_buf()
        } else {
            location.join(DB_SUBDIR).join(DB_FILENAME)
        }
    }

    /// Runs `f` against the initialized state, failing loudly otherwise.
    fn with_state<R>(
        &self,
        operation: &str,
        f: impl FnOnce(&SqliteState) -> Result<R>,
    ) -> Result<R> {
        let guard = acquire_lock(&self.state);
        let state = guard.as_ref().ok_or_else(|| Error::NotInitialized {
            operation: operation.to_string(),
        })?;
        f(state)
    }

    fn record_operation_metrics(operation: &'static str, start: Instant, status: &'static str) {
        metrics::counter!(
            "storage_operations_total",
            "backend" => "sqlite",
            "operation" => operation,
            "status" => status
        )
        .increment(1);
        metrics::histogram!(
            "storage_operation_duration_ms",
            "backend" => "sqlite",
            "operation" => operation,
            "status" => status
        )
        .record(start.elapsed().as_secs_f64() * 1000.0);
    }

    /// Inserts or creates the project row and returns its id.
    fn ensure_project(conn: &Connection, db_path: &Path, name: &str) -> Result<i64> {
        conn.execute(
            "INSERT OR IGNORE INTO projects (name, created_at) VALUES (?1, ?2)",
            params![name, format_timestamp(Utc::now())],
        )
        .map_err(|e| Error::storage("ensure_project", db_path, e))?;

        conn.query_row(
            "SELECT id FROM projects WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )
        .map_err(|e| Error::storage("lookup_project", db_path, e))
    }

    /// Shared implementation for the full/metadata/substring plan queries.
    fn plan_query(
        &self,
        operation: &'static str,
        filter: &PlanFilter,
        include_content: bool,
        text: Option<&str>,
    ) -> Result<PlanQuery> {
        let start = Instant::now();
        let result = self.with_state(operation, |state| {
            let content_col = if include_content {
                "p.content"
            } else {
                "NULL AS content"
            };

            let (clause, mut query_params, next_param) = sql::build_plan_clause(filter, 2);
            let mut text_clause = String::new();
            if let Some(text) = text {
                text_clause =
                    format!(" AND instr(lower(coalesce(p.content, '')), ?{next_param}) > 0");
                query_params.push(text.to_lowercase());
            }

            let statement = format!(
                "SELECT p.slug, p.title, p.status, p.author, p.priority, p.plan_type, \
                        p.topics, {content_col}, p.source, p.created_at, p.updated_at
                 FROM plans p
                 WHERE p.project_id = ?1{clause}{text_clause}
                 ORDER BY p.updated_at DESC"
            );

            let mut stmt = statement_for(state, operation, &statement)?;
            let rows = stmt
                .query_map(
                    params_from_iter(
                        std::iter::once(state.project_id.to_string()).chain(query_params),
                    ),
                    |row| {
                        Ok(PlanRow {
                            slug: row.get(0)?,
                            title: row.get(1)?,
                            status: row.get(2)?,
                            author: row.get(3)?,
                            priority: row.get(4)?,
                            plan_type: row.get(5)?,
                            topics: row.get(6)?,
                            content: row.get(7)?,
                            source: row.get(8)?,
                            created_at: row.get(9)?,
                            updated_at: row.get(10)?,
                        })
                    },
                )
                .map_err(|e| Error::storage(operation, &state.db_path, e))?;

            let mut plans = Vec::new();
            for row in rows {
                let row = row.map_err(|e| Error::storage(operation, &state.db_path, e))?;
                plans.push(row.into_plan());
            }

            Ok(PlanQuery {
                count: plans.len(),
                plans,
            })
        });

        Self::record_operation_metrics(operation, start, status_of(&result));
        result
    }

    /// Shared implementation for the full/metadata/substring session queries.
    fn session_query(
        &self,
        operation: &'static str,
        filter: &SessionFilter,
        include_content: bool,
        text: Option<&str>,
    ) -> Result<SessionQuery> {
        let start = Instant::now();
        let result = self.with_state(operation, |state| {
            let content_col = if include_content {
                "s.content"
            } else {
                "NULL AS content"
            };

            let today = Utc::now().date_naive();
            let (clause, mut query_params, next_param) =
                sql::build_session_clause(filter, 2, today);
            let mut text_clause = String::new();
            if let Some(text) = text {
                text_clause =
                    format!(" AND instr(lower(coalesce(s.content, '')), ?{next_param}) > 0");
                query_params.push(text.to_lowercase());
            }

            let statement = format!(
                "SELECT s.date, s.topic, s.plan_slug, s.duration, s.phases, s.topics, \
                        {content_col}, s.source, s.created_at, s.updated_at
                 FROM sessions s
                 WHERE s.project_id = ?1{clause}{text_clause}
                 ORDER BY s.date DESC, s.id DESC"
            );

            let mut stmt = statement_for(state, operation, &statement)?;
            let rows = stmt
                .query_map(
                    params_from_iter(
                        std::iter::once(state.project_id.to_string()).chain(query_params),
                    ),
                    |row| {
                        Ok(SessionRow {
                            date: row.get(0)?,
                            topic: row.get(1)?,
                            plan_slug: row.get(2)?,
                            duration: row.get(3)?,
                            phases: row.get(4)?,
                            topics: row.get(5)?,
                            content: row.get(6)?,
                            source: row.get(7)?,
                            created_at: row.get(8)?,
                            updated_at: row.get(9)?,
                        })
                    },
                )
                .map_err(|e| Error::storage(operation, &state.db_path, e))?;

            let mut sessions = Vec::new();
            for row in rows {
                let row = row.map_err(|e| Error::storage(operation, &state.db_path, e))?;
                sessions.push(row.into_session());
            }

            Ok(SessionQuery {
                count: sessions.len(),
                sessions,
            })
        });

        Self::record_operation_metrics(operation, start, status_of(&result));
        result
    }

    /// Metadata-only plan query: same predicates, content excluded.
    pub fn query_plans_metadata(&self, filter: &PlanFilter) -> Result<PlanQuery> {
        self.plan_query("query_plans_metadata", filter, false, None)
    }

    /// Metadata-only session query: same predicates, content excluded.
    pub fn query_sessions_metadata(&self, filter: &SessionFilter) -> Result<SessionQuery> {
        self.session_query("query_sessions_metadata", filter, false, None)
    }

    /// Full plan query with an additional case-insensitive content
    /// substring predicate, bypassing the FTS index.
    pub fn query_plans_with_text(&self, filter: &PlanFilter, text: &str) -> Result<PlanQuery> {
        self.plan_query("query_plans_with_text", filter, true, Some(text))
    }

    /// Full session query with an additional case-insensitive content
    /// substring predicate, bypassing the FTS index.
    pub fn query_sessions_with_text(
        &self,
        filter: &SessionFilter,
        text: &str,
    ) -> Result<SessionQuery> {
        self.session_query("query_sessions_with_text", filter, true, Some(text))
    }

    /// Inserts a plan, updating the existing row on a slug conflict.
    ///
    /// The creation timestamp of an existing row is preserved; everything
    /// else takes the new values. FTS stays in sync via triggers.
    #[instrument(skip(self, plan), fields(operation = "insert_plan", backend = "sqlite", plan.id = %plan.id))]
    pub fn insert_plan(&self, plan: &Plan) -> Result<()> {
        let start = Instant::now();
        let result = self.with_state("insert_plan", |state| {
            state
                .conn
                .execute(
                    "INSERT INTO plans (project_id, slug, title, status, author, priority, \
                                        plan_type, topics, content, source, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                     ON CONFLICT(project_id, slug) DO UPDATE SET
                        title = excluded.title,
                        status = excluded.status,
                        author = excluded.author,
                        priority = excluded.priority,
                        plan_type = excluded.plan_type,
                        topics = excluded.topics,
                        content = excluded.content,
                        source = excluded.source,
                        updated_at = excluded.updated_at",
                    params![
                        state.project_id,
                        plan.id,
                        plan.title,
                        plan.status.as_str(),
                        plan.author,
                        plan.priority,
                        plan.plan_type,
                        join_list(&plan.topics),
                        plan.description,
                        plan.source,
                        format_timestamp(plan.created_at),
                        format_timestamp(plan.updated_at),
                    ],
                )
                .map_err(|e| Error::storage("insert_plan", &state.db_path, e))?;
            Ok(())
        });

        Self::record_operation_metrics("insert_plan", start, status_of(&result));
        result
    }

    /// Appends a session row. Sessions are an append-only log; there is
    /// no conflict target.
    #[instrument(skip(self, session), fields(operation = "insert_session", backend = "sqlite", session.date = %session.date))]
    pub fn insert_session(&self, session: &Session) -> Result<()> {
        let start = Instant::now();
        let result = self.with_state("insert_session", |state| {
            state
                .conn
                .execute(
                    "INSERT INTO sessions (project_id, date, topic, plan_slug, duration, \
                                           phases, topics, content, source, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                    params![
                        state.project_id,
                        session.date.to_string(),
                        session.topic,
                        session.plan_id,
                        session.duration,
                        join_list(&session.phases),
                        join_list(&session.topics),
                        session.content,
                        session.source,
                        format_timestamp(session.created_at),
                        format_timestamp(session.updated_at),
                    ],
                )
                .map_err(|e| Error::storage("insert_session", &state.db_path, e))?;
            Ok(())
        });

        Self::record_operation_metrics("insert_session", start, status_of(&result));
        result
    }

    /// Full-text phrase search over one entity table.
    fn search_entity(
        state: &SqliteState,
        operation: &'static str,
        statement: &str,
        phrase: &str,
        kind: MatchKind,
    ) -> Result<Vec<SearchMatch>> {
        let mut stmt = statement_for(state, operation, statement)?;
        let rows = stmt
            .query_map(
                params![phrase, state.project_id, SEARCH_LIMIT as i64],
                |row| {
                    let source: String = row.get(0)?;
                    let content: String = row.get(1)?;
                    Ok((source, content))
                },
            )
            .map_err(|e| Error::storage(operation, &state.db_path, e))?;

        let mut matches = Vec::new();
        for row in rows {
            let (source, content) =
                row.map_err(|e| Error::storage(operation, &state.db_path, e))?;
            matches.push(SearchMatch {
                source,
                // Row storage has no line attribution.
                line: 1,
                context: flatten_snippet(&content, SNIPPET_LEN),
                relevance: FTS_RELEVANCE,
                kind,
            });
        }
        Ok(matches)
    }
}

impl StorageAdapter for SqliteBackend {
    #[instrument(skip(self), fields(operation = "init", backend = "sqlite", location = %location.display()))]
    fn init(&self, location: &Path) -> Result<()> {
        let mut guard = acquire_lock(&self.state);
        if guard.is_some() {
            return Ok(());
        }

        let db_path = Self::resolve_db_path(location);
        if let Some(parent) = db_path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::Initialization {
                path: db_path.clone(),
                cause: e.to_string(),
            })?;
        }

        let conn = Connection::open(&db_path).map_err(|e| Error::Initialization {
            path: db_path.clone(),
            cause: e.to_string(),
        })?;

        // WAL for read performance; journal_mode returns a value, so the
        // result is intentionally ignored.
        let _ = conn.pragma_update(None, "journal_mode", "WAL");
        let _ = conn.pragma_update(None, "synchronous", "NORMAL");
        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(|e| Error::Initialization {
                path: db_path.clone(),
                cause: e.to_string(),
            })?;

        for (operation, statement) in sql::SCHEMA_STATEMENTS {
            conn.execute(statement, [])
                .map_err(|e| Error::storage(*operation, &db_path, e))?;
        }

        let project_id = Self::ensure_project(&conn, &db_path, &self.project)?;

        *guard = Some(SqliteState {
            conn,
            db_path,
            project_id,
        });
        Ok(())
    }

    #[instrument(skip(self, filter), fields(operation = "query_plans", backend = "sqlite"))]
    fn query_plans(&self, filter: &PlanFilter) -> Result<PlanQuery> {
        self.plan_query("query_plans", filter, true, None)
    }

    #[instrument(skip(self, filter), fields(operation = "query_sessions", backend = "sqlite"))]
    fn query_sessions(&self, filter: &SessionFilter) -> Result<SessionQuery> {
        self.session_query("query_sessions", filter, true, None)
    }

    #[instrument(
        skip(self, query),
        fields(operation = "search", backend = "sqlite", scope = scope.as_str())
    )]
    fn search(&self, query: &str, scope: SearchScope) -> Result<Vec<SearchMatch>> {
        if query.trim().is_empty() {
            return Err(Error::InvalidInput("search query is empty".to_string()));
        }

        let start = Instant::now();
        let result = self.with_state("search", |state| {
            let phrase = sql::fts_phrase(query);
            let mut matches = Vec::new();

            if matches!(scope, SearchScope::All | SearchScope::Plans) {
                matches.extend(Self::search_entity(
                    state,
                    "search_plans",
                    "SELECT p.source, coalesce(p.content, p.title)
                     FROM plans_fts f
                     JOIN plans p ON p.id = f.rowid
                     WHERE plans_fts MATCH ?1 AND p.project_id = ?2
                     LIMIT ?3",
                    &phrase,
                    MatchKind::Plan,
                )?);
            }

            if matches!(scope, SearchScope::All | SearchScope::Sessions) {
                matches.extend(Self::search_entity(
                    state,
                    "search_sessions",
                    "SELECT s.source, coalesce(s.content, s.topic)
                     FROM sessions_fts f
                     JOIN sessions s ON s.id = f.rowid
                     WHERE sessions_fts MATCH ?1 AND s.project_id = ?2
                     LIMIT ?3",
                    &phrase,
                    MatchKind::Session,
                )?);
            }

            // Learned and essentials documents live outside this store;
            // those scopes contribute nothing here.
            Ok(matches)
        });

        Self::record_operation_metrics("search", start, status_of(&result));
        result
    }

    #[instrument(skip(self), fields(operation = "rebuild_index", backend = "sqlite"))]
    fn rebuild_index(&self) -> Result<IndexCounts> {
        // FTS tables are trigger-synced on every insert and update, so
        // there is nothing to rebuild; report current row counts. New
        // external files are not picked up here — content arrives via
        // explicit inserts.
        self.with_state("rebuild_index", |state| {
            let count = |operation: &'static str, statement: &str| -> Result<usize> {
                state
                    .conn
                    .query_row(statement, params![state.project_id], |row| {
                        row.get::<_, i64>(0)
                    })
                    .map_err(|e| Error::storage(operation, &state.db_path, e))
                    .map(|n| usize::try_from(n).unwrap_or(0))
            };

            Ok(IndexCounts {
                plans: count(
                    "count_plans",
                    "SELECT COUNT(*) FROM plans WHERE project_id = ?1",
                )?,
                sessions: count(
                    "count_sessions",
                    "SELECT COUNT(*) FROM sessions WHERE project_id = ?1",
                )?,
                learned: 0,
            })
        })
    }

    #[instrument(skip(self), fields(operation = "close", backend = "sqlite"))]
    fn close(&self) -> Result<()> {
        let mut guard = acquire_lock(&self.state);
        *guard = None;
        Ok(())
    }
}

/// Prepares a statement with storage-error wrapping.
fn statement_for<'a>(
    state: &'a SqliteState,
    operation: &'static str,
    statement: &str,
) -> Result<rusqlite::Statement<'a>> {
    state
        .conn
        .prepare(statement)
        .map_err(|e| Error::storage(operation, &state.db_path, e))
}

/// Joins a list for storage; `None` when empty so absent and empty agree.
fn join_list(items: &[String]) -> Option<String> {
    if items.is_empty() {
        None
    } else {
        Some(items.join(","))
    }
}

/// Flattens whitespace runs and truncates for display.
fn flatten_snippet(text: &str, max_len: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.len() <= max_len {
        return flat;
    }
    let mut end = max_len;
    while !flat.is_char_boundary(end) {
        end -= 1;
    }
    flat[..end].to_string()
}

fn status_of<T>(result: &Result<T>) -> &'static str {
    if result.is_ok() { "success" } else { "error" }
}
