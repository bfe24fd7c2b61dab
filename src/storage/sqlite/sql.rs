//! Schema DDL and filter-clause building for the `SQLite` backend.
//!
//! The schema is applied idempotently on every `init`. Full-text tables
//! are external-content FTS5 over the base tables, kept in sync by
//! triggers — which is why `rebuild_index` on this backend only reports
//! counts.

use chrono::NaiveDate;

use crate::models::{PlanFilter, SessionFilter};

/// Schema statements, each paired with an operation name for error
/// wrapping. Executed in order; all are `IF NOT EXISTS`-idempotent.
pub const SCHEMA_STATEMENTS: &[(&str, &str)] = &[
    (
        "create_projects_table",
        "CREATE TABLE IF NOT EXISTS projects (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            root_path TEXT,
            created_at TEXT NOT NULL
        )",
    ),
    (
        "create_plans_table",
        "CREATE TABLE IF NOT EXISTS plans (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
            slug TEXT NOT NULL,
            title TEXT NOT NULL,
            status TEXT NOT NULL,
            author TEXT,
            priority TEXT,
            plan_type TEXT,
            topics TEXT,
            content TEXT,
            source TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE(project_id, slug)
        )",
    ),
    (
        "create_sessions_table",
        "CREATE TABLE IF NOT EXISTS sessions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
            date TEXT NOT NULL,
            topic TEXT NOT NULL,
            plan_slug TEXT,
            duration TEXT,
            phases TEXT,
            topics TEXT,
            content TEXT,
            source TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
    ),
    (
        "create_plans_status_index",
        "CREATE INDEX IF NOT EXISTS idx_plans_status ON plans(project_id, status)",
    ),
    (
        "create_plans_updated_index",
        "CREATE INDEX IF NOT EXISTS idx_plans_updated_at ON plans(updated_at DESC)",
    ),
    (
        "create_sessions_date_index",
        "CREATE INDEX IF NOT EXISTS idx_sessions_date ON sessions(project_id, date DESC)",
    ),
    (
        "create_sessions_plan_index",
        "CREATE INDEX IF NOT EXISTS idx_sessions_plan ON sessions(plan_slug)",
    ),
    (
        "create_plans_fts",
        "CREATE VIRTUAL TABLE IF NOT EXISTS plans_fts USING fts5(
            title, content, topics,
            content='plans', content_rowid='id'
        )",
    ),
    (
        "create_plans_fts_insert_trigger",
        "CREATE TRIGGER IF NOT EXISTS plans_fts_ai AFTER INSERT ON plans BEGIN
            INSERT INTO plans_fts(rowid, title, content, topics)
            VALUES (new.id, new.title, coalesce(new.content, ''), coalesce(new.topics, ''));
        END",
    ),
    (
        "create_plans_fts_delete_trigger",
        "CREATE TRIGGER IF NOT EXISTS plans_fts_ad AFTER DELETE ON plans BEGIN
            INSERT INTO plans_fts(plans_fts, rowid, title, content, topics)
            VALUES ('delete', old.id, old.title, coalesce(old.content, ''), coalesce(old.topics, ''));
        END",
    ),
    (
        "create_plans_fts_update_trigger",
        "CREATE TRIGGER IF NOT EXISTS plans_fts_au AFTER UPDATE ON plans BEGIN
            INSERT INTO plans_fts(plans_fts, rowid, title, content, topics)
            VALUES ('delete', old.id, old.title, coalesce(old.content, ''), coalesce(old.topics, ''));
            INSERT INTO plans_fts(rowid, title, content, topics)
            VALUES (new.id, new.title, coalesce(new.content, ''), coalesce(new.topics, ''));
        END",
    ),
    (
        "create_sessions_fts",
        "CREATE VIRTUAL TABLE IF NOT EXISTS sessions_fts USING fts5(
            topic, content, topics,
            content='sessions', content_rowid='id'
        )",
    ),
    (
        "create_sessions_fts_insert_trigger",
        "CREATE TRIGGER IF NOT EXISTS sessions_fts_ai AFTER INSERT ON sessions BEGIN
            INSERT INTO sessions_fts(rowid, topic, content, topics)
            VALUES (new.id, new.topic, coalesce(new.content, ''), coalesce(new.topics, ''));
        END",
    ),
    (
        "create_sessions_fts_delete_trigger",
        "CREATE TRIGGER IF NOT EXISTS sessions_fts_ad AFTER DELETE ON sessions BEGIN
            INSERT INTO sessions_fts(sessions_fts, rowid, topic, content, topics)
            VALUES ('delete', old.id, old.topic, coalesce(old.content, ''), coalesce(old.topics, ''));
        END",
    ),
    (
        "create_sessions_fts_update_trigger",
        "CREATE TRIGGER IF NOT EXISTS sessions_fts_au AFTER UPDATE ON sessions BEGIN
            INSERT INTO sessions_fts(sessions_fts, rowid, topic, content, topics)
            VALUES ('delete', old.id, old.topic, coalesce(old.content, ''), coalesce(old.topics, ''));
            INSERT INTO sessions_fts(rowid, topic, content, topics)
            VALUES (new.id, new.topic, coalesce(new.content, ''), coalesce(new.topics, ''));
        END",
    ),
];

/// Builds a WHERE fragment for a plan filter with numbered parameters.
///
/// Returns the clause (empty or starting with ` AND `), the parameter
/// values, and the next free parameter index.
pub fn build_plan_clause(filter: &PlanFilter, start_param: usize) -> (String, Vec<String>, usize) {
    let mut conditions = Vec::new();
    let mut params = Vec::new();
    let mut param_idx = start_param;

    if let Some(status) = filter.status {
        conditions.push(format!("p.status = ?{param_idx}"));
        param_idx += 1;
        params.push(status.as_str().to_string());
    }

    if let Some(ref author) = filter.author {
        conditions.push(format!("p.author = ?{param_idx}"));
        param_idx += 1;
        params.push(author.clone());
    }

    // Topic is a case-insensitive substring match against the title or
    // the per-row topic list; one lowercased parameter serves both.
    if let Some(ref topic) = filter.topic {
        conditions.push(format!(
            "(instr(lower(p.title), ?{param_idx}) > 0 \
             OR instr(lower(coalesce(p.topics, '')), ?{param_idx}) > 0)"
        ));
        param_idx += 1;
        params.push(topic.to_lowercase());
    }

    if let Some(after) = filter.updated_after {
        conditions.push(format!("p.updated_at >= ?{param_idx}"));
        param_idx += 1;
        params.push(super::format_timestamp(after));
    }

    if let Some(before) = filter.updated_before {
        conditions.push(format!("p.updated_at <= ?{param_idx}"));
        param_idx += 1;
        params.push(super::format_timestamp(before));
    }

    let clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" AND {}", conditions.join(" AND "))
    };

    (clause, params, param_idx)
}

/// Builds a WHERE fragment for a session filter with numbered parameters.
///
/// `today` anchors the `last_days` window so queries are deterministic
/// under test.
pub fn build_session_clause(
    filter: &SessionFilter,
    start_param: usize,
    today: NaiveDate,
) -> (String, Vec<String>, usize) {
    let mut conditions = Vec::new();
    let mut params = Vec::new();
    let mut param_idx = start_param;

    if let Some(date) = filter.date {
        conditions.push(format!("s.date = ?{param_idx}"));
        param_idx += 1;
        params.push(date.to_string());
    }

    if let Some(after) = filter.date_after {
        conditions.push(format!("s.date >= ?{param_idx}"));
        param_idx += 1;
        params.push(after.to_string());
    }

    if let Some(before) = filter.date_before {
        conditions.push(format!("s.date <= ?{param_idx}"));
        param_idx += 1;
        params.push(before.to_string());
    }

    if let Some(days) = filter.last_days {
        let cutoff = today - chrono::Duration::days(i64::from(days));
        conditions.push(format!("s.date >= ?{param_idx}"));
        param_idx += 1;
        params.push(cutoff.to_string());
    }

    if let Some(ref topic) = filter.topic {
        conditions.push(format!(
            "(instr(lower(s.topic), ?{param_idx}) > 0 \
             OR instr(lower(coalesce(s.topics, '')), ?{param_idx}) > 0)"
        ));
        param_idx += 1;
        params.push(topic.to_lowercase());
    }

    if let Some(ref plan_id) = filter.plan_id {
        conditions.push(format!("s.plan_slug = ?{param_idx}"));
        param_idx += 1;
        params.push(plan_id.clone());
    }

    let clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" AND {}", conditions.join(" AND "))
    };

    (clause, params, param_idx)
}

/// Wraps a user query as an FTS5 exact phrase, doubling internal quotes.
pub fn fts_phrase(query: &str) -> String {
    let mut phrase = String::with_capacity(query.len() + 2);
    phrase.push('"');
    for c in query.chars() {
        if c == '"' {
            phrase.push_str("\"\"");
        } else {
            phrase.push(c);
        }
    }
    phrase.push('"');
    phrase
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PlanStatus;

    #[test]
    fn test_empty_filter_builds_empty_clause() {
        let (clause, params, next) = build_plan_clause(&PlanFilter::new(), 2);
        assert!(clause.is_empty());
        assert!(params.is_empty());
        assert_eq!(next, 2);
    }

    #[test]
    fn test_plan_clause_numbers_parameters() {
        let filter = PlanFilter::new()
            .with_status(PlanStatus::Active)
            .with_author("dana")
            .with_topic("Auth");
        let (clause, params, next) = build_plan_clause(&filter, 2);

        assert!(clause.contains("p.status = ?2"));
        assert!(clause.contains("p.author = ?3"));
        assert!(clause.contains("?4"));
        assert_eq!(params, vec!["active", "dana", "auth"]);
        assert_eq!(next, 5);
    }

    #[test]
    fn test_session_clause_last_days_uses_anchor() {
        let today: NaiveDate = "2026-08-06".parse().unwrap();
        let filter = SessionFilter::new().with_last_days(30);
        let (clause, params, _) = build_session_clause(&filter, 2, today);

        assert!(clause.contains("s.date >= ?2"));
        assert_eq!(params, vec!["2026-07-07"]);
    }

    #[test]
    fn test_fts_phrase_escapes_quotes() {
        assert_eq!(fts_phrase("plain query"), "\"plain query\"");
        assert_eq!(fts_phrase(r#"say "hi""#), r#""say ""hi""""#);
    }
}
