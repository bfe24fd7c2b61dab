//! Session log loading for the mining pipeline.

use chrono::{Duration, NaiveDate, Utc};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::{Error, Result};

// Allow expect() on static regex patterns - these are guaranteed to compile
#[allow(clippy::expect_used)]
static DATE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4}-\d{2}-\d{2})").expect("static regex: date prefix"));

/// A raw session log loaded for mining.
#[derive(Debug, Clone)]
pub struct SessionLog {
    /// Path of the session file.
    pub path: PathBuf,
    /// Calendar day parsed from the filename, when present.
    pub date: Option<NaiveDate>,
    /// Full file content.
    pub content: String,
}

/// Loads session files within a trailing day window.
///
/// Files whose names carry no parsable date are included unconditionally
/// rather than excluded — an undated log may still hold learnings. A
/// missing directory contributes nothing. Unreadable files are skipped.
///
/// # Errors
///
/// Returns an error only when the directory exists but cannot be listed.
pub fn load_recent_sessions(dir: &Path, window_days: u32) -> Result<Vec<SessionLog>> {
    let mut sessions = Vec::new();

    if !dir.exists() {
        tracing::debug!(dir = %dir.display(), "sessions directory missing, nothing to mine");
        return Ok(sessions);
    }

    let entries =
        fs::read_dir(dir).map_err(|e| Error::operation("read_sessions_dir", e))?;
    let cutoff = Utc::now().date_naive() - Duration::days(i64::from(window_days));

    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().is_none_or(|ext| ext != "md") {
            continue;
        }

        let date = path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(|stem| DATE_PREFIX.captures(stem))
            .and_then(|caps| caps[1].parse().ok());

        if let Some(date) = date {
            if date < cutoff {
                continue;
            }
        }

        match fs::read_to_string(&path) {
            Ok(content) => sessions.push(SessionLog {
                path,
                date,
                content,
            }),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "skipping unreadable session");
            },
        }
    }

    sessions.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(sessions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_directory_is_empty() {
        let dir = TempDir::new().unwrap();
        let sessions = load_recent_sessions(&dir.path().join("nope"), 30).unwrap();
        assert!(sessions.is_empty());
    }

    #[test]
    fn test_window_filters_dated_files() {
        let dir = TempDir::new().unwrap();
        let recent = Utc::now().date_naive() - Duration::days(3);
        let old = Utc::now().date_naive() - Duration::days(90);

        fs::write(dir.path().join(format!("{recent}-work.md")), "recent").unwrap();
        fs::write(dir.path().join(format!("{old}-work.md")), "old").unwrap();

        let sessions = load_recent_sessions(dir.path(), 30).unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].content, "recent");
    }

    #[test]
    fn test_undated_files_are_included() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("scratchpad.md"), "undated notes").unwrap();

        let sessions = load_recent_sessions(dir.path(), 30).unwrap();
        assert_eq!(sessions.len(), 1);
        assert!(sessions[0].date.is_none());
    }

    #[test]
    fn test_non_markdown_ignored() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("notes.txt"), "not markdown").unwrap();

        let sessions = load_recent_sessions(dir.path(), 30).unwrap();
        assert!(sessions.is_empty());
    }
}
