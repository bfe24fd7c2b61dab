//! End-to-end tests for the mining pipeline: load sessions, detect
//! patterns, track history, materialize skills.
#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::uninlined_format_args
)]

use chrono::{Duration, Utc};
use devlore::mining::{
    PatternTracker, create_learned_skill, detect_patterns, load_recent_sessions,
};
use devlore::MiningConfig;
use std::fs;
use tempfile::TempDir;

fn days_ago(n: i64) -> String {
    (Utc::now().date_naive() - Duration::days(n)).to_string()
}

#[test]
fn test_pipeline_end_to_end() {
    let dir = TempDir::new().unwrap();
    let sessions_dir = dir.path().join("sessions");
    fs::create_dir_all(&sessions_dir).unwrap();

    // Three sessions; two share a learning, the third stands alone.
    fs::write(
        sessions_dir.join(format!("{}-one.md", days_ago(5))),
        "# Session one\n\n**Key Learning:** process.exit prevents testing\n",
    )
    .unwrap();
    fs::write(
        sessions_dir.join(format!("{}-two.md", days_ago(3))),
        "# Session two\n\n**Key Learning:** process.exit breaks test runner\n",
    )
    .unwrap();
    fs::write(
        sessions_dir.join(format!("{}-three.md", days_ago(1))),
        "# Session three\n\n**Key Learning:** must refactor update command\n",
    )
    .unwrap();

    let sessions = load_recent_sessions(&sessions_dir, 30).unwrap();
    assert_eq!(sessions.len(), 3);

    let config = MiningConfig {
        min_frequency: 2,
        ..MiningConfig::default()
    };
    let patterns = detect_patterns(&sessions, &config).unwrap();

    // The two process.exit learnings cluster; the refactor note does not
    // reach the threshold alone.
    assert_eq!(patterns.len(), 1);
    let pattern = &patterns[0];
    assert_eq!(pattern.frequency, 2);
    assert_eq!(pattern.error, "process.exit prevents testing");
    assert_eq!(pattern.suggested_resolution, "process.exit prevents testing");

    // Track the detected pattern in long-term history.
    let tracker = PatternTracker::new(dir.path().join(".patterns.json"));
    let today = Utc::now().date_naive();
    let tracked = tracker
        .track_pattern(&pattern.error, Some(&pattern.suggested_resolution), today)
        .unwrap();
    assert_eq!(tracked.frequency, 1);
    assert!(!tracked.documented);

    // Materialize a skill, then record that it exists.
    let skills_dir = dir.path().join("skills");
    let outcome = create_learned_skill(pattern, &skills_dir).unwrap();
    assert!(!outcome.existed);
    assert!(tracker.mark_pattern_documented(&pattern.error).unwrap());
    assert!(tracker.load().patterns[0].documented);

    // Second materialization is a no-op reporting prior existence.
    let written = fs::read_to_string(&outcome.path).unwrap();
    let again = create_learned_skill(pattern, &skills_dir).unwrap();
    assert!(again.existed);
    assert_eq!(fs::read_to_string(&again.path).unwrap(), written);
}

#[test]
fn test_window_excludes_old_learnings() {
    let dir = TempDir::new().unwrap();
    let sessions_dir = dir.path().join("sessions");
    fs::create_dir_all(&sessions_dir).unwrap();

    fs::write(
        sessions_dir.join(format!("{}-old.md", days_ago(120))),
        "# Ancient\n\n**Key Learning:** stale advice from another era\n",
    )
    .unwrap();
    fs::write(
        sessions_dir.join(format!("{}-new.md", days_ago(2))),
        "# Recent\n\n**Key Learning:** fresh observation worth keeping\n",
    )
    .unwrap();

    let sessions = load_recent_sessions(&sessions_dir, 30).unwrap();
    assert_eq!(sessions.len(), 1);

    let config = MiningConfig {
        min_frequency: 1,
        ..MiningConfig::default()
    };
    let patterns = detect_patterns(&sessions, &config).unwrap();
    assert_eq!(patterns.len(), 1);
    assert_eq!(patterns[0].error, "fresh observation worth keeping");
}

#[test]
fn test_custom_learning_marker() {
    let dir = TempDir::new().unwrap();
    let sessions_dir = dir.path().join("sessions");
    fs::create_dir_all(&sessions_dir).unwrap();

    fs::write(
        sessions_dir.join(format!("{}-gotcha.md", days_ago(1))),
        "# Session\n\n**Gotcha:** borrow checker rejects self-referential cache\n",
    )
    .unwrap();

    let sessions = load_recent_sessions(&sessions_dir, 30).unwrap();

    let config = MiningConfig {
        min_frequency: 1,
        learning_pattern: r"\*\*Gotcha:\*\*\s*(.+)".to_string(),
        ..MiningConfig::default()
    };
    let patterns = detect_patterns(&sessions, &config).unwrap();
    assert_eq!(patterns.len(), 1);
    assert!(patterns[0].error.contains("borrow checker"));
}

#[test]
fn test_tracker_frequency_monotonicity_across_runs() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(".patterns.json");
    let first_day = "2026-08-01".parse().unwrap();
    let later_day = "2026-08-04".parse().unwrap();

    let tracker = PatternTracker::new(&path);
    tracker.track_pattern("repeated lesson", None, first_day).unwrap();
    drop(tracker);

    // A fresh tracker over the same document continues the count.
    let tracker = PatternTracker::new(&path);
    let entry = tracker
        .track_pattern("repeated lesson", None, later_day)
        .unwrap();
    assert_eq!(entry.frequency, 2);
    assert_eq!(entry.first_seen, first_day);
    assert_eq!(entry.last_seen, later_day);
}
