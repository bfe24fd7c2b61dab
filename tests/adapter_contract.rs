//! Contract tests for the storage adapter trait.
//!
//! Both backends sit behind `Box<dyn StorageAdapter>` here; the
//! assertions only go through the trait so the backends stay honestly
//! interchangeable.
#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::uninlined_format_args
)]

use chrono::{TimeZone, Utc};
use devlore::storage::{BackendKind, SqliteBackend, StorageAdapter, open_adapter};
use devlore::{DevloreConfig, Error, Plan, PlanFilter, PlanStatus, SearchScope, SessionFilter};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(dir: &Path, name: &str, content: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn plan(id: &str, status: PlanStatus, author: &str, day: u32) -> Plan {
    let stamp = Utc.with_ymd_and_hms(2026, 3, day, 12, 0, 0).single().unwrap();
    Plan {
        id: id.to_string(),
        title: format!("Plan {id}"),
        status,
        author: Some(author.to_string()),
        created_at: stamp,
        updated_at: stamp,
        topics: Vec::new(),
        description: Some("plan body".to_string()),
        source: format!("plans/{id}.md"),
        priority: None,
        plan_type: None,
    }
}

/// Seeds the five-plan fixture: 2 active/dana, 1 active/kim, 2 complete/dana.
fn seeded_sqlite(dir: &TempDir) -> Box<dyn StorageAdapter> {
    let backend = SqliteBackend::new("contract");
    backend.init(dir.path()).unwrap();
    backend
        .insert_plan(&plan("active-old", PlanStatus::Active, "dana", 1))
        .unwrap();
    backend
        .insert_plan(&plan("active-new", PlanStatus::Active, "dana", 9))
        .unwrap();
    backend
        .insert_plan(&plan("active-kim", PlanStatus::Active, "kim", 5))
        .unwrap();
    backend
        .insert_plan(&plan("done-a", PlanStatus::Complete, "dana", 3))
        .unwrap();
    backend
        .insert_plan(&plan("done-b", PlanStatus::Complete, "dana", 7))
        .unwrap();
    Box::new(backend)
}

#[test]
fn test_status_and_author_filter_scenario() {
    let dir = TempDir::new().unwrap();
    let adapter = seeded_sqlite(&dir);

    let result = adapter
        .query_plans(
            &PlanFilter::new()
                .with_status(PlanStatus::Active)
                .with_author("dana"),
        )
        .unwrap();

    assert_eq!(result.count, 2);
    // Most-recently-updated first.
    assert_eq!(result.plans[0].id, "active-new");
    assert_eq!(result.plans[1].id, "active-old");
    for p in &result.plans {
        assert_eq!(p.status, PlanStatus::Active);
        assert_eq!(p.author.as_deref(), Some("dana"));
    }
}

#[test]
fn test_status_filter_holds_for_every_result() {
    let dir = TempDir::new().unwrap();
    let adapter = seeded_sqlite(&dir);

    for status in [PlanStatus::Active, PlanStatus::Complete, PlanStatus::Paused] {
        let result = adapter
            .query_plans(&PlanFilter::new().with_status(status))
            .unwrap();
        for p in &result.plans {
            assert_eq!(p.status, status);
        }
    }
}

#[test]
fn test_not_initialized_fails_loudly_on_both_backends() {
    let config = DevloreConfig::default();
    for kind in [BackendKind::FileIndex, BackendKind::Sqlite] {
        let adapter = open_adapter(kind, &config);
        let err = adapter.query_plans(&PlanFilter::new()).unwrap_err();
        assert!(
            matches!(err, Error::NotInitialized { .. }),
            "{} backend must fail loudly, got: {err}",
            kind.as_str()
        );
        let err = adapter.search("q", SearchScope::All).unwrap_err();
        assert!(matches!(err, Error::NotInitialized { .. }));
        let err = adapter.rebuild_index().unwrap_err();
        assert!(matches!(err, Error::NotInitialized { .. }));
        // close before init stays safe.
        adapter.close().unwrap();
    }
}

#[test]
fn test_init_and_close_are_idempotent_on_both_backends() {
    let config = DevloreConfig::default();
    for kind in [BackendKind::FileIndex, BackendKind::Sqlite] {
        let dir = TempDir::new().unwrap();
        let adapter = open_adapter(kind, &config);
        adapter.init(dir.path()).unwrap();
        adapter.init(dir.path()).unwrap();
        adapter.close().unwrap();
        adapter.close().unwrap();
    }
}

#[test]
fn test_empty_filters_return_everything() {
    let dir = TempDir::new().unwrap();
    let adapter = seeded_sqlite(&dir);

    let plans = adapter.query_plans(&PlanFilter::new()).unwrap();
    assert_eq!(plans.count, 5);
    assert_eq!(plans.count, plans.plans.len());

    let sessions = adapter.query_sessions(&SessionFilter::new()).unwrap();
    assert_eq!(sessions.count, 0);
}

#[test]
fn test_file_backend_honors_same_contract() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "plans/dana.md",
        "# dana\n\n**Plan:** [Active plan](./active-plan.md)\n",
    );
    write(
        dir.path(),
        "plans/active-plan.md",
        "# Active plan\n\n**Status:** Active\n",
    );
    write(
        dir.path(),
        "plans/finished.md",
        "# Finished work\n\n**Status:** Complete\n",
    );

    let config = DevloreConfig::default();
    let adapter = open_adapter(BackendKind::FileIndex, &config);
    adapter.init(dir.path()).unwrap();
    let counts = adapter.rebuild_index().unwrap();
    assert_eq!(counts.plans, 2);

    let active = adapter
        .query_plans(
            &PlanFilter::new()
                .with_status(PlanStatus::Active)
                .with_author("dana"),
        )
        .unwrap();
    assert_eq!(active.count, 1);
    assert_eq!(active.plans[0].id, "active-plan");

    let complete = adapter
        .query_plans(&PlanFilter::new().with_status(PlanStatus::Complete))
        .unwrap();
    assert_eq!(complete.count, 1);
    assert!(complete.plans[0].author.is_none());
}

#[test]
fn test_search_orders_by_descending_relevance() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "sessions/2026-08-01-notes.md",
        "# Notes\n\ncache cache cache\nsingle cache mention\n",
    );

    let config = DevloreConfig::default();
    let adapter = open_adapter(BackendKind::FileIndex, &config);
    adapter.init(dir.path()).unwrap();

    let matches = adapter.search("cache", SearchScope::All).unwrap();
    assert!(matches.len() >= 2);
    for pair in matches.windows(2) {
        assert!(pair[0].relevance >= pair[1].relevance);
    }
}
