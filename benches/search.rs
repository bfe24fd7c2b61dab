//! Benchmarks for full-text search on both backends.

// Criterion macros generate items without docs - this is expected for benchmarks
// Benchmarks use expect/unwrap for simplicity - panics are acceptable in benchmarks
#![allow(missing_docs)]
#![allow(clippy::expect_used, clippy::unwrap_used)]

use criterion::{Criterion, criterion_group, criterion_main};
use std::fs;
use std::hint::black_box;
use tempfile::TempDir;

use chrono::Utc;
use devlore::storage::{FileIndexBackend, SqliteBackend, StorageAdapter};
use devlore::{SearchScope, Session};

const SESSION_COUNT: usize = 200;

fn file_backend_fixture(dir: &TempDir) -> FileIndexBackend {
    let sessions = dir.path().join("sessions");
    fs::create_dir_all(&sessions).unwrap();
    for i in 0..SESSION_COUNT {
        fs::write(
            sessions.join(format!("2026-01-{:02}-s{i}.md", (i % 28) + 1)),
            format!(
                "# Session {i}\n\nWorked on the storage index today.\n\
                 The cache layer needs another look.\nLine without keywords.\n"
            ),
        )
        .unwrap();
    }

    let backend = FileIndexBackend::new();
    backend.init(dir.path()).unwrap();
    backend
}

fn sqlite_backend_fixture(dir: &TempDir) -> SqliteBackend {
    let backend = SqliteBackend::new("bench");
    backend.init(dir.path()).unwrap();
    for i in 0..SESSION_COUNT {
        let date = format!("2026-01-{:02}", (i % 28) + 1);
        backend
            .insert_session(&Session {
                date: date.parse().unwrap(),
                topic: format!("session {i}"),
                plan_id: None,
                duration: None,
                phases: Vec::new(),
                topics: Vec::new(),
                content: Some(format!(
                    "Worked on the storage index today. The cache layer needs another look. {i}"
                )),
                source: format!("sessions/{date}-s{i}.md"),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            })
            .unwrap();
    }
    backend
}

fn bench_search(c: &mut Criterion) {
    let file_dir = TempDir::new().unwrap();
    let file_backend = file_backend_fixture(&file_dir);

    let sqlite_dir = TempDir::new().unwrap();
    let sqlite_backend = sqlite_backend_fixture(&sqlite_dir);

    c.bench_function("file_index_search", |b| {
        b.iter(|| {
            let matches = file_backend
                .search(black_box("cache layer"), SearchScope::Sessions)
                .unwrap();
            black_box(matches)
        });
    });

    c.bench_function("sqlite_fts_search", |b| {
        b.iter(|| {
            let matches = sqlite_backend
                .search(black_box("cache layer"), SearchScope::Sessions)
                .unwrap();
            black_box(matches)
        });
    });
}

criterion_group!(benches, bench_search);
criterion_main!(benches);
