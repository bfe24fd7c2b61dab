//! Best-effort markdown extraction.
//!
//! The rebuild pass derives plans and sessions from loosely-structured
//! markdown conventions: author pointer files linking to a plan, plan
//! documents with a leading heading and a bolded `**Status:**` line, and
//! date-prefixed session files. A parse failure is data, not a fault —
//! each extractor returns `Option` and the scan continues.

// Allow expect() on static regex patterns - these are guaranteed to compile
#![allow(clippy::expect_used)]

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

use crate::models::{Plan, PlanStatus, Session};

static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#\s+(.+)$").expect("static regex: heading"));

static STATUS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\*\*Status:\*\*\s*(.+)$").expect("static regex: status"));

static POINTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\*\*(?:Plan|Currently Working On):\*\*\s*\[([^\]]+)\]\(([^)]+)\)")
        .expect("static regex: pointer")
});

static PLAN_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\*\*Plan:\*\*\s*(.+)$").expect("static regex: plan label"));

static TOPIC_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\*\*Topic:\*\*\s*(.+)$").expect("static regex: topic"));

static TOPICS_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\*\*Topics:\*\*\s*(.+)$").expect("static regex: topics"));

static DURATION_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\*\*Duration:\*\*\s*(.+)$").expect("static regex: duration")
});

static PHASES_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\*\*Phases:\*\*\s*(.+)$").expect("static regex: phases"));

static PRIORITY_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\*\*Priority:\*\*\s*(.+)$").expect("static regex: priority")
});

static TYPE_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\*\*Type:\*\*\s*(.+)$").expect("static regex: type"));

static MARKDOWN_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("static regex: link"));

static SESSION_STEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4}-\d{2}-\d{2})(?:[-_](.*))?$").expect("static regex: session stem")
});

/// A pointer file's reference to a plan document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointerRef {
    /// Link text, used as a title fallback.
    pub title: String,
    /// Link target, relative to the pointer file's directory.
    pub target: String,
}

/// Extracts the plan reference from an author pointer file.
///
/// Returns `None` when the content carries no recognizable pointer line.
#[must_use]
pub fn extract_pointer(content: &str) -> Option<PointerRef> {
    POINTER.captures(content).map(|caps| PointerRef {
        title: caps[1].trim().to_string(),
        target: caps[2].trim().to_string(),
    })
}

/// Extracts a plan from a plan document.
///
/// A plan document needs a leading `#` heading and a `**Status:**` line;
/// anything else is skipped. A status value outside the five known states
/// indexes as `Planned` — the file is still a plan.
#[must_use]
pub fn extract_plan_doc(
    id: &str,
    source: &str,
    content: &str,
    author: Option<&str>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
) -> Option<Plan> {
    let title = HEADING.captures(content)?[1].trim().to_string();
    let status_text = STATUS.captures(content)?[1].trim().to_string();
    let status = PlanStatus::parse(&status_text).unwrap_or(PlanStatus::Planned);

    Some(Plan {
        id: id.to_string(),
        title,
        status,
        author: author.map(ToString::to_string),
        created_at,
        updated_at,
        topics: label_list(&TOPICS_LABEL, content),
        description: None,
        source: source.to_string(),
        priority: label_value(&PRIORITY_LABEL, content),
        plan_type: label_value(&TYPE_LABEL, content),
    })
}

/// Extracts a session from a date-prefixed session file.
///
/// The file stem must start with `YYYY-MM-DD`; the heading supplies the
/// topic, falling back to the stem suffix and then the date itself.
#[must_use]
pub fn extract_session(
    stem: &str,
    source: &str,
    content: &str,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
) -> Option<Session> {
    let caps = SESSION_STEM.captures(stem)?;
    let date: NaiveDate = caps[1].parse().ok()?;
    let stem_topic = caps
        .get(2)
        .map(|m| m.as_str().replace(['-', '_'], " ").trim().to_string())
        .filter(|s| !s.is_empty());

    let topic = label_value(&TOPIC_LABEL, content)
        .or_else(|| HEADING.captures(content).map(|c| c[1].trim().to_string()))
        .or(stem_topic)
        .unwrap_or_else(|| date.to_string());

    Some(Session {
        date,
        topic,
        plan_id: extract_plan_reference(content),
        duration: label_value(&DURATION_LABEL, content),
        phases: label_list(&PHASES_LABEL, content),
        topics: label_list(&TOPICS_LABEL, content),
        content: None,
        source: source.to_string(),
        created_at,
        updated_at,
    })
}

/// Extracts the linked plan identifier from a `**Plan:**` line.
///
/// Accepts both a markdown link (the target's file stem becomes the id)
/// and a bare identifier. A dangling reference is surfaced as-is.
#[must_use]
pub fn extract_plan_reference(content: &str) -> Option<String> {
    let value = PLAN_LABEL.captures(content)?[1].trim().to_string();

    if let Some(link) = MARKDOWN_LINK.captures(&value) {
        let target = link[2].trim();
        return Some(file_stem_of(target));
    }

    Some(value)
}

/// Returns the file stem of a path-like reference.
fn file_stem_of(reference: &str) -> String {
    Path::new(reference)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(reference)
        .to_string()
}

/// Reads a single-value bolded label line.
fn label_value(re: &Regex, content: &str) -> Option<String> {
    re.captures(content)
        .map(|c| c[1].trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Reads a comma-separated bolded label line.
fn label_list(re: &Regex, content: &str) -> Vec<String> {
    label_value(re, content)
        .map(|value| {
            value
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

/// Returns (created, updated) timestamps for a file, clamped so updated
/// is never earlier than created. Falls back to now when the filesystem
/// cannot supply them.
#[must_use]
pub fn file_times(path: &Path) -> (DateTime<Utc>, DateTime<Utc>) {
    let now = Utc::now();
    let Ok(metadata) = std::fs::metadata(path) else {
        return (now, now);
    };

    let updated = metadata
        .modified()
        .map_or(now, DateTime::<Utc>::from);
    let created = metadata
        .created()
        .map_or(updated, DateTime::<Utc>::from)
        .min(updated);

    (created, updated)
}
