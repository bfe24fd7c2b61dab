//! Plan types and filters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanStatus {
    /// Work is actively in progress.
    Active,
    /// Work was started and intentionally set aside.
    Paused,
    /// Work is queued but not started.
    Planned,
    /// Work is finished.
    Complete,
    /// Work was abandoned.
    Cancelled,
}

impl PlanStatus {
    /// Returns the status as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Planned => "planned",
            Self::Complete => "complete",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parses a status string, case-insensitively.
    ///
    /// Returns `None` for values outside the five known states; callers
    /// decide whether to skip or default.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "active" | "in progress" | "in-progress" => Some(Self::Active),
            "paused" | "on hold" | "on-hold" => Some(Self::Paused),
            "planned" | "todo" | "pending" => Some(Self::Planned),
            "complete" | "completed" | "done" => Some(Self::Complete),
            "cancelled" | "canceled" | "abandoned" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

/// A tracked unit of intended or completed work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    /// Identifier, unique within a project (usually the source file stem).
    pub id: String,
    /// Human-readable title.
    pub title: String,
    /// Current lifecycle status.
    pub status: PlanStatus,
    /// Author, when known (derived from pointer files).
    #[serde(default)]
    pub author: Option<String>,
    /// Creation timestamp. Never later than `updated_at`.
    pub created_at: DateTime<Utc>,
    /// Last-updated timestamp.
    pub updated_at: DateTime<Utc>,
    /// Topic tags, in source order.
    #[serde(default)]
    pub topics: Vec<String>,
    /// Free-text description or full document body. The heavy field:
    /// metadata-only query variants leave it `None`.
    #[serde(default)]
    pub description: Option<String>,
    /// Source reference (file path or virtual path).
    pub source: String,
    /// Optional priority tag.
    #[serde(default)]
    pub priority: Option<String>,
    /// Optional type tag (e.g. "feature", "refactor").
    #[serde(default, rename = "type")]
    pub plan_type: Option<String>,
}

/// Filter criteria for plan queries.
///
/// Omitted predicates impose no constraint; supplied predicates combine
/// with AND semantics.
#[derive(Debug, Clone, Default)]
pub struct PlanFilter {
    /// Exact status match.
    pub status: Option<PlanStatus>,
    /// Exact author match.
    pub author: Option<String>,
    /// Case-insensitive substring match against title or any topic tag.
    pub topic: Option<String>,
    /// Only plans updated at or after this instant.
    pub updated_after: Option<DateTime<Utc>>,
    /// Only plans updated at or before this instant.
    pub updated_before: Option<DateTime<Utc>>,
}

impl PlanFilter {
    /// Creates an empty filter (matches all).
    #[must_use]
    pub const fn new() -> Self {
        Self {
            status: None,
            author: None,
            topic: None,
            updated_after: None,
            updated_before: None,
        }
    }

    /// Adds a status predicate.
    #[must_use]
    pub const fn with_status(mut self, status: PlanStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Adds an author predicate.
    #[must_use]
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Adds a topic predicate.
    #[must_use]
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// Adds an updated-after predicate.
    #[must_use]
    pub const fn with_updated_after(mut self, instant: DateTime<Utc>) -> Self {
        self.updated_after = Some(instant);
        self
    }

    /// Adds an updated-before predicate.
    #[must_use]
    pub const fn with_updated_before(mut self, instant: DateTime<Utc>) -> Self {
        self.updated_before = Some(instant);
        self
    }

    /// Returns true if the filter is empty (matches all).
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.author.is_none()
            && self.topic.is_none()
            && self.updated_after.is_none()
            && self.updated_before.is_none()
    }

    /// Evaluates every supplied predicate against a plan.
    #[must_use]
    pub fn matches(&self, plan: &Plan) -> bool {
        if let Some(status) = self.status {
            if plan.status != status {
                return false;
            }
        }
        if let Some(ref author) = self.author {
            if plan.author.as_deref() != Some(author.as_str()) {
                return false;
            }
        }
        if let Some(ref topic) = self.topic {
            if !topic_matches(topic, &plan.title, &plan.topics) {
                return false;
            }
        }
        if let Some(after) = self.updated_after {
            if plan.updated_at < after {
                return false;
            }
        }
        if let Some(before) = self.updated_before {
            if plan.updated_at > before {
                return false;
            }
        }
        true
    }
}

/// Case-insensitive substring match against a title and a tag list.
pub(crate) fn topic_matches(needle: &str, title: &str, tags: &[String]) -> bool {
    let needle = needle.to_lowercase();
    title.to_lowercase().contains(&needle)
        || tags.iter().any(|t| t.to_lowercase().contains(&needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use test_case::test_case;

    fn sample_plan() -> Plan {
        Plan {
            id: "auth-rework".to_string(),
            title: "Rework authentication flow".to_string(),
            status: PlanStatus::Active,
            author: Some("dana".to_string()),
            created_at: Utc.with_ymd_and_hms(2026, 1, 10, 9, 0, 0).single().unwrap(),
            updated_at: Utc.with_ymd_and_hms(2026, 2, 1, 9, 0, 0).single().unwrap(),
            topics: vec!["auth".to_string(), "security".to_string()],
            description: None,
            source: "plans/auth-rework.md".to_string(),
            priority: None,
            plan_type: None,
        }
    }

    #[test_case("ACTIVE", Some(PlanStatus::Active); "uppercase active")]
    #[test_case("Complete", Some(PlanStatus::Complete); "mixed case complete")]
    #[test_case("done", Some(PlanStatus::Complete); "done alias")]
    #[test_case("on hold", Some(PlanStatus::Paused); "on hold alias")]
    #[test_case("someday", None; "unknown value")]
    fn test_status_parse(input: &str, expected: Option<PlanStatus>) {
        assert_eq!(PlanStatus::parse(input), expected);
    }

    #[test]
    fn test_empty_filter_matches_all() {
        let filter = PlanFilter::new();
        assert!(filter.is_empty());
        assert!(filter.matches(&sample_plan()));
    }

    #[test]
    fn test_filter_and_semantics() {
        let plan = sample_plan();

        let filter = PlanFilter::new()
            .with_status(PlanStatus::Active)
            .with_author("dana");
        assert!(filter.matches(&plan));

        let filter = PlanFilter::new()
            .with_status(PlanStatus::Active)
            .with_author("someone-else");
        assert!(!filter.matches(&plan));
    }

    #[test]
    fn test_topic_matches_title_and_tags() {
        let plan = sample_plan();
        assert!(PlanFilter::new().with_topic("AUTH").matches(&plan));
        assert!(PlanFilter::new().with_topic("security").matches(&plan));
        assert!(!PlanFilter::new().with_topic("frontend").matches(&plan));
    }

    #[test]
    fn test_updated_window() {
        let plan = sample_plan();
        let jan = Utc.with_ymd_and_hms(2026, 1, 15, 0, 0, 0).single().unwrap();
        let mar = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).single().unwrap();

        assert!(PlanFilter::new().with_updated_after(jan).matches(&plan));
        assert!(!PlanFilter::new().with_updated_after(mar).matches(&plan));
        assert!(PlanFilter::new().with_updated_before(mar).matches(&plan));
        assert!(!PlanFilter::new().with_updated_before(jan).matches(&plan));
    }
}
