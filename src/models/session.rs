//! Session types and filters.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::plan::topic_matches;

/// A dated record of work performed, optionally linked to a plan.
///
/// Sessions are append-only in spirit; the store permits metadata patches
/// but never rewrites the underlying log files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Calendar day of the session.
    pub date: NaiveDate,
    /// Topic or title of the session.
    pub topic: String,
    /// Linked plan identifier. A dangling reference is surfaced as-is,
    /// never treated as an error.
    #[serde(default)]
    pub plan_id: Option<String>,
    /// Free-form duration label (e.g. "2h30m").
    #[serde(default)]
    pub duration: Option<String>,
    /// Ordered phase labels for the session.
    #[serde(default)]
    pub phases: Vec<String>,
    /// Topic tags, in source order.
    #[serde(default)]
    pub topics: Vec<String>,
    /// Full log body. The heavy field: metadata-only query variants leave
    /// it `None`, and the file index never stores it.
    #[serde(default)]
    pub content: Option<String>,
    /// Source reference (file path or virtual path).
    pub source: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-updated timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Filter criteria for session queries.
///
/// Omitted predicates impose no constraint; supplied predicates combine
/// with AND semantics.
#[derive(Debug, Clone, Default)]
pub struct SessionFilter {
    /// Exact calendar-day match.
    pub date: Option<NaiveDate>,
    /// Only sessions on or after this day.
    pub date_after: Option<NaiveDate>,
    /// Only sessions on or before this day.
    pub date_before: Option<NaiveDate>,
    /// Only sessions within the trailing N days.
    pub last_days: Option<u32>,
    /// Case-insensitive substring match against topic or any topic tag.
    pub topic: Option<String>,
    /// Exact linked-plan identifier match.
    pub plan_id: Option<String>,
}

impl SessionFilter {
    /// Creates an empty filter (matches all).
    #[must_use]
    pub const fn new() -> Self {
        Self {
            date: None,
            date_after: None,
            date_before: None,
            last_days: None,
            topic: None,
            plan_id: None,
        }
    }

    /// Adds an exact-date predicate.
    #[must_use]
    pub const fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Adds a date-after predicate.
    #[must_use]
    pub const fn with_date_after(mut self, date: NaiveDate) -> Self {
        self.date_after = Some(date);
        self
    }

    /// Adds a date-before predicate.
    #[must_use]
    pub const fn with_date_before(mut self, date: NaiveDate) -> Self {
        self.date_before = Some(date);
        self
    }

    /// Adds a trailing-window predicate.
    #[must_use]
    pub const fn with_last_days(mut self, days: u32) -> Self {
        self.last_days = Some(days);
        self
    }

    /// Adds a topic predicate.
    #[must_use]
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// Adds a linked-plan predicate.
    #[must_use]
    pub fn with_plan_id(mut self, plan_id: impl Into<String>) -> Self {
        self.plan_id = Some(plan_id.into());
        self
    }

    /// Returns true if the filter is empty (matches all).
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.date.is_none()
            && self.date_after.is_none()
            && self.date_before.is_none()
            && self.last_days.is_none()
            && self.topic.is_none()
            && self.plan_id.is_none()
    }

    /// Evaluates every supplied predicate against a session.
    ///
    /// `today` anchors the `last_days` window so results are deterministic
    /// under test.
    #[must_use]
    pub fn matches(&self, session: &Session, today: NaiveDate) -> bool {
        if let Some(date) = self.date {
            if session.date != date {
                return false;
            }
        }
        if let Some(after) = self.date_after {
            if session.date < after {
                return false;
            }
        }
        if let Some(before) = self.date_before {
            if session.date > before {
                return false;
            }
        }
        if let Some(days) = self.last_days {
            let cutoff = today - Duration::days(i64::from(days));
            if session.date < cutoff {
                return false;
            }
        }
        if let Some(ref topic) = self.topic {
            if !topic_matches(topic, &session.topic, &session.topics) {
                return false;
            }
        }
        if let Some(ref plan_id) = self.plan_id {
            if session.plan_id.as_deref() != Some(plan_id.as_str()) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_session(date: &str, topic: &str, plan_id: Option<&str>) -> Session {
        Session {
            date: date.parse().unwrap(),
            topic: topic.to_string(),
            plan_id: plan_id.map(ToString::to_string),
            duration: None,
            phases: Vec::new(),
            topics: vec!["storage".to_string()],
            content: None,
            source: format!("sessions/{date}.md"),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_exact_date() {
        let session = sample_session("2026-08-01", "index rebuild", None);
        let today = "2026-08-06".parse().unwrap();

        let filter = SessionFilter::new().with_date("2026-08-01".parse().unwrap());
        assert!(filter.matches(&session, today));

        let filter = SessionFilter::new().with_date("2026-08-02".parse().unwrap());
        assert!(!filter.matches(&session, today));
    }

    #[test]
    fn test_last_days_window() {
        let today: NaiveDate = "2026-08-06".parse().unwrap();
        let recent = sample_session("2026-08-01", "recent work", None);
        let old = sample_session("2026-06-01", "old work", None);

        let filter = SessionFilter::new().with_last_days(30);
        assert!(filter.matches(&recent, today));
        assert!(!filter.matches(&old, today));
    }

    #[test]
    fn test_topic_case_insensitive() {
        let session = sample_session("2026-08-01", "Index Rebuild", None);
        let today = "2026-08-06".parse().unwrap();

        assert!(
            SessionFilter::new()
                .with_topic("rebuild")
                .matches(&session, today)
        );
        assert!(
            SessionFilter::new()
                .with_topic("STORAGE")
                .matches(&session, today)
        );
        assert!(
            !SessionFilter::new()
                .with_topic("frontend")
                .matches(&session, today)
        );
    }

    #[test]
    fn test_plan_link() {
        let linked = sample_session("2026-08-01", "work", Some("auth-rework"));
        let unlinked = sample_session("2026-08-02", "work", None);
        let today = "2026-08-06".parse().unwrap();

        let filter = SessionFilter::new().with_plan_id("auth-rework");
        assert!(filter.matches(&linked, today));
        assert!(!filter.matches(&unlinked, today));
    }
}
