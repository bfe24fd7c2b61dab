//! Row structs and row-to-model mapping.

use chrono::{DateTime, NaiveDate, Utc};

use crate::models::{Plan, PlanStatus, Session};

/// Flat plan row as read from the database.
pub struct PlanRow {
    /// Plan identifier within the project.
    pub slug: String,
    /// Plan title.
    pub title: String,
    /// Raw status text.
    pub status: String,
    /// Author, when recorded.
    pub author: Option<String>,
    /// Priority tag.
    pub priority: Option<String>,
    /// Type tag.
    pub plan_type: Option<String>,
    /// Comma-joined topic list.
    pub topics: Option<String>,
    /// Heavy content column; `None` for metadata-only queries.
    pub content: Option<String>,
    /// Source reference.
    pub source: String,
    /// Stored creation timestamp.
    pub created_at: String,
    /// Stored update timestamp.
    pub updated_at: String,
}

/// Flat session row as read from the database.
pub struct SessionRow {
    /// Stored calendar day.
    pub date: String,
    /// Session topic.
    pub topic: String,
    /// Linked plan identifier.
    pub plan_slug: Option<String>,
    /// Free-form duration label.
    pub duration: Option<String>,
    /// Comma-joined phase list.
    pub phases: Option<String>,
    /// Comma-joined topic list.
    pub topics: Option<String>,
    /// Heavy content column; `None` for metadata-only queries.
    pub content: Option<String>,
    /// Source reference.
    pub source: String,
    /// Stored creation timestamp.
    pub created_at: String,
    /// Stored update timestamp.
    pub updated_at: String,
}

/// Parses a stored timestamp, defaulting to the epoch on mismatch.
///
/// Stored values are produced by this crate; a mismatch means external
/// edits, which degrade to a harmless default rather than failing the row.
fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_default()
}

/// Parses a stored calendar day, defaulting to the epoch day on mismatch.
fn parse_date(value: &str) -> NaiveDate {
    value.parse().unwrap_or_default()
}

/// Splits a stored comma-joined list.
fn split_list(value: Option<String>) -> Vec<String> {
    value
        .map(|t| {
            t.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

impl PlanRow {
    /// Converts the row into a [`Plan`].
    pub fn into_plan(self) -> Plan {
        let status = PlanStatus::parse(&self.status).unwrap_or(PlanStatus::Planned);
        let created_at = parse_timestamp(&self.created_at);
        let updated_at = parse_timestamp(&self.updated_at).max(created_at);

        Plan {
            id: self.slug,
            title: self.title,
            status,
            author: self.author,
            created_at,
            updated_at,
            topics: split_list(self.topics),
            description: self.content,
            source: self.source,
            priority: self.priority,
            plan_type: self.plan_type,
        }
    }
}

impl SessionRow {
    /// Converts the row into a [`Session`].
    pub fn into_session(self) -> Session {
        let created_at = parse_timestamp(&self.created_at);
        let updated_at = parse_timestamp(&self.updated_at).max(created_at);

        Session {
            date: parse_date(&self.date),
            topic: self.topic,
            plan_id: self.plan_slug,
            duration: self.duration,
            phases: split_list(self.phases),
            topics: split_list(self.topics),
            content: self.content,
            source: self.source,
            created_at,
            updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_row_mapping() {
        let row = PlanRow {
            slug: "auth-rework".to_string(),
            title: "Auth rework".to_string(),
            status: "active".to_string(),
            author: Some("dana".to_string()),
            priority: None,
            plan_type: None,
            topics: Some("auth, security".to_string()),
            content: Some("body".to_string()),
            source: "plans/auth-rework.md".to_string(),
            created_at: "2026-01-10T09:00:00.000Z".to_string(),
            updated_at: "2026-02-01T09:00:00.000Z".to_string(),
        };

        let plan = row.into_plan();
        assert_eq!(plan.id, "auth-rework");
        assert_eq!(plan.status, PlanStatus::Active);
        assert_eq!(plan.topics, vec!["auth", "security"]);
        assert!(plan.created_at <= plan.updated_at);
    }

    #[test]
    fn test_unknown_status_degrades_to_planned() {
        let row = PlanRow {
            slug: "x".to_string(),
            title: "x".to_string(),
            status: "garbled".to_string(),
            author: None,
            priority: None,
            plan_type: None,
            topics: None,
            content: None,
            source: "x.md".to_string(),
            created_at: "not a time".to_string(),
            updated_at: "not a time".to_string(),
        };

        let plan = row.into_plan();
        assert_eq!(plan.status, PlanStatus::Planned);
        assert!(plan.topics.is_empty());
    }

    #[test]
    fn test_session_row_mapping() {
        let row = SessionRow {
            date: "2026-08-01".to_string(),
            topic: "indexing".to_string(),
            plan_slug: Some("auth-rework".to_string()),
            duration: Some("2h".to_string()),
            phases: Some("explore, verify".to_string()),
            topics: None,
            content: Some("log body".to_string()),
            source: "sessions/2026-08-01.md".to_string(),
            created_at: "2026-08-01T10:00:00.000Z".to_string(),
            updated_at: "2026-08-01T12:00:00.000Z".to_string(),
        };

        let session = row.into_session();
        assert_eq!(session.date.to_string(), "2026-08-01");
        assert_eq!(session.plan_id.as_deref(), Some("auth-rework"));
        assert_eq!(session.phases, vec!["explore", "verify"]);
    }
}
