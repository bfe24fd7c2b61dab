//! Search types and query projections.

use serde::{Deserialize, Serialize};

use super::{Plan, Session};

/// Which entity kinds a full-text search covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchScope {
    /// Every entity kind.
    #[default]
    All,
    /// Plans only.
    Plans,
    /// Sessions only.
    Sessions,
    /// Learned-pattern documents only.
    Learned,
    /// Essential reference documents at the knowledge root.
    Essentials,
}

impl SearchScope {
    /// Returns the scope as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Plans => "plans",
            Self::Sessions => "sessions",
            Self::Learned => "learned",
            Self::Essentials => "essentials",
        }
    }

    /// Parses a scope string, defaulting to `All` for unknown values.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "plans" => Self::Plans,
            "sessions" => Self::Sessions,
            "learned" => Self::Learned,
            "essentials" => Self::Essentials,
            _ => Self::All,
        }
    }
}

/// The entity kind a search match came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    /// A plan document.
    Plan,
    /// A session log.
    Session,
    /// A learned-pattern document.
    Learned,
    /// An essentials document.
    Essentials,
}

impl MatchKind {
    /// Returns the kind as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Plan => "plan",
            Self::Session => "session",
            Self::Learned => "learned",
            Self::Essentials => "essentials",
        }
    }
}

/// One full-text match. Produced fresh per query; never persisted.
#[derive(Debug, Clone)]
pub struct SearchMatch {
    /// Source reference of the matched document.
    pub source: String,
    /// 1-based line number, or 1 when the backend cannot attribute lines.
    pub line: usize,
    /// Short context snippet around the match.
    pub context: String,
    /// Relevance score; results are ordered descending by this value.
    pub relevance: f32,
    /// Which entity kind produced the match.
    pub kind: MatchKind,
}

/// Result of a filtered plan query.
#[derive(Debug, Clone)]
pub struct PlanQuery {
    /// Number of matching plans.
    pub count: usize,
    /// Matching plans, most-recently-updated first.
    pub plans: Vec<Plan>,
}

/// Result of a filtered session query.
#[derive(Debug, Clone)]
pub struct SessionQuery {
    /// Number of matching sessions.
    pub count: usize,
    /// Matching sessions, most-recent date first.
    pub sessions: Vec<Session>,
}

/// Entity counts reported by an index rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IndexCounts {
    /// Plans indexed.
    pub plans: usize,
    /// Sessions indexed.
    pub sessions: usize,
    /// Learned-pattern entries indexed.
    pub learned: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("plans", SearchScope::Plans)]
    #[test_case("SESSIONS", SearchScope::Sessions)]
    #[test_case("learned", SearchScope::Learned)]
    #[test_case("essentials", SearchScope::Essentials)]
    #[test_case("anything-else", SearchScope::All)]
    fn test_scope_parse(input: &str, expected: SearchScope) {
        assert_eq!(SearchScope::parse(input), expected);
    }

    #[test]
    fn test_round_trip_labels() {
        for scope in [
            SearchScope::Plans,
            SearchScope::Sessions,
            SearchScope::Learned,
            SearchScope::Essentials,
        ] {
            assert_eq!(SearchScope::parse(scope.as_str()), scope);
        }
    }
}
