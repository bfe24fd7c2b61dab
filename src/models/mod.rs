//! Data models for devlore.
//!
//! This module contains all the core data structures used throughout the system.

mod pattern;
mod plan;
mod search;
mod session;

pub use pattern::{DetectedPattern, PatternHistory, SkillExample, TrackedPattern};
pub use plan::{Plan, PlanFilter, PlanStatus};
pub use search::{IndexCounts, MatchKind, PlanQuery, SearchMatch, SearchScope, SessionQuery};
pub use session::{Session, SessionFilter};
