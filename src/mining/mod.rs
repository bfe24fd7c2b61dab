//! Pattern mining pipeline.
//!
//! Independent of the storage adapters: loads recent session logs,
//! extracts "learning" annotations, clusters them by approximate keyword
//! similarity, tracks long-term frequency in its own persisted store, and
//! materializes a durable skill artifact once a pattern crosses a
//! frequency threshold.
//!
//! Pipeline order: [`load_recent_sessions`] →
//! [`extract_learning_clusters`]/[`detect_patterns`] →
//! [`PatternTracker::track_pattern`] → [`create_learned_skill`].

mod detector;
mod loader;
mod skill;
mod tracker;

pub use detector::{
    SIMILARITY_THRESHOLD, detect_patterns, extract_learning_clusters, keyword_signature,
    signature_similarity,
};
pub use loader::{SessionLog, load_recent_sessions};
pub use skill::{SkillOutcome, create_learned_skill, slugify};
pub use tracker::PatternTracker;
