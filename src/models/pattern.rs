//! Pattern types for the mining pipeline.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A recurring textual observation tracked across sessions.
///
/// Invariants maintained by [`crate::mining::PatternTracker`]:
/// frequency only increases, `first_seen <= last_seen`, the keyword set
/// only grows, and `documented` flips to true exactly once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackedPattern {
    /// Identifier: a slug derived from the observation text.
    pub id: String,
    /// Canonical observation text.
    pub error: String,
    /// How many times the observation has been recorded.
    pub frequency: u32,
    /// Day the observation was first recorded.
    pub first_seen: NaiveDate,
    /// Day the observation was most recently recorded.
    pub last_seen: NaiveDate,
    /// Whether a skill artifact has been materialized for this pattern.
    #[serde(default)]
    pub documented: bool,
    /// Distinct resolution texts, in recording order.
    #[serde(default)]
    pub resolutions: Vec<String>,
    /// Keyword set associated with the observation.
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// The pattern-history document persisted by the tracker.
///
/// Owned solely by the mining pipeline and fully rewritten on every
/// tracking call; the storage adapter backends never touch it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatternHistory {
    /// All tracked patterns.
    #[serde(default)]
    pub patterns: Vec<TrackedPattern>,
}

/// A structured before/after example attached to a skill artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillExample {
    /// The problematic form.
    pub before: String,
    /// The corrected form.
    pub after: String,
}

/// A cluster of similar observations produced by pattern detection.
#[derive(Debug, Clone)]
pub struct DetectedPattern {
    /// Cluster identifier: the first three keywords joined with spaces.
    pub id: String,
    /// Canonical observation text (the first observation in the cluster).
    pub error: String,
    /// Number of observations merged into this cluster.
    pub frequency: u32,
    /// Earliest session day contributing to the cluster.
    pub first_seen: NaiveDate,
    /// Latest session day contributing to the cluster.
    pub last_seen: NaiveDate,
    /// Every observation text merged into the cluster, in order.
    pub resolutions: Vec<String>,
    /// Union of keyword signatures across the cluster.
    pub keywords: Vec<String>,
    /// Suggested resolution for documentation: the first recorded example.
    pub suggested_resolution: String,
    /// Structured examples supplied by a curator, if any. Detection never
    /// fills these; they flow through to skill rendering.
    pub examples: Vec<SkillExample>,
    /// Related skill names to link from the rendered artifact.
    pub related: Vec<String>,
}
