//! Learning extraction and keyword-signature clustering.
//!
//! Observations are freeform text; exact matching would fragment the same
//! lesson phrased three different ways into three patterns. Instead each
//! observation gets a short keyword signature and merges into the closest
//! existing cluster above a similarity threshold. The cluster scan is
//! linear per observation, which is fine at local-tool scale.

use chrono::{NaiveDate, Utc};
use regex::Regex;

use crate::config::MiningConfig;
use crate::models::DetectedPattern;
use crate::{Error, Result};

use super::loader::SessionLog;

/// Minimum similarity for an observation to merge into a cluster.
pub const SIMILARITY_THRESHOLD: f64 = 0.4;

/// Maximum keywords in a signature.
const SIGNATURE_LEN: usize = 5;

/// Keywords used to key a new cluster.
const CLUSTER_KEY_LEN: usize = 3;

/// Words too common to distinguish observations. Tokens shorter than four
/// characters never reach this list.
const STOPWORDS: &[&str] = &[
    "that", "this", "with", "from", "when", "then", "than", "have", "will", "been", "were",
    "does", "only", "into", "over", "just", "like", "also", "very", "them", "they", "your",
    "what", "which", "would", "could", "should", "there", "their", "where", "while", "about",
    "after", "before", "because", "every", "still", "some", "more", "most", "each", "other",
];

/// Builds a keyword signature: the first distinct lowercase words of
/// length ≥ 4, stopwords excluded, capped at five.
#[must_use]
pub fn keyword_signature(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    let mut signature: Vec<String> = Vec::with_capacity(SIGNATURE_LEN);

    for word in lower.split(|c: char| !c.is_alphanumeric()) {
        if word.len() < 4 || STOPWORDS.contains(&word) {
            continue;
        }
        if signature.iter().any(|s| s == word) {
            continue;
        }
        signature.push(word.to_string());
        if signature.len() == SIGNATURE_LEN {
            break;
        }
    }

    signature
}

/// Similarity of two keyword signatures: shared keywords over the larger
/// signature. Two 5-keyword signatures sharing two terms score 0.4 and
/// merge; sharing one term scores 0.2 and stays separate.
#[must_use]
pub fn signature_similarity(a: &[String], b: &[String]) -> f64 {
    let larger = a.len().max(b.len());
    if larger == 0 {
        return 0.0;
    }
    let shared = a.iter().filter(|word| b.contains(word)).count();
    shared as f64 / larger as f64
}

struct Observation {
    text: String,
    date: NaiveDate,
}

/// Pulls every learning annotation out of the loaded sessions.
fn extract_observations(sessions: &[SessionLog], pattern: &Regex) -> Vec<Observation> {
    let today = Utc::now().date_naive();
    let mut observations = Vec::new();

    for session in sessions {
        let date = session.date.unwrap_or(today);
        for caps in pattern.captures_iter(&session.content) {
            if let Some(text) = caps.get(1) {
                let text = text.as_str().trim();
                if !text.is_empty() {
                    observations.push(Observation {
                        text: text.to_string(),
                        date,
                    });
                }
            }
        }
    }

    observations
}

/// Clusters every learning annotation in the given sessions, regardless
/// of frequency.
///
/// Each observation merges into the best-matching existing cluster at or
/// above [`SIMILARITY_THRESHOLD`], incrementing its frequency, extending
/// its last-seen date, appending the observation as a resolution example,
/// and unioning in new keywords. Otherwise it seeds a new cluster keyed
/// by its first three keywords.
///
/// # Errors
///
/// Returns `InvalidInput` when the configured extraction regex does not
/// compile.
pub fn extract_learning_clusters(
    sessions: &[SessionLog],
    config: &MiningConfig,
) -> Result<Vec<DetectedPattern>> {
    let pattern = Regex::new(&config.learning_pattern)
        .map_err(|e| Error::InvalidInput(format!("unusable learning pattern: {e}")))?;

    let observations = extract_observations(sessions, &pattern);
    let mut clusters: Vec<DetectedPattern> = Vec::new();

    for observation in observations {
        let signature = keyword_signature(&observation.text);

        // Linear scan over existing clusters; best match wins.
        let mut best: Option<(usize, f64)> = None;
        for (idx, cluster) in clusters.iter().enumerate() {
            let similarity = signature_similarity(&signature, &cluster.keywords);
            if best.is_none_or(|(_, s)| similarity > s) {
                best = Some((idx, similarity));
            }
        }

        match best {
            Some((idx, similarity)) if similarity >= SIMILARITY_THRESHOLD => {
                let cluster = &mut clusters[idx];
                cluster.frequency += 1;
                if observation.date > cluster.last_seen {
                    cluster.last_seen = observation.date;
                }
                cluster.resolutions.push(observation.text);
                for keyword in signature {
                    if !cluster.keywords.contains(&keyword) {
                        cluster.keywords.push(keyword);
                    }
                }
            },
            _ => {
                let id = signature
                    .iter()
                    .take(CLUSTER_KEY_LEN)
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(" ");
                clusters.push(DetectedPattern {
                    id,
                    error: observation.text.clone(),
                    frequency: 1,
                    first_seen: observation.date,
                    last_seen: observation.date,
                    resolutions: vec![observation.text.clone()],
                    keywords: signature,
                    suggested_resolution: observation.text,
                    examples: Vec::new(),
                    related: Vec::new(),
                });
            },
        }
    }

    Ok(clusters)
}

/// Returns the document-worthy clusters: frequency at or above the
/// configured threshold, each suggesting its first recorded example as
/// the resolution. Ordered by descending frequency.
///
/// # Errors
///
/// Returns `InvalidInput` when the configured extraction regex does not
/// compile.
pub fn detect_patterns(
    sessions: &[SessionLog],
    config: &MiningConfig,
) -> Result<Vec<DetectedPattern>> {
    let mut patterns: Vec<DetectedPattern> = extract_learning_clusters(sessions, config)?
        .into_iter()
        .filter(|cluster| cluster.frequency >= config.min_frequency)
        .map(|mut cluster| {
            cluster.suggested_resolution =
                cluster.resolutions.first().cloned().unwrap_or_default();
            cluster
        })
        .collect();

    patterns.sort_by(|a, b| b.frequency.cmp(&a.frequency));

    tracing::debug!(
        sessions = sessions.len(),
        patterns = patterns.len(),
        threshold = config.min_frequency,
        "pattern detection complete"
    );
    Ok(patterns)
}
