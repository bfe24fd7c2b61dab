//! Long-term pattern tracking.
//!
//! Independent of the 30-day mining window: the tracker accumulates
//! observation frequencies across the project's whole history in its own
//! JSON document. Matching here is by exact observation text, not
//! clustering — the clusters feed in their canonical texts.

use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::{PatternHistory, TrackedPattern};
use crate::{Error, Result};

use super::detector::keyword_signature;
use super::skill::slugify;

/// Tracks observation frequencies in a persisted history document.
///
/// The document is fully rewritten on every tracking call via temp file +
/// rename. Single writer; owned solely by the mining pipeline.
pub struct PatternTracker {
    path: PathBuf,
}

impl PatternTracker {
    /// Creates a tracker over the history document at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the history document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the history, recovering an empty one when the document is
    /// absent or unparsable.
    #[must_use]
    pub fn load(&self) -> PatternHistory {
        match fs::read_to_string(&self.path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(history) => history,
                Err(e) => {
                    tracing::warn!(
                        path = %self.path.display(),
                        error = %e,
                        "pattern history unparsable, starting fresh"
                    );
                    PatternHistory::default()
                },
            },
            Err(_) => PatternHistory::default(),
        }
    }

    fn persist(&self, history: &PatternHistory) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| Error::operation("create_history_dir", e))?;
        }

        let json = serde_json::to_string_pretty(history)
            .map_err(|e| Error::operation("serialize_history", e))?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| Error::storage("write_history", &self.path, e))?;
        fs::rename(&tmp, &self.path)
            .map_err(|e| Error::storage("replace_history", &self.path, e))?;
        Ok(())
    }

    /// Records one occurrence of an observation.
    ///
    /// An existing entry (matched by exact text) gets its frequency
    /// incremented, its last-seen date extended, the resolution appended
    /// when new, and its keyword set unioned — never shrunk. First-seen
    /// never changes. Otherwise a new entry is created.
    ///
    /// Returns the entry as stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the history cannot be persisted.
    pub fn track_pattern(
        &self,
        observation: &str,
        resolution: Option<&str>,
        date: NaiveDate,
    ) -> Result<TrackedPattern> {
        let mut history = self.load();

        let entry = if let Some(entry) = history
            .patterns
            .iter_mut()
            .find(|p| p.error == observation)
        {
            entry.frequency += 1;
            if date > entry.last_seen {
                entry.last_seen = date;
            }
            if let Some(resolution) = resolution {
                if !entry.resolutions.iter().any(|r| r == resolution) {
                    entry.resolutions.push(resolution.to_string());
                }
            }
            for keyword in keyword_signature(observation) {
                if !entry.keywords.contains(&keyword) {
                    entry.keywords.push(keyword);
                }
            }
            entry.clone()
        } else {
            let entry = TrackedPattern {
                id: slugify(observation),
                error: observation.to_string(),
                frequency: 1,
                first_seen: date,
                last_seen: date,
                documented: false,
                resolutions: resolution.map(ToString::to_string).into_iter().collect(),
                keywords: keyword_signature(observation),
            };
            history.patterns.push(entry.clone());
            entry
        };

        self.persist(&history)?;
        Ok(entry)
    }

    /// Marks the entry for an observation as documented.
    ///
    /// Flipped once a skill artifact exists for the exact text; the flag
    /// never reverts. Returns whether a matching entry was found.
    ///
    /// # Errors
    ///
    /// Returns an error if the history cannot be persisted.
    pub fn mark_pattern_documented(&self, observation: &str) -> Result<bool> {
        let mut history = self.load();

        let Some(entry) = history
            .patterns
            .iter_mut()
            .find(|p| p.error == observation)
        else {
            return Ok(false);
        };

        entry.documented = true;
        self.persist(&history)?;
        Ok(true)
    }
}
