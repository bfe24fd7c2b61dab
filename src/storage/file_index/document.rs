//! The persisted index document.
//!
//! A single versioned JSON document holds the file backend's complete
//! derived state. It is read wholesale on init and rewritten wholesale
//! after every mutation — there are no partial writes. Rewrites go
//! through a temp file renamed over the original so a crash mid-write
//! cannot corrupt the document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::models::{Plan, Session};
use crate::{Error, Result};

/// Current schema version of the index document.
pub const SCHEMA_VERSION: u32 = 1;

/// The file backend's complete persisted state.
///
/// External tools may read this document but should not hand-edit it;
/// there is no migration logic beyond the fixed version number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextIndex {
    /// Schema version.
    pub version: u32,
    /// When the document was last rewritten.
    pub updated: DateTime<Utc>,
    /// Indexed plans.
    pub plans: Vec<Plan>,
    /// Indexed sessions.
    pub sessions: Vec<Session>,
    /// Learned-pattern entries. Reserved; currently always empty.
    #[serde(default)]
    pub learned: Vec<serde_json::Value>,
}

impl ContextIndex {
    /// Creates an empty document at the current schema version.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            version: SCHEMA_VERSION,
            updated: Utc::now(),
            plans: Vec::new(),
            sessions: Vec::new(),
            learned: Vec::new(),
        }
    }

    /// Loads the document, creating and persisting an empty one when the
    /// file is absent or unparsable.
    ///
    /// A fresh project must work with zero prior state, so a missing or
    /// corrupt document is recovered, not surfaced.
    ///
    /// # Errors
    ///
    /// Returns an error only if a recovery write of the empty document fails.
    pub fn load_or_init(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<Self>(&contents) {
                Ok(index) => return Ok(index),
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "index document unparsable, starting fresh"
                    );
                },
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no index document, starting fresh");
            },
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "index document unreadable, starting fresh"
                );
            },
        }

        let index = Self::empty();
        index.persist(path)?;
        Ok(index)
    }

    /// Rewrites the whole document at `path` via temp file + rename.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write/rename fails.
    pub fn persist(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| Error::operation("serialize_index", e))?;

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| Error::storage("write_index", path, e))?;
        fs::rename(&tmp, path).map_err(|e| Error::storage("replace_index", path, e))?;

        Ok(())
    }
}
