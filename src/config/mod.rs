//! Configuration management.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::storage::BackendKind;

/// Index document filename inside the knowledge directory.
pub const INDEX_FILENAME: &str = ".index.json";

/// Pattern-history filename inside the knowledge directory.
pub const HISTORY_FILENAME: &str = ".patterns.json";

/// Conventional database subdirectory and filename, appended when `init`
/// receives a directory instead of a database file path.
pub const DB_SUBDIR: &str = ".devlore";
/// Database filename inside [`DB_SUBDIR`].
pub const DB_FILENAME: &str = "knowledge.db";

/// Main configuration for devlore.
#[derive(Debug, Clone)]
pub struct DevloreConfig {
    /// Root of the knowledge tree (holds plans/, sessions/, learned/).
    pub knowledge_dir: PathBuf,
    /// Optional personal-patterns directory, also watched for staleness.
    pub personal_dir: Option<PathBuf>,
    /// Directory where skill artifacts are materialized.
    pub skills_dir: PathBuf,
    /// Which storage backend to construct.
    pub backend: BackendKind,
    /// Database location for the SQL backend (file or directory).
    pub database: PathBuf,
    /// Logical project name for SQL-backend partitioning.
    pub project: String,
    /// Mining options.
    pub mining: MiningConfig,
}

/// Options for the pattern mining pipeline.
#[derive(Debug, Clone)]
pub struct MiningConfig {
    /// Trailing day window for session loading.
    pub window_days: u32,
    /// Minimum cluster frequency for a pattern to be document-worthy.
    pub min_frequency: u32,
    /// Regex matched against session content to extract observations.
    /// The first capture group is the observation text.
    pub learning_pattern: String,
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            window_days: 30,
            min_frequency: 3,
            learning_pattern: r"\*\*Key Learning:?\*\*:?\s*(.+)".to_string(),
        }
    }
}

impl Default for DevloreConfig {
    fn default() -> Self {
        Self {
            knowledge_dir: PathBuf::from("knowledge"),
            personal_dir: None,
            skills_dir: PathBuf::from("knowledge").join("skills"),
            backend: BackendKind::FileIndex,
            database: PathBuf::from("."),
            project: "default".to_string(),
            mining: MiningConfig::default(),
        }
    }
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    /// Knowledge directory.
    pub knowledge_dir: Option<String>,
    /// Personal-patterns directory.
    pub personal_dir: Option<String>,
    /// Skills directory.
    pub skills_dir: Option<String>,
    /// Backend name: "file" or "sqlite".
    pub backend: Option<String>,
    /// Database path for the SQL backend.
    pub database: Option<String>,
    /// Project name.
    pub project: Option<String>,
    /// Mining section.
    pub mining: Option<ConfigFileMining>,
}

/// Mining section in the config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileMining {
    /// Trailing day window.
    pub window_days: Option<u32>,
    /// Frequency threshold.
    pub min_frequency: Option<u32>,
    /// Observation extraction regex.
    pub learning_pattern: Option<String>,
}

impl DevloreConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> crate::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| crate::Error::operation("read_config_file", e))?;

        let file: ConfigFile = toml::from_str(&contents)
            .map_err(|e| crate::Error::operation("parse_config_file", e))?;

        Ok(Self::from_config_file(file))
    }

    /// Loads configuration from the default location.
    ///
    /// Checks the following paths in order:
    /// 1. Platform-specific config dir (`~/Library/Application Support/devlore/` on macOS)
    /// 2. XDG config dir (`~/.config/devlore/` for Unix compatibility)
    ///
    /// Returns default configuration if no config file is found.
    #[must_use]
    pub fn load_default() -> Self {
        let Some(base_dirs) = directories::BaseDirs::new() else {
            return Self::default();
        };

        let platform_config = base_dirs.config_dir().join("devlore").join("config.toml");
        if platform_config.exists() {
            if let Ok(config) = Self::load_from_file(&platform_config) {
                return config;
            }
        }

        let xdg_config = base_dirs
            .home_dir()
            .join(".config")
            .join("devlore")
            .join("config.toml");
        if xdg_config.exists() {
            if let Ok(config) = Self::load_from_file(&xdg_config) {
                return config;
            }
        }

        Self::default()
    }

    /// Converts a `ConfigFile` to `DevloreConfig`.
    fn from_config_file(file: ConfigFile) -> Self {
        let mut config = Self::default();

        if let Some(knowledge_dir) = file.knowledge_dir {
            config.knowledge_dir = PathBuf::from(&knowledge_dir);
            config.skills_dir = PathBuf::from(&knowledge_dir).join("skills");
        }
        if let Some(personal_dir) = file.personal_dir {
            config.personal_dir = Some(PathBuf::from(personal_dir));
        }
        if let Some(skills_dir) = file.skills_dir {
            config.skills_dir = PathBuf::from(skills_dir);
        }
        if let Some(backend) = file.backend {
            config.backend = BackendKind::parse(&backend);
        }
        if let Some(database) = file.database {
            config.database = PathBuf::from(database);
        }
        if let Some(project) = file.project {
            config.project = project;
        }
        if let Some(mining) = file.mining {
            if let Some(v) = mining.window_days {
                config.mining.window_days = v;
            }
            if let Some(v) = mining.min_frequency {
                config.mining.min_frequency = v;
            }
            if let Some(v) = mining.learning_pattern {
                config.mining.learning_pattern = v;
            }
        }

        config
    }

    /// Sets the knowledge directory.
    #[must_use]
    pub fn with_knowledge_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.knowledge_dir = path.into();
        self.skills_dir = self.knowledge_dir.join("skills");
        self
    }

    /// Sets the personal-patterns directory.
    #[must_use]
    pub fn with_personal_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.personal_dir = Some(path.into());
        self
    }

    /// Sets the storage backend.
    #[must_use]
    pub const fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    /// Sets the database location for the SQL backend.
    #[must_use]
    pub fn with_database(mut self, path: impl Into<PathBuf>) -> Self {
        self.database = path.into();
        self
    }

    /// Sets the project name.
    #[must_use]
    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = project.into();
        self
    }

    /// Path of the index document inside the knowledge directory.
    #[must_use]
    pub fn index_path(&self) -> PathBuf {
        self.knowledge_dir.join(INDEX_FILENAME)
    }

    /// Path of the pattern-history document.
    #[must_use]
    pub fn history_path(&self) -> PathBuf {
        self.knowledge_dir.join(HISTORY_FILENAME)
    }

    /// Plans sub-directory.
    #[must_use]
    pub fn plans_dir(&self) -> PathBuf {
        self.knowledge_dir.join("plans")
    }

    /// Sessions sub-directory.
    #[must_use]
    pub fn sessions_dir(&self) -> PathBuf {
        self.knowledge_dir.join("sessions")
    }

    /// Learned-patterns sub-directory.
    #[must_use]
    pub fn learned_dir(&self) -> PathBuf {
        self.knowledge_dir.join("learned")
    }
}
