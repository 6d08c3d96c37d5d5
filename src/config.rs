use crate::store::SIDE_SUFFIX;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Directory holding config files, both per-user (`~/.roster`) and per-project
pub const CONFIG_DIR: &str = ".roster";

pub const DEFAULT_STUDENTS_FILE: &str = "students.txt";
pub const DEFAULT_CREDENTIALS_FILE: &str = "credentials.txt";

/// A validation error in the configuration
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]: {}", self.field, self.message)
    }
}

/// Where the two collections live
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct StorageConfig {
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    #[serde(default)]
    pub students_file: Option<String>,
    #[serde(default)]
    pub credentials_file: Option<String>,
}

/// Configuration for session transcripts
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct TranscriptConfig {
    #[serde(default)]
    pub enabled: Option<bool>,
    /// Defaults to `<data_dir>/sessions`
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub transcript: TranscriptConfig,
}

impl Config {
    /// Load configuration from default paths
    /// Priority: local (.roster/config.local.toml) > project (.roster/config.toml) > user (~/.roster/config.toml)
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(CONFIG_DIR).join("config.toml");
            if user_config.exists() {
                config.merge(Self::load_from(&user_config)?);
            }
        }

        let project_config = Path::new(CONFIG_DIR).join("config.toml");
        if project_config.exists() {
            config.merge(Self::load_from(&project_config)?);
        }

        // Should be gitignored
        let local_config = Path::new(CONFIG_DIR).join("config.local.toml");
        if local_config.exists() {
            config.merge(Self::load_from(&local_config)?);
        }

        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Merge another config into this one (other takes priority for every field it sets)
    pub fn merge(&mut self, other: Config) {
        if other.storage.data_dir.is_some() {
            self.storage.data_dir = other.storage.data_dir;
        }
        if other.storage.students_file.is_some() {
            self.storage.students_file = other.storage.students_file;
        }
        if other.storage.credentials_file.is_some() {
            self.storage.credentials_file = other.storage.credentials_file;
        }

        if other.transcript.enabled.is_some() {
            self.transcript.enabled = other.transcript.enabled;
        }
        if other.transcript.dir.is_some() {
            self.transcript.dir = other.transcript.dir;
        }
    }

    pub fn data_dir(&self) -> PathBuf {
        self.storage
            .data_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn students_file(&self) -> &str {
        self.storage
            .students_file
            .as_deref()
            .unwrap_or(DEFAULT_STUDENTS_FILE)
    }

    pub fn credentials_file(&self) -> &str {
        self.storage
            .credentials_file
            .as_deref()
            .unwrap_or(DEFAULT_CREDENTIALS_FILE)
    }

    pub fn students_path(&self) -> PathBuf {
        self.data_dir().join(self.students_file())
    }

    pub fn credentials_path(&self) -> PathBuf {
        self.data_dir().join(self.credentials_file())
    }

    pub fn transcript_enabled(&self) -> bool {
        self.transcript.enabled.unwrap_or(true)
    }

    pub fn transcripts_dir(&self) -> PathBuf {
        self.transcript
            .dir
            .clone()
            .unwrap_or_else(|| self.data_dir().join("sessions"))
    }

    /// Validate configuration and return any errors found
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        let files = [
            ("storage.students_file", self.students_file()),
            ("storage.credentials_file", self.credentials_file()),
        ];

        for (field, name) in files {
            if name.trim().is_empty() {
                errors.push(ValidationError {
                    field: field.to_string(),
                    message: "File name must not be empty".to_string(),
                });
                continue;
            }
            if name.contains(['/', '\\']) {
                errors.push(ValidationError {
                    field: field.to_string(),
                    message: format!(
                        "'{}' must be a plain file name; use storage.data_dir for the location",
                        name
                    ),
                });
            }
            if name.ends_with(SIDE_SUFFIX) {
                errors.push(ValidationError {
                    field: field.to_string(),
                    message: format!(
                        "'{}' must not end in '{}', which is reserved for side files",
                        name, SIDE_SUFFIX
                    ),
                });
            }
        }

        if self.students_file() == self.credentials_file() {
            errors.push(ValidationError {
                field: "storage.credentials_file".to_string(),
                message: format!(
                    "Students and credentials cannot share the file '{}'",
                    self.students_file()
                ),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
