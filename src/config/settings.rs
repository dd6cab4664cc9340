//! TOML-based configuration for podium.
//!
//! Supports a config file (podium.toml) with environment variable expansion
//! in path values.
//!
//! Example configuration:
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 8000
//!
//! [worker]
//! path = "${PODIUM_HOME}/bin/podium-worker"
//! args = ["--model", "analyst-large"]
//! timeout_secs = 30
//!
//! [analysis]
//! stage_timeout_secs = 60
//!
//! [normalize]
//! constructor_column = "ConstructorTable"
//!
//! [expand]
//! target_id = "ferrari"
//! max_depth = 16
//!
//! [history]
//! enabled = true
//! path = "./history.db"
//!
//! [logging]
//! level = "debug"
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::expand::ExpandConfig;
use crate::normalize::NormalizeConfig;

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub worker: WorkerSettings,
    pub analysis: AnalysisSettings,
    pub normalize: NormalizeConfig,
    pub expand: ExpandSettings,
    pub history: HistorySettings,
    pub logging: LoggingSettings,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

/// Analyst worker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkerSettings {
    /// Path to the worker binary (supports ${ENV_VAR} expansion).
    pub path: Option<String>,

    /// Extra command-line arguments for the worker.
    pub args: Vec<String>,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            path: None,
            args: Vec::new(),
            timeout_secs: 30,
        }
    }
}

impl WorkerSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Request controller configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Upper bound on each awaited collaborator stage, in seconds.
    pub stage_timeout_secs: u64,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            stage_timeout_secs: 60,
        }
    }
}

/// Constructor expansion configuration.
///
/// The constructor column itself is shared with `[normalize]`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExpandSettings {
    pub target_id: String,
    pub match_field: String,
    pub max_depth: usize,
    pub collision_suffix: String,
}

impl Default for ExpandSettings {
    fn default() -> Self {
        let defaults = ExpandConfig::default();
        Self {
            target_id: defaults.target_id,
            match_field: defaults.match_field,
            max_depth: defaults.max_depth,
            collision_suffix: defaults.collision_suffix,
        }
    }
}

/// Request history configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HistorySettings {
    pub enabled: bool,

    /// Database path (supports ${ENV_VAR} expansion).
    pub path: Option<String>,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
        }
    }
}

/// Log output configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive; `RUST_LOG` takes precedence.
    pub level: String,

    /// Colorize output.
    pub ansi: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            ansi: true,
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate settings from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `PODIUM_CONFIG`
    /// 2. `./podium.toml`
    /// 3. `~/.config/podium/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("PODIUM_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("podium.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("podium").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    fn validate(&self) -> Result<(), SettingsError> {
        if self.analysis.stage_timeout_secs == 0 {
            return Err(SettingsError::InvalidConfig(
                "analysis.stage_timeout_secs must be positive".to_string(),
            ));
        }
        if self.worker.timeout_secs == 0 {
            return Err(SettingsError::InvalidConfig(
                "worker.timeout_secs must be positive".to_string(),
            ));
        }
        if self.expand.max_depth == 0 {
            return Err(SettingsError::InvalidConfig(
                "expand.max_depth must be positive".to_string(),
            ));
        }
        if self.expand.target_id.is_empty() || self.expand.match_field.is_empty() {
            return Err(SettingsError::InvalidConfig(
                "expand.target_id and expand.match_field must be set".to_string(),
            ));
        }
        if self.expand.collision_suffix.is_empty() {
            return Err(SettingsError::InvalidConfig(
                "expand.collision_suffix must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Expansion settings combined with the shared constructor column.
    pub fn expand_config(&self) -> ExpandConfig {
        ExpandConfig {
            constructor_column: self.normalize.constructor_column.clone(),
            target_id: self.expand.target_id.clone(),
            match_field: self.expand.match_field.clone(),
            max_depth: self.expand.max_depth,
            collision_suffix: self.expand.collision_suffix.clone(),
        }
    }

    /// Get the worker binary path, if configured.
    pub fn worker_path(&self) -> Result<Option<PathBuf>, SettingsError> {
        self.worker
            .path
            .as_deref()
            .map(|p| expand_env_vars(p).map(PathBuf::from))
            .transpose()
    }

    /// Get the history database path: configured, else `<data_dir>/podium/history.db`.
    pub fn history_path(&self) -> Result<PathBuf, SettingsError> {
        if let Some(path) = &self.history.path {
            return Ok(PathBuf::from(expand_env_vars(path)?));
        }
        let base = dirs::data_dir().ok_or_else(|| {
            SettingsError::InvalidConfig("no data directory; set history.path".to_string())
        })?;
        Ok(base.join("podium").join("history.db"))
    }

    pub fn stage_timeout(&self) -> Duration {
        Duration::from_secs(self.analysis.stage_timeout_secs)
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let var_name = if chars.peek() == Some(&'{') {
            chars.next();
            let mut name = String::new();
            for ch in chars.by_ref() {
                if ch == '}' {
                    break;
                }
                name.push(ch);
            }
            name
        } else {
            // $VAR ends at the first non-alphanumeric, non-underscore char
            let mut name = String::new();
            while let Some(&ch) = chars.peek() {
                if !(ch.is_alphanumeric() || ch == '_') {
                    break;
                }
                name.push(ch);
                chars.next();
            }
            if name.is_empty() {
                result.push('$');
                continue;
            }
            name
        };

        let value =
            env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
        result.push_str(&value);
    }

    Ok(result)
}
