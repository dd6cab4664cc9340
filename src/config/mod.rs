//! Configuration module for podium.
//!
//! Handles the TOML settings file and environment variable expansion.

mod settings;

pub use settings::{
    expand_env_vars, AnalysisSettings, ExpandSettings, HistorySettings, LoggingSettings,
    ServerSettings, Settings, SettingsError, WorkerSettings,
};
