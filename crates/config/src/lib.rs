//! Configuration loading, validation, and management for playwatch.
//!
//! Loads configuration from `~/.playwatch/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use playwatch_core::{FlagFields, StateFields};

/// The root configuration structure.
///
/// Maps directly to `~/.playwatch/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Engine tuning
    #[serde(default)]
    pub engine: EngineConfig,

    /// Wire vocabulary overrides
    #[serde(default)]
    pub fields: FieldsConfig,

    /// Output shaping for the watch pipeline
    #[serde(default)]
    pub watch: WatchOptions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Bound of every internal stream channel
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

fn default_capacity() -> usize {
    32
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
        }
    }
}

/// The notification vocabulary, overridable per deployment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldsConfig {
    /// Names used for player state tracking
    #[serde(default)]
    pub state: StateFields,

    /// Names used for the suppression switch
    #[serde(default)]
    pub flag: FlagFields,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchOptions {
    /// Whether the suppression switch gates the output
    #[serde(default = "default_true")]
    pub suppression: bool,

    /// Whether to drop consecutive identical output lines
    #[serde(default)]
    pub dedup: bool,

    /// Whether to drop the artist when the title already starts with it
    #[serde(default)]
    pub trim_artist: bool,
}

fn default_true() -> bool {
    true
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            suppression: true,
            dedup: false,
            trim_artist: false,
        }
    }
}

impl WatchConfig {
    /// Load configuration from the default path (~/.playwatch/config.toml).
    ///
    /// Environment variables override the file:
    /// - `PLAYWATCH_STATE_INTERFACE`
    /// - `PLAYWATCH_FLAG_INTERFACE`
    pub fn load() -> Result<Self, ConfigError> {
        let config_dir = Self::config_dir();
        let config_path = config_dir.join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_overrides(
            std::env::var("PLAYWATCH_STATE_INTERFACE").ok(),
            std::env::var("PLAYWATCH_FLAG_INTERFACE").ok(),
        );
        Ok(config)
    }

    /// Apply environment overrides to an already-loaded config.
    fn apply_overrides(&mut self, state_interface: Option<String>, flag_interface: Option<String>) {
        if let Some(interface) = state_interface {
            self.fields.state.interface = interface;
        }
        if let Some(interface) = flag_interface {
            self.fields.flag.interface = interface;
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".playwatch")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.capacity == 0 {
            return Err(ConfigError::ValidationError(
                "engine.capacity must be at least 1".into(),
            ));
        }

        if self.fields.state.interface.is_empty() || self.fields.flag.interface.is_empty() {
            return Err(ConfigError::ValidationError(
                "interface names must not be empty".into(),
            ));
        }

        if self.fields.state.metadata.is_empty()
            || self.fields.state.playback.is_empty()
            || self.fields.flag.property.is_empty()
        {
            return Err(ConfigError::ValidationError(
                "property names must not be empty".into(),
            ));
        }

        Ok(())
    }

    /// Generate a default config TOML string (for `check --print-config`).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            fields: FieldsConfig::default(),
            watch: WatchOptions::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
