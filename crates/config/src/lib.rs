//! Configuration loading, validation, and management for Learnmate.
//!
//! Loads configuration from `~/.learnmate/config.toml` with environment
//! variable overrides. Validates all settings at load time.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.learnmate/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Generation backend settings
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Turn store settings
    #[serde(default)]
    pub store: StoreConfig,
}

/// Generation backend configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API key for the generation backend. Absence is a valid, detectable
    /// state: chat exchanges fail with a configuration error but nothing
    /// else degrades.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Override the backend base URL (testing, proxies)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Max tokens per completion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,

    /// Deadline for one generation call, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_model() -> String {
    "gemini-2.0-flash-exp".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_timeout_secs() -> u64 {
    60
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: None,
            model: default_model(),
            temperature: default_temperature(),
            max_output_tokens: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Turn store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Backend: "sqlite" or "in_memory"
    #[serde(default = "default_store_backend")]
    pub backend: String,

    /// SQLite database path (defaults to ~/.learnmate/turns.db)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

fn default_store_backend() -> String {
    "sqlite".into()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            path: None,
        }
    }
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("provider", &self.provider)
            .field("store", &self.store)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.learnmate/config.toml).
    ///
    /// Environment overrides, highest priority first:
    /// - `GEMINI_API_KEY` / `LEARNMATE_API_KEY` — backend credential
    /// - `LEARNMATE_MODEL` — model identifier
    /// - `LEARNMATE_DB` — SQLite path
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if config.provider.api_key.is_none() {
            config.provider.api_key = std::env::var("GEMINI_API_KEY")
                .ok()
                .or_else(|| std::env::var("LEARNMATE_API_KEY").ok());
        }

        if let Ok(model) = std::env::var("LEARNMATE_MODEL") {
            config.provider.model = model;
        }

        if let Ok(path) = std::env::var("LEARNMATE_DB") {
            config.store.path = Some(path);
        }

        Ok(config)
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
        home_dir().join(".learnmate")
    }

    /// The SQLite database path, configured or default.
    pub fn store_path(&self) -> PathBuf {
        self.store
            .path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| Self::config_dir().join("turns.db"))
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.provider.temperature < 0.0 || self.provider.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "provider.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.provider.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "provider.timeout_secs must be greater than 0".into(),
            ));
        }

        match self.store.backend.as_str() {
            "sqlite" | "in_memory" => Ok(()),
            other => Err(ConfigError::ValidationError(format!(
                "unknown store backend: {other} (expected \"sqlite\" or \"in_memory\")"
            ))),
        }
    }

    /// Check if a backend credential is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.provider.api_key.is_some()
    }

    /// Generate a default config TOML string (for the `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn home_dir() -> PathBuf {
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
