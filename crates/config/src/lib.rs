//! Configuration loading, validation, and management for Aurion.
//!
//! Loads configuration from `~/.aurion/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Context window bounds accepted by the assistant.
pub const MIN_CONTEXT_WINDOW: usize = 1;
pub const MAX_CONTEXT_WINDOW: usize = 50;

/// The root configuration structure.
///
/// Maps directly to `~/.aurion/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Gemini API key (the environment takes over when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Gemini model name
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens per response
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// Role the assistant starts in
    #[serde(default = "default_role")]
    pub default_role: String,

    /// Stream responses fragment by fragment
    #[serde(default = "default_true")]
    pub streaming: bool,

    /// How many recent turns go into each prompt
    #[serde(default = "default_context_window")]
    pub context_window: usize,

    /// HTTP timeout for generation requests
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Base URL of the Generative Language API
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Conversation store settings
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Speech capture settings
    #[serde(default)]
    pub voice: VoiceConfig,
}

fn default_model() -> String {
    "gemini-2.5-flash".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_output_tokens() -> u32 {
    2048
}
fn default_role() -> String {
    "general".into()
}
fn default_context_window() -> usize {
    10
}
fn default_request_timeout_secs() -> u64 {
    120
}
fn default_api_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".into()
}
fn default_true() -> bool {
    true
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("default_role", &self.default_role)
            .field("streaming", &self.streaming)
            .field("context_window", &self.context_window)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("api_base_url", &self.api_base_url)
            .field("memory", &self.memory)
            .field("voice", &self.voice)
            .finish()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Location of the conversation document (default: `<config dir>/data/memory.json`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceConfig {
    /// External command that records one utterance and prints its transcript.
    /// Voice input is disabled when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    /// Upper bound on one capture, listening plus speaking
    #[serde(default = "default_voice_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_voice_timeout_secs() -> u64 {
    35
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            command: None,
            timeout_secs: default_voice_timeout_secs(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (`~/.aurion/config.toml`,
    /// or `$AURION_CONFIG` when set).
    ///
    /// Environment overrides:
    /// - `GEMINI_API_KEY`, then `AURION_API_KEY` (only when the file has no key)
    /// - `AURION_MODEL`
    /// - `AURION_ROLE`
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from(&Self::config_path())?;
        config.apply_env();
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

    fn apply_env(&mut self) {
        if self.api_key.as_deref().is_none_or(|k| k.trim().is_empty()) {
            self.api_key = api_key_from(|name| std::env::var(name).ok());
        }

        if let Ok(model) = std::env::var("AURION_MODEL") {
            self.model = model;
        }

        if let Ok(role) = std::env::var("AURION_ROLE") {
            self.default_role = role;
        }
    }

    /// Get the configuration directory path (`$AURION_HOME` or `~/.aurion`).
    pub fn config_dir() -> PathBuf {
        match std::env::var("AURION_HOME") {
            Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            _ => dirs_home().join(".aurion"),
        }
    }

    /// The config file `load` reads: `$AURION_CONFIG`, else `config.toml`
    /// inside [`AppConfig::config_dir`].
    pub fn config_path() -> PathBuf {
        std::env::var("AURION_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| Self::config_dir().join("config.toml"))
    }

    /// Where the conversation document lives.
    pub fn memory_path(&self) -> PathBuf {
        self.memory
            .path
            .clone()
            .unwrap_or_else(|| Self::config_dir().join("data").join("memory.json"))
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if !(MIN_CONTEXT_WINDOW..=MAX_CONTEXT_WINDOW).contains(&self.context_window) {
            return Err(ConfigError::ValidationError(format!(
                "context_window must be between {MIN_CONTEXT_WINDOW} and {MAX_CONTEXT_WINDOW}"
            )));
        }

        if self.voice.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "voice.timeout_secs must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// The API key, or `ConfigError::MissingApiKey` when none is configured.
    ///
    /// The assistant is never constructed without one.
    pub fn load_api_key(&self) -> Result<String, ConfigError> {
        match self.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(key.to_string()),
            _ => Err(ConfigError::MissingApiKey),
        }
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.load_api_key().is_ok()
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
            default_role: default_role(),
            streaming: true,
            context_window: default_context_window(),
            request_timeout_secs: default_request_timeout_secs(),
            api_base_url: default_api_base_url(),
            memory: MemoryConfig::default(),
            voice: VoiceConfig::default(),
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

/// First non-blank value of `GEMINI_API_KEY`, then `AURION_API_KEY`.
fn api_key_from(lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
    ["GEMINI_API_KEY", "AURION_API_KEY"]
        .into_iter()
        .filter_map(lookup)
        .find(|key| !key.trim().is_empty())
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("GEMINI_API_KEY is not set (add it to the environment or to api_key in config.toml)")]
    MissingApiKey,

    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
