//! UQA Configuration Management
//!
//! Handles configuration from environment variables and config files
//! with sensible defaults for development. Values are read once at
//! startup; missing API credentials are not an error here and only
//! surface later as upstream call failures.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,

    /// Completion API configuration
    pub llm: LlmConfig,

    /// Web search API configuration
    pub search: SearchConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })
    }

    /// Load the startup configuration
    ///
    /// Reads the TOML file named by `UQA_CONFIG` when set, then applies
    /// environment overrides; otherwise uses the environment alone.
    pub fn load() -> Result<Self, ConfigError> {
        match std::env::var("UQA_CONFIG") {
            Ok(path) => Self::from_file(path)?.with_env_override(),
            Err(_) => Self::from_env(),
        }
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(mut self) -> Result<Self, ConfigError> {
        self.apply_env(|key| std::env::var(key).ok())?;
        Ok(self)
    }

    /// Overlay values from a key lookup onto this config
    ///
    /// Only keys that are present are applied.
    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        // Server
        if let Some(host) = var("API_HOST") {
            self.server.host = host;
        }
        if let Some(port) = var("API_PORT") {
            self.server.port = parse_value("API_PORT", port)?;
        }

        // Completion API
        if let Some(key) = var("TOGETHER_API_KEY") {
            self.llm.api_key = Some(key);
        }
        if let Some(url) = var("TOGETHER_BASE_URL") {
            self.llm.base_url = url;
        }
        if let Some(model) = var("LLM_MODEL") {
            self.llm.model = model;
        }

        // Search API
        if let Some(key) = var("GOOGLE_SEARCH_API_KEY") {
            self.search.api_key = Some(key);
        }
        if let Some(cx) = var("GOOGLE_SEARCH_CX") {
            self.search.engine_id = Some(cx);
        }
        if let Some(url) = var("GOOGLE_SEARCH_URL") {
            self.search.base_url = url;
        }

        if let Some(secs) = var("UPSTREAM_TIMEOUT_SECS") {
            let secs: u64 = parse_value("UPSTREAM_TIMEOUT_SECS", secs)?;
            self.llm.timeout_secs = secs;
            self.search.timeout_secs = secs;
        }

        // Logging
        if let Some(level) = var("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("LOG_FORMAT") {
            self.logging.json_format = format.eq_ignore_ascii_case("json");
        }

        Ok(())
    }

    /// Copy of this config with API credentials masked, for display
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        config.llm.api_key = config.llm.api_key.as_deref().map(mask_secret);
        config.search.api_key = config.search.api_key.as_deref().map(mask_secret);
        config
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: String) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value,
    })
}

fn mask_secret(secret: &str) -> String {
    let visible: String = secret.chars().take(4).collect();
    if secret.chars().count() <= 8 {
        "****".to_string()
    } else {
        format!("{visible}****")
    }
}

/// Convert a seconds setting into an optional timeout (0 disables it)
fn timeout_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Maximum request body size in bytes
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            max_body_size: 1024 * 1024, // 1MB
        }
    }
}

impl ServerConfig {
    /// Socket address string to bind
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Completion API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Together API key
    pub api_key: Option<String>,

    /// API base URL (OpenAI-compatible)
    pub base_url: String,

    /// Model name to use
    pub model: String,

    /// Request timeout in seconds (0 disables)
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.together.xyz/v1".to_string(),
            model: "deepseek-ai/DeepSeek-R1".to_string(),
            timeout_secs: 60,
        }
    }
}

impl LlmConfig {
    pub fn timeout(&self) -> Option<Duration> {
        timeout_from_secs(self.timeout_secs)
    }
}

/// Web search API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Google Custom Search API key
    pub api_key: Option<String>,

    /// Programmable search engine identifier (`cx`)
    pub engine_id: Option<String>,

    /// Search endpoint URL
    pub base_url: String,

    /// Request timeout in seconds (0 disables)
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            engine_id: None,
            base_url: "https://www.googleapis.com/customsearch/v1".to_string(),
            timeout_secs: 60,
        }
    }
}

impl SearchConfig {
    pub fn timeout(&self) -> Option<Duration> {
        timeout_from_secs(self.timeout_secs)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,

    /// Include file/line in logs
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            include_location: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

impl From<ConfigError> for crate::UqaError {
    fn from(err: ConfigError) -> Self {
        crate::UqaError::ConfigError(err.to_string())
    }
}
