//! UQA Core - Domain models, traits, and shared types
//!
//! This crate defines the core abstractions used throughout the UQA system:
//! - Prediction request/response models
//! - Answer and source value types with their invariants
//! - Common error types
//! - Shared traits for the completion and search backends
//! - Configuration management
//!
//! Author: hephaex@gmail.com

pub mod config;

pub use config::{AppConfig, ConfigError, LlmConfig, LoggingConfig, SearchConfig, ServerConfig};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;
use utoipa::ToSchema;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for UQA operations
#[derive(Error, Debug)]
pub enum UqaError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("Search error: {0}")]
    SearchError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Logging error: {0}")]
    LoggingError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, UqaError>;

// ============================================================================
// Prediction Types
// ============================================================================

/// Maximum number of sources attached to a prediction
pub const MAX_SOURCES: usize = 3;

/// Caller-supplied request identifier, echoed back unmodified
///
/// Accepts either a JSON number or a JSON string. Numbers keep their exact
/// JSON form so `7` comes back as `7`, not `"7"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    Number(serde_json::Number),
    Text(String),
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestId::Number(n) => write!(f, "{n}"),
            RequestId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for RequestId {
    fn from(n: i64) -> Self {
        RequestId::Number(n.into())
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        RequestId::Text(s.to_string())
    }
}

/// Selected answer option
///
/// Either a choice number in `1..=10` or the sentinel `-1`
/// ("could not determine"). No other value can be constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Answer(i64);

impl Answer {
    /// Sentinel meaning no answer could be determined
    pub const UNDETERMINED: Answer = Answer(-1);

    pub const MIN_CHOICE: i64 = 1;
    pub const MAX_CHOICE: i64 = 10;

    /// Create an answer for a concrete option number
    pub fn choice(n: i64) -> Result<Self> {
        if (Self::MIN_CHOICE..=Self::MAX_CHOICE).contains(&n) {
            Ok(Self(n))
        } else {
            Err(UqaError::ValidationError(format!(
                "answer must be between {} and {} or -1, got {n}",
                Self::MIN_CHOICE,
                Self::MAX_CHOICE
            )))
        }
    }

    /// Numeric value as sent on the wire
    pub fn value(self) -> i64 {
        self.0
    }

    /// Whether this is a concrete option rather than the sentinel
    pub fn is_determined(self) -> bool {
        self != Self::UNDETERMINED
    }
}

impl TryFrom<i64> for Answer {
    type Error = UqaError;

    fn try_from(n: i64) -> Result<Self> {
        if n == Self::UNDETERMINED.0 {
            Ok(Self::UNDETERMINED)
        } else {
            Self::choice(n)
        }
    }
}

impl From<Answer> for i64 {
    fn from(answer: Answer) -> Self {
        answer.0
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Syntactically valid absolute URL used as a supporting source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUrl(reqwest::Url);

impl SourceUrl {
    /// Parse a link, rejecting anything that is not an absolute http(s) URL
    pub fn parse(link: &str) -> Result<Self> {
        let url = reqwest::Url::parse(link)
            .map_err(|e| UqaError::ValidationError(format!("invalid source URL {link:?}: {e}")))?;

        match url.scheme() {
            "http" | "https" if url.has_host() => Ok(Self(url)),
            scheme => Err(UqaError::ValidationError(format!(
                "invalid source URL {link:?}: unsupported scheme {scheme:?}"
            ))),
        }
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for SourceUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SourceUrl {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SourceUrl {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let link = String::deserialize(deserializer)?;
        SourceUrl::parse(&link).map_err(serde::de::Error::custom)
    }
}

/// Incoming prediction request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PredictionRequest {
    /// Opaque request identifier (string or number)
    #[schema(value_type = Object, example = 1)]
    pub id: RequestId,

    /// Question text with enumerated answer options
    #[schema(
        example = "В каком году Университет ИТМО был включён в число Национальных исследовательских университетов России?\n1. 2007\n2. 2009\n3. 2011\n4. 2015"
    )]
    pub query: String,
}

impl PredictionRequest {
    pub fn new(id: impl Into<RequestId>, query: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            query: query.into(),
        }
    }

    /// Check field values beyond what deserialization enforces
    pub fn validate(&self) -> Result<()> {
        if self.query.trim().is_empty() {
            return Err(UqaError::ValidationError(
                "query must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Assembled prediction, immutable once built
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PredictionResponse {
    /// Identifier copied from the request
    #[schema(value_type = Object, example = 1)]
    id: RequestId,

    /// Selected option (1-10) or -1 when undetermined
    #[schema(value_type = i64, example = 2)]
    answer: Answer,

    /// Human-readable explanation of the supporting evidence
    reasoning: String,

    /// Up to three supporting links
    #[schema(value_type = Vec<String>, example = json!(["https://itmo.ru/ru/"]))]
    sources: Vec<SourceUrl>,
}

impl PredictionResponse {
    /// Build a response, enforcing the source-count limit
    pub fn new(
        id: RequestId,
        answer: Answer,
        reasoning: impl Into<String>,
        sources: Vec<SourceUrl>,
    ) -> Result<Self> {
        if sources.len() > MAX_SOURCES {
            return Err(UqaError::ValidationError(format!(
                "at most {MAX_SOURCES} sources allowed, got {}",
                sources.len()
            )));
        }

        Ok(Self {
            id,
            answer,
            reasoning: reasoning.into(),
            sources,
        })
    }

    pub fn id(&self) -> &RequestId {
        &self.id
    }

    pub fn answer(&self) -> Answer {
        self.answer
    }

    pub fn reasoning(&self) -> &str {
        &self.reasoning
    }

    pub fn sources(&self) -> &[SourceUrl] {
        &self.sources
    }
}

// ============================================================================
// Search Types
// ============================================================================

/// Single web search hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Page title
    pub title: String,

    /// Page link, not yet validated
    pub link: String,
}

impl SearchResult {
    pub fn new(title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
        }
    }
}

/// Supporting evidence gathered for a question
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evidence {
    pub sources: Vec<SourceUrl>,
    pub reasoning: String,
}

// ============================================================================
// Chat Types
// ============================================================================

/// Chat message sent to a completion API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Trait for web search backends
#[async_trait::async_trait]
pub trait SearchBackend: Send + Sync {
    /// Search the web, returning at most `limit` hits in rank order
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>>;

    /// Get backend name for logging
    fn name(&self) -> &str;
}

/// Trait for LLM completion clients
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    /// Send a chat conversation and return the text of the top choice
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String>;

    /// Model identifier for logging
    fn model(&self) -> &str;
}

// ============================================================================
// Tests
// ============================================================================
