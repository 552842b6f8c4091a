//! Web search backend
//!
//! Google Custom Search JSON API client. Issues a single GET with the
//! `key`, `cx` and `q` query parameters and reads `items[].title` and
//! `items[].link` from the payload.
//!
//! Author: hephaex@gmail.com

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use uqa_core::{Result, SearchBackend, SearchConfig, SearchResult, UqaError};

/// Google Custom Search client
pub struct GoogleSearchClient {
    client: Client,
    api_key: Option<String>,
    engine_id: Option<String>,
    base_url: String,
    timeout: Option<Duration>,
}

#[derive(Debug, Deserialize)]
struct GoogleSearchResponse {
    #[serde(default)]
    items: Vec<GoogleItem>,
}

#[derive(Debug, Deserialize)]
struct GoogleItem {
    title: Option<String>,
    link: Option<String>,
}

impl GoogleSearchClient {
    /// Create a new client against the public Custom Search endpoint
    pub fn new(api_key: impl Into<String>, engine_id: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: Some(api_key.into()),
            engine_id: Some(engine_id.into()),
            base_url: SearchConfig::default().base_url,
            timeout: None,
        }
    }

    /// Create from config
    ///
    /// Missing credentials are passed through; the API rejects the call.
    pub fn from_config(config: &SearchConfig) -> Self {
        Self {
            client: Client::new(),
            api_key: config.api_key.clone(),
            engine_id: config.engine_id.clone(),
            base_url: config.base_url.clone(),
            timeout: config.timeout(),
        }
    }

    /// Set custom endpoint URL
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set a per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn query_params<'a>(&'a self, query: &'a str) -> Vec<(&'static str, &'a str)> {
        let mut params = Vec::with_capacity(3);
        if let Some(key) = self.api_key.as_deref() {
            params.push(("key", key));
        }
        if let Some(cx) = self.engine_id.as_deref() {
            params.push(("cx", cx));
        }
        params.push(("q", query));
        params
    }
}

#[async_trait]
impl SearchBackend for GoogleSearchClient {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>> {
        let mut builder = self
            .client
            .get(self.base_url.as_str())
            .query(&self.query_params(query));
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| UqaError::SearchError(format!("Request failed: {e}")))?;

        let payload: GoogleSearchResponse = response
            .json()
            .await
            .map_err(|e| UqaError::SearchError(format!("Failed to parse response: {e}")))?;

        payload
            .items
            .into_iter()
            .take(limit)
            .enumerate()
            .map(|(i, item)| {
                let link = item
                    .link
                    .ok_or_else(|| UqaError::SearchError(format!("Result {i} has no link")))?;
                Ok(SearchResult::new(item.title.unwrap_or_default(), link))
            })
            .collect()
    }

    fn name(&self) -> &str {
        "google-custom-search"
    }
}
