//! UQA RAG - Answer and evidence orchestrator
//!
//! This crate implements the prediction pipeline that combines:
//! - Answer resolution through an LLM completion API
//! - Evidence retrieval through a web search API
//!
//! Both steps are best-effort: upstream failures degrade to the
//! sentinel answer and the fallback rationale instead of failing the
//! request. They run one after the other, never concurrently.
//!
//! Author: hephaex@gmail.com

use std::sync::Arc;
use std::time::Instant;
use uqa_core::{
    AppConfig, LlmClient, PredictionRequest, PredictionResponse, Result, SearchBackend,
};

pub mod llm;
pub mod resolver;
pub mod retriever;
pub mod search;

pub use llm::TogetherClient;
pub use resolver::AnswerResolver;
pub use retriever::EvidenceRetriever;
pub use search::GoogleSearchClient;

// ============================================================================
// Prediction Pipeline
// ============================================================================

/// Resolves an answer and gathers evidence for a prediction request
pub struct PredictionPipeline {
    resolver: AnswerResolver,
    retriever: EvidenceRetriever,
}

impl PredictionPipeline {
    /// Create a pipeline over the given backends
    pub fn new(llm_client: Arc<dyn LlmClient>, search_backend: Arc<dyn SearchBackend>) -> Self {
        Self {
            resolver: AnswerResolver::new(llm_client),
            retriever: EvidenceRetriever::new(search_backend),
        }
    }

    /// Create a pipeline wired to the Together and Google clients
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            Arc::new(TogetherClient::from_config(&config.llm)),
            Arc::new(GoogleSearchClient::from_config(&config.search)),
        )
    }

    /// Run the full pipeline for one request
    ///
    /// Only request validation and response assembly can fail; both yield
    /// `UqaError::ValidationError`.
    pub async fn predict(&self, request: &PredictionRequest) -> Result<PredictionResponse> {
        request.validate()?;
        let start = Instant::now();

        let answer = self.resolver.resolve(&request.query).await;
        let evidence = self.retriever.retrieve(&request.query).await;

        let response = PredictionResponse::new(
            request.id.clone(),
            answer,
            evidence.reasoning,
            evidence.sources,
        )?;

        tracing::debug!(
            id = %request.id,
            answer = %response.answer(),
            sources = response.sources().len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Prediction assembled"
        );

        Ok(response)
    }
}

// ============================================================================
// Test Support
// ============================================================================

#[cfg(test)]
pub(crate) mod test_support {
    use async_trait::async_trait;
    use std::sync::Mutex;
    use uqa_core::{ChatMessage, LlmClient, Result, SearchBackend, SearchResult, UqaError};

    /// Serve a router on an ephemeral local port, returning its base URL
    pub async fn spawn_stub(router: axum::Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    /// LLM that always replies with the same text
    pub struct StaticLlm {
        reply: String,
        seen: Mutex<Vec<ChatMessage>>,
    }

    impl StaticLlm {
        pub fn new(reply: impl Into<String>) -> Self {
            Self {
                reply: reply.into(),
                seen: Mutex::new(Vec::new()),
            }
        }

        pub fn last_messages(&self) -> Vec<ChatMessage> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LlmClient for StaticLlm {
        async fn chat(&self, messages: &[ChatMessage]) -> Result<String> {
            *self.seen.lock().unwrap() = messages.to_vec();
            Ok(self.reply.clone())
        }

        fn model(&self) -> &str {
            "static"
        }
    }

    pub struct FailingLlm;

    #[async_trait]
    impl LlmClient for FailingLlm {
        async fn chat(&self, _messages: &[ChatMessage]) -> Result<String> {
            Err(UqaError::LlmError("connection refused".to_string()))
        }

        fn model(&self) -> &str {
            "failing"
        }
    }

    /// Search backend with fixed hits
    pub struct StaticSearch {
        results: Vec<SearchResult>,
    }

    impl StaticSearch {
        pub fn new(results: Vec<SearchResult>) -> Self {
            Self { results }
        }
    }

    #[async_trait]
    impl SearchBackend for StaticSearch {
        async fn search(&self, _query: &str, limit: usize) -> Result<Vec<SearchResult>> {
            Ok(self.results.iter().take(limit).cloned().collect())
        }

        fn name(&self) -> &str {
            "static"
        }
    }

    pub struct FailingSearch;

    #[async_trait]
    impl SearchBackend for FailingSearch {
        async fn search(&self, _query: &str, _limit: usize) -> Result<Vec<SearchResult>> {
            Err(UqaError::SearchError("timed out".to_string()))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retriever::FALLBACK_REASONING;
    use crate::test_support::{FailingLlm, FailingSearch, StaticLlm, StaticSearch};
    use uqa_core::{Answer, RequestId, SearchResult, UqaError};

    fn itmo_hits() -> Vec<SearchResult> {
        vec![
            SearchResult::new("ИТМО — Википедия", "https://ru.wikipedia.org/wiki/ИТМО"),
            SearchResult::new("Университет ИТМО", "https://itmo.ru/"),
        ]
    }

    #[tokio::test]
    async fn test_predict_combines_answer_and_evidence() {
        let pipeline = PredictionPipeline::new(
            Arc::new(StaticLlm::new("Ответ: 2")),
            Arc::new(StaticSearch::new(itmo_hits())),
        );

        let request = PredictionRequest::new("req-1", "В каком городе ИТМО?\n1. Москва\n2. Санкт-Петербург");
        let response = pipeline.predict(&request).await.unwrap();

        assert_eq!(response.id(), &RequestId::from("req-1"));
        assert_eq!(response.answer(), Answer::choice(2).unwrap());
        assert_eq!(response.sources().len(), 2);
        assert!(response.reasoning().contains("- Университет ИТМО: https://itmo.ru/"));
    }

    #[tokio::test]
    async fn test_predict_degrades_on_upstream_failures() {
        let pipeline = PredictionPipeline::new(Arc::new(FailingLlm), Arc::new(FailingSearch));

        let request = PredictionRequest::new(17i64, "Вопрос?\n1. да\n2. нет");
        let response = pipeline.predict(&request).await.unwrap();

        assert_eq!(response.id(), &RequestId::from(17i64));
        assert_eq!(response.answer(), Answer::UNDETERMINED);
        assert!(response.sources().is_empty());
        assert_eq!(response.reasoning(), FALLBACK_REASONING);
    }

    #[tokio::test]
    async fn test_predict_rejects_empty_query() {
        let pipeline = PredictionPipeline::new(
            Arc::new(StaticLlm::new("1")),
            Arc::new(StaticSearch::new(vec![])),
        );

        let err = pipeline
            .predict(&PredictionRequest::new(1i64, "  "))
            .await
            .unwrap_err();
        assert!(matches!(err, UqaError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_from_config_without_credentials_degrades() {
        let mut config = AppConfig::default();
        config.llm.base_url = "http://127.0.0.1:9".to_string();
        config.search.base_url = "http://127.0.0.1:9".to_string();
        config.llm.timeout_secs = 1;
        config.search.timeout_secs = 1;
        let pipeline = PredictionPipeline::from_config(&config);

        let response = pipeline
            .predict(&PredictionRequest::new(5i64, "Вопрос?\n1. а"))
            .await
            .unwrap();
        assert_eq!(response.answer(), Answer::UNDETERMINED);
        assert_eq!(response.reasoning(), FALLBACK_REASONING);
    }
}
