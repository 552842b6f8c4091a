//! Evidence retrieval
//!
//! Runs the question through a web search backend and turns the top
//! hits into a list of source links plus a short rationale. Any failure
//! degrades to an empty source list and a fixed apology.
//!
//! Author: hephaex@gmail.com

use std::sync::Arc;
use uqa_core::{Evidence, Result, SearchBackend, SearchResult, SourceUrl, MAX_SOURCES};

/// First line of the rationale
pub const REASONING_LEAD_IN: &str = "Результаты поиска указывают на следующие источники:";

/// Rationale used when no evidence could be gathered
pub const FALLBACK_REASONING: &str = "Не удалось найти релевантную информацию.";

/// Evidence returned when retrieval fails
pub fn fallback_evidence() -> Evidence {
    Evidence {
        sources: Vec::new(),
        reasoning: FALLBACK_REASONING.to_string(),
    }
}

/// Turn search hits into evidence
///
/// Every link must be a valid URL; one bad link rejects the whole set.
pub fn build_evidence(results: &[SearchResult]) -> Result<Evidence> {
    let mut sources = Vec::with_capacity(results.len().min(MAX_SOURCES));
    let mut reasoning = String::from(REASONING_LEAD_IN);

    for result in results.iter().take(MAX_SOURCES) {
        sources.push(SourceUrl::parse(&result.link)?);
        reasoning.push_str(&format!("\n- {}: {}", result.title, result.link));
    }

    Ok(Evidence { sources, reasoning })
}

/// Gathers supporting links for a question
pub struct EvidenceRetriever {
    backend: Arc<dyn SearchBackend>,
}

impl EvidenceRetriever {
    pub fn new(backend: Arc<dyn SearchBackend>) -> Self {
        Self { backend }
    }

    /// Retrieve evidence, degrading every failure to [`fallback_evidence`]
    pub async fn retrieve(&self, query: &str) -> Evidence {
        match self.try_retrieve(query).await {
            Ok(evidence) => evidence,
            Err(e) => {
                tracing::warn!(backend = self.backend.name(), error = %e, "Evidence retrieval failed");
                fallback_evidence()
            }
        }
    }

    async fn try_retrieve(&self, query: &str) -> Result<Evidence> {
        let results = self.backend.search(query, MAX_SOURCES).await?;
        tracing::debug!(
            backend = self.backend.name(),
            hits = results.len(),
            "Search completed"
        );
        build_evidence(&results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FailingSearch, StaticSearch};

    fn hits(n: usize) -> Vec<SearchResult> {
        (1..=n)
            .map(|i| SearchResult::new(format!("Page {i}"), format!("https://itmo.ru/p/{i}")))
            .collect()
    }

    #[test]
    fn test_build_evidence_formats_reasoning() {
        let evidence = build_evidence(&hits(2)).unwrap();
        assert_eq!(evidence.sources.len(), 2);
        assert_eq!(evidence.sources[1].as_str(), "https://itmo.ru/p/2");
        assert_eq!(
            evidence.reasoning,
            "Результаты поиска указывают на следующие источники:\n\
             - Page 1: https://itmo.ru/p/1\n\
             - Page 2: https://itmo.ru/p/2"
        );
    }

    #[test]
    fn test_build_evidence_caps_at_three() {
        let evidence = build_evidence(&hits(7)).unwrap();
        assert_eq!(evidence.sources.len(), 3);
        assert_eq!(evidence.reasoning.lines().count(), 4);
    }

    #[test]
    fn test_build_evidence_empty() {
        let evidence = build_evidence(&[]).unwrap();
        assert!(evidence.sources.is_empty());
        assert_eq!(evidence.reasoning, REASONING_LEAD_IN);
    }

    #[test]
    fn test_build_evidence_invalid_link() {
        let results = vec![
            SearchResult::new("ok", "https://itmo.ru/"),
            SearchResult::new("bad", "not a url"),
        ];
        assert!(build_evidence(&results).is_err());
    }

    #[tokio::test]
    async fn test_retrieve_fewer_than_three() {
        let retriever = EvidenceRetriever::new(Arc::new(StaticSearch::new(hits(1))));
        let evidence = retriever.retrieve("q").await;
        assert_eq!(evidence.sources.len(), 1);
        assert_eq!(evidence.reasoning.lines().count(), 2);
    }

    #[tokio::test]
    async fn test_retrieve_backend_failure_falls_back() {
        let retriever = EvidenceRetriever::new(Arc::new(FailingSearch));
        assert_eq!(retriever.retrieve("q").await, fallback_evidence());
    }

    #[tokio::test]
    async fn test_retrieve_invalid_link_falls_back() {
        let retriever = EvidenceRetriever::new(Arc::new(StaticSearch::new(vec![
            SearchResult::new("bad", "javascript:alert(1)"),
        ])));
        let evidence = retriever.retrieve("q").await;
        assert!(evidence.sources.is_empty());
        assert_eq!(evidence.reasoning, FALLBACK_REASONING);
    }
}
