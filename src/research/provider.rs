//! Contracts the orchestrator consumes from external services.
//!
//! Concrete adapters live in [`crate::tools::search`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::source::SourceCategory;

/// Raw search result as returned by a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
    /// Provider-supplied category. When absent the domain policy classifies the URL.
    #[serde(default)]
    pub category: Option<SourceCategory>,
    /// Provider relevance in 0-1. When absent a keyword heuristic is used.
    #[serde(default)]
    pub relevance: Option<f32>,
}

/// Search failures. A timeout is reported distinctly from "no results",
/// which is `Ok(vec![])`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SearchError {
    #[error("search timed out after {0} ms")]
    Timeout(u64),

    #[error("search provider failed: {0}")]
    Failed(String),
}

impl SearchError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, SearchError::Timeout(_))
    }
}

/// Turns a query string into a ranked list of hits.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, SearchError>;

    /// Short name used in logs.
    fn name(&self) -> &str {
        "search"
    }
}

/// Best-effort full-text fetch. Returns an empty string on failure.
#[async_trait]
pub trait ContentEnricher: Send + Sync {
    async fn fetch(&self, url: &str) -> String;
}

/// Enricher that never fetches anything; records keep their snippets.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEnricher;

#[async_trait]
impl ContentEnricher for NoopEnricher {
    async fn fetch(&self, _url: &str) -> String {
        String::new()
    }
}
