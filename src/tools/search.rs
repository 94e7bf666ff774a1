//! Search and page-fetch adapters
//!
//! - [`DaedraSearch`] - DuckDuckGo through the daedra crate, no API key
//! - [`SerperSearch`] - Google results through the Serper.dev HTTP API
//! - [`DaedraFetcher`] - full page text through daedra, for enrichment

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

use crate::research::provider::{ContentEnricher, SearchError, SearchHit, SearchProvider};
use crate::types::{AppError, Result};

/// Default Serper endpoint.
pub const SERPER_ENDPOINT: &str = "https://google.serper.dev/search";

/// Web search powered by daedra (DuckDuckGo).
#[derive(Debug, Default, Clone, Copy)]
pub struct DaedraSearch;

impl DaedraSearch {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SearchProvider for DaedraSearch {
    async fn search(&self, query: &str, max_results: usize) -> std::result::Result<Vec<SearchHit>, SearchError> {
        let search_args = daedra::SearchArgs {
            query: query.to_string(),
            options: Some(daedra::SearchOptions {
                num_results: max_results,
                ..Default::default()
            }),
        };

        let response = daedra::tools::search::perform_search(&search_args)
            .await
            .map_err(|e| SearchError::Failed(format!("duckduckgo: {}", e)))?;

        Ok(response
            .data
            .into_iter()
            .take(max_results)
            .map(|r| SearchHit {
                title: r.title,
                url: r.url,
                snippet: r.description,
                category: None,
                relevance: None,
            })
            .collect())
    }

    fn name(&self) -> &str {
        "duckduckgo"
    }
}

#[derive(Debug, Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<SerperOrganic>,
}

#[derive(Debug, Deserialize)]
struct SerperOrganic {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
}

/// Google results via Serper.dev, biased to a region and language.
#[derive(Debug, Clone)]
pub struct SerperSearch {
    http_client: reqwest::Client,
    api_key: String,
    endpoint: String,
    region: String,
    language: String,
    timeout: Duration,
}

impl SerperSearch {
    pub fn new(api_key: String, region: String, language: String, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Search(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http_client,
            api_key,
            endpoint: SERPER_ENDPOINT.to_string(),
            region,
            language,
            timeout,
        })
    }

    /// Point the adapter at another endpoint (proxies, tests).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn map_error(&self, e: reqwest::Error) -> SearchError {
        if e.is_timeout() {
            SearchError::Timeout(self.timeout.as_millis() as u64)
        } else {
            SearchError::Failed(format!("serper: {}", e))
        }
    }
}

#[async_trait]
impl SearchProvider for SerperSearch {
    async fn search(&self, query: &str, max_results: usize) -> std::result::Result<Vec<SearchHit>, SearchError> {
        let body = json!({
            "q": query,
            "num": max_results,
            "gl": self.region,
            "hl": self.language,
        });

        let response = self
            .http_client
            .post(&self.endpoint)
            .header("X-API-KEY", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(SearchError::Failed(format!("serper returned HTTP {}: {}", status, text)));
        }

        let parsed: SerperResponse = response.json().await.map_err(|e| self.map_error(e))?;
        debug!(query, results = parsed.organic.len(), "serper search");

        Ok(parsed
            .organic
            .into_iter()
            .filter(|r| !r.link.is_empty())
            .take(max_results)
            .map(|r| SearchHit {
                title: r.title,
                url: r.link,
                snippet: r.snippet,
                category: None,
                relevance: None,
            })
            .collect())
    }

    fn name(&self) -> &str {
        "serper"
    }
}

/// Fetches a page as markdown through daedra and truncates it.
#[derive(Debug, Clone, Copy)]
pub struct DaedraFetcher {
    max_chars: usize,
}

impl DaedraFetcher {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }
}

#[async_trait]
impl ContentEnricher for DaedraFetcher {
    async fn fetch(&self, url: &str) -> String {
        let fetch_args = daedra::VisitPageArgs {
            url: url.to_string(),
            include_images: false,
            selector: None,
        };

        match daedra::tools::fetch::fetch_page(&fetch_args).await {
            Ok(page) => truncate_chars(&page.content, self.max_chars),
            Err(e) => {
                warn!(url, error = %e, "page fetch failed, keeping snippet");
                String::new()
            }
        }
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
