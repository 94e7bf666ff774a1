//! One research round: search, enrich, verify, merge, evaluate, validate.

use futures::FutureExt;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::decision::{Decision, DecisionService, FallbackLog};
use super::domains::DomainPolicy;
use super::evidence::EvidenceSet;
use super::floors::EvidenceFloors;
use super::orchestrator::panic_message;
use super::provider::{ContentEnricher, SearchError, SearchHit, SearchProvider};
use super::query::Query;
use super::source::{RecommendedUse, SourceRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Timeout,
    Error,
}

/// A query that was skipped because its search call failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedQuery {
    pub query: String,
    pub kind: FailureKind,
    pub message: String,
}

/// A completed round. Never modified after it is appended to the history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Round {
    /// 1-based.
    pub round_number: usize,
    pub queries: Vec<Query>,
    pub results: Vec<SourceRecord>,
    pub decision: Decision,
    pub duration_ms: u64,
    #[serde(default)]
    pub failed_queries: Vec<FailedQuery>,
    #[serde(default)]
    pub enriched_count: usize,
}

/// Round-level knobs that do not change during a session.
#[derive(Debug, Clone)]
pub struct RoundSettings {
    pub max_results_per_query: usize,
    pub enrich_top_n: usize,
    pub enrich_timeout: Duration,
    pub min_source_quality: f32,
}

impl Default for RoundSettings {
    fn default() -> Self {
        Self {
            max_results_per_query: 8,
            enrich_top_n: 3,
            enrich_timeout: Duration::from_secs(10),
            min_source_quality: 0.0,
        }
    }
}

/// Inputs for one round.
pub struct RoundRequest<'a> {
    pub question: &'a str,
    pub round_number: usize,
    pub queries: Vec<Query>,
    pub per_search_timeout: Duration,
    pub history: &'a [Round],
}

/// A finished round plus the gap queries post-validation asks for next.
#[derive(Debug, Clone)]
pub struct RoundOutput {
    pub round: Round,
    pub gap_queries: Vec<Query>,
}

pub struct RoundController {
    search: Arc<dyn SearchProvider>,
    enricher: Arc<dyn ContentEnricher>,
    domains: Arc<DomainPolicy>,
    floors: Arc<EvidenceFloors>,
    settings: RoundSettings,
}

impl RoundController {
    pub fn new(
        search: Arc<dyn SearchProvider>,
        enricher: Arc<dyn ContentEnricher>,
        domains: Arc<DomainPolicy>,
        floors: Arc<EvidenceFloors>,
        settings: RoundSettings,
    ) -> Self {
        Self {
            search,
            enricher,
            domains,
            floors,
            settings,
        }
    }

    pub async fn run(
        &self,
        request: RoundRequest<'_>,
        decision_service: &dyn DecisionService,
        evidence: &mut EvidenceSet,
        fallbacks: &mut FallbackLog,
    ) -> RoundOutput {
        let started = Instant::now();
        let RoundRequest {
            question,
            round_number,
            queries,
            per_search_timeout,
            history,
        } = request;

        if queries.is_empty() {
            info!(round = round_number, "no queries left to run");
            return RoundOutput {
                round: Round {
                    round_number,
                    queries,
                    results: Vec::new(),
                    decision: Decision::insufficient("no unexecuted queries were available for this round"),
                    duration_ms: started.elapsed().as_millis() as u64,
                    failed_queries: Vec::new(),
                    enriched_count: 0,
                },
                gap_queries: Vec::new(),
            };
        }

        let (mut harvested, failed_queries) = self.execute_queries(&queries, per_search_timeout).await;
        let enriched_count = self.enrich(&mut harvested).await;

        let verified = decision_service.verify_sources(question, harvested).await;
        fallbacks.note("verify_sources", &verified);
        let results: Vec<SourceRecord> = verified
            .into_value()
            .into_iter()
            .filter(|s| s.recommended_use != RecommendedUse::DoNotUse)
            .filter(|s| s.quality >= self.settings.min_source_quality)
            .collect();

        let added = evidence.merge(results.clone());

        let evaluation = decision_service.evaluate(question, evidence.sources(), history).await;
        fallbacks.note("evaluate", &evaluation);
        let mut decision = evaluation.into_value();
        let gap_queries = self.floors.enforce(&mut decision, question, evidence.sources());

        let duration_ms = started.elapsed().as_millis() as u64;
        info!(
            round = round_number,
            queries = queries.len(),
            failed = failed_queries.len(),
            results = results.len(),
            new_sources = added,
            total_sources = evidence.len(),
            overall = decision.overall(),
            confidence = decision.confidence,
            should_continue = decision.should_continue,
            gaps = gap_queries.len(),
            duration_ms,
            "round completed"
        );

        RoundOutput {
            round: Round {
                round_number,
                queries,
                results,
                decision,
                duration_ms,
                failed_queries,
                enriched_count,
            },
            gap_queries,
        }
    }

    /// Run every query concurrently, each under its own timeout. Failures and
    /// panics are recorded and skipped. Records are deduplicated by URL within
    /// the round.
    async fn execute_queries(&self, queries: &[Query], per_search_timeout: Duration) -> (Vec<SourceRecord>, Vec<FailedQuery>) {
        let timeout_ms = per_search_timeout.as_millis() as u64;
        let max_results = self.settings.max_results_per_query;

        let calls = queries.iter().map(|query| async move {
            let call = AssertUnwindSafe(self.search.search(&query.text, max_results)).catch_unwind();
            let result = match timeout(per_search_timeout, call).await {
                Ok(Ok(result)) => result,
                Ok(Err(payload)) => Err(SearchError::Failed(format!("provider panicked: {}", panic_message(payload)))),
                Err(_) => Err(SearchError::Timeout(timeout_ms)),
            };
            (query, result)
        });

        let mut records: Vec<SourceRecord> = Vec::new();
        let mut failed = Vec::new();
        for (query, result) in join_all(calls).await {
            match result {
                Ok(hits) if hits.is_empty() => {
                    debug!(query = %query.text, provider = self.search.name(), "query returned no results");
                }
                Ok(hits) => {
                    debug!(query = %query.text, hits = hits.len(), "query returned results");
                    for hit in hits {
                        if hit.url.trim().is_empty() || records.iter().any(|r| r.url == hit.url) {
                            continue;
                        }
                        records.push(self.to_record(hit, &query.text));
                    }
                }
                Err(e) => {
                    warn!(query = %query.text, provider = self.search.name(), error = %e, "search call skipped");
                    failed.push(FailedQuery {
                        query: query.text.clone(),
                        kind: if e.is_timeout() {
                            FailureKind::Timeout
                        } else {
                            FailureKind::Error
                        },
                        message: e.to_string(),
                    });
                }
            }
        }
        (records, failed)
    }

    fn to_record(&self, hit: SearchHit, origin_query: &str) -> SourceRecord {
        let category = hit.category.unwrap_or_else(|| self.domains.classify(&hit.url));
        let relevance = hit
            .relevance
            .unwrap_or_else(|| self.domains.keyword_relevance(category, &hit.title, &hit.snippet));
        SourceRecord::from_hit(hit, category, relevance, origin_query)
    }

    /// Fetch full content for the first `enrich_top_n` records. Failures and
    /// timeouts keep the snippet.
    async fn enrich(&self, records: &mut [SourceRecord]) -> usize {
        let n = self.settings.enrich_top_n.min(records.len());
        if n == 0 {
            return 0;
        }
        let limit = self.settings.enrich_timeout;
        let fetches = records[..n].iter().map(|record| {
            let url = record.url.clone();
            async move {
                match timeout(limit, AssertUnwindSafe(self.enricher.fetch(&url)).catch_unwind()).await {
                    Ok(Ok(content)) => content,
                    Ok(Err(payload)) => {
                        warn!(url = %url, panic = %panic_message(payload), "enricher panicked");
                        String::new()
                    }
                    Err(_) => String::new(),
                }
            }
        });
        let contents = join_all(fetches).await;

        let mut enriched = 0;
        for (record, content) in records.iter_mut().zip(contents) {
            if content.trim().is_empty() {
                continue;
            }
            record.full_content = Some(content);
            enriched += 1;
        }
        debug!(requested = n, enriched, "enrichment finished");
        enriched
    }
}
