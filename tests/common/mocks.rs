//! Mock implementations for testing.
//!
//! Deterministic LLM clients, search providers and decision services shared
//! across the integration test files.

use async_trait::async_trait;
use juris::llm::{CompletionOptions, LLMClient};
use juris::research::decision::ResearchPlan;
use juris::research::query::normalize_query_key;
use juris::research::{
    Complexity, Decision, DecisionService, Outcome, QualityAssessment, Query, Round, SearchError, SearchHit,
    SearchProvider, SourceRecord,
};
use juris::types::{AppError, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Build a search hit with no provider category or relevance.
pub fn hit(title: &str, url: &str, snippet: &str) -> SearchHit {
    SearchHit {
        title: title.to_string(),
        url: url.to_string(),
        snippet: snippet.to_string(),
        category: None,
        relevance: None,
    }
}

// ============= LLM =============

/// Mock LLM client that answers by system prompt.
///
/// ```ignore
/// let client = MockLLMClient::new("not json")
///     .route(prompts::PLAN_SYSTEM, r#"{"complexity": "simple", "initial_queries": ["q"]}"#);
/// ```
#[derive(Clone)]
pub struct MockLLMClient {
    routes: Vec<(String, String)>,
    default_response: String,
    should_fail: bool,
    calls: Arc<AtomicUsize>,
}

impl MockLLMClient {
    /// Client that returns `response` for every call.
    pub fn new(response: &str) -> Self {
        Self {
            routes: Vec::new(),
            default_response: response.to_string(),
            should_fail: false,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Return `response` when the system prompt equals `system`.
    pub fn route(mut self, system: &str, response: &str) -> Self {
        self.routes.push((system.to_string(), response.to_string()));
        self
    }

    /// Client whose every call fails at the transport level.
    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::new("")
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LLMClient for MockLLMClient {
    async fn generate(&self, prompt: &str, options: &CompletionOptions) -> Result<String> {
        self.generate_with_system("", prompt, options).await
    }

    async fn generate_with_system(&self, system: &str, _prompt: &str, _options: &CompletionOptions) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.should_fail {
            return Err(AppError::LLM("Mock LLM failure".to_string()));
        }
        Ok(self
            .routes
            .iter()
            .find(|(key, _)| key == system)
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| self.default_response.clone()))
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}

// ============= Search =============

/// Returns the same hits for every query.
pub struct StaticSearch {
    hits: Vec<SearchHit>,
    calls: AtomicUsize,
}

impl StaticSearch {
    pub fn new(hits: Vec<SearchHit>) -> Self {
        Self {
            hits,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchProvider for StaticSearch {
    async fn search(&self, _query: &str, max_results: usize) -> std::result::Result<Vec<SearchHit>, SearchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.hits.iter().take(max_results).cloned().collect())
    }

    fn name(&self) -> &str {
        "static"
    }
}

/// One hit derived from the query text plus a hit shared by every query,
/// so rounds keep finding new URLs and duplicates occur on purpose.
pub struct QueryEchoSearch;

#[async_trait]
impl SearchProvider for QueryEchoSearch {
    async fn search(&self, query: &str, _max_results: usize) -> std::result::Result<Vec<SearchHit>, SearchError> {
        let slug: String = normalize_query_key(query)
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '-' })
            .collect();
        let host = if query.contains(".gov.co") {
            "www.suin-juriscol.gov.co"
        } else {
            "www.ambitojuridico.com"
        };
        Ok(vec![
            hit(
                &format!("Resultado para {}", query),
                &format!("https://{}/{}", host, slug),
                "artículo 2512 del código civil, sentencia de la corte y doctrina",
            ),
            hit(
                "Código Civil colombiano",
                "https://www.secretariasenado.gov.co/codigo_civil.html",
                "Ley 84 de 1873, artículo 2518",
            ),
        ])
    }

    fn name(&self) -> &str {
        "echo"
    }
}

/// Always succeeds with no results.
pub struct EmptySearch;

#[async_trait]
impl SearchProvider for EmptySearch {
    async fn search(&self, _query: &str, _max_results: usize) -> std::result::Result<Vec<SearchHit>, SearchError> {
        Ok(Vec::new())
    }
}

/// Always fails.
pub struct FailingSearch;

#[async_trait]
impl SearchProvider for FailingSearch {
    async fn search(&self, _query: &str, _max_results: usize) -> std::result::Result<Vec<SearchHit>, SearchError> {
        Err(SearchError::Failed("backend unavailable".to_string()))
    }
}

// ============= Decision =============

/// Decision service with fixed answers. `propose_queries` yields a fresh
/// query each call unless built with [`ScriptedDecision::repeating`].
pub struct ScriptedDecision {
    pub complexity: Complexity,
    pub should_continue: bool,
    pub confidence: f32,
    pub overall: f32,
    repeat_question: bool,
    proposals: AtomicUsize,
}

impl ScriptedDecision {
    pub fn new(complexity: Complexity, should_continue: bool, confidence: f32, overall: f32) -> Self {
        Self {
            complexity,
            should_continue,
            confidence,
            overall,
            repeat_question: false,
            proposals: AtomicUsize::new(0),
        }
    }

    /// Proposals only repeat the original question, which has already run.
    pub fn repeating(mut self) -> Self {
        self.repeat_question = true;
        self
    }

    /// Reports "stop, confident, excellent" every round.
    pub fn satisfied(complexity: Complexity) -> Self {
        Self::new(complexity, false, 0.95, 9.0)
    }
}

#[async_trait]
impl DecisionService for ScriptedDecision {
    async fn plan(&self, question: &str) -> Result<Outcome<ResearchPlan>> {
        Ok(Outcome::ok(ResearchPlan {
            complexity: self.complexity,
            initial_queries: vec![Query::high(question, "scripted plan")],
        }))
    }

    async fn evaluate(&self, _question: &str, _sources: &[SourceRecord], _rounds: &[Round]) -> Outcome<Decision> {
        Outcome::ok(Decision {
            should_continue: self.should_continue,
            confidence: self.confidence,
            quality_assessment: QualityAssessment::uniform(self.overall),
            missing_information: Vec::new(),
            next_queries: Vec::new(),
            reasoning: "scripted".to_string(),
            evidence_gaps: Vec::new(),
        })
    }

    async fn propose_queries(&self, question: &str, _sources: &[SourceRecord], _rounds: &[Round]) -> Outcome<Vec<Query>> {
        if self.repeat_question {
            return Outcome::ok(vec![Query::high(question, "scripted follow-up")]);
        }
        let n = self.proposals.fetch_add(1, Ordering::SeqCst) + 1;
        Outcome::ok(vec![Query::high(format!("{} ampliación {}", question, n), "scripted follow-up")])
    }

    async fn synthesize(&self, question: &str, sources: &[SourceRecord], _rounds: &[Round]) -> Outcome<String> {
        Outcome::ok(format!("{}: {} sources", question, sources.len()))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Panics during evaluation.
pub struct PanickingDecision;

#[async_trait]
impl DecisionService for PanickingDecision {
    async fn plan(&self, question: &str) -> Result<Outcome<ResearchPlan>> {
        Ok(Outcome::ok(ResearchPlan::fallback(question)))
    }

    async fn evaluate(&self, _question: &str, _sources: &[SourceRecord], _rounds: &[Round]) -> Outcome<Decision> {
        panic!("evaluator exploded");
    }

    async fn propose_queries(&self, _question: &str, _sources: &[SourceRecord], _rounds: &[Round]) -> Outcome<Vec<Query>> {
        Outcome::ok(Vec::new())
    }

    async fn synthesize(&self, _question: &str, _sources: &[SourceRecord], _rounds: &[Round]) -> Outcome<String> {
        Outcome::ok("unreachable".to_string())
    }
}
