//! Decision policy backed by a language model.
//!
//! Replies are parsed leniently: field aliases, bare-string queries and a
//! 0-100 score scale are accepted. Anything that still cannot be read falls
//! back to the documented conservative value.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use super::decision::{
    Complexity, Decision, DecisionService, FALLBACK_CONFIDENCE, FALLBACK_SCORE, QualityAssessment, ResearchPlan,
    fallback_synthesis,
};
use super::domains::DomainPolicy;
use super::parsing::{Outcome, parse_reply};
use super::prompts;
use super::query::{Query, QueryPriority};
use super::round::Round;
use super::source::{Authority, Currency, RecommendedUse, SourceRecord};
use crate::llm::{CompletionOptions, LLMClient};
use crate::types::Result;

/// Sources listed in a synthesis fallback.
const FALLBACK_LISTING: usize = 10;

#[derive(Debug, Clone)]
pub struct LlmPolicySettings {
    /// Temperature for the final synthesis; structured calls use 0.1.
    pub temperature: f32,
    pub max_tokens: u32,
    /// Run the per-round verification call.
    pub verify_sources: bool,
}

impl Default for LlmPolicySettings {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            max_tokens: 3000,
            verify_sources: false,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawQuery {
    Text(String),
    Full(Query),
}

impl RawQuery {
    fn into_query(self, default_priority: QueryPriority) -> Query {
        match self {
            RawQuery::Text(text) => Query::new(text, default_priority, ""),
            RawQuery::Full(query) => query,
        }
    }
}

fn collect_queries(raw: Vec<RawQuery>, default_priority: QueryPriority) -> Vec<Query> {
    raw.into_iter()
        .map(|q| q.into_query(default_priority))
        .filter(|q| !q.text.trim().is_empty())
        .collect()
}

#[derive(Debug, Deserialize)]
struct RawPlan {
    #[serde(default, alias = "complejidad")]
    complexity: Option<Complexity>,
    #[serde(default, alias = "queries", alias = "search_queries")]
    initial_queries: Vec<RawQuery>,
}

#[derive(Debug, Default, Deserialize)]
struct RawAssessment {
    #[serde(alias = "normativa")]
    primary_law: Option<f32>,
    #[serde(alias = "jurisprudencia")]
    case_law: Option<f32>,
    #[serde(alias = "doctrina")]
    scholarship: Option<f32>,
    #[serde(alias = "actualidad")]
    currency: Option<f32>,
    #[serde(alias = "verificacion")]
    verification: Option<f32>,
    #[serde(alias = "total", alias = "total_score")]
    overall: Option<f32>,
}

impl RawAssessment {
    /// Normalize to the 0-10 scale. Each value above 10 is read as 0-100 and
    /// divided by 10; missing dimensions take the mean of the present ones; a
    /// missing `overall` is the mean of the dimensions.
    fn normalize(self) -> Option<QualityAssessment> {
        let dims = [self.primary_law, self.case_law, self.scholarship, self.currency, self.verification];
        let present: Vec<f32> = dims.iter().flatten().copied().collect();
        if present.is_empty() && self.overall.is_none() {
            return None;
        }
        let fix = |v: f32| (if v > 10.0 { v / 10.0 } else { v }).clamp(0.0, 10.0);

        let fill = if present.is_empty() {
            self.overall.map(fix).unwrap_or(FALLBACK_SCORE)
        } else {
            present.iter().map(|v| fix(*v)).sum::<f32>() / present.len() as f32
        };
        let dim = |v: Option<f32>| v.map(fix).unwrap_or(fill);

        let mut assessment = QualityAssessment {
            primary_law: dim(self.primary_law),
            case_law: dim(self.case_law),
            scholarship: dim(self.scholarship),
            currency: dim(self.currency),
            verification: dim(self.verification),
            overall: 0.0,
        };
        assessment.overall = self.overall.map(fix).unwrap_or_else(|| assessment.dimension_mean());
        Some(assessment)
    }
}

#[derive(Debug, Deserialize)]
struct RawDecision {
    #[serde(default, alias = "needs_more_search")]
    should_continue: Option<bool>,
    #[serde(default)]
    is_sufficient: Option<bool>,
    #[serde(default)]
    confidence: Option<f32>,
    #[serde(default, alias = "scores", alias = "detailed_scores")]
    quality_assessment: Option<RawAssessment>,
    #[serde(default, alias = "missing_info")]
    missing_information: Vec<String>,
    #[serde(default, alias = "additional_queries")]
    next_queries: Vec<RawQuery>,
    #[serde(default)]
    reasoning: String,
}

impl RawDecision {
    fn into_decision(self) -> Option<Decision> {
        let quality_assessment = self.quality_assessment?.normalize()?;
        let should_continue = self
            .should_continue
            .or(self.is_sufficient.map(|sufficient| !sufficient))
            .unwrap_or(true);
        let confidence = match self.confidence {
            Some(c) if c > 1.0 => (c / 100.0).clamp(0.0, 1.0),
            Some(c) => c.clamp(0.0, 1.0),
            None => FALLBACK_CONFIDENCE,
        };
        Some(Decision {
            should_continue,
            confidence,
            quality_assessment,
            missing_information: self.missing_information,
            next_queries: collect_queries(self.next_queries, QueryPriority::Medium),
            reasoning: self.reasoning,
            evidence_gaps: Vec::new(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawProposal {
    #[serde(default, alias = "next_queries", alias = "additional_queries")]
    queries: Vec<RawQuery>,
}

#[derive(Debug, Deserialize)]
struct RawVerdict {
    url: String,
    #[serde(default)]
    authority: Option<Authority>,
    #[serde(default)]
    currency: Option<Currency>,
    #[serde(default)]
    recommended_use: Option<RecommendedUse>,
    #[serde(default)]
    notes: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawVerification {
    #[serde(default, alias = "verifications")]
    sources: Vec<RawVerdict>,
}

pub struct LlmDecisionService {
    llm: Arc<dyn LLMClient>,
    domains: Arc<DomainPolicy>,
    settings: LlmPolicySettings,
}

impl LlmDecisionService {
    pub fn new(llm: Arc<dyn LLMClient>, domains: Arc<DomainPolicy>, settings: LlmPolicySettings) -> Self {
        Self { llm, domains, settings }
    }

    async fn ask(&self, system: &str, prompt: &str, max_tokens: u32) -> Result<String> {
        let text = self
            .llm
            .generate_with_system(system, prompt, &CompletionOptions::structured(max_tokens))
            .await?;
        debug!(model = self.llm.model_name(), chars = text.len(), "model replied");
        Ok(text)
    }
}

#[async_trait]
impl DecisionService for LlmDecisionService {
    async fn plan(&self, question: &str) -> Result<Outcome<ResearchPlan>> {
        let text = self.ask(prompts::PLAN_SYSTEM, &prompts::plan_prompt(question), 800).await?;
        let raw = match parse_reply::<RawPlan>(&text) {
            Ok(raw) => raw,
            Err(e) => return Ok(Outcome::fallback(ResearchPlan::fallback(question), e.to_string())),
        };
        let initial_queries = collect_queries(raw.initial_queries, QueryPriority::High);
        if initial_queries.is_empty() {
            return Ok(Outcome::fallback(ResearchPlan::fallback(question), "plan reply listed no queries"));
        }
        Ok(Outcome::ok(ResearchPlan {
            complexity: raw.complexity.unwrap_or(Complexity::Complex),
            initial_queries,
        }))
    }

    async fn evaluate(&self, question: &str, sources: &[SourceRecord], rounds: &[Round]) -> Outcome<Decision> {
        let prompt = prompts::evaluate_prompt(question, sources, rounds);
        let text = match self.ask(prompts::EVALUATE_SYSTEM, &prompt, 1500).await {
            Ok(text) => text,
            Err(e) => {
                let reason = format!("transport: {}", e);
                return Outcome::fallback(Decision::conservative(&reason), reason);
            }
        };
        match parse_reply::<RawDecision>(&text).map(RawDecision::into_decision) {
            Ok(Some(decision)) => Outcome::ok(decision),
            Ok(None) => Outcome::fallback(
                Decision::conservative("evaluation reply had no scores"),
                "evaluation reply had no scores",
            ),
            Err(e) => Outcome::fallback(Decision::conservative(e.to_string()), e.to_string()),
        }
    }

    async fn propose_queries(&self, question: &str, sources: &[SourceRecord], rounds: &[Round]) -> Outcome<Vec<Query>> {
        let prompt = prompts::propose_prompt(question, sources, rounds);
        let reason = match self.ask(prompts::PROPOSE_SYSTEM, &prompt, 800).await {
            Ok(text) => match parse_reply::<RawProposal>(&text) {
                Ok(raw) => {
                    let queries = collect_queries(raw.queries, QueryPriority::Medium);
                    if !queries.is_empty() {
                        return Outcome::ok(queries);
                    }
                    "proposal listed no queries".to_string()
                }
                Err(e) => e.to_string(),
            },
            Err(e) => format!("transport: {}", e),
        };
        Outcome::fallback(self.domains.follow_up_queries(question), reason)
    }

    async fn synthesize(&self, question: &str, sources: &[SourceRecord], rounds: &[Round]) -> Outcome<String> {
        let options = CompletionOptions::prose(self.settings.temperature, self.settings.max_tokens);
        let prompt = prompts::synthesize_prompt(question, sources, rounds);
        let reason = match self.llm.generate_with_system(prompts::SYNTHESIZE_SYSTEM, &prompt, &options).await {
            Ok(text) if !text.trim().is_empty() => return Outcome::ok(text),
            Ok(_) => "empty synthesis".to_string(),
            Err(e) => format!("transport: {}", e),
        };
        Outcome::fallback(fallback_synthesis(question, sources, FALLBACK_LISTING), reason)
    }

    async fn verify_sources(&self, question: &str, mut sources: Vec<SourceRecord>) -> Outcome<Vec<SourceRecord>> {
        if !self.settings.verify_sources || sources.is_empty() {
            return Outcome::ok(sources);
        }
        let prompt = prompts::verify_prompt(question, &sources);
        let text = match self.ask(prompts::VERIFY_SYSTEM, &prompt, 1500).await {
            Ok(text) => text,
            Err(e) => return Outcome::fallback(sources, format!("transport: {}", e)),
        };
        let raw = match parse_reply::<RawVerification>(&text) {
            Ok(raw) => raw,
            Err(e) => return Outcome::fallback(sources, e.to_string()),
        };

        let verdicts: HashMap<String, RawVerdict> = raw.sources.into_iter().map(|v| (v.url.clone(), v)).collect();
        for source in sources.iter_mut() {
            let Some(verdict) = verdicts.get(&source.url) else {
                continue;
            };
            if let Some(authority) = verdict.authority {
                source.authority = authority;
            }
            if let Some(currency) = verdict.currency {
                source.currency = currency;
            }
            if let Some(recommended_use) = verdict.recommended_use {
                source.recommended_use = recommended_use;
            }
            if let Some(notes) = &verdict.notes {
                source.verification_notes = Some(notes.clone());
            }
        }
        Outcome::ok(sources)
    }

    fn name(&self) -> &str {
        "llm"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AppError;
    use rstest::rstest;
    use std::sync::Mutex;

    /// Replies from a fixed script, one per call.
    struct ScriptedLlm {
        replies: Mutex<Vec<Result<String>>>,
    }

    impl ScriptedLlm {
        fn new(replies: Vec<Result<String>>) -> Arc<Self> {
            let mut replies = replies;
            replies.reverse();
            Arc::new(Self {
                replies: Mutex::new(replies),
            })
        }
    }

    #[async_trait]
    impl LLMClient for ScriptedLlm {
        async fn generate(&self, prompt: &str, options: &CompletionOptions) -> Result<String> {
            self.generate_with_system("", prompt, options).await
        }

        async fn generate_with_system(&self, _system: &str, _prompt: &str, _options: &CompletionOptions) -> Result<String> {
            self.replies
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(AppError::LLM("script exhausted".to_string())))
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    fn service(replies: Vec<Result<String>>) -> LlmDecisionService {
        LlmDecisionService::new(
            ScriptedLlm::new(replies),
            Arc::new(DomainPolicy::default()),
            LlmPolicySettings {
                verify_sources: true,
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn test_plan_parses_fenced_reply() {
        let reply = "```json\n{\"complexity\": \"moderada\", \"initial_queries\": [\"usucapion requisitos\", {\"query\": \"ley 791 de 2002\", \"priority\": \"alta\"}]}\n```";
        let plan = service(vec![Ok(reply.to_string())]).plan("usucapion").await.unwrap();

        assert!(!plan.is_fallback());
        assert_eq!(plan.value.complexity, Complexity::Moderate);
        assert_eq!(plan.value.initial_queries[0].priority, QueryPriority::High);
        assert_eq!(plan.value.initial_queries[1].text, "ley 791 de 2002");
    }

    #[tokio::test]
    async fn test_plan_garbage_falls_back_and_transport_error_propagates() {
        let plan = service(vec![Ok("no idea".to_string())]).plan("usucapion").await.unwrap();
        assert!(plan.is_fallback());
        assert_eq!(plan.value, ResearchPlan::fallback("usucapion"));

        let err = service(vec![Err(AppError::LLM("down".to_string()))]).plan("usucapion").await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn test_evaluate_unparsable_is_conservative() {
        let outcome = service(vec![Ok("The evidence looks fine.".to_string())])
            .evaluate("q", &[], &[])
            .await;
        assert!(outcome.is_fallback());
        assert!(outcome.value.should_continue);
        assert!(outcome.value.overall() < 4.0);
    }

    #[tokio::test]
    async fn test_evaluate_normalizes_hundred_scale_and_missing_overall() {
        let reply = r#"{"is_sufficient": true, "confidence": 92, "scores": {"normativa": 90, "jurisprudencia": 80, "doctrina": 70, "actualidad": 60, "verificacion": 50}}"#;
        let decision = service(vec![Ok(reply.to_string())])
            .evaluate("q", &[], &[])
            .await
            .into_value();

        assert!(!decision.should_continue);
        assert!((decision.confidence - 0.92).abs() < 1e-6);
        assert_eq!(decision.quality_assessment.primary_law, 9.0);
        assert!((decision.overall() - 7.0).abs() < 1e-5);
    }

    #[rstest]
    #[case::hundred_scale_overall(9.0, 90.0)]
    #[case::hundred_scale_dimensions(90.0, 9.0)]
    #[tokio::test]
    async fn test_evaluate_normalizes_mixed_scales_per_value(#[case] dimension: f32, #[case] overall: f32) {
        let reply = serde_json::json!({
            "should_continue": false,
            "confidence": 0.95,
            "quality_assessment": {
                "primary_law": dimension,
                "case_law": dimension,
                "scholarship": dimension,
                "currency": dimension,
                "verification": dimension,
                "overall": overall
            }
        })
        .to_string();
        let decision = service(vec![Ok(reply)]).evaluate("q", &[], &[]).await.into_value();

        let scores = &decision.quality_assessment;
        for score in [scores.primary_law, scores.case_law, scores.scholarship, scores.currency, scores.verification] {
            assert!((score - 9.0).abs() < 1e-5, "dimension {}", score);
        }
        assert!((decision.overall() - 9.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_evaluate_without_scores_falls_back() {
        let outcome = service(vec![Ok(r#"{"should_continue": false, "confidence": 1.0}"#.to_string())])
            .evaluate("q", &[], &[])
            .await;
        assert!(outcome.is_fallback());
        assert!(outcome.value.should_continue);
    }

    #[tokio::test]
    async fn test_propose_falls_back_to_templates() {
        let outcome = service(vec![Ok(r#"{"queries": []}"#.to_string())])
            .propose_queries("usucapion", &[], &[])
            .await;
        assert!(outcome.is_fallback());
        assert_eq!(outcome.value, DomainPolicy::default().follow_up_queries("usucapion"));
    }

    #[tokio::test]
    async fn test_synthesis_failure_lists_sources() {
        let outcome = service(vec![Err(AppError::Timeout(1000))])
            .synthesize("usucapion", &[], &[])
            .await;
        assert!(outcome.is_fallback());
        assert!(outcome.value.starts_with("Automated synthesis failed"));
    }

    #[tokio::test]
    async fn test_verify_applies_verdicts_by_url() {
        use crate::research::provider::SearchHit;
        use crate::research::source::SourceCategory;

        let hit = |url: &str| SearchHit {
            title: "t".to_string(),
            url: url.to_string(),
            snippet: String::new(),
            category: None,
            relevance: None,
        };
        let sources = vec![
            SourceRecord::from_hit(hit("https://a.gov.co"), SourceCategory::Official, 0.5, "q"),
            SourceRecord::from_hit(hit("https://b.com"), SourceCategory::General, 0.5, "q"),
        ];
        let reply = r#"{"sources": [{"url": "https://b.com", "recommended_use": "no_usar", "currency": "desactualizada", "notes": "derogada"}]}"#;
        let verified = service(vec![Ok(reply.to_string())])
            .verify_sources("q", sources)
            .await
            .into_value();

        assert_eq!(verified[0].recommended_use, RecommendedUse::PrimaryCitation);
        assert_eq!(verified[1].recommended_use, RecommendedUse::DoNotUse);
        assert_eq!(verified[1].currency, Currency::Outdated);
        assert_eq!(verified[1].verification_notes.as_deref(), Some("derogada"));
    }
}
