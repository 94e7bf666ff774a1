//! The replaceable research policy and the values it produces.
//!
//! A [`DecisionService`] plans the first queries, judges whether the evidence
//! suffices, proposes follow-ups and writes the final synthesis. Every
//! operation except planning returns a value even when the upstream reply is
//! unusable, tagged through [`Outcome`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::parsing::Outcome;
use super::query::Query;
use super::round::Round;
use super::source::SourceRecord;
use crate::types::Result;

/// Score every dimension gets when evaluation falls back.
pub const FALLBACK_SCORE: f32 = 3.0;
/// Confidence reported when evaluation falls back.
pub const FALLBACK_CONFIDENCE: f32 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Complexity {
    #[serde(alias = "simple", alias = "baja", alias = "low")]
    Simple,
    #[serde(alias = "moderada", alias = "media", alias = "medium")]
    Moderate,
    #[serde(alias = "compleja", alias = "alta", alias = "high")]
    Complex,
    #[serde(alias = "very_complex", alias = "muy_compleja", alias = "muy-compleja")]
    VeryComplex,
}

impl Complexity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Moderate => "moderate",
            Self::Complex => "complex",
            Self::VeryComplex => "very-complex",
        }
    }
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchPlan {
    pub complexity: Complexity,
    pub initial_queries: Vec<Query>,
}

impl ResearchPlan {
    /// Plan used when the planning reply cannot be parsed.
    pub fn fallback(question: &str) -> Self {
        Self {
            complexity: Complexity::Complex,
            initial_queries: vec![Query::high(question.trim(), "original question")],
        }
    }
}

/// Sub-scores per evidentiary dimension, all on the 0-10 scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityAssessment {
    pub primary_law: f32,
    pub case_law: f32,
    pub scholarship: f32,
    pub currency: f32,
    pub verification: f32,
    pub overall: f32,
}

impl QualityAssessment {
    pub fn uniform(score: f32) -> Self {
        Self {
            primary_law: score,
            case_law: score,
            scholarship: score,
            currency: score,
            verification: score,
            overall: score,
        }
    }

    /// Mean of the five dimensions, excluding `overall`.
    pub fn dimension_mean(&self) -> f32 {
        (self.primary_law + self.case_law + self.scholarship + self.currency + self.verification) / 5.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub should_continue: bool,
    /// 0-1.
    pub confidence: f32,
    pub quality_assessment: QualityAssessment,
    #[serde(default)]
    pub missing_information: Vec<String>,
    #[serde(default)]
    pub next_queries: Vec<Query>,
    #[serde(default)]
    pub reasoning: String,
    /// Evidentiary floors found unmet by post-validation.
    #[serde(default)]
    pub evidence_gaps: Vec<String>,
}

impl Decision {
    /// Continue-biased decision used when evaluation cannot be trusted.
    pub fn conservative(reasoning: impl Into<String>) -> Self {
        Self {
            should_continue: true,
            confidence: FALLBACK_CONFIDENCE,
            quality_assessment: QualityAssessment::uniform(FALLBACK_SCORE),
            missing_information: Vec::new(),
            next_queries: Vec::new(),
            reasoning: reasoning.into(),
            evidence_gaps: Vec::new(),
        }
    }

    /// Decision for a round that had nothing to search.
    pub fn insufficient(reasoning: impl Into<String>) -> Self {
        Self {
            should_continue: true,
            confidence: 0.0,
            quality_assessment: QualityAssessment::uniform(0.0),
            missing_information: vec!["no queries were executed".to_string()],
            next_queries: Vec::new(),
            reasoning: reasoning.into(),
            evidence_gaps: Vec::new(),
        }
    }

    pub fn overall(&self) -> f32 {
        self.quality_assessment.overall
    }
}

/// Research policy consumed by the orchestrator.
#[async_trait]
pub trait DecisionService: Send + Sync {
    /// Classify the question and propose the first queries. A transport
    /// failure here is the only error the orchestrator treats as fatal.
    async fn plan(&self, question: &str) -> Result<Outcome<ResearchPlan>>;

    /// Judge whether the accumulated evidence suffices.
    async fn evaluate(&self, question: &str, sources: &[SourceRecord], rounds: &[Round]) -> Outcome<Decision>;

    /// Follow-up queries when the last decision offered none.
    async fn propose_queries(&self, question: &str, sources: &[SourceRecord], rounds: &[Round]) -> Outcome<Vec<Query>>;

    /// Final answer context.
    async fn synthesize(&self, question: &str, sources: &[SourceRecord], rounds: &[Round]) -> Outcome<String>;

    /// Adjust authority, currency and recommended use of freshly harvested
    /// records. The default keeps them as they are.
    async fn verify_sources(&self, _question: &str, sources: Vec<SourceRecord>) -> Outcome<Vec<SourceRecord>> {
        Outcome::ok(sources)
    }

    fn name(&self) -> &str {
        "decision"
    }
}

/// How often each Decision Service operation fell back during a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackLog {
    pub plan: usize,
    pub evaluate: usize,
    pub propose_queries: usize,
    pub synthesize: usize,
    pub verify_sources: usize,
    /// Reasons in the order they happened, prefixed with the operation.
    pub reasons: Vec<String>,
}

impl FallbackLog {
    pub fn total(&self) -> usize {
        self.plan + self.evaluate + self.propose_queries + self.synthesize + self.verify_sources
    }

    pub(crate) fn note<T>(&mut self, operation: &'static str, outcome: &Outcome<T>) {
        let Some(reason) = outcome.fallback_reason() else {
            return;
        };
        tracing::warn!(operation, reason, "decision service fell back");
        let counter = match operation {
            "plan" => &mut self.plan,
            "evaluate" => &mut self.evaluate,
            "propose_queries" => &mut self.propose_queries,
            "synthesize" => &mut self.synthesize,
            _ => &mut self.verify_sources,
        };
        *counter += 1;
        self.reasons.push(format!("{}: {}", operation, reason));
    }
}

/// Deterministic listing used when synthesis fails.
pub fn fallback_synthesis(question: &str, sources: &[SourceRecord], limit: usize) -> String {
    let mut text = format!(
        "Automated synthesis failed; the sources below are listed without analysis and must be reviewed manually.\n\nQuestion: {}\n",
        question.trim()
    );
    if sources.is_empty() {
        text.push_str("\nNo sources were found.\n");
        return text;
    }
    text.push_str("\nSources:\n");
    for (i, source) in sources.iter().take(limit).enumerate() {
        text.push_str(&format!(
            "{}. [{}] {} (quality {:.1})\n   {}\n",
            i + 1,
            source.category,
            source.title,
            source.quality,
            source.url
        ));
        let snippet = source.snippet.trim();
        if !snippet.is_empty() {
            text.push_str(&format!("   {}\n", snippet));
        }
    }
    text
}
