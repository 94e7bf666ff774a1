//! Rule-based decision policy. Deterministic, needs no model; used offline and
//! in tests.

use async_trait::async_trait;
use std::sync::Arc;

use super::decision::{Complexity, Decision, DecisionService, QualityAssessment, ResearchPlan};
use super::domains::DomainPolicy;
use super::evidence::EvidenceSummary;
use super::floors::EvidenceFloors;
use super::parsing::Outcome;
use super::query::{Query, QueryPriority};
use super::round::Round;
use super::source::{SourceCategory, SourceRecord};
use crate::types::Result;

/// Words that usually mean a question spans several legal issues.
const COMPOUND_MARKERS: &[&str] = &[" y ", " versus ", " vs ", "diferencia", "comparar", "compare", "relación"];

/// Overall score below which the heuristic keeps searching.
const CONTINUE_BELOW: f32 = 8.0;

#[derive(Debug, Clone, Default)]
pub struct HeuristicDecisionService {
    domains: Arc<DomainPolicy>,
    floors: Arc<EvidenceFloors>,
}

impl HeuristicDecisionService {
    pub fn new(domains: Arc<DomainPolicy>, floors: Arc<EvidenceFloors>) -> Self {
        Self { domains, floors }
    }

    fn complexity(question: &str) -> Complexity {
        let lowered = format!(" {} ", question.to_lowercase());
        let words = question.split_whitespace().count();
        let base = match words {
            0..=3 => 0,
            4..=8 => 1,
            9..=16 => 2,
            _ => 3,
        };
        let bump = usize::from(COMPOUND_MARKERS.iter().any(|m| lowered.contains(m)));
        match (base + bump).min(3) {
            0 => Complexity::Simple,
            1 => Complexity::Moderate,
            2 => Complexity::Complex,
            _ => Complexity::VeryComplex,
        }
    }

    fn mentioning(sources: &[SourceRecord], keywords: &[String]) -> usize {
        sources
            .iter()
            .filter(|s| {
                let text = s.searchable_text();
                keywords.iter().any(|k| text.contains(&k.to_lowercase()))
            })
            .count()
    }

    fn assess(&self, sources: &[SourceRecord]) -> QualityAssessment {
        if sources.is_empty() {
            return QualityAssessment::uniform(0.0);
        }
        let summary = EvidenceSummary::of(sources);
        let scaled = |count: usize, per: f32| (count as f32 * per).min(10.0);
        let statutes = Self::mentioning(sources, &self.floors.statute_keywords);
        let cases = Self::mentioning(sources, &self.floors.jurisprudence_keywords);
        let doctrine = Self::mentioning(sources, &self.floors.doctrine_keywords);
        let average_relevance = sources.iter().map(|s| s.relevance).sum::<f32>() / sources.len() as f32;

        let mut assessment = QualityAssessment {
            primary_law: scaled(summary.official, 2.0) * 0.5 + scaled(statutes, 2.5) * 0.5,
            case_law: scaled(cases, 3.0),
            scholarship: scaled(summary.academic, 2.5) * 0.5 + scaled(doctrine, 2.5) * 0.5,
            currency: (average_relevance * 10.0).min(10.0),
            verification: summary.average_quality,
            overall: 0.0,
        };
        assessment.overall = assessment.dimension_mean();
        assessment
    }

    /// Follow-ups built from the question and the titles of the best sources.
    fn follow_ups(&self, question: &str, sources: &[SourceRecord]) -> Vec<Query> {
        let from_titles = sources
            .iter()
            .filter(|s| matches!(s.category, SourceCategory::Official | SourceCategory::Academic))
            .take(3)
            .map(|s| {
                let title: Vec<&str> = s.title.split_whitespace().take(6).collect();
                Query::new(
                    format!("{} {}", question.trim(), title.join(" ")),
                    QueryPriority::Medium,
                    format!("expand on {}", s.url),
                )
            });
        self.domains
            .follow_up_queries(question)
            .into_iter()
            .chain(from_titles)
            .collect()
    }
}

#[async_trait]
impl DecisionService for HeuristicDecisionService {
    async fn plan(&self, question: &str) -> Result<Outcome<ResearchPlan>> {
        let mut initial_queries = vec![Query::high(question.trim(), "original question")];
        initial_queries.extend(self.domains.follow_up_queries(question));
        Ok(Outcome::ok(ResearchPlan {
            complexity: Self::complexity(question),
            initial_queries,
        }))
    }

    async fn evaluate(&self, question: &str, sources: &[SourceRecord], _rounds: &[Round]) -> Outcome<Decision> {
        let assessment = self.assess(sources);
        let overall = assessment.overall;
        let should_continue = overall < CONTINUE_BELOW;
        let coverage = (sources.len() as f32 / 10.0).min(1.0);

        let mut missing_information = Vec::new();
        if assessment.primary_law < 5.0 {
            missing_information.push("statutory text".to_string());
        }
        if assessment.case_law < 5.0 {
            missing_information.push("case law".to_string());
        }
        if assessment.scholarship < 5.0 {
            missing_information.push("doctrine".to_string());
        }

        Outcome::ok(Decision {
            should_continue,
            confidence: (overall / 10.0 * coverage).clamp(0.0, 1.0),
            quality_assessment: assessment,
            missing_information,
            next_queries: if should_continue {
                self.follow_ups(question, sources)
            } else {
                Vec::new()
            },
            reasoning: format!("rule-based assessment over {} sources", sources.len()),
            evidence_gaps: Vec::new(),
        })
    }

    async fn propose_queries(&self, question: &str, sources: &[SourceRecord], _rounds: &[Round]) -> Outcome<Vec<Query>> {
        Outcome::ok(self.follow_ups(question, sources))
    }

    async fn synthesize(&self, question: &str, sources: &[SourceRecord], rounds: &[Round]) -> Outcome<String> {
        let mut text = format!("Research summary for: {}\n", question.trim());
        if let Some(last) = rounds.last() {
            text.push_str(&format!(
                "Rounds: {}. Final overall score: {:.1}/10.\n",
                rounds.len(),
                last.decision.overall()
            ));
        }
        for category in [
            SourceCategory::Official,
            SourceCategory::Academic,
            SourceCategory::News,
            SourceCategory::General,
        ] {
            let group: Vec<&SourceRecord> = sources.iter().filter(|s| s.category == category).collect();
            if group.is_empty() {
                continue;
            }
            text.push_str(&format!("\n{} sources:\n", category));
            for source in group {
                text.push_str(&format!("- {} <{}>\n", source.title, source.url));
                let excerpt: String = source.best_text().chars().take(300).collect();
                if !excerpt.trim().is_empty() {
                    text.push_str(&format!("  {}\n", excerpt.trim()));
                }
            }
        }
        if sources.is_empty() {
            text.push_str("\nNo sources were found.\n");
        }
        Outcome::ok(text)
    }

    fn name(&self) -> &str {
        "heuristic"
    }
}
