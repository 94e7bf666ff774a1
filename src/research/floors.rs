//! Evidentiary floors checked against the evidence itself, whatever the
//! decision policy claimed.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::decision::Decision;
use super::evidence::EvidenceSummary;
use super::query::{Query, QueryPriority, render_template};
use super::source::SourceRecord;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceFloors {
    #[serde(default = "default_min_official")]
    pub min_official: usize,

    #[serde(default = "default_min_one")]
    pub min_statute: usize,

    #[serde(default = "default_min_one")]
    pub min_jurisprudence: usize,

    #[serde(default = "default_min_one")]
    pub min_doctrine: usize,

    /// Subtracted from `overall` per unmet floor.
    #[serde(default = "default_penalty")]
    pub penalty: f32,

    #[serde(default = "default_statute_keywords")]
    pub statute_keywords: Vec<String>,

    #[serde(default = "default_jurisprudence_keywords")]
    pub jurisprudence_keywords: Vec<String>,

    #[serde(default = "default_doctrine_keywords")]
    pub doctrine_keywords: Vec<String>,

    #[serde(default = "default_official_gap_template")]
    pub official_gap_template: String,

    #[serde(default = "default_statute_gap_template")]
    pub statute_gap_template: String,

    #[serde(default = "default_jurisprudence_gap_template")]
    pub jurisprudence_gap_template: String,

    #[serde(default = "default_doctrine_gap_template")]
    pub doctrine_gap_template: String,
}

fn default_min_official() -> usize {
    2
}

fn default_min_one() -> usize {
    1
}

fn default_penalty() -> f32 {
    1.5
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn default_statute_keywords() -> Vec<String> {
    words(&["artículo", "articulo", "art.", "ley", "decreto", "código", "codigo"])
}

fn default_jurisprudence_keywords() -> Vec<String> {
    words(&["sentencia", "jurisprudencia", "corte", "fallo", "magistrado"])
}

fn default_doctrine_keywords() -> Vec<String> {
    words(&["doctrina", "académico", "academico", "universidad", "revista", "tratadista"])
}

fn default_official_gap_template() -> String {
    "{question} site:gov.co".to_string()
}

fn default_statute_gap_template() -> String {
    "{question} artículo ley decreto".to_string()
}

fn default_jurisprudence_gap_template() -> String {
    "{question} sentencia jurisprudencia corte".to_string()
}

fn default_doctrine_gap_template() -> String {
    "{question} doctrina académico universidad".to_string()
}

impl Default for EvidenceFloors {
    fn default() -> Self {
        Self {
            min_official: default_min_official(),
            min_statute: default_min_one(),
            min_jurisprudence: default_min_one(),
            min_doctrine: default_min_one(),
            penalty: default_penalty(),
            statute_keywords: default_statute_keywords(),
            jurisprudence_keywords: default_jurisprudence_keywords(),
            doctrine_keywords: default_doctrine_keywords(),
            official_gap_template: default_official_gap_template(),
            statute_gap_template: default_statute_gap_template(),
            jurisprudence_gap_template: default_jurisprudence_gap_template(),
            doctrine_gap_template: default_doctrine_gap_template(),
        }
    }
}

fn count_mentioning(sources: &[SourceRecord], keywords: &[String]) -> usize {
    sources
        .iter()
        .filter(|s| {
            let text = s.searchable_text();
            keywords.iter().any(|k| text.contains(&k.to_lowercase()))
        })
        .count()
}

impl EvidenceFloors {
    /// Apply every floor to `decision` and return the gap queries to inject
    /// into the next round. Each unmet floor lowers `overall` by `penalty`
    /// (not below 0), forces continuation and records the gap.
    pub fn enforce(&self, decision: &mut Decision, question: &str, sources: &[SourceRecord]) -> Vec<Query> {
        let summary = EvidenceSummary::of(sources);
        let checks = [
            (
                summary.official,
                self.min_official,
                "official sources",
                &self.official_gap_template,
            ),
            (
                count_mentioning(sources, &self.statute_keywords),
                self.min_statute,
                "statute or article references",
                &self.statute_gap_template,
            ),
            (
                count_mentioning(sources, &self.jurisprudence_keywords),
                self.min_jurisprudence,
                "jurisprudence references",
                &self.jurisprudence_gap_template,
            ),
            (
                count_mentioning(sources, &self.doctrine_keywords),
                self.min_doctrine,
                "doctrinal references",
                &self.doctrine_gap_template,
            ),
        ];

        let mut gap_queries = Vec::new();
        for (found, required, label, template) in checks {
            if found >= required {
                continue;
            }
            let gap = format!("{}: found {}, required {}", label, found, required);
            debug!(gap = %gap, "evidentiary floor not met");

            let overall = &mut decision.quality_assessment.overall;
            *overall = (*overall - self.penalty).max(0.0);
            decision.should_continue = true;
            decision.missing_information.push(format!("more {}", label));
            decision.evidence_gaps.push(gap.clone());
            gap_queries.push(Query::new(render_template(template, question), QueryPriority::High, gap));
        }
        gap_queries
    }
}
