//! Prompt templates for the LLM-backed decision policy.
//!
//! The wording is opaque to the orchestrator; only the JSON shapes the
//! replies are asked to follow matter, and those mirror the reply structs in
//! `llm_policy`.

use super::evidence::EvidenceSummary;
use super::round::Round;
use super::source::SourceRecord;

pub const PLAN_SYSTEM: &str = "You are a senior legal researcher. You plan web searches for questions about the law of the configured jurisdiction. Reply with a single JSON object and nothing else.";

pub const EVALUATE_SYSTEM: &str = "You are a strict legal research reviewer. You judge whether collected sources are enough to answer a legal question with citations to statutes, case law and doctrine. Reply with a single JSON object and nothing else.";

pub const PROPOSE_SYSTEM: &str = "You are a legal research assistant. You propose new web searches that close the gaps in the evidence collected so far. Reply with a single JSON object and nothing else.";

pub const VERIFY_SYSTEM: &str = "You verify legal sources. For each source judge its authority, whether it is current law and how it should be used. Reply with a single JSON object and nothing else.";

pub const SYNTHESIZE_SYSTEM: &str = "You are a legal analyst. Write a structured answer context from the sources provided, citing each claim with the source URL. Say explicitly when the sources do not settle a point.";

/// Characters of source text included per source.
const EXCERPT_CHARS: usize = 500;

fn excerpt(text: &str, limit: usize) -> String {
    let mut out: String = text.chars().take(limit).collect();
    if text.chars().count() > limit {
        out.push_str("...");
    }
    out.replace('\n', " ")
}

/// Numbered source listing shared by the evidence-bearing prompts.
pub fn render_sources(sources: &[SourceRecord]) -> String {
    if sources.is_empty() {
        return "(no sources yet)".to_string();
    }
    sources
        .iter()
        .enumerate()
        .map(|(i, s)| {
            format!(
                "[{}] {} | {} | category={} quality={:.1} authority={:?}\n    {}",
                i + 1,
                s.title,
                s.url,
                s.category,
                s.quality,
                s.authority,
                excerpt(s.best_text(), EXCERPT_CHARS)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_history(rounds: &[Round]) -> String {
    if rounds.is_empty() {
        return "(first round)".to_string();
    }
    rounds
        .iter()
        .map(|r| {
            let queries: Vec<&str> = r.queries.iter().map(|q| q.text.as_str()).collect();
            format!(
                "Round {}: {} results, overall {:.1}, queries: {}",
                r.round_number,
                r.results.len(),
                r.decision.overall(),
                queries.join(" ; ")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_summary(summary: &EvidenceSummary) -> String {
    format!(
        "total={} official={} academic={} news={} general={} high_quality={} average_quality={:.1}",
        summary.total,
        summary.official,
        summary.academic,
        summary.news,
        summary.general,
        summary.high_quality,
        summary.average_quality
    )
}

pub fn plan_prompt(question: &str) -> String {
    format!(
        r#"Legal question: {question}

Classify how complex the research is and propose between 3 and 6 initial web searches.

Return JSON:
{{
  "complexity": "simple" | "moderate" | "complex" | "very-complex",
  "initial_queries": [
    {{"text": "...", "priority": "high" | "medium" | "low", "rationale": "..."}}
  ]
}}"#
    )
}

pub fn evaluate_prompt(question: &str, sources: &[SourceRecord], rounds: &[Round]) -> String {
    format!(
        r#"Legal question: {question}

Evidence summary: {summary}

Research so far:
{history}

Sources:
{sources}

Score each dimension from 0 to 10 and decide whether more searching is needed.

Return JSON:
{{
  "should_continue": true | false,
  "confidence": 0.0-1.0,
  "quality_assessment": {{
    "primary_law": 0-10, "case_law": 0-10, "scholarship": 0-10,
    "currency": 0-10, "verification": 0-10, "overall": 0-10
  }},
  "missing_information": ["..."],
  "next_queries": [{{"text": "...", "priority": "high" | "medium" | "low", "rationale": "..."}}],
  "reasoning": "..."
}}"#,
        summary = render_summary(&EvidenceSummary::of(sources)),
        history = render_history(rounds),
        sources = render_sources(sources),
    )
}

pub fn propose_prompt(question: &str, sources: &[SourceRecord], rounds: &[Round]) -> String {
    format!(
        r#"Legal question: {question}

Research so far:
{history}

Sources:
{sources}

Propose up to 5 new searches that are not repeats of earlier ones.

Return JSON:
{{"queries": [{{"text": "...", "priority": "high" | "medium" | "low", "rationale": "..."}}]}}"#,
        history = render_history(rounds),
        sources = render_sources(sources),
    )
}

pub fn verify_prompt(question: &str, sources: &[SourceRecord]) -> String {
    format!(
        r#"Legal question: {question}

Sources:
{sources}

Return JSON with one entry per source, in any order, keyed by URL:
{{
  "sources": [
    {{
      "url": "...",
      "authority": "maximal" | "high" | "medium" | "low" | "minimal",
      "currency": "current" | "outdated" | "unknown",
      "recommended_use": "primary-citation" | "secondary" | "contextual" | "do-not-use",
      "notes": "..."
    }}
  ]
}}"#,
        sources = render_sources(sources),
    )
}

pub fn synthesize_prompt(question: &str, sources: &[SourceRecord], rounds: &[Round]) -> String {
    format!(
        r#"Legal question: {question}

Research history:
{history}

Sources:
{sources}

Write the answer context: applicable statutes, relevant case law, doctrine, and open points."#,
        history = render_history(rounds),
        sources = render_sources(sources),
    )
}
