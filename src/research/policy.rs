//! When to stop researching.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use super::decision::{Complexity, Decision};
use super::evidence::EvidenceSummary;
use super::round::Round;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The policy judged the evidence sufficient.
    Sufficient,
    MaxRounds,
    /// Several consecutive low-quality rounds. Not a success signal.
    DeadEnd,
    TimeBudget,
    HighQualityTarget,
    /// No unexecuted query was left to run.
    QueriesExhausted,
    /// Planning failed or a collaborator panicked.
    Error,
}

impl StopReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sufficient => "sufficient",
            Self::MaxRounds => "max_rounds",
            Self::DeadEnd => "dead_end",
            Self::TimeBudget => "time_budget",
            Self::HighQualityTarget => "high_quality_target",
            Self::QueriesExhausted => "queries_exhausted",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Minimum rounds per complexity tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinimumRounds {
    #[serde(default = "default_simple")]
    pub simple: usize,
    #[serde(default = "default_moderate")]
    pub moderate: usize,
    #[serde(default = "default_complex")]
    pub complex: usize,
    #[serde(default = "default_very_complex")]
    pub very_complex: usize,
}

fn default_simple() -> usize {
    1
}

fn default_moderate() -> usize {
    2
}

fn default_complex() -> usize {
    3
}

fn default_very_complex() -> usize {
    4
}

impl Default for MinimumRounds {
    fn default() -> Self {
        Self {
            simple: default_simple(),
            moderate: default_moderate(),
            complex: default_complex(),
            very_complex: default_very_complex(),
        }
    }
}

impl MinimumRounds {
    pub fn for_complexity(&self, complexity: Complexity) -> usize {
        match complexity {
            Complexity::Simple => self.simple,
            Complexity::Moderate => self.moderate,
            Complexity::Complex => self.complex,
            Complexity::VeryComplex => self.very_complex,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoppingPolicy {
    #[serde(default = "default_sufficient_confidence")]
    pub sufficient_confidence: f32,

    #[serde(default = "default_sufficient_overall")]
    pub sufficient_overall: f32,

    #[serde(default = "default_dead_end_rounds")]
    pub dead_end_rounds: usize,

    #[serde(default = "default_dead_end_overall")]
    pub dead_end_overall: f32,

    #[serde(default = "default_max_elapsed_ms")]
    pub max_elapsed_ms: u64,

    #[serde(default = "default_high_quality_sources")]
    pub high_quality_sources: usize,

    #[serde(default = "default_high_quality_overall")]
    pub high_quality_overall: f32,

    #[serde(default)]
    pub minimum_rounds: MinimumRounds,
}

fn default_sufficient_confidence() -> f32 {
    0.9
}

fn default_sufficient_overall() -> f32 {
    8.0
}

fn default_dead_end_rounds() -> usize {
    3
}

fn default_dead_end_overall() -> f32 {
    5.0
}

fn default_max_elapsed_ms() -> u64 {
    300_000
}

fn default_high_quality_sources() -> usize {
    8
}

fn default_high_quality_overall() -> f32 {
    7.0
}

impl Default for StoppingPolicy {
    fn default() -> Self {
        Self {
            sufficient_confidence: default_sufficient_confidence(),
            sufficient_overall: default_sufficient_overall(),
            dead_end_rounds: default_dead_end_rounds(),
            dead_end_overall: default_dead_end_overall(),
            max_elapsed_ms: default_max_elapsed_ms(),
            high_quality_sources: default_high_quality_sources(),
            high_quality_overall: default_high_quality_overall(),
            minimum_rounds: MinimumRounds::default(),
        }
    }
}

/// Everything the policy looks at after a round.
#[derive(Debug, Clone, Copy)]
pub struct StopCheck<'a> {
    pub rounds: &'a [Round],
    pub summary: &'a EvidenceSummary,
    pub minimum_rounds: usize,
    pub max_rounds: usize,
    pub elapsed: Duration,
}

impl StoppingPolicy {
    /// Minimum rounds for a complexity, clamped to `max_rounds`.
    pub fn minimum_rounds(&self, complexity: Complexity, max_rounds: usize) -> usize {
        self.minimum_rounds.for_complexity(complexity).min(max_rounds)
    }

    pub fn max_elapsed(&self) -> Duration {
        Duration::from_millis(self.max_elapsed_ms)
    }

    /// `Some` when the session must stop after the latest round.
    pub fn check(&self, state: StopCheck<'_>) -> Option<StopReason> {
        let last = state.rounds.last()?;
        let completed = state.rounds.len();
        let minimum_reached = completed >= state.minimum_rounds;

        if minimum_reached && self.is_sufficient(&last.decision) {
            return Some(StopReason::Sufficient);
        }
        if completed >= state.max_rounds {
            return Some(StopReason::MaxRounds);
        }
        if self.is_dead_end(state.rounds) {
            return Some(StopReason::DeadEnd);
        }
        if state.elapsed >= self.max_elapsed() {
            return Some(StopReason::TimeBudget);
        }
        if minimum_reached
            && state.summary.high_quality >= self.high_quality_sources
            && last.decision.overall() >= self.high_quality_overall
        {
            return Some(StopReason::HighQualityTarget);
        }
        None
    }

    fn is_sufficient(&self, decision: &Decision) -> bool {
        !decision.should_continue
            && decision.confidence >= self.sufficient_confidence
            && decision.overall() >= self.sufficient_overall
    }

    fn is_dead_end(&self, rounds: &[Round]) -> bool {
        self.dead_end_rounds > 0
            && rounds.len() >= self.dead_end_rounds
            && rounds[rounds.len() - self.dead_end_rounds..]
                .iter()
                .all(|r| r.decision.overall() < self.dead_end_overall)
    }
}
