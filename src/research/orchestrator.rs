//! The research control loop.
//!
//! ```text
//! PLANNING -> ROUND(1) -> ROUND(2) -> ... -> SYNTHESIS -> DONE
//!     \__________\___________\______-> ERROR -> SYNTHESIS (degraded)
//! ```
//!
//! [`Orchestrator::run_research`] never fails and never panics outward:
//! planning transport errors and panics inside injected collaborators end the
//! session with `success = false` and a deterministic synthesis over whatever
//! evidence was collected.

use chrono::{DateTime, Utc};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::decision::{Complexity, DecisionService, FallbackLog, fallback_synthesis};
use super::domains::DomainPolicy;
use super::evidence::EvidenceSet;
use super::floors::EvidenceFloors;
use super::policy::{StopCheck, StopReason, StoppingPolicy};
use super::provider::{ContentEnricher, NoopEnricher, SearchProvider};
use super::query::{Query, QueryLedger, QueryPriority};
use super::round::{Round, RoundController, RoundRequest, RoundSettings};
use super::source::SourceRecord;

/// Sources listed by the degraded synthesis.
const DEGRADED_LISTING: usize = 20;

/// Per-request caps.
#[derive(Clone)]
pub struct ResearchOptions {
    pub max_rounds: usize,
    pub max_searches_per_round: usize,
    pub per_search_timeout: Duration,
    /// Replaces the orchestrator's decision policy for this request.
    pub decision_override: Option<Arc<dyn DecisionService>>,
}

impl Default for ResearchOptions {
    fn default() -> Self {
        Self {
            max_rounds: 5,
            max_searches_per_round: 6,
            per_search_timeout: Duration::from_secs(15),
            decision_override: None,
        }
    }
}

impl fmt::Debug for ResearchOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResearchOptions")
            .field("max_rounds", &self.max_rounds)
            .field("max_searches_per_round", &self.max_searches_per_round)
            .field("per_search_timeout", &self.per_search_timeout)
            .field(
                "decision_override",
                &self.decision_override.as_ref().map(|d| d.name().to_string()),
            )
            .finish()
    }
}

/// Session-independent orchestrator configuration.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Cap on accumulated sources.
    pub max_sources: usize,
    pub round: RoundSettings,
    pub stopping: StoppingPolicy,
    pub domains: Arc<DomainPolicy>,
    pub floors: Arc<EvidenceFloors>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_sources: 20,
            round: RoundSettings::default(),
            stopping: StoppingPolicy::default(),
            domains: Arc::new(DomainPolicy::default()),
            floors: Arc::new(EvidenceFloors::default()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResearchPhase {
    Planning,
    Round(usize),
    Synthesis,
    Done,
    Error,
}

impl fmt::Display for ResearchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Planning => f.write_str("planning"),
            Self::Round(n) => write!(f, "round({})", n),
            Self::Synthesis => f.write_str("synthesis"),
            Self::Done => f.write_str("done"),
            Self::Error => f.write_str("error"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResearchMetadata {
    pub total_rounds: usize,
    pub total_sources: usize,
    pub high_quality_sources: usize,
    pub official_sources: usize,
    pub average_quality: f32,
    pub gaps_identified: usize,
    pub elapsed_ms: u64,
    /// `overall` of the last round's decision.
    pub final_sufficiency: f32,
    pub complexity: Option<Complexity>,
    pub minimum_rounds: usize,
    pub decision_policy: String,
    pub fallbacks: FallbackLog,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchResult {
    pub session_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub question: String,
    pub success: bool,
    pub final_context: String,
    pub all_sources: Vec<SourceRecord>,
    pub rounds: Vec<Round>,
    pub stop_reason: StopReason,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub metadata: ResearchMetadata,
}

/// Mutable state of one session. Dropped when the result is built.
struct Session {
    id: Uuid,
    evidence: EvidenceSet,
    rounds: Vec<Round>,
    ledger: QueryLedger,
    pending_gaps: Vec<Query>,
    fallbacks: FallbackLog,
    complexity: Option<Complexity>,
    minimum_rounds: usize,
    phase: ResearchPhase,
}

impl Session {
    fn new(max_sources: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            evidence: EvidenceSet::new(max_sources),
            rounds: Vec::new(),
            ledger: QueryLedger::new(),
            pending_gaps: Vec::new(),
            fallbacks: FallbackLog::default(),
            complexity: None,
            minimum_rounds: 1,
            phase: ResearchPhase::Planning,
        }
    }

    fn enter(&mut self, phase: ResearchPhase) {
        info!(session = %self.id, from = %self.phase, to = %phase, "research phase");
        self.phase = phase;
    }
}

pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

pub struct Orchestrator {
    search: Arc<dyn SearchProvider>,
    enricher: Arc<dyn ContentEnricher>,
    decision: Arc<dyn DecisionService>,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(search: Arc<dyn SearchProvider>, decision: Arc<dyn DecisionService>, config: OrchestratorConfig) -> Self {
        Self {
            search,
            enricher: Arc::new(NoopEnricher),
            decision,
            config,
        }
    }

    pub fn with_enricher(mut self, enricher: Arc<dyn ContentEnricher>) -> Self {
        self.enricher = enricher;
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Research `question` until the stopping policy fires, then synthesize.
    pub async fn run_research(&self, question: &str, options: &ResearchOptions) -> ResearchResult {
        let started_at = Utc::now();
        let started = Instant::now();
        let decision = options
            .decision_override
            .clone()
            .unwrap_or_else(|| self.decision.clone());
        let mut session = Session::new(self.config.max_sources);

        info!(
            session = %session.id,
            question,
            policy = decision.name(),
            max_rounds = options.max_rounds,
            "research started"
        );

        let outcome = if question.trim().is_empty() {
            Err("question is empty".to_string())
        } else {
            match AssertUnwindSafe(self.drive(question, options, decision.as_ref(), &mut session, started))
                .catch_unwind()
                .await
            {
                Ok(result) => result,
                Err(payload) => Err(format!("research aborted by a panic: {}", panic_message(payload))),
            }
        };

        let (success, stop_reason, error, final_context) = match outcome {
            Ok(reason) => {
                session.enter(ResearchPhase::Synthesis);
                let context = self.synthesize(question, decision.as_ref(), &mut session).await;
                (true, reason, None, context)
            }
            Err(message) => {
                error!(session = %session.id, error = %message, "research failed");
                session.enter(ResearchPhase::Error);
                session.enter(ResearchPhase::Synthesis);
                let context = fallback_synthesis(question, session.evidence.sources(), DEGRADED_LISTING);
                (false, StopReason::Error, Some(message), context)
            }
        };
        session.enter(ResearchPhase::Done);

        let summary = session.evidence.summary();
        let metadata = ResearchMetadata {
            total_rounds: session.rounds.len(),
            total_sources: summary.total,
            high_quality_sources: summary.high_quality,
            official_sources: summary.official,
            average_quality: summary.average_quality,
            gaps_identified: session.rounds.iter().map(|r| r.decision.evidence_gaps.len()).sum(),
            elapsed_ms: started.elapsed().as_millis() as u64,
            final_sufficiency: session.rounds.last().map(|r| r.decision.overall()).unwrap_or(0.0),
            complexity: session.complexity,
            minimum_rounds: session.minimum_rounds,
            decision_policy: decision.name().to_string(),
            fallbacks: session.fallbacks,
        };
        info!(
            session = %session.id,
            success,
            stop_reason = %stop_reason,
            rounds = metadata.total_rounds,
            sources = metadata.total_sources,
            elapsed_ms = metadata.elapsed_ms,
            "research finished"
        );

        ResearchResult {
            session_id: session.id,
            started_at,
            question: question.trim().to_string(),
            success,
            final_context,
            all_sources: session.evidence.into_sources(),
            rounds: session.rounds,
            stop_reason,
            error,
            metadata,
        }
    }

    /// Planning plus the round loop. `Err` carries a catastrophic failure.
    async fn drive(
        &self,
        question: &str,
        options: &ResearchOptions,
        decision: &dyn DecisionService,
        session: &mut Session,
        started: Instant,
    ) -> Result<StopReason, String> {
        let max_rounds = options.max_rounds.max(1);
        let cap = options.max_searches_per_round.max(1);

        let plan = decision
            .plan(question)
            .await
            .map_err(|e| format!("planning failed: {}", e))?;
        session.fallbacks.note("plan", &plan);
        let plan = plan.into_value();
        session.complexity = Some(plan.complexity);
        session.minimum_rounds = self.config.stopping.minimum_rounds(plan.complexity, max_rounds);
        info!(
            session = %session.id,
            complexity = %plan.complexity,
            minimum_rounds = session.minimum_rounds,
            initial_queries = plan.initial_queries.len(),
            "research planned"
        );

        let controller = RoundController::new(
            self.search.clone(),
            self.enricher.clone(),
            self.config.domains.clone(),
            self.config.floors.clone(),
            self.config.round.clone(),
        );
        let mut candidates = plan.initial_queries;

        for round_number in 1..=max_rounds {
            if round_number > 1 {
                candidates = self.next_candidates(question, decision, session, cap).await;
            }
            let mandatory = self.mandatory_queries(question, session, round_number);
            let queries = session
                .ledger
                .select_fresh(mandatory.into_iter().chain(candidates.drain(..)).collect(), cap);

            if queries.is_empty() && round_number > 1 && session.rounds.len() >= session.minimum_rounds {
                info!(session = %session.id, round = round_number, "no fresh queries left");
                return Ok(StopReason::QueriesExhausted);
            }
            session.ledger.record(&queries);

            session.enter(ResearchPhase::Round(round_number));
            let request = RoundRequest {
                question,
                round_number,
                queries,
                per_search_timeout: options.per_search_timeout,
                history: &session.rounds,
            };
            let output = controller
                .run(request, decision, &mut session.evidence, &mut session.fallbacks)
                .await;
            session.pending_gaps = output.gap_queries;
            session.rounds.push(output.round);

            let summary = session.evidence.summary();
            let reason = self.config.stopping.check(StopCheck {
                rounds: &session.rounds,
                summary: &summary,
                minimum_rounds: session.minimum_rounds,
                max_rounds,
                elapsed: started.elapsed(),
            });
            if let Some(reason) = reason {
                info!(session = %session.id, round = round_number, stop_reason = %reason, "stopping");
                return Ok(reason);
            }
        }
        Ok(StopReason::MaxRounds)
    }

    /// Pending gap queries followed by the domain-constrained queries. All
    /// of them run in round 1 or while official sources are below the floor;
    /// otherwise only `forced_per_round` do.
    fn mandatory_queries(&self, question: &str, session: &mut Session, round_number: usize) -> Vec<Query> {
        let domains = &self.config.domains;
        let official = session.evidence.summary().official;
        let limit = if round_number == 1 || official < domains.official_floor {
            usize::MAX
        } else {
            domains.forced_per_round
        };
        let pending: Vec<Query> = session
            .pending_gaps
            .drain(..)
            .chain(domains.mandatory_queries(question))
            .collect();
        session.ledger.select_fresh(pending, limit)
    }

    /// Non-low-priority follow-ups from the last decision, high first; when
    /// none are fresh, ask the policy for new ones.
    async fn next_candidates(&self, question: &str, decision: &dyn DecisionService, session: &mut Session, cap: usize) -> Vec<Query> {
        let mut suggested: Vec<Query> = session
            .rounds
            .last()
            .map(|r| r.decision.next_queries.clone())
            .unwrap_or_default()
            .into_iter()
            .filter(|q| q.priority != QueryPriority::Low)
            .collect();
        suggested.sort_by_key(|q| q.priority);

        let fresh = session.ledger.select_fresh(suggested, cap);
        if !fresh.is_empty() {
            return fresh;
        }
        let proposed = decision
            .propose_queries(question, session.evidence.sources(), &session.rounds)
            .await;
        session.fallbacks.note("propose_queries", &proposed);
        proposed.into_value()
    }

    async fn synthesize(&self, question: &str, decision: &dyn DecisionService, session: &mut Session) -> String {
        let call = decision.synthesize(question, session.evidence.sources(), &session.rounds);
        match AssertUnwindSafe(call).catch_unwind().await {
            Ok(outcome) => {
                session.fallbacks.note("synthesize", &outcome);
                outcome.into_value()
            }
            Err(payload) => {
                warn!(session = %session.id, panic = %panic_message(payload), "synthesis panicked");
                fallback_synthesis(question, session.evidence.sources(), DEGRADED_LISTING)
            }
        }
    }
}
