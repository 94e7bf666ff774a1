//! Autonomous multi-round legal research
//!
//! The orchestrator keeps searching until the evidence is judged sufficient or
//! a safety cap fires. No fixed iteration count is assumed.
//!
//! # Architecture
//!
//! - [`orchestrator::Orchestrator`] - owns the session, drives rounds, synthesizes
//! - [`round::RoundController`] - one round: search, enrich, verify, merge, evaluate
//! - [`decision::DecisionService`] - replaceable policy: plan, evaluate, propose, synthesize
//!   - [`llm_policy::LlmDecisionService`] - backed by an [`LLMClient`](crate::llm::LLMClient)
//!   - [`heuristic::HeuristicDecisionService`] - deterministic, offline
//! - [`floors::EvidenceFloors`] - evidentiary minimums checked after every evaluation
//! - [`policy::StoppingPolicy`] - when to stop
//! - [`domains::DomainPolicy`] - jurisdiction allow-lists and mandatory queries
//!
//! # Usage
//!
//! ```ignore
//! use juris::research::{Orchestrator, OrchestratorConfig, ResearchOptions, HeuristicDecisionService};
//! use std::sync::Arc;
//!
//! let orchestrator = Orchestrator::new(search, Arc::new(HeuristicDecisionService::default()), OrchestratorConfig::default());
//! let result = orchestrator
//!     .run_research("requisitos para usucapion", &ResearchOptions::default())
//!     .await;
//!
//! println!("{}", result.final_context);
//! for source in &result.all_sources {
//!     println!("- [{}] {}", source.category, source.url);
//! }
//! ```

pub mod decision;
pub mod domains;
pub mod evidence;
pub mod floors;
pub mod heuristic;
pub mod llm_policy;
pub mod orchestrator;
pub mod parsing;
pub mod policy;
pub mod prompts;
pub mod provider;
pub mod query;
pub mod round;
pub mod source;

pub use decision::{Complexity, Decision, DecisionService, FallbackLog, QualityAssessment, ResearchPlan};
pub use domains::DomainPolicy;
pub use evidence::{EvidenceSet, EvidenceSummary};
pub use floors::EvidenceFloors;
pub use heuristic::HeuristicDecisionService;
pub use llm_policy::{LlmDecisionService, LlmPolicySettings};
pub use orchestrator::{Orchestrator, OrchestratorConfig, ResearchMetadata, ResearchOptions, ResearchResult};
pub use parsing::{Outcome, OutcomeStatus, extract_json_object, parse_reply};
pub use policy::{StopReason, StoppingPolicy};
pub use provider::{ContentEnricher, NoopEnricher, SearchError, SearchHit, SearchProvider};
pub use query::{Query, QueryLedger, QueryPriority};
pub use round::{FailedQuery, FailureKind, Round, RoundController, RoundSettings};
pub use source::{Authority, Currency, RecommendedUse, SourceCategory, SourceRecord};
