//! # juris - autonomous multi-round legal research
//!
//! Given a legal question, juris plans search queries, runs them against a web
//! search backend, scores and deduplicates the evidence, and keeps iterating
//! until a decision policy judges the evidence sufficient or a safety cap fires.
//! The result carries a synthesized answer, every source with its quality
//! score, and a per-round audit trail.
//!
//! ## Overview
//!
//! juris can be used in two ways:
//!
//! 1. **As a command-line tool** - Run the `juris` binary
//! 2. **As a library** - Embed the orchestrator in a chat application
//!
//! ## Quick Start (Library Usage)
//!
//! ```rust,ignore
//! use juris::research::{HeuristicDecisionService, ResearchOptions};
//! use juris::tools::search::DaedraSearch;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let result = juris::run_research(
//!         "requisitos para la usucapión extraordinaria",
//!         Arc::new(DaedraSearch::new()),
//!         Arc::new(HeuristicDecisionService::default()),
//!         &ResearchOptions::default(),
//!     )
//!     .await;
//!
//!     println!("{}", result.final_context);
//! }
//! ```
//!
//! ### Model-backed decisions
//!
//! ```rust,ignore
//! use juris::{JurisConfig, LlmDecisionService};
//! use std::sync::Arc;
//!
//! let config = JurisConfig::load_or_default("juris.toml")?;
//! let llm = config.llm_provider()?.create_client().await?;
//! let decision = LlmDecisionService::new(
//!     Arc::from(llm),
//!     Arc::new(config.domains.clone()),
//!     config.llm_policy_settings(),
//! );
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `ollama` | Ollama local inference (default) |
//! | `minimal` | OpenAI-compatible transport only |
//!
//! ## Modules
//!
//! - [`research`] - Orchestrator, rounds, decision policies, stopping rules
//! - [`llm`] - LLM client implementations
//! - [`tools`] - Search and page-fetch adapters
//! - [`utils`] - `juris.toml` loading and validation
//! - [`types`] - Common error type
//! - [`cli`] - Argument parsing and terminal output for the binary

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

/// Command-line parsing and output helpers.
pub mod cli;
/// LLM provider clients and abstractions.
pub mod llm;
/// Multi-round research orchestration.
pub mod research;
/// Search and content-fetch adapters.
pub mod tools;
/// Core error types.
pub mod types;
/// Configuration utilities.
pub mod utils;

pub use llm::{CompletionOptions, LLMClient, Provider};
pub use research::{
    DecisionService, HeuristicDecisionService, LlmDecisionService, Orchestrator, OrchestratorConfig,
    ResearchOptions, ResearchResult, SearchProvider, SourceRecord, StopReason,
};
pub use types::{AppError, Result};
pub use utils::toml_config::{ConfigError, JurisConfig};

use std::sync::Arc;

/// Run one research session with the default orchestrator configuration.
///
/// Never fails: errors surface as `success = false` on the result.
pub async fn run_research(
    question: &str,
    search: Arc<dyn SearchProvider>,
    decision: Arc<dyn DecisionService>,
    options: &ResearchOptions,
) -> ResearchResult {
    Orchestrator::new(search, decision, OrchestratorConfig::default())
        .run_research(question, options)
        .await
}
