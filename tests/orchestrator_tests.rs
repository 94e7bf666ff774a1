//! End-to-end tests for the research orchestrator
//!
//! Every test uses deterministic stubs from `common::mocks`; no network.

mod common;

use common::mocks::{
    EmptySearch, FailingSearch, MockLLMClient, PanickingDecision, QueryEchoSearch, ScriptedDecision, StaticSearch,
    hit,
};
use juris::research::query::normalize_query_key;
use juris::research::{
    Complexity, DecisionService, DomainPolicy, EvidenceFloors, FailureKind, HeuristicDecisionService, LlmDecisionService,
    LlmPolicySettings, Orchestrator, OrchestratorConfig, ResearchOptions, ResearchResult, SearchError, SearchHit,
    SearchProvider, StopReason,
};
use mockall::mock;
use rstest::rstest;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

const QUESTION: &str = "requisitos para usucapion";

fn relaxed_floors() -> OrchestratorConfig {
    OrchestratorConfig {
        floors: Arc::new(EvidenceFloors {
            min_official: 0,
            min_statute: 0,
            min_jurisprudence: 0,
            min_doctrine: 0,
            ..EvidenceFloors::default()
        }),
        ..OrchestratorConfig::default()
    }
}

fn with_domains(domains: DomainPolicy) -> OrchestratorConfig {
    OrchestratorConfig {
        domains: Arc::new(domains),
        ..relaxed_floors()
    }
}

fn site_queries(round: &juris::research::Round) -> usize {
    round.queries.iter().filter(|q| q.text.contains("site:")).count()
}

fn heuristic() -> Arc<dyn DecisionService> {
    Arc::new(HeuristicDecisionService::default())
}

fn official_hits() -> Vec<SearchHit> {
    vec![
        hit(
            "Código Civil - Prescripción adquisitiva",
            "https://www.secretariasenado.gov.co/senado/basedoc/codigo_civil_pr077.html",
            "artículo 2518 y siguientes del código civil",
        ),
        hit(
            "Sentencia SC-2020 usucapión extraordinaria",
            "https://www.cortesuprema.gov.co/corte/sentencia-usucapion",
            "la corte reitera los requisitos de la posesión",
        ),
    ]
}

fn general_hits(n: usize) -> Vec<SearchHit> {
    (1..=n)
        .map(|i| {
            hit(
                &format!("Blog inmobiliario {}", i),
                &format!("https://blog{}.example.org/usucapion", i),
                "consejos prácticos",
            )
        })
        .collect()
}

fn assert_invariants(result: &ResearchResult, max_rounds: usize) {
    assert!(result.rounds.len() <= max_rounds.max(1));

    let urls: HashSet<&str> = result.all_sources.iter().map(|s| s.url.as_str()).collect();
    assert_eq!(urls.len(), result.all_sources.len(), "duplicate URL in all_sources");

    let mut seen = HashSet::new();
    for round in &result.rounds {
        for query in &round.queries {
            assert!(
                seen.insert(normalize_query_key(&query.text)),
                "query repeated across rounds: {}",
                query.text
            );
        }
    }
}

// ============= Invariants =============

#[rstest]
#[case(1)]
#[case(2)]
#[case(4)]
#[tokio::test]
async fn test_invariants_hold_for_any_round_cap(#[case] max_rounds: usize) {
    let orchestrator = Orchestrator::new(Arc::new(QueryEchoSearch), heuristic(), OrchestratorConfig::default());
    let options = ResearchOptions {
        max_rounds,
        ..Default::default()
    };

    let result = orchestrator.run_research(QUESTION, &options).await;

    assert!(result.success);
    assert!(!result.rounds.is_empty());
    assert_invariants(&result, max_rounds);
}

#[tokio::test]
async fn test_zero_results_terminates_successfully() {
    let orchestrator = Orchestrator::new(Arc::new(EmptySearch), heuristic(), OrchestratorConfig::default());
    let options = ResearchOptions::default();

    let result = orchestrator.run_research(QUESTION, &options).await;

    assert!(result.success);
    assert!(result.all_sources.is_empty());
    assert!(result.error.is_none());
    assert!(matches!(
        result.stop_reason,
        StopReason::DeadEnd | StopReason::MaxRounds | StopReason::QueriesExhausted
    ));
    assert_invariants(&result, options.max_rounds);
}

#[tokio::test]
async fn test_failing_search_is_recorded_not_fatal() {
    let orchestrator = Orchestrator::new(Arc::new(FailingSearch), heuristic(), OrchestratorConfig::default());

    let result = orchestrator.run_research(QUESTION, &ResearchOptions::default()).await;

    assert!(result.success);
    let first = &result.rounds[0];
    assert_eq!(first.failed_queries.len(), first.queries.len());
    assert!(first.failed_queries.iter().all(|f| f.kind == FailureKind::Error));
    assert!(first.results.is_empty());
}

#[tokio::test]
async fn test_runs_are_idempotent_with_deterministic_stubs() {
    let run = || async {
        Orchestrator::new(Arc::new(QueryEchoSearch), heuristic(), OrchestratorConfig::default())
            .run_research(QUESTION, &ResearchOptions::default())
            .await
    };

    let first = run().await;
    let second = run().await;

    let urls = |r: &ResearchResult| r.all_sources.iter().map(|s| s.url.clone()).collect::<HashSet<_>>();
    assert_eq!(first.rounds.len(), second.rounds.len());
    assert_eq!(urls(&first), urls(&second));
    assert_eq!(first.stop_reason, second.stop_reason);
    assert_ne!(first.session_id, second.session_id);
}

// ============= Decision fallbacks =============

#[tokio::test]
async fn test_unparsable_evaluation_keeps_researching() {
    let llm = Arc::new(MockLLMClient::new("I think the evidence is fine, no JSON here."));
    let decision = LlmDecisionService::new(
        llm.clone(),
        Arc::new(Default::default()),
        LlmPolicySettings::default(),
    );
    let orchestrator = Orchestrator::new(
        Arc::new(StaticSearch::new(official_hits())),
        Arc::new(decision),
        OrchestratorConfig::default(),
    );

    let result = orchestrator.run_research(QUESTION, &ResearchOptions::default()).await;

    assert!(result.success);
    let first = &result.rounds[0].decision;
    assert!(first.should_continue);
    assert!(first.overall() < 4.0);
    assert!(result.rounds.len() > 1, "session ended on the fallback round");

    let fallbacks = &result.metadata.fallbacks;
    assert_eq!(fallbacks.plan, 1);
    assert!(fallbacks.evaluate >= 1);
    assert!(fallbacks.reasons.iter().any(|r| r.starts_with("evaluate:")));
    assert_eq!(result.metadata.complexity, Some(Complexity::Complex));
    assert!(llm.call_count() > 0);
}

#[tokio::test]
async fn test_planning_transport_failure_degrades() {
    let decision = LlmDecisionService::new(
        Arc::new(MockLLMClient::failing()),
        Arc::new(Default::default()),
        LlmPolicySettings::default(),
    );
    let search = Arc::new(StaticSearch::new(official_hits()));
    let orchestrator = Orchestrator::new(search.clone(), Arc::new(decision), OrchestratorConfig::default());

    let result = orchestrator.run_research(QUESTION, &ResearchOptions::default()).await;

    assert!(!result.success);
    assert_eq!(result.stop_reason, StopReason::Error);
    assert!(result.error.as_deref().unwrap_or_default().starts_with("planning failed"));
    assert!(result.rounds.is_empty());
    assert_eq!(search.call_count(), 0);
    assert!(result.final_context.contains("No sources were found."));
}

#[tokio::test]
async fn test_panic_in_collaborator_yields_degraded_result() {
    let orchestrator = Orchestrator::new(
        Arc::new(StaticSearch::new(official_hits())),
        Arc::new(PanickingDecision),
        OrchestratorConfig::default(),
    );

    let result = orchestrator.run_research(QUESTION, &ResearchOptions::default()).await;

    assert!(!result.success);
    assert_eq!(result.stop_reason, StopReason::Error);
    assert!(result.error.as_deref().unwrap_or_default().contains("evaluator exploded"));
    assert!(result.final_context.starts_with("Automated synthesis failed"));
    assert_eq!(result.all_sources.len(), 2);
}

// ============= Stopping scenarios =============

#[tokio::test]
async fn test_minimum_rounds_override_early_sufficiency() {
    let orchestrator = Orchestrator::new(
        Arc::new(StaticSearch::new(official_hits())),
        Arc::new(ScriptedDecision::satisfied(Complexity::Moderate)),
        relaxed_floors(),
    );

    let result = orchestrator.run_research(QUESTION, &ResearchOptions::default()).await;

    assert!(result.success);
    assert_eq!(result.metadata.minimum_rounds, 2);
    assert_eq!(result.rounds.len(), 2);
    assert_eq!(result.stop_reason, StopReason::Sufficient);
    assert_eq!(result.metadata.official_sources, 2);
    assert_eq!(result.final_context, format!("{}: 2 sources", QUESTION));
}

#[tokio::test]
async fn test_three_weak_rounds_are_a_dead_end() {
    let orchestrator = Orchestrator::new(
        Arc::new(QueryEchoSearch),
        Arc::new(ScriptedDecision::new(Complexity::VeryComplex, true, 0.5, 4.0)),
        OrchestratorConfig::default(),
    );

    let result = orchestrator.run_research(QUESTION, &ResearchOptions::default()).await;

    assert!(result.success);
    assert_eq!(result.rounds.len(), 3);
    assert_eq!(result.stop_reason, StopReason::DeadEnd);
    assert!(result.rounds.iter().all(|r| !r.queries.is_empty()));
    assert_invariants(&result, 5);
}

#[tokio::test]
async fn test_missing_official_sources_inject_gap_query() {
    let orchestrator = Orchestrator::new(
        Arc::new(StaticSearch::new(general_hits(5))),
        Arc::new(ScriptedDecision::satisfied(Complexity::Simple)),
        OrchestratorConfig::default(),
    );
    let options = ResearchOptions {
        max_rounds: 3,
        ..Default::default()
    };

    let result = orchestrator.run_research(QUESTION, &options).await;

    let first = &result.rounds[0];
    assert_eq!(first.results.len(), 5);
    assert!(first.decision.should_continue);
    assert!(
        first
            .decision
            .evidence_gaps
            .contains(&"official sources: found 0, required 2".to_string())
    );
    assert!(first.decision.overall() < 9.0);

    let second = &result.rounds[1];
    let official_gap = format!("{} site:gov.co", QUESTION);
    assert!(second.queries.iter().any(|q| q.text == official_gap));
}

#[tokio::test]
async fn test_rounds_never_exceed_search_cap() {
    let orchestrator = Orchestrator::new(Arc::new(QueryEchoSearch), heuristic(), OrchestratorConfig::default());
    let options = ResearchOptions {
        max_rounds: 3,
        max_searches_per_round: 2,
        ..Default::default()
    };

    let result = orchestrator.run_research(QUESTION, &options).await;

    assert!(result.success);
    assert!(result.rounds.len() > 1);
    assert!(result.rounds.iter().all(|r| r.queries.len() <= 2));
    assert_eq!(result.rounds[0].queries.len(), 2);
    assert_eq!(site_queries(&result.rounds[0]), 2, "mandatory queries run first");
    assert_invariants(&result, 3);
}

#[tokio::test]
async fn test_no_fresh_queries_stops_as_exhausted() {
    let domains = DomainPolicy {
        mandatory: Vec::new(),
        subject_rules: Vec::new(),
        ..DomainPolicy::default()
    };
    let orchestrator = Orchestrator::new(
        Arc::new(StaticSearch::new(official_hits())),
        Arc::new(ScriptedDecision::new(Complexity::Simple, true, 0.6, 6.0).repeating()),
        with_domains(domains),
    );

    let result = orchestrator.run_research(QUESTION, &ResearchOptions::default()).await;

    assert!(result.success);
    assert_eq!(result.stop_reason, StopReason::QueriesExhausted);
    assert_eq!(result.rounds.len(), 1);
    assert_eq!(result.rounds[0].queries.len(), 1);
    assert_eq!(result.all_sources.len(), 2);
}

#[rstest]
#[case::floor_met_forces_one(1, 1)]
#[case::floor_unmet_forces_all(3, 2)]
#[tokio::test]
async fn test_mandatory_injection_follows_official_floor(#[case] official_floor: usize, #[case] expected_site_queries: usize) {
    let domains = DomainPolicy {
        mandatory: [
            "corteconstitucional.gov.co",
            "consejodeestado.gov.co",
            "suin-juriscol.gov.co",
            "cortesuprema.gov.co",
            "secretariasenado.gov.co",
            "funcionpublica.gov.co",
        ]
        .iter()
        .map(|d| d.to_string())
        .collect(),
        subject_rules: Vec::new(),
        official_floor,
        forced_per_round: 1,
        ..DomainPolicy::default()
    };
    let orchestrator = Orchestrator::new(
        Arc::new(StaticSearch::new(official_hits())),
        Arc::new(ScriptedDecision::new(Complexity::Simple, true, 0.6, 6.0)),
        with_domains(domains),
    );
    let options = ResearchOptions {
        max_rounds: 2,
        max_searches_per_round: 2,
        ..Default::default()
    };

    let result = orchestrator.run_research(QUESTION, &options).await;

    assert_eq!(result.rounds.len(), 2);
    assert_eq!(site_queries(&result.rounds[0]), 2);
    assert_eq!(result.metadata.official_sources, 2);
    assert_eq!(site_queries(&result.rounds[1]), expected_site_queries);
    assert_eq!(result.rounds[1].queries.len(), 2);
}

#[tokio::test]
async fn test_decision_override_replaces_policy() {
    let orchestrator = Orchestrator::new(
        Arc::new(StaticSearch::new(official_hits())),
        heuristic(),
        relaxed_floors(),
    );
    let options = ResearchOptions {
        decision_override: Some(Arc::new(ScriptedDecision::satisfied(Complexity::Simple))),
        ..Default::default()
    };

    let result = orchestrator.run_research(QUESTION, &options).await;

    assert_eq!(result.metadata.decision_policy, "scripted");
    assert_eq!(result.rounds.len(), 1);
    assert_eq!(result.stop_reason, StopReason::Sufficient);
}

#[tokio::test]
async fn test_result_serializes_for_json_output() {
    let result = juris::run_research(
        QUESTION,
        Arc::new(StaticSearch::new(official_hits())),
        Arc::new(ScriptedDecision::satisfied(Complexity::Simple)),
        &ResearchOptions {
            max_rounds: 1,
            ..Default::default()
        },
    )
    .await;

    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(value["stop_reason"], "max_rounds");
    assert_eq!(value["success"], true);
    assert!(value.get("error").is_none());
    assert_eq!(value["all_sources"][0]["category"], "official");

    let parsed: ResearchResult = serde_json::from_value(value).unwrap();
    assert_eq!(parsed.rounds.len(), 1);
}

// ============= Collaborator expectations =============

mock! {
    pub Search {}

    #[async_trait::async_trait]
    impl SearchProvider for Search {
        async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, SearchError>;
    }
}

#[tokio::test]
async fn test_site_queries_that_time_out_are_skipped() {
    let mut search = MockSearch::new();
    search
        .expect_search()
        .withf(|_query, max_results| *max_results == 8)
        .times(1..)
        .returning(|query, _| {
            if query.contains("site:") {
                Err(SearchError::Timeout(15_000))
            } else {
                Ok(vec![hit(
                    "Ley 791 de 2002",
                    "https://www.suin-juriscol.gov.co/viewDocument.asp?id=1667336",
                    "ley que reduce los términos de prescripción",
                )])
            }
        });

    let orchestrator = Orchestrator::new(Arc::new(search), heuristic(), OrchestratorConfig::default());
    let options = ResearchOptions {
        max_rounds: 1,
        per_search_timeout: Duration::from_secs(1),
        ..Default::default()
    };

    let result = orchestrator.run_research(QUESTION, &options).await;

    assert!(result.success);
    let round = &result.rounds[0];
    assert!(!round.failed_queries.is_empty());
    assert!(round.failed_queries.iter().all(|f| f.kind == FailureKind::Timeout));
    assert!(round.failed_queries.iter().all(|f| f.query.contains("site:")));
    assert_eq!(result.all_sources.len(), 1);
}
