//! End-to-end tests of the plan / execute / evaluate loop.
//!
//! The LLM-backed services run against a scripted mock provider and the
//! tools against the in-memory claim graph, so every layer except the
//! HTTP transport is exercised.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use claimgraph_agent::adapters::ai::{MockAIProvider, MockError};
use claimgraph_agent::adapters::graph::{
    ClaimFixture, EndpointFixture, EntityFixture, EvidenceFixture, GraphFixture, InMemoryClaimGraph,
};
use claimgraph_agent::adapters::llm::{LlmEvaluator, LlmPlanner, LlmSynthesizer};
use claimgraph_agent::application::{
    AnswerQuestionCommand, AnswerQuestionError, AnswerQuestionHandler, OrchestrationSettings,
    Orchestrator, RetryPolicy, ToolExecutor,
};
use claimgraph_agent::domain::entities::EntityClass;
use claimgraph_agent::domain::orchestration::{
    CompletionReason, OrchestrationError, OrchestrationFailure, OrchestrationMode, OrchestrationPhase,
};
use claimgraph_agent::domain::tools::{ToolFailureKind, ToolRegistry};
use claimgraph_agent::ports::{CompletionPurpose, ServiceError};

// =============================================================================
// Test Infrastructure
// =============================================================================

const METFORMIN: i64 = 14042;
const ASPIRIN: i64 = 1191;
const ADVERSE_EVENTS: i64 = 84;

fn entity(class: EntityClass, id: i64, name: &str) -> EntityFixture {
    EntityFixture {
        class,
        id,
        name: name.to_string(),
        synonyms: Vec::new(),
    }
}

/// Metformin with 84 reported adverse events and one target.
fn metformin_fixture() -> GraphFixture {
    let mut entities = vec![
        entity(EntityClass::Drug, METFORMIN, "metformin"),
        entity(EntityClass::Gene, 5562, "PRKAA1"),
    ];
    let mut claims = Vec::new();

    for n in 0..ADVERSE_EVENTS {
        let ae_id = 1_000 + n;
        entities.push(entity(EntityClass::AdverseEvent, ae_id, &format!("adverse event {}", n)));
        claims.push(ClaimFixture {
            id: n + 1,
            relation: "reported_with".to_string(),
            subject: EndpointFixture {
                class: EntityClass::Drug,
                id: METFORMIN,
            },
            object: EndpointFixture {
                class: EntityClass::AdverseEvent,
                id: ae_id,
            },
            strength: Some(0.5 + (n % 5) as f64 / 10.0),
            source: Some("faers".to_string()),
            evidence: vec![EvidenceFixture {
                id: format!("faers:{}", 50_000 + n),
                dataset: None,
                excerpt: None,
                reference: None,
            }],
        });
    }
    claims.push(ClaimFixture {
        id: 500,
        relation: "targets".to_string(),
        subject: EndpointFixture {
            class: EntityClass::Drug,
            id: METFORMIN,
        },
        object: EndpointFixture {
            class: EntityClass::Gene,
            id: 5562,
        },
        strength: Some(0.8),
        source: Some("chembl".to_string()),
        evidence: Vec::new(),
    });

    GraphFixture { entities, claims }
}

/// Adds aspirin and its target PTGS1 to the metformin graph.
fn two_drug_fixture() -> GraphFixture {
    let mut fixture = metformin_fixture();
    fixture.entities.push(entity(EntityClass::Drug, ASPIRIN, "aspirin"));
    fixture.entities.push(entity(EntityClass::Gene, 5742, "PTGS1"));
    fixture.claims.push(ClaimFixture {
        id: 501,
        relation: "targets".to_string(),
        subject: EndpointFixture {
            class: EntityClass::Drug,
            id: ASPIRIN,
        },
        object: EndpointFixture {
            class: EntityClass::Gene,
            id: 5742,
        },
        strength: Some(0.9),
        source: Some("chembl".to_string()),
        evidence: Vec::new(),
    });
    fixture
}

fn fast_settings() -> OrchestrationSettings {
    let policy = RetryPolicy::with_retries(2, Duration::from_millis(1), Duration::from_secs(5));
    OrchestrationSettings {
        planning_retry: policy.clone(),
        evaluation_retry: policy.clone(),
        synthesis_retry: policy,
        max_items_per_tool: 10,
    }
}

fn handler(provider: Arc<MockAIProvider>, fixture: GraphFixture) -> AnswerQuestionHandler {
    let registry = Arc::new(ToolRegistry::standard());
    let graph = InMemoryClaimGraph::from_fixture(fixture).unwrap();
    let executor = ToolExecutor::new(registry.clone(), Arc::new(graph), Duration::from_secs(5));
    let orchestrator = Orchestrator::new(
        Arc::new(LlmPlanner::new(provider.clone(), registry)),
        Arc::new(LlmEvaluator::new(provider.clone())),
        Arc::new(LlmSynthesizer::new(provider)),
        Arc::new(executor),
        fast_settings(),
    );
    AnswerQuestionHandler::new(Arc::new(orchestrator))
}

fn command(query: &str, max_iterations: u32) -> AnswerQuestionCommand {
    AnswerQuestionCommand::new(query, OrchestrationMode::Interactive).with_max_iterations(max_iterations)
}

fn orchestration_failure(err: AnswerQuestionError) -> OrchestrationFailure {
    match err {
        AnswerQuestionError::Orchestration(failure) => failure,
        other => panic!("expected orchestration failure, got {other}"),
    }
}

const RESOLVE_AND_QUERY: &str = r#"{
    "thought": "Resolve the drug, then list its adverse events.",
    "tool_calls": [
        {"tool": "resolve_drugs", "args": {"names": ["metformin"]}, "reason": "need the drug id"},
        {"tool": "drug_adverse_events", "args": {"drug_id": "metformin"}}
    ]
}"#;

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test]
async fn metformin_question_stops_after_one_sufficient_iteration() {
    let provider = Arc::new(
        MockAIProvider::new()
            .with_response(RESOLVE_AND_QUERY)
            .with_response(
                r#"```json
{"status": "SUFFICIENT", "confidence": 0.9, "reasoning": "84 adverse event reports retrieved", "gaps": []}
```"#,
            )
            .with_response("Metformin is most often reported with gastrointestinal adverse events."),
    );

    let outcome = handler(provider.clone(), metformin_fixture())
        .handle(command("What adverse events might metformin cause?", 3))
        .await
        .unwrap();

    assert_eq!(outcome.completion_reason, CompletionReason::Sufficient);
    assert_eq!(outcome.completion_reason.as_str(), "sufficient");
    assert_eq!(outcome.iterations, 1);
    assert!(!outcome.final_response.is_empty());
    assert_eq!(outcome.resolved.lookup(EntityClass::Drug, "metformin"), Some(METFORMIN));

    let iteration = &outcome.history[0];
    assert_eq!(iteration.executions.len(), 2);
    assert!(iteration.executions.iter().all(|r| r.success));
    assert_eq!(iteration.executions[1].row_count(), ADVERSE_EVENTS as usize);
    let evaluation = iteration.evaluation.as_ref().unwrap();
    assert_eq!(evaluation.confidence(), 0.9);

    assert_eq!(outcome.provenance.claim_ids.len(), ADVERSE_EVENTS as usize);
    assert_eq!(outcome.provenance.evidence_ids.len(), ADVERSE_EVENTS as usize);

    let calls = provider.get_calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[1].metadata.purpose, CompletionPurpose::Evaluation);
    assert!(calls[1].messages[0].content.contains("[10 of 84 shown]"));
    assert_eq!(calls[2].metadata.purpose, CompletionPurpose::Synthesis);
    assert!(!calls[2].messages[0].content.contains("best effort"));
}

#[tokio::test]
async fn unresolved_entity_fails_its_call_without_aborting() {
    let provider = Arc::new(
        MockAIProvider::new()
            .with_response(
                r#"{"tool_calls": [
                    {"tool": "resolve_drugs", "args": {"names": ["zorblax"]}},
                    {"tool": "drug_adverse_events", "args": {"drug_id": "zorblax"}}
                ]}"#,
            )
            .with_response(
                r#"{"status": "INSUFFICIENT", "confidence": 0.1, "reasoning": "zorblax is not in the graph",
                    "gaps": [{"category": "resolution", "description": "zorblax unknown", "priority": 1}]}"#,
            )
            .with_response(r#"{"thought": "nothing else to try", "tool_calls": [], "stop": "no_relevant_tools"}"#)
            .with_response("The graph has no drug named zorblax."),
    );

    let outcome = handler(provider.clone(), metformin_fixture())
        .handle(command("What adverse events might zorblax cause?", 3))
        .await
        .unwrap();

    assert_eq!(outcome.completion_reason, CompletionReason::NoRelevantTools);
    assert_eq!(outcome.iterations, 2);
    assert!(outcome.resolved.is_empty());

    let first = &outcome.history[0];
    assert!(first.executions[0].success);
    assert_eq!(first.executions[0].row_count(), 0);
    assert!(!first.executions[1].success);
    assert_eq!(first.executions[1].failure, Some(ToolFailureKind::InvalidArguments));
    assert!(outcome.history[1].executions.is_empty());

    // the second plan saw the first evaluation's gaps
    let calls = provider.get_calls();
    assert!(calls[2].messages[0].content.contains("zorblax unknown"));
    assert!(calls[3].messages[0].content.contains("best effort"));
}

#[tokio::test]
async fn budget_exhaustion_synthesizes_best_effort_answer() {
    let plan = r#"{"tool_calls": [{"tool": "drug_targets", "args": {"drug_id": 14042}}]}"#;
    let partial = r#"{"status": "PARTIAL", "confidence": 0.5, "reasoning": "targets only"}"#;
    let provider = Arc::new(
        MockAIProvider::new()
            .with_response(plan)
            .with_response(partial)
            .with_response(plan)
            .with_response(partial)
            .with_response("Metformin targets PRKAA1."),
    );

    let outcome = handler(provider.clone(), metformin_fixture())
        .handle(command("How does metformin work?", 2))
        .await
        .unwrap();

    assert_eq!(outcome.completion_reason, CompletionReason::MaxIterations);
    assert_eq!(outcome.iterations, 2);
    assert_eq!(outcome.history.len(), 2);
    assert_eq!(outcome.final_response, "Metformin targets PRKAA1.");

    let calls = provider.get_calls();
    assert_eq!(calls.len(), 5);
    assert!(calls[4].messages[0].content.contains("best effort"));
}

#[tokio::test]
async fn failing_calls_do_not_stop_the_iteration() {
    let provider = Arc::new(
        MockAIProvider::new()
            .with_response(
                r#"{"tool_calls": [
                    {"tool": "pubmed_search", "args": {"query": "metformin"}},
                    {"tool": "drug_targets", "args": {"drug_id": 999999}},
                    {"tool": "drug_targets", "args": {"drug_id": 14042}}
                ]}"#,
            )
            .with_response(r#"{"status": "sufficient", "confidence": 0.8, "reasoning": "target found"}"#)
            .with_response("Metformin targets PRKAA1."),
    );

    let outcome = handler(provider, metformin_fixture())
        .handle(command("What does metformin target?", 3))
        .await
        .unwrap();

    let executions = &outcome.history[0].executions;
    assert_eq!(executions.len(), 3);
    assert_eq!(
        executions.iter().map(|r| r.success).collect::<Vec<_>>(),
        vec![false, false, true]
    );
    assert!(executions[0].error.as_deref().unwrap().contains("unknown tool: pubmed_search"));
    assert_eq!(executions[1].failure, Some(ToolFailureKind::NotFound));
    assert_eq!(outcome.completion_reason, CompletionReason::Sufficient);
}

#[tokio::test]
async fn malformed_plan_is_retried() {
    let provider = Arc::new(
        MockAIProvider::new()
            .with_response("I would start by resolving metformin.")
            .with_error(MockError::RateLimited { retry_after_secs: 0 })
            .with_response(RESOLVE_AND_QUERY)
            .with_response(r#"{"status": "SUFFICIENT", "confidence": 0.95}"#)
            .with_response("Answer."),
    );

    let outcome = handler(provider.clone(), metformin_fixture())
        .handle(command("What adverse events might metformin cause?", 3))
        .await
        .unwrap();

    assert_eq!(outcome.completion_reason, CompletionReason::Sufficient);
    assert_eq!(provider.call_count(), 5);
}

#[tokio::test]
async fn exhausted_planning_retries_fail_the_query() {
    let provider = Arc::new(
        MockAIProvider::new()
            .with_response("not json")
            .with_response("still not json")
            .with_response("{\"tool_calls\": \"nope\"}"),
    );

    let err = handler(provider.clone(), metformin_fixture())
        .handle(command("What adverse events might metformin cause?", 3))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("Planning failed"));
    assert_eq!(provider.call_count(), 3);

    let failure = orchestration_failure(err);
    assert_eq!(failure.state.phase(), OrchestrationPhase::Planning);
    assert!(failure.state.history().is_empty());
    assert!(failure.state.resolved().is_empty());
}

#[tokio::test]
async fn positional_placeholders_follow_resolution_order() {
    let provider = Arc::new(
        MockAIProvider::new()
            .with_response(
                r#"{"tool_calls": [
                    {"tool": "resolve_drugs", "args": {"names": ["metformin", "aspirin"]}},
                    {"tool": "drug_targets", "args": {"drug_id": 0}},
                    {"tool": "drug_targets", "args": {"drug_id": 1}}
                ]}"#,
            )
            .with_response(r#"{"status": "SUFFICIENT", "confidence": 0.85, "reasoning": "both targets known"}"#)
            .with_response("Metformin targets PRKAA1; aspirin targets PTGS1."),
    );

    let outcome = handler(provider, two_drug_fixture())
        .handle(command("Compare the targets of metformin and aspirin", 3))
        .await
        .unwrap();

    assert_eq!(outcome.resolved.nth(EntityClass::Drug, 0), Some(METFORMIN));
    assert_eq!(outcome.resolved.nth(EntityClass::Drug, 1), Some(ASPIRIN));

    let executions = &outcome.history[0].executions;
    assert_eq!(executions[1].args_used.entity_id("drug_id").unwrap(), METFORMIN);
    assert_eq!(executions[2].args_used.entity_id("drug_id").unwrap(), ASPIRIN);
    let gene = |i: usize| executions[i].payload.clone().unwrap().into_rows()[0]["gene_name"].clone();
    assert_eq!(gene(1), "PRKAA1");
    assert_eq!(gene(2), "PTGS1");
}

#[tokio::test]
async fn empty_plan_without_stop_is_still_evaluated() {
    let provider = Arc::new(
        MockAIProvider::new()
            .with_response(r#"{"thought": "the question needs no lookup", "tool_calls": []}"#)
            .with_response(r#"{"status": "PARTIAL", "confidence": 0.4, "reasoning": "nothing gathered yet"}"#)
            .with_response("No evidence was gathered."),
    );

    let outcome = handler(provider.clone(), metformin_fixture())
        .handle(command("What adverse events might metformin cause?", 1))
        .await
        .unwrap();

    assert_eq!(outcome.completion_reason, CompletionReason::MaxIterations);
    assert_eq!(outcome.history.len(), 1);
    assert!(outcome.history[0].executions.is_empty());
    assert!(outcome.history[0].evaluation.is_some());

    let purposes: Vec<_> = provider.get_calls().iter().map(|c| c.metadata.purpose).collect();
    assert_eq!(
        purposes,
        vec![CompletionPurpose::Planning, CompletionPurpose::Evaluation, CompletionPurpose::Synthesis]
    );
}

#[tokio::test]
async fn evaluation_failure_keeps_executed_iteration_in_state() {
    let provider = Arc::new(
        MockAIProvider::new()
            .with_response(r#"{"tool_calls": [{"tool": "resolve_drugs", "args": {"names": ["metformin"]}}]}"#)
            .with_response("looks fine to me")
            .with_response("still fine")
            .with_response("{\"status\": \"SUFFICIENT\"}"),
    );

    let err = handler(provider.clone(), metformin_fixture())
        .handle(command("What adverse events might metformin cause?", 3))
        .await
        .unwrap_err();
    let failure = orchestration_failure(err);

    assert!(matches!(
        failure.error,
        OrchestrationError::Evaluation(ServiceError::ContractViolation(_))
    ));
    assert_eq!(provider.call_count(), 4);

    let state = &failure.state;
    assert_eq!(state.phase(), OrchestrationPhase::Evaluating);
    assert_eq!(state.iteration(), 1);
    assert!(!state.is_complete());
    assert_eq!(state.resolved().lookup(EntityClass::Drug, "metformin"), Some(METFORMIN));

    let history = state.history();
    assert_eq!(history.len(), 1);
    assert!(history[0].evaluation.is_none());
    assert_eq!(history[0].executions.len(), 1);
    assert!(history[0].executions[0].success);
    assert!(state.rolling_summary().contains("resolve_drugs"));
}

#[tokio::test]
async fn blank_synthesis_fails_without_retry() {
    let provider = Arc::new(
        MockAIProvider::new()
            .with_response(RESOLVE_AND_QUERY)
            .with_response(r#"{"status": "SUFFICIENT", "confidence": 0.9, "reasoning": "84 reports"}"#)
            .with_response("   \n\t  ")
            .with_response("A real answer that must never be requested."),
    );

    let err = handler(provider.clone(), metformin_fixture())
        .handle(command("What adverse events might metformin cause?", 3))
        .await
        .unwrap_err();
    let failure = orchestration_failure(err);

    assert!(matches!(failure.error, OrchestrationError::Synthesis(ServiceError::EmptyOutput)));
    assert_eq!(provider.call_count(), 3);

    let state = &failure.state;
    assert_eq!(state.phase(), OrchestrationPhase::Finishing);
    assert!(!state.is_complete());
    assert!(state.final_response().is_none());
    assert_eq!(state.history().len(), 1);
    assert!(state.history()[0].evaluation.is_some());
    assert_eq!(state.resolved().lookup(EntityClass::Drug, "metformin"), Some(METFORMIN));
}

// =============================================================================
// Fixture files
// =============================================================================

#[test]
fn fixture_files_load_in_both_formats() {
    let fixture = metformin_fixture();

    let mut json = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    json.write_all(serde_json::to_string(&fixture).unwrap().as_bytes()).unwrap();
    let from_json = GraphFixture::from_path(json.path()).unwrap();

    let mut yaml = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    yaml.write_all(serde_yaml::to_string(&fixture).unwrap().as_bytes()).unwrap();
    let from_yaml = GraphFixture::from_path(yaml.path()).unwrap();

    assert_eq!(from_json, fixture);
    assert_eq!(from_yaml, fixture);

    let graph = InMemoryClaimGraph::from_fixture(from_yaml).unwrap();
    assert_eq!(graph.entity_count(), ADVERSE_EVENTS as usize + 2);
    assert_eq!(graph.claim_count(), ADVERSE_EVENTS as usize + 1);
}
