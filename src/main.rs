//! claimgraph-agent: answer one question against a fixture graph.
//!
//! Usage: `claimgraph-agent <graph-fixture> <question...>`

use std::sync::Arc;

use secrecy::ExposeSecret;

use claimgraph_agent::adapters::ai::{
    AnthropicConfig, AnthropicProvider, FailoverAIProvider, OpenAIConfig, OpenAIProvider,
};
use claimgraph_agent::adapters::graph::{GraphFixture, InMemoryClaimGraph};
use claimgraph_agent::adapters::llm::{LlmEvaluator, LlmPlanner, LlmSynthesizer};
use claimgraph_agent::application::{
    AnswerQuestionCommand, AnswerQuestionHandler, CancellationToken, Orchestrator, ToolExecutor,
};
use claimgraph_agent::config::{init_tracing, AiConfig, AiProvider, AppConfig};
use claimgraph_agent::domain::tools::ToolRegistry;
use claimgraph_agent::ports::{AIError, AIProvider};

const USAGE: &str = "usage: claimgraph-agent <graph-fixture> <question...>";

fn build_one(config: &AiConfig, which: AiProvider) -> Result<Arc<dyn AIProvider>, AIError> {
    let missing = || AIError::AuthenticationFailed;
    match which {
        AiProvider::Anthropic => {
            let key = config.anthropic_api_key.as_ref().ok_or_else(missing)?;
            let mut provider = AnthropicConfig::new(key.expose_secret().clone())
                .with_timeout(config.timeout())
                .with_max_retries(config.max_retries);
            if let Some(model) = &config.anthropic_model {
                provider = provider.with_model(model.clone());
            }
            Ok(Arc::new(AnthropicProvider::new(provider)?))
        }
        AiProvider::OpenAI => {
            let key = config.openai_api_key.as_ref().ok_or_else(missing)?;
            let mut provider = OpenAIConfig::new(key.expose_secret().clone())
                .with_timeout(config.timeout())
                .with_max_retries(config.max_retries);
            if let Some(model) = &config.openai_model {
                provider = provider.with_model(model.clone());
            }
            Ok(Arc::new(OpenAIProvider::new(provider)?))
        }
    }
}

fn build_provider(config: &AiConfig) -> Result<Arc<dyn AIProvider>, AIError> {
    let mut provider = FailoverAIProvider::new(build_one(config, config.primary_provider)?);
    if let Some(fallback) = config.usable_fallback() {
        provider = provider.with_fallback(build_one(config, fallback)?);
    }
    Ok(Arc::new(provider))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let fixture_path = args.next().ok_or(USAGE)?;
    let question = args.collect::<Vec<_>>().join(" ");
    if question.trim().is_empty() {
        return Err(USAGE.into());
    }

    let config = AppConfig::load()?;
    init_tracing(&config.logging)?;
    config.validate()?;

    let graph = InMemoryClaimGraph::from_fixture(GraphFixture::from_path(&fixture_path)?)?
        .with_scoring(config.scoring.policy()?, config.scoring.condition_boost);
    tracing::info!(
        entities = graph.entity_count(),
        claims = graph.claim_count(),
        "Claim graph ready"
    );

    let provider = build_provider(&config.ai)?;
    let registry = Arc::new(ToolRegistry::standard());
    let executor = ToolExecutor::new(
        registry.clone(),
        Arc::new(graph),
        config.orchestration.tool_timeout(),
    );
    let orchestrator = Orchestrator::new(
        Arc::new(LlmPlanner::new(provider.clone(), registry)),
        Arc::new(LlmEvaluator::new(provider.clone())),
        Arc::new(LlmSynthesizer::new(provider)),
        Arc::new(executor),
        config.orchestration.settings(),
    );
    let handler = AnswerQuestionHandler::new(Arc::new(orchestrator));

    let (cancel_handle, cancel) = CancellationToken::new();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling query");
            cancel_handle.cancel();
        }
    });

    let command = AnswerQuestionCommand::new(question, config.orchestration.default_mode)
        .with_max_iterations(config.orchestration.budget()?.get());
    let outcome = handler.handle_cancellable(command, &cancel).await?;

    println!("{}", outcome.final_response);
    println!();
    println!(
        "[{} after {} iteration(s), {} ms]",
        outcome.completion_reason, outcome.iterations, outcome.duration_ms
    );
    Ok(())
}
