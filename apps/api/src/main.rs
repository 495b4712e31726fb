mod config;
mod delivery;
mod errors;
mod generation;
mod llm_client;
mod models;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::generation::balance::{BalanceGate, CreditsBalanceGate, StaticBalance};
use crate::generation::orchestrator::Orchestrator;
use crate::generation::GenerationError;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting rejection API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM client
    let llm = LlmClient::new(
        config.openrouter_api_key.clone(),
        config.openrouter_base_url.clone(),
    )
    .map_err(GenerationError::from)?;
    info!("LLM client initialized ({})", llm.base_url());

    let balance: Arc<dyn BalanceGate> = if config.balance_check {
        Arc::new(CreditsBalanceGate::new(llm.clone()))
    } else {
        info!("Balance check disabled, primary model is always attempted first");
        Arc::new(StaticBalance(None))
    };

    let orchestrator = Orchestrator::new(config.models.clone(), Arc::new(llm), balance);
    info!(
        "Models: senior={} standard={} fallback={}",
        orchestrator.config().senior,
        orchestrator.config().standard,
        orchestrator.config().fallback
    );

    // Build app state
    let state = AppState {
        orchestrator: Arc::new(orchestrator),
        generation_timeout: config.generation_timeout,
        bulk_concurrency: config.bulk_concurrency,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
