//! Contract Chat - conversational vendor contract intake
//!
//! An HTTP service where a language model gathers vendor contract details in
//! conversation and, once everything is known, records the contract.

mod actions;
mod api;
mod auth;
mod config;
mod conversation;
mod llm;
mod runtime;
mod state_machine;
mod store;
mod system_prompt;

use api::{create_router, AppState};
use auth::TokenVerifier;
use config::AppConfig;
use conversation::ConversationStore;
use llm::{GeminiService, LlmService, LoggingService};
use runtime::DialogueRuntime;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use store::{ContractStore, Database};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Upper bound on a single model call
const LLM_TIMEOUT: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "contract_chat=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = AppConfig::from_env()?;

    // Ensure database directory exists
    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    tracing::info!(path = %config.db_path.display(), "Opening contract store");
    let store: Arc<dyn ContractStore> = Arc::new(Database::open(&config.db_path)?);
    tracing::info!(contracts = store.count().await?, "Contract store ready");

    let gemini = GeminiService::new(
        config.google_api_key.clone(),
        &config.model,
        config.gateway.as_deref(),
        LLM_TIMEOUT,
    )?;
    let llm: Arc<dyn LlmService> = Arc::new(LoggingService::new(Arc::new(gemini)));

    let history = Arc::new(ConversationStore::new(
        config.history_scope,
        config.history_limit,
    ));
    tracing::info!(
        model = %llm.model_id(),
        history_scope = ?history.scope(),
        history_limit = config.history_limit,
        gateway = config.gateway.is_some(),
        "Dialogue runtime initialized"
    );

    let runtime = DialogueRuntime::new(llm, store, history, config.generation);
    let state = AppState::new(runtime, TokenVerifier::new(config.secret_key.as_bytes()));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Contract chat server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
