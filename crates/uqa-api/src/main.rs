//! UQA API Server
//!
//! REST API server answering multiple-choice questions about ITMO University.
//!
//! Author: hephaex@gmail.com

use std::sync::Arc;
use uqa_api::{create_router, logging::init_tracing, state::AppState};
use uqa_core::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration (once; never re-read)
    let config = AppConfig::load()?;

    // Initialize tracing
    init_tracing(&config.logging)?;

    let addr = config.server.bind_addr();
    if config.llm.api_key.is_none() {
        tracing::warn!("TOGETHER_API_KEY is not set; every answer will be -1");
    }
    if config.search.api_key.is_none() || config.search.engine_id.is_none() {
        tracing::warn!("Google search credentials are incomplete; evidence will fall back");
    }

    // Create application state
    let state = Arc::new(AppState::from_config(config));

    // Create router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("UQA API Server starting on http://{}", addr);
    tracing::info!("OpenAPI spec at http://{}/api-docs/openapi.json", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("UQA API Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
