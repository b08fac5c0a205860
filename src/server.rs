/// Server setup and initialization
///
/// Wires together the storage backend, the document session and the HTTP
/// routes. Provides the application factory used by `main` and by tests.

use crate::{
    api::{create_document_routes, create_flow_routes, AppState},
    config::Config,
    session::FlowSession,
    storage::FlowBackend,
};
use anyhow::Result;
use axum::{routing::get, Router};
use std::sync::Arc;
use tokio::net::TcpListener;

/// Open the configured backend and build the shared session
pub async fn create_state(config: &Config) -> Result<AppState> {
    tracing::info!("Initializing flow storage");
    let backend = FlowBackend::open(&config.storage)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to open flow storage: {}", e))?;

    tracing::info!(
        "Initializing document session (autosave after {} ms)",
        config.autosave.debounce_ms
    );
    let session = Arc::new(FlowSession::new(
        Arc::new(backend),
        config.autosave.debounce(),
    ));

    let flows = session.refresh_list().await;
    tracing::info!("Found {} stored flow(s)", flows.len());

    Ok(AppState { session })
}

/// Assemble every route over an existing state
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health check endpoint
        .route("/healthz", get(health_check))
        // Flow lifecycle routes
        .merge(create_flow_routes())
        // Open document routes
        .merge(create_document_routes())
        .with_state(state)
}

/// Create the main Axum application with all routes
pub async fn create_app(config: Config) -> Result<Router> {
    let state = create_state(&config).await?;
    let app = build_router(state);
    tracing::info!("Application initialized successfully");
    Ok(app)
}

/// Start the HTTP server with the given configuration
///
/// Stops on Ctrl-C, then writes any save still waiting on the debounce timer.
pub async fn start_server(config: Config) -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(true)
        .with_level(true)
        .init();

    tracing::info!("Starting flowtool server...");

    let state = create_state(&config).await?;
    let session = Arc::clone(&state.session);
    let app = build_router(state);

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&bind_addr).await?;

    tracing::info!("Server listening on http://{}", bind_addr);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    session.shutdown().await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received, stopping server...");
}

/// Health check endpoint handler
async fn health_check() -> &'static str {
    "ok"
}
