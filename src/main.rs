/// flowtool: process and module flow editor backend
///
/// Main entry point. Loads configuration from the environment and starts the
/// HTTP server.

use flowtool::{config::Config, server::start_server};

/// Application entry point
///
/// The server provides:
/// - Flow lifecycle API at /api/flows/*
/// - Open document editing at /api/document/*
/// - Health check at /healthz
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration (defaults to localhost:3004 and .flowtool/)
    let config = Config::default();

    start_server(config).await?;

    Ok(())
}
