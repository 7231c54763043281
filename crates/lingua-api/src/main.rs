//! Lingua API Server
//!
//! Loads configuration, sets up logging, picks the storage backend and serves
//! the authentication API.

use anyhow::Context;
use clap::Parser;
use lingua_api::{create_router, state::AppState};
use lingua_core::config::{AppConfig, LoggingConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lingua-api")]
#[command(author, version, about = "Lingua authentication and session server", long_about = None)]
struct Cli {
    /// TOML configuration file; environment variables override its values
    #[arg(short, long, env = "LINGUA_CONFIG")]
    config: Option<PathBuf>,
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    if logging.json_format {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match &cli.config {
        Some(path) => AppConfig::from_file(path)?.with_env_override()?,
        None => AppConfig::from_env()?,
    };

    init_tracing(&config.logging);
    config.validate()?;

    let addr = format!("{}:{}", config.server.host, config.server.port);

    // Create application state
    let state = AppState::from_config(config)
        .await
        .context("Failed to initialize authentication")?;

    let app = create_router(Arc::new(state));

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Lingua API Server starting on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);
    tracing::info!("OpenAPI spec at http://{}/api-docs/openapi.json", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
