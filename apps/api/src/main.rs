mod charter;
mod config;
mod errors;
mod llm_client;
mod projects;
mod routes;
mod scoring;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::ModelClient;
use crate::projects::ProjectRepository;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed values)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Copilot API v{}", env!("CARGO_PKG_VERSION"));

    // Load the backlog table once
    let repo = ProjectRepository::load(&config.projects_path)?;
    if repo.is_empty() {
        warn!("{} contains no projects", config.projects_path);
    }

    // Initialize model client; missing credentials disable scoring instead of failing startup
    let llm = match ModelClient::from_config(&config) {
        Ok(client) => {
            info!(
                "LLM client initialized (provider: {}, model: {})",
                client.provider_kind().as_str(),
                client.model()
            );
            Ok(client)
        }
        Err(e) => {
            warn!("{e}");
            Err(e.to_string())
        }
    };

    let state = AppState {
        repo: Arc::new(repo),
        llm,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // dashboard runs on a separate origin

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
