mod config;
mod errors;
mod interview;
mod llm_client;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::interview::session::SessionStore;
use crate::llm_client::selector::{EnvModelLoader, ModelLoader, ModelSettings};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting TalentScout v{}", env!("CARGO_PKG_VERSION"));

    let models = EnvModelLoader::new(ModelSettings {
        ollama_base_url: config.ollama_base_url.clone(),
        timeout: Duration::from_secs(config.llm_timeout_secs),
    });

    let available: Vec<_> = models
        .options()
        .into_iter()
        .filter(|o| o.available)
        .map(|o| o.id)
        .collect();
    if available.is_empty() {
        warn!("No models available; check your environment variables");
    } else {
        info!("Models available: {}", available.join(", "));
    }

    let sessions = SessionStore::new();
    sessions.spawn_idle_sweeper(
        Duration::from_secs(config.session_idle_secs),
        Duration::from_secs(config.session_sweep_secs),
    );
    info!(
        "Idle sessions expire after {}s (checked every {}s)",
        config.session_idle_secs, config.session_sweep_secs
    );

    let state = AppState {
        config: config.clone(),
        models: Arc::new(models),
        sessions,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
