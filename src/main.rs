mod config;
mod error;
mod model;
mod providers;
mod server;
mod util;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use providers::azure::AzureDevOpsTracker;
use providers::WorkItemTracker;
use server::AppState;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let log_json = matches!(
        std::env::var("STORY_BRIDGE_LOG_JSON").as_deref(),
        Ok("1" | "true" | "yes")
    );
    if log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("shutdown requested");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    // Load config
    let config = config::load_config()?;

    // Connect the backend once; handlers share it through router state
    let tracker = AzureDevOpsTracker::new(&config.azure)
        .context("Failed to build Azure DevOps client")?;
    let backend = tracker.name().to_string();
    let state = AppState::new(Arc::new(tracker), config.azure.project_id.clone());
    let app = server::build_router(state);

    let bind = config.server.bind();
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;
    tracing::info!(
        bind,
        backend = %backend,
        organization = %config.azure.organization_url,
        project = %config.azure.project_id,
        "story-bridge listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}
