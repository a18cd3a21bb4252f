use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ativeplay_ingest::config::Config;
use ativeplay_ingest::{app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing/logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ativeplay_ingest=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let config = Config::from_env();
    let port = config.port;

    tracing::info!("Starting AtivePlay Ingest v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.node_env);
    tracing::info!(
        "Classification signal: {:?}, fetch timeout: {}ms, retries: {}",
        config.classify_by,
        config.fetch_timeout_ms,
        config.max_retries
    );

    let state = Arc::new(AppState::new(config)?);
    let app = app(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
