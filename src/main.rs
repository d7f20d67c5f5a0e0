#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::sync::Arc;

use skillweave::api::{self, AppState};
use skillweave::auth::JwtVerifier;
use skillweave::config::ServerConfig;
use skillweave::storage::Storage;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing logger
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,skillweave=debug".into()),
        )
        .with_target(false)
        .init();

    let config = ServerConfig::default();

    tracing::info!("Starting skillweave server");

    let storage = Arc::new(Storage::new(&config.db_path)?);

    let verifier: Option<Arc<dyn skillweave::auth::TokenVerifier>> = match &config.jwt_secret {
        Some(secret) => Some(Arc::new(JwtVerifier::new(secret))),
        None => {
            tracing::warn!("SKILLWEAVE_JWT_SECRET not set, token login disabled");
            None
        }
    };

    let state = AppState::new(storage, verifier, config.secure_cookies);

    let app = api::router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    tracing::info!("skillweave listening on http://{}", config.bind_addr());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
    }
    tracing::info!("Shutting down");
}
