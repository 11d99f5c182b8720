use std::sync::Arc;

use anyhow::Result;
use tokio::{net::TcpListener, signal};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use aerium::{
    api::{self, AppState},
    config::Config,
    store::postgres::{self, PgNoteStore, PgReadingStore},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env (ignore error if file absent — env vars may be set externally)
    let _ = dotenvy::dotenv();

    // Initialise tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    // Load config
    let config = Config::from_env()?;
    info!(
        sensors = config.topology.len(),
        liveness_window_secs = config.liveness_window_secs,
        fleet_freshness_secs = config.fleet_freshness_secs,
        "Configuration loaded"
    );

    // Connect to the reading store and run migrations
    let pool = postgres::create_pool(&config.database_url).await?;
    postgres::run_migrations(&pool).await?;
    info!("Reading store ready");

    let state = AppState::new(
        Arc::new(PgReadingStore::new(pool.clone())),
        Arc::new(PgNoteStore::new(pool)),
        &config,
    );

    // Start HTTP server
    let addr = format!("{}:{}", config.server_host, config.server_port);
    let listener = TcpListener::bind(&addr).await?;
    info!(addr = %addr, "HTTP server listening");

    axum::serve(listener, api::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
