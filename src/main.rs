use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use bandpics::config::{Cli, Config};
use bandpics::db::{Database, SessionModel};
use bandpics::routes;
use bandpics::social::EmptySource;
use bandpics::state::AppState;
use bandpics::storage::LocalBlobStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Parse CLI args and load config
    let cli = Cli::parse();
    let data_dir = Config::data_dir(&cli);
    std::fs::create_dir_all(&data_dir)?;
    tracing::info!("Data directory: {}", data_dir.display());

    let config = Config::load(&cli)?;

    // Ensure uploads directory exists
    std::fs::create_dir_all(config.uploads_path())?;

    // Initialize database
    let database = Database::new(config.db_path());
    let pool = database.handle()?;

    spawn_session_sweeper(
        SessionModel::new(pool.clone()),
        config.auth.sweep_interval_minutes,
    );

    let blobs = Arc::new(LocalBlobStore::new(
        config.uploads_path(),
        config.storage.public_base_url.clone(),
    ));
    let state = AppState::new(pool, config.clone(), blobs, Arc::new(EmptySource));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = routes::router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    database.close();
    Ok(())
}

/// Periodically purge expired sessions. An interval of zero disables the sweep.
fn spawn_session_sweeper(sessions: SessionModel, interval_minutes: u64) {
    if interval_minutes == 0 {
        return;
    }
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_minutes * 60));
        loop {
            interval.tick().await;
            let sessions = sessions.clone();
            match tokio::task::spawn_blocking(move || sessions.delete_expired_sessions()).await {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => tracing::warn!("Session sweep failed: {}", e),
                Err(e) => tracing::warn!("Session sweep task panicked: {}", e),
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
