mod auth;
mod config;
mod db;
mod error;
mod extractors;
mod routes;
mod state;

use axum::routing::get;
use axum::Router;
use clap::Parser;
use std::net::SocketAddr;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::auth::Sessions;
use crate::config::{Cli, Config};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Parse CLI args and load config; a missing secret, database path or
    // run mode aborts here
    let cli = Cli::parse();
    let data_dir = Config::data_dir(&cli);
    std::fs::create_dir_all(&data_dir)?;
    tracing::info!("Data directory: {}", data_dir.display());

    let config = Config::load(&cli)?;

    // Initialize database
    let pool = db::shared_pool(config.db_path())?;
    db::run_migrations(&pool)?;

    // Build app state
    let sessions = Sessions::new(config.session_secret(), config.is_production());
    let state = AppState { db: pool, sessions };

    // Build router
    let app = Router::new()
        .route("/", get(routes::home::index))
        .merge(routes::auth::router())
        .merge(routes::jokes::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
