use anyhow::Result;
use axum::extract::DefaultBodyLimit;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

mod config;
mod error;
mod logging;
mod routes;
mod services;
pub mod models;

use services::sessions::SessionStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    logging::init_logging()?;

    // Load configuration
    let config = config::Config::from_env()?;
    let addr = config.addr;
    let body_limit = config.max_file_size;

    // Build our application state
    let state = Arc::new(AppState::new(config));

    let app = routes::routes()
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// Application state
pub struct AppState {
    config: config::Config,
    sessions: SessionStore,
}

impl AppState {
    fn new(config: config::Config) -> Self {
        let sessions = SessionStore::new(config.max_sessions, config.session_idle);
        Self { config, sessions }
    }
}
