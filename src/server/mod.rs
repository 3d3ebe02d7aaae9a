//! HTTP processor
//!
//! Accepts a sample (multipart upload, storage key, or inline base64), runs
//! the tool battery against it, and answers with the collected output keyed
//! by tool name.

use anyhow::{Context, Result};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::sync::Arc;
use tracing::info;

use crate::config::StegprocConfig;
use crate::runner::Runner;

pub mod error;
pub mod handlers;
pub mod types;

pub use error::ApiError;

/// Shared across all requests
pub struct AppState {
    pub config: StegprocConfig,
    pub runner: Runner,
}

impl AppState {
    pub fn new(config: StegprocConfig) -> Self {
        let runner = Runner::new(&config);
        Self { config, runner }
    }
}

/// Create the router for the processor
pub fn router(state: Arc<AppState>) -> Router {
    let body_limit = state.config.server.max_upload_bytes;

    Router::new()
        .route("/", get(handlers::health_check))
        .route("/health", get(handlers::health_check))
        .route("/tools", get(handlers::list_tools))
        .route("/process", post(handlers::process))
        .route("/upload", post(handlers::upload))
        .route("/stegsolve", post(handlers::stegsolve))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// Bind and serve until the process is stopped
pub async fn serve(config: StegprocConfig) -> Result<()> {
    let addr = config.bind_address();
    let state = Arc::new(AppState::new(config));
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Stegproc listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Stegproc stopped");
    Ok(())
}

async fn shutdown_signal() {
    // An error here means no handler could be installed; run until killed
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}
