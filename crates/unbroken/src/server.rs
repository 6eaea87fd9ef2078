//! HTTP server for unbroken
//!
//! Builds the router and runs it until Ctrl-C.

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::{Config, ConfigError};
use crate::handlers::{self, AppState};
use crate::ingest::Ingestor;

/// Server errors
#[derive(Debug, Error)]
pub enum ServerError {
    /// Invalid configuration
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Could not bind the listen address
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        /// The address that could not be bound
        addr: String,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// The server stopped with an error
    #[error("Server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Build the application router
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/go/push", post(handlers::push_go_test))
        .route("/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Build the router from configuration
///
/// # Errors
///
/// Returns `ConfigError` if the push settings are invalid.
pub fn app(config: &Config) -> Result<Router, ConfigError> {
    let ingestor = Ingestor::new(config.derive_options(), config.push_target()?);
    Ok(router(AppState::new(ingestor), config.max_upload_bytes()))
}

/// Run the server until shutdown
///
/// # Errors
///
/// Returns `ServerError` if the configuration is invalid, the address
/// cannot be bound, or serving fails.
pub async fn serve(config: &Config) -> Result<(), ServerError> {
    let app = app(config)?;
    let addr = config.bind_address();

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.clone(),
            source,
        })?;

    info!(
        addr = %addr,
        push = config.push_metrics,
        "unbroken listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("unbroken stopped");
    Ok(())
}

async fn shutdown_signal() {
    // If the handler cannot be installed, run until killed
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}
