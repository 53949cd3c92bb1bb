//! Axum server setup
//!
//! Middleware, outermost first:
//! - Unhandled error handler (logs, hides detail outside debug)
//! - Trusted host check (skipped in debug)
//! - CORS for the configured origins
//! - Request timing and access log
//! - Panic catcher
//!
//! Graceful shutdown on SIGTERM/Ctrl+C.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{middleware, Router};
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;

use super::error::{handle_unhandled_errors, panic_response};
use super::middleware::{cors_layer, request_timing, trusted_host, AllowedHosts};
use super::routes;
use crate::db::{DbError, Schema};
use crate::state::AppState;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to (default: 0.0.0.0:8000)
    pub bind_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
        }
    }
}

impl ServerConfig {
    /// Bind address from `HOST` and `PORT`; `HOST` may be a hostname
    pub async fn from_settings(settings: &commute_core::Settings) -> Result<Self, ServerError> {
        Self::resolve(&settings.bind_address()).await
    }

    /// Literal `ip:port`, or `host:port` resolved to its first address
    pub async fn resolve(addr: &str) -> Result<Self, ServerError> {
        if let Ok(config) = Self::parse(addr) {
            return Ok(config);
        }

        let resolve_error = |source| ServerError::Resolve {
            addr: addr.to_string(),
            source,
        };
        let bind_addr = tokio::net::lookup_host(addr)
            .await
            .map_err(resolve_error)?
            .next()
            .ok_or_else(|| {
                resolve_error(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "no addresses found",
                ))
            })?;
        tracing::debug!(addr, %bind_addr, "Resolved bind address");
        Ok(Self { bind_addr })
    }

    pub fn parse(addr: &str) -> Result<Self, ServerError> {
        let bind_addr = addr.parse().map_err(|source| ServerError::BindAddress {
            addr: addr.to_string(),
            source,
        })?;
        Ok(Self { bind_addr })
    }
}

/// The full application: every route behind the middleware stack
pub fn build_router(state: AppState) -> Router {
    let api_prefix = state.settings().api_v1_str.clone();
    assemble(state, routes::router(&api_prefix))
}

/// Wrap `routes` in the middleware stack and attach state.
///
/// Exposed so tests can mount extra routes behind the same stack.
pub fn assemble(state: AppState, routes: Router<AppState>) -> Router {
    let settings = state.settings_arc();

    let mut app = routes
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(middleware::from_fn(request_timing))
        .layer(cors_layer(&settings.backend_cors_origins));

    if !settings.debug {
        let hosts = Arc::new(AllowedHosts::new(&settings.allowed_hosts));
        app = app.layer(middleware::from_fn_with_state(hosts, trusted_host));
    }

    app.layer(middleware::from_fn_with_state(
        Arc::clone(&settings),
        handle_unhandled_errors,
    ))
    .with_state(state)
}

/// Startup hook: database init with the declared schema
pub async fn startup(state: &AppState) -> Result<(), ServerError> {
    let settings = state.settings();
    tracing::info!(
        environment = %settings.environment,
        debug = settings.debug,
        "Starting {}",
        settings.project_name
    );

    state
        .db()
        .init(settings, &Schema::declared())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Startup failed");
            ServerError::Startup(e)
        })?;

    tracing::info!("Application startup complete");
    Ok(())
}

/// Shutdown hook. Pool disposal is left to the caller.
pub fn shutdown(state: &AppState) {
    tracing::info!("Shutting down {}", state.settings().project_name);
    tracing::info!("Shutdown complete");
}

/// Run the HTTP server.
///
/// # Example
///
/// ```ignore
/// let state = AppState::new(settings, Database::connect_lazy(&settings)?);
/// run_server(state.clone(), ServerConfig::from_settings(state.settings()).await?).await?;
/// state.db().close().await;
/// ```
pub async fn run_server(state: AppState, config: ServerConfig) -> Result<(), ServerError> {
    startup(&state).await?;

    let app = build_router(state.clone());

    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    shutdown(&state);
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
///
/// A handler that cannot be installed is logged and never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting shutdown");
        }
    }
}

/// Server error type
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid bind address '{addr}': {source}")]
    BindAddress {
        addr: String,
        #[source]
        source: std::net::AddrParseError,
    },

    #[error("Could not resolve bind address '{addr}': {source}")]
    Resolve {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Startup failed: {0}")]
    Startup(#[source] DbError),
}
