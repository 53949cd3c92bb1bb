//! commute-server: HTTP API for the commute tracker
//!
//! Provides:
//! - Pooled database sessions with scoped commit/rollback (`db`)
//! - The axum application with its middleware stack and routes (`http`)
//! - Shared handler state (`state`)
//!
//! Settings come in from the caller; nothing here reads the process-wide
//! settings cache.

pub mod db;
pub mod http;
pub mod state;

pub use db::{Database, DatabaseHealth, DbError, Schema, Session, SessionObserver};
pub use http::{build_router, run_server, ApiError, ServerConfig, ServerError};
pub use state::AppState;
