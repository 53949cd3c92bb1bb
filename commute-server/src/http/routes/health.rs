//! Liveness and database health endpoints

use axum::extract::State;
use axum::http::StatusCode;
use axum::{routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::DatabaseHealth;
use crate::state::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: String,
    pub environment: &'static str,
    pub uptime_seconds: u64,
    pub timestamp: DateTime<Utc>,
}

/// GET /health
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let settings = state.settings();
    Json(HealthResponse {
        status: "ok",
        version: settings.version.clone(),
        environment: settings.environment.as_str(),
        uptime_seconds: state.uptime().as_secs(),
        timestamp: Utc::now(),
    })
}

/// GET /health/db - 503 when the probe fails
async fn database_health(State(state): State<AppState>) -> (StatusCode, Json<DatabaseHealth>) {
    let report = state.db().health_check().await;
    let status = if report.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(report))
}

/// Health routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/db", get(database_health))
}
