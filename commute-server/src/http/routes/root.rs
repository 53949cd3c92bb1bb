//! API information at `/`

use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ExternalLinks {
    pub frontend: &'static str,
    pub health: &'static str,
    pub github_repo: &'static str,
}

/// Root payload
#[derive(Debug, Serialize)]
pub struct ApiInfo {
    pub message: String,
    pub version: String,
    pub environment: &'static str,
    pub api_docs: &'static str,
    pub endpoints: Vec<String>,
    pub learning_objectives: &'static [&'static str],
    pub next_steps: Vec<String>,
    pub external_links: ExternalLinks,
}

const LEARNING_OBJECTIVES: &[&str] = &[
    "Structure an async HTTP API with axum and tower middleware",
    "Manage pooled database sessions with explicit commit and rollback",
    "Integrate external APIs (Google Maps)",
    "Implement authentication and security",
    "Analyze commute data",
    "Build production-ready API endpoints",
];

/// GET /
async fn root(State(state): State<AppState>) -> Json<ApiInfo> {
    let settings = state.settings();
    let api = &settings.api_v1_str;

    Json(ApiInfo {
        message: format!("Welcome to the {} API", settings.project_name),
        version: settings.version.clone(),
        environment: settings.environment.as_str(),
        api_docs: if settings.debug {
            "See endpoints"
        } else {
            "Not available in production"
        },
        endpoints: vec![
            "/health".to_string(),
            "/health/db".to_string(),
            format!("{api}/auth/"),
            format!("{api}/commutes/"),
            format!("{api}/analytics/"),
        ],
        learning_objectives: LEARNING_OBJECTIVES,
        next_steps: vec![
            "Start with /health endpoint to test connectivity".to_string(),
            "Check /health/db to verify the database".to_string(),
            format!("Explore {api}/commutes for main features"),
        ],
        external_links: ExternalLinks {
            frontend: "http://localhost:3000",
            health: "http://localhost:8000/health",
            github_repo: "https://github.com/krisyana/commute-tracker-learning",
        },
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(root))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use commute_core::{Profile, Settings};

    use super::*;
    use crate::db::{Database, PoolSettings};

    fn state(debug: &str) -> AppState {
        let settings = Settings::from_lookup(Profile::Base, |key| match key {
            "ENVIRONMENT" => Some("staging".to_string()),
            "DEBUG" => Some(debug.to_string()),
            "API_V1_STR" => Some("/api/v2/".to_string()),
            _ => None,
        })
        .unwrap();
        let db = Database::with_options("sqlite::memory:", PoolSettings::default()).unwrap();
        AppState::new(Arc::new(settings), db)
    }

    #[tokio::test]
    async fn root_reports_environment_and_endpoints() {
        let Json(info) = root(State(state("false"))).await;
        assert_eq!(info.environment, "staging");
        assert_eq!(info.version, "1.0.0");
        assert_eq!(info.api_docs, "Not available in production");
        assert!(info.endpoints.contains(&"/api/v2/commutes/".to_string()));
        assert!(!info.learning_objectives.is_empty());
    }

    #[tokio::test]
    async fn debug_mode_points_at_endpoints() {
        let Json(info) = root(State(state("true"))).await;
        assert_eq!(info.api_docs, "See endpoints");
    }
}
