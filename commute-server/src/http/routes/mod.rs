//! Route handlers organized by resource

pub mod analytics;
pub mod auth;
pub mod commutes;
pub mod health;
pub mod root;

use axum::Router;

use crate::state::AppState;

/// Every route, with resource groups mounted under `api_prefix`
pub fn router(api_prefix: &str) -> Router<AppState> {
    Router::new()
        .merge(root::router())
        .merge(health::router())
        .merge(auth::router(&format!("{api_prefix}/auth")))
        .merge(commutes::router(&format!("{api_prefix}/commutes")))
        .merge(analytics::router(&format!("{api_prefix}/analytics")))
}
