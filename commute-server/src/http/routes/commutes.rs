//! Commute tracking routes

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

/// GET {api}/commutes/
async fn list_commutes() -> Json<Value> {
    Json(json!({ "message": "List of commutes" }))
}

pub fn router<S>(base: &str) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route(base, get(list_commutes))
        .route(&format!("{base}/"), get(list_commutes))
}
