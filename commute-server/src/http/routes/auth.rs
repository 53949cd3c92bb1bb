//! Authentication routes (placeholder)

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

/// GET {api}/auth/
async fn auth_root() -> Json<Value> {
    Json(json!({ "message": "Auth endpoint" }))
}

/// Mounted at `base`, answering with and without the trailing slash
pub fn router<S>(base: &str) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route(base, get(auth_root))
        .route(&format!("{base}/"), get(auth_root))
}
