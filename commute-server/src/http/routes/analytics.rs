use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

async fn analytics_overview() -> Json<Value> {
    Json(json!({ "message": "Analytics overview" }))
}

pub fn router<S>(base: &str) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route(base, get(analytics_overview))
        .route(&format!("{base}/"), get(analytics_overview))
}
