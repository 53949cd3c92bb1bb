//! API error types and the top-level error handler
//!
//! Handler errors and panics both become a 500 carrying an [`UnhandledError`]
//! marker. The outermost middleware, [`handle_unhandled_errors`], logs the
//! failure and decides how much of it the client may see: full detail in
//! debug mode, a generic message otherwise.

use std::any::Any;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use commute_core::Settings;
use serde_json::{json, Value};

use crate::db::DbError;

const GENERIC_MESSAGE: &str = "Internal Server Error";

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// Database failure (500, detail hidden outside debug)
    Database(DbError),

    /// A dependency is down (503)
    ServiceUnavailable { reason: String },

    /// Anything else (500, detail hidden outside debug)
    Internal { message: String },
}

impl ApiError {
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Database(e) => write!(f, "{e}"),
            Self::ServiceUnavailable { reason } => write!(f, "service unavailable: {reason}"),
            Self::Internal { message } => f.write_str(message),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::ServiceUnavailable { reason } => (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "error": "Service Unavailable",
                    "detail": reason
                })),
            )
                .into_response(),
            Self::Database(e) => unhandled_response(e.to_string(), "DbError"),
            Self::Internal { message } => unhandled_response(message, "InternalError"),
        }
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        Self::Database(e)
    }
}

/// Marker carried by a 500 response whose cause has not been shown yet
#[derive(Debug, Clone)]
pub struct UnhandledError {
    pub detail: String,
    pub kind: &'static str,
}

fn unhandled_response(detail: String, kind: &'static str) -> Response {
    let mut response = (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": GENERIC_MESSAGE })),
    )
        .into_response();
    response
        .extensions_mut()
        .insert(UnhandledError { detail, kind });
    response
}

/// Response for a handler that panicked (used with `CatchPanicLayer`)
pub fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "handler panicked".to_string()
    };
    unhandled_response(detail, "Panic")
}

/// Outermost middleware: log unhandled failures and shape their body
pub async fn handle_unhandled_errors(
    State(settings): State<Arc<Settings>>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();

    let response = next.run(request).await;
    let Some(failure) = response.extensions().get::<UnhandledError>().cloned() else {
        return response;
    };

    tracing::error!(
        method = %method,
        path = %path,
        kind = failure.kind,
        error = %failure.detail,
        "Unhandled exception"
    );

    let body = error_body(&failure, &path, settings.debug);
    let (mut parts, _) = response.into_parts();
    parts.extensions.remove::<UnhandledError>();
    parts.headers.remove(header::CONTENT_LENGTH);
    parts.headers.insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("application/json"),
    );
    Response::from_parts(parts, Body::from(body.to_string()))
}

fn error_body(failure: &UnhandledError, path: &str, debug: bool) -> Value {
    if debug {
        json!({
            "error": GENERIC_MESSAGE,
            "detail": failure.detail,
            "type": failure.kind,
            "path": path
        })
    } else {
        json!({ "error": GENERIC_MESSAGE })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn internal_error_is_500_with_marker() {
        let response = ApiError::internal("boom").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let marker = response.extensions().get::<UnhandledError>().unwrap();
        assert_eq!(marker.detail, "boom");
        assert_eq!(marker.kind, "InternalError");
    }

    #[tokio::test]
    async fn service_unavailable_is_503_without_marker() {
        let response = ApiError::ServiceUnavailable {
            reason: "database down".into(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(response.extensions().get::<UnhandledError>().is_none());
    }

    #[test]
    fn panic_payloads_are_described() {
        let response = panic_response(Box::new("static message"));
        let marker = response.extensions().get::<UnhandledError>().unwrap();
        assert_eq!(marker.detail, "static message");
        assert_eq!(marker.kind, "Panic");

        let response = panic_response(Box::new(String::from("owned message")));
        let marker = response.extensions().get::<UnhandledError>().unwrap();
        assert_eq!(marker.detail, "owned message");
    }

    #[test]
    fn body_shape_depends_on_debug() {
        let failure = UnhandledError {
            detail: "division by zero".into(),
            kind: "InternalError",
        };
        assert_eq!(
            error_body(&failure, "/boom", false),
            json!({ "error": "Internal Server Error" })
        );
        assert_eq!(
            error_body(&failure, "/boom", true),
            json!({
                "error": "Internal Server Error",
                "detail": "division by zero",
                "type": "InternalError",
                "path": "/boom"
            })
        );
    }
}
