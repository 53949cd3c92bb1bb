//! Request middleware: trusted host check, CORS policy, request timing

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Request, State};
use axum::http::{header, HeaderName, HeaderValue, Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tracing::{info, warn};

/// Methods a cross-origin caller may use
pub const CORS_METHODS: [Method; 6] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::OPTIONS,
    Method::PATCH,
];

/// Elapsed request time in seconds, set on every response
pub const PROCESS_TIME_HEADER: HeaderName = HeaderName::from_static("x-process-time");

/// Host header allow-list.
///
/// Entries match exactly, `*` matches anything, and `*.example.com` matches
/// any subdomain of `example.com` (not the bare domain).
#[derive(Debug, Clone)]
pub struct AllowedHosts {
    patterns: Vec<String>,
}

impl AllowedHosts {
    pub fn new(patterns: &[String]) -> Self {
        Self {
            patterns: patterns.iter().map(|p| p.to_ascii_lowercase()).collect(),
        }
    }

    pub fn is_allowed(&self, host_header: &str) -> bool {
        let host = strip_port(host_header).to_ascii_lowercase();
        self.patterns.iter().any(|pattern| {
            pattern == "*"
                || *pattern == host
                || pattern
                    .strip_prefix('*')
                    .is_some_and(|suffix| suffix.starts_with('.') && host.ends_with(suffix))
        })
    }
}

fn strip_port(host: &str) -> &str {
    if host.starts_with('[') {
        // IPv6 literal, keep the brackets
        return match host.find(']') {
            Some(end) => &host[..=end],
            None => host,
        };
    }
    host.split(':').next().unwrap_or(host)
}

/// Reject requests whose Host is not on the allow-list
pub async fn trusted_host(
    State(hosts): State<Arc<AllowedHosts>>,
    request: Request,
    next: Next,
) -> Response {
    let host = request
        .headers()
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .or_else(|| request.uri().host())
        .unwrap_or_default();

    if hosts.is_allowed(host) {
        next.run(request).await
    } else {
        warn!(host = %host, path = %request.uri().path(), "Rejected request with untrusted host");
        (StatusCode::BAD_REQUEST, "Invalid host header").into_response()
    }
}

/// CORS for the configured origins with credentials allowed.
///
/// Request headers are mirrored back, since wildcards are not permitted
/// alongside credentials. A `*` origin mirrors the request origin.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|origin| origin == "*") {
        AllowOrigin::mirror_request()
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(origin = %origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_credentials(true)
        .allow_methods(AllowMethods::list(CORS_METHODS))
        .allow_headers(AllowHeaders::mirror_request())
        .expose_headers([PROCESS_TIME_HEADER])
}

/// Log each request on entry and exit and attach `X-Process-Time`
pub async fn request_timing(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let started = Instant::now();

    info!(method = %method, path = %path, "{} {}", method, path);

    let mut response = next.run(request).await;

    let elapsed = started.elapsed().as_secs_f64();
    let status = response.status().as_u16();
    info!(
        method = %method,
        path = %path,
        status,
        elapsed_secs = elapsed,
        "{} {} - {} - {:.3}s",
        method,
        path,
        status,
        elapsed
    );

    if let Ok(value) = HeaderValue::from_str(&elapsed.to_string()) {
        response.headers_mut().insert(PROCESS_TIME_HEADER, value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hosts(patterns: &[&str]) -> AllowedHosts {
        let patterns: Vec<String> = patterns.iter().map(|p| p.to_string()).collect();
        AllowedHosts::new(&patterns)
    }

    #[test]
    fn exact_hosts_match_ignoring_port_and_case() {
        let allowed = hosts(&["localhost", "127.0.0.1"]);
        assert!(allowed.is_allowed("localhost"));
        assert!(allowed.is_allowed("LOCALHOST:8000"));
        assert!(allowed.is_allowed("127.0.0.1:8000"));
        assert!(!allowed.is_allowed("evil.example"));
        assert!(!allowed.is_allowed(""));
    }

    #[test]
    fn wildcard_subdomains() {
        let allowed = hosts(&["*.example.com"]);
        assert!(allowed.is_allowed("api.example.com"));
        assert!(allowed.is_allowed("a.b.example.com:443"));
        assert!(!allowed.is_allowed("example.com"));
        assert!(!allowed.is_allowed("badexample.com"));
    }

    #[test]
    fn star_allows_everything() {
        assert!(hosts(&["*"]).is_allowed("anything.at.all"));
    }

    #[test]
    fn ipv6_port_is_stripped() {
        assert_eq!(strip_port("[::1]:8000"), "[::1]");
        assert!(hosts(&["[::1]"]).is_allowed("[::1]:8000"));
    }
}
