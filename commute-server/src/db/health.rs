//! Database health report

use serde::Serialize;

use super::pool::ConnectionInfo;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Result of one health probe. Failures are data, never errors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatabaseHealth {
    pub status: HealthStatus,
    /// Round-trip time of the probe query in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub connection_info: Option<ConnectionInfo>,
}

impl DatabaseHealth {
    pub fn healthy(response_time_ms: f64, connection_info: ConnectionInfo) -> Self {
        Self {
            status: HealthStatus::Healthy,
            response_time_ms: Some(round_millis(response_time_ms)),
            error: None,
            connection_info: Some(connection_info),
        }
    }

    pub fn unhealthy(error: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Unhealthy,
            response_time_ms: None,
            error: Some(error.into()),
            connection_info: None,
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}

fn round_millis(ms: f64) -> f64 {
    (ms * 100.0).round() / 100.0
}
