/// Structured error types for commute-core.
///
/// Uses `thiserror` so library consumers get composable errors.
/// The `commute` binary wraps these in `anyhow` at the edges.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration loading and validation errors.
///
/// Every variant is fatal: settings construction aborts on the first one.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// `ENVIRONMENT` is not one of the known deployment environments
    #[error("Environment must be one of: development, staging, production (got '{value}')")]
    InvalidEnvironment { value: String },

    /// `SECRET_KEY` is too short to sign tokens safely
    #[error("Secret key must be at least {min} characters long (got {len})")]
    SecretKeyTooShort { len: usize, min: usize },

    /// `GOOGLE_MAPS_API_KEY` does not look like a Maps key
    #[error("Invalid Google Maps API key format")]
    InvalidMapsApiKey,

    /// A value could not be parsed into the field's type
    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    /// A numeric value is outside its allowed bounds
    #[error("{key} must be between {min} and {max} (got {value})")]
    OutOfRange {
        key: String,
        value: i64,
        min: i64,
        max: i64,
    },

    /// The env file exists but could not be read or parsed
    #[error("Failed to read env file {path:?}: {source}")]
    EnvFile {
        path: PathBuf,
        source: dotenvy::Error,
    },
}

/// Result type alias for commute-core operations
pub type Result<T> = std::result::Result<T, ConfigError>;

impl ConfigError {
    /// Create an invalid value error
    pub fn invalid_value(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Create an out of range error
    pub fn out_of_range(key: impl Into<String>, value: i64, min: i64, max: i64) -> Self {
        Self::OutOfRange {
            key: key.into(),
            value,
            min,
            max,
        }
    }

    /// Create an env file error
    pub fn env_file(path: impl Into<PathBuf>, source: dotenvy::Error) -> Self {
        Self::EnvFile {
            path: path.into(),
            source,
        }
    }
}
