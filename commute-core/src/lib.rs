//! commute-core: configuration shared by the commute tracker server and CLI
//!
//! Settings are loaded and validated once, then handed to every component
//! that needs them as `Arc<Settings>`.

pub mod config;
pub mod error;

pub use config::{
    get_settings, parse_delimited, redact_url, DatabaseConfig, Environment, LogLevel, Profile,
    Settings, MIN_SECRET_KEY_LEN,
};
pub use error::{ConfigError, Result};
