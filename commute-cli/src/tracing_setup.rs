//! Structured logging setup for the commute binary
//!
//! JSON records on stderr, one per line. The base level comes from
//! `LOG_LEVEL`; noisy dependencies are pinned separately.
//!
//! Environment variables:
//!   RUST_LOG    # Full filter override, e.g. `commute_server=debug,sqlx=info`

use anyhow::{anyhow, Result};
use commute_core::{LogLevel, Settings};
use tracing_subscriber::EnvFilter;

/// Dependency targets and the level each is held to
const DEPENDENCY_DIRECTIVES: &[&str] = &["sqlx=warn", "tower_http=warn", "hyper=info"];

/// Tracing configuration options
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Level for our own crates and anything not pinned
    pub level: LogLevel,
    /// JSON records (default) or compact human-readable lines
    pub json: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            json: true,
        }
    }
}

impl TracingConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            level: settings.log_level,
            ..Self::default()
        }
    }

    /// Filter used when `RUST_LOG` is unset
    pub fn filter_directives(&self) -> String {
        let mut directives = vec![self.level.filter_directive()];
        directives.extend_from_slice(DEPENDENCY_DIRECTIVES);
        directives.join(",")
    }
}

/// Install the global subscriber.
///
/// Fails if one is already installed; callers may ignore that.
pub fn init_tracing(config: &TracingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.filter_directives()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);

    if config.json {
        builder
            .json()
            .with_current_span(false)
            .flatten_event(true)
            .try_init()
            .map_err(|err| anyhow!(err))
    } else {
        builder.compact().try_init().map_err(|err| anyhow!(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_pins_dependencies() {
        let config = TracingConfig::default();
        assert_eq!(
            config.filter_directives(),
            "info,sqlx=warn,tower_http=warn,hyper=info"
        );
    }

    #[test]
    fn warning_maps_to_warn() {
        let config = TracingConfig {
            level: LogLevel::Warning,
            json: true,
        };
        assert!(config.filter_directives().starts_with("warn,"));
    }

    #[test]
    fn level_follows_settings() {
        let settings = Settings::from_lookup(commute_core::Profile::Base, |key| {
            (key == "LOG_LEVEL").then(|| "debug".to_string())
        })
        .unwrap();
        assert_eq!(TracingConfig::from_settings(&settings).level, LogLevel::Debug);
    }

    #[test]
    fn second_init_is_an_error_not_a_panic() {
        let config = TracingConfig::default();
        let _ = init_tracing(&config);
        assert!(init_tracing(&config).is_err());
    }
}
