//! Connection pool construction
//!
//! Both pools are sqlx `AnyPool`s so the same code serves PostgreSQL in
//! deployment and SQLite files in tests; the URL scheme picks the driver.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;
use sqlx::any::{AnyConnectOptions, AnyPoolOptions};
use sqlx::{AnyPool, ConnectOptions};

use super::DbError;

/// Steady-state connections kept per pool.
pub const DEFAULT_POOL_SIZE: u32 = 5;

/// Extra connections allowed above `pool_size` under load.
pub const DEFAULT_MAX_OVERFLOW: u32 = 20;

/// How long a caller waits for a connection before giving up.
pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

/// Connections older than this are closed and replaced.
pub const DEFAULT_RECYCLE: Duration = Duration::from_secs(3600);

/// Pool sizing and connection policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolSettings {
    pub pool_size: u32,
    pub max_overflow: u32,
    pub acquire_timeout: Duration,
    pub recycle: Duration,
    /// Ping connections before handing them out
    pub pre_ping: bool,
    /// Log every statement at debug level
    pub echo: bool,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            pool_size: DEFAULT_POOL_SIZE,
            max_overflow: DEFAULT_MAX_OVERFLOW,
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
            recycle: DEFAULT_RECYCLE,
            pre_ping: true,
            echo: false,
        }
    }
}

impl PoolSettings {
    /// Hard upper bound on open connections
    pub fn max_connections(&self) -> u32 {
        self.pool_size + self.max_overflow
    }
}

/// Which pool a session was drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PoolKind {
    /// Serves request handlers
    Request,
    /// Serves schema management and CLI maintenance
    Admin,
}

impl fmt::Display for PoolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request => f.write_str("request"),
            Self::Admin => f.write_str("admin"),
        }
    }
}

/// Point-in-time pool occupancy
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionInfo {
    /// Connection URL with the password masked
    pub url: String,
    pub pool_size: u32,
    pub max_connections: u32,
    pub checked_in: u32,
    pub checked_out: u32,
    pub overflow: u32,
    pub total_connections: u32,
}

impl ConnectionInfo {
    pub(crate) fn snapshot(pool: &AnyPool, url: &str, settings: &PoolSettings) -> Self {
        // size and idle are read separately, so clamp rather than trust the difference
        let total = pool.size();
        let idle = u32::try_from(pool.num_idle()).unwrap_or(u32::MAX).min(total);

        Self {
            url: commute_core::redact_url(url),
            pool_size: settings.pool_size,
            max_connections: settings.max_connections(),
            checked_in: idle,
            checked_out: total - idle,
            overflow: total.saturating_sub(settings.pool_size),
            total_connections: total,
        }
    }
}

/// Strip ORM-style driver qualifiers from the URL scheme.
///
/// `postgresql+asyncpg://host/db` becomes `postgresql://host/db`; sqlx picks
/// its driver from the bare scheme.
pub fn driver_url(url: &str) -> Cow<'_, str> {
    match url.split_once("://") {
        Some((scheme, rest)) if scheme.contains('+') => {
            let base = scheme.split('+').next().unwrap_or(scheme);
            Cow::Owned(format!("{base}://{rest}"))
        }
        _ => Cow::Borrowed(url),
    }
}

/// Build a lazily connecting pool.
///
/// No connection is opened until the first checkout, so a database that is
/// down at boot surfaces in the health check rather than here. Must be called
/// inside a Tokio runtime.
pub fn build_pool(url: &str, settings: &PoolSettings) -> Result<AnyPool, DbError> {
    sqlx::any::install_default_drivers();

    let options = AnyConnectOptions::from_str(&driver_url(url))?;
    let options = if settings.echo {
        options
    } else {
        options.disable_statement_logging()
    };

    let pool = AnyPoolOptions::new()
        .max_connections(settings.max_connections())
        .acquire_timeout(settings.acquire_timeout)
        .max_lifetime(settings.recycle)
        .test_before_acquire(settings.pre_ping)
        .connect_lazy_with(options);

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_pool_settings() {
        let settings = PoolSettings::default();
        assert_eq!(settings.pool_size, 5);
        assert_eq!(settings.max_overflow, 20);
        assert_eq!(settings.max_connections(), 25);
        assert_eq!(settings.recycle, Duration::from_secs(3600));
        assert_eq!(settings.acquire_timeout, Duration::from_secs(30));
        assert!(settings.pre_ping);
    }

    #[test]
    fn driver_qualifier_is_stripped() {
        assert_eq!(
            driver_url("postgresql+asyncpg://u:p@db:5432/app"),
            "postgresql://u:p@db:5432/app"
        );
        assert_eq!(driver_url("postgres://db/app"), "postgres://db/app");
        assert_eq!(driver_url("sqlite::memory:"), "sqlite::memory:");
    }

    #[tokio::test]
    async fn lazy_pool_opens_nothing() {
        let pool = build_pool("sqlite::memory:", &PoolSettings::default()).unwrap();
        let info = ConnectionInfo::snapshot(&pool, "sqlite::memory:", &PoolSettings::default());
        assert_eq!(info.total_connections, 0);
        assert_eq!(info.checked_out, 0);
        assert_eq!(info.overflow, 0);
    }

    #[tokio::test]
    async fn invalid_url_is_rejected() {
        assert!(build_pool("not a url", &PoolSettings::default()).is_err());
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn pool_acquires_connection() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = build_pool(&url, &PoolSettings::default()).expect("pool creation failed");

        sqlx::query("SELECT 1")
            .execute(&pool)
            .await
            .expect("query failed");
    }
}
