//! Database layer - connection pools and scoped sessions
//!
//! # Design Principles
//!
//! - Two lazily connecting pools: one for request handlers, one for schema
//!   management and CLI maintenance
//! - Sessions are transactions; commit is explicit, everything else rolls back
//! - The connection always goes back to the pool, on every exit path
//! - No retries: a checkout timeout fails that caller only
//! - An unreachable database fails fast with the driver's own error, not a
//!   checkout timeout

pub mod health;
pub mod pool;
pub mod schema;
pub mod session;

use std::sync::Arc;
use std::time::{Duration, Instant};

use commute_core::Settings;
use futures::future::BoxFuture;
use sqlx::{AnyConnection, AnyPool, Connection};
use thiserror::Error;
use tracing::{error, info, warn};

pub use health::{DatabaseHealth, HealthStatus};
pub use pool::{build_pool, driver_url, ConnectionInfo, PoolKind, PoolSettings};
pub use schema::{Schema, Table};
pub use session::{LoggingObserver, Session, SessionObserver};

use session::Observers;

/// Upper bound on waiting for checked-out connections during `close`
const CLOSE_TIMEOUT: Duration = Duration::from_secs(10);

/// Upper bound on the reachability check made while a pool holds no connections
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Database errors
#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlx(#[source] sqlx::Error),

    /// Every connection (overflow included) stayed checked out for the
    /// whole acquire timeout
    #[error("Timed out waiting for a pooled database connection")]
    PoolTimeout,

    /// The database refused or failed the connection attempt
    #[error("Failed to connect to database: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("Timed out connecting to the database after {0:?}")]
    ConnectTimeout(Duration),

    #[error("Failed to apply schema for table '{table}': {source}")]
    Schema {
        table: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Session already closed")]
    SessionClosed,
}

impl From<sqlx::Error> for DbError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::PoolTimedOut => Self::PoolTimeout,
            other => Self::Sqlx(other),
        }
    }
}

/// Owns both pools and hands out sessions
#[derive(Clone)]
pub struct Database {
    pool: AnyPool,
    admin_pool: AnyPool,
    url: String,
    pool_settings: PoolSettings,
    observers: Observers,
}

impl Database {
    /// Build pools from settings; statement logging follows `settings.debug`.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn connect_lazy(settings: &Settings) -> Result<Self, DbError> {
        let config = settings.database_config();
        let pool_settings = PoolSettings {
            echo: config.echo,
            ..PoolSettings::default()
        };
        Self::with_options(&config.url, pool_settings)
    }

    /// Build pools with explicit sizing.
    ///
    /// For `sqlite::memory:` each pool (and each connection) sees its own
    /// private database; use a file URL when sessions must share data.
    pub fn with_options(url: &str, pool_settings: PoolSettings) -> Result<Self, DbError> {
        let pool = build_pool(url, &pool_settings)?;
        let admin_pool = build_pool(url, &pool_settings)?;

        let mut observers = Observers::default();
        observers.push(Arc::new(LoggingObserver));

        info!(
            url = %commute_core::redact_url(url),
            pool_size = pool_settings.pool_size,
            max_overflow = pool_settings.max_overflow,
            "Database pools configured"
        );

        Ok(Self {
            pool,
            admin_pool,
            url: url.to_string(),
            pool_settings,
            observers,
        })
    }

    /// Add a lifecycle observer. Applies to sessions opened afterwards.
    pub fn register_observer(&mut self, observer: Arc<dyn SessionObserver>) {
        self.observers.push(observer);
    }

    /// Request-path pool
    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    /// Maintenance pool
    pub fn admin_pool(&self) -> &AnyPool {
        &self.admin_pool
    }

    /// Open a session on the request pool
    pub async fn session(&self) -> Result<Session, DbError> {
        self.open(PoolKind::Request).await
    }

    /// Open a session on the admin pool
    pub async fn admin_session(&self) -> Result<Session, DbError> {
        self.open(PoolKind::Admin).await
    }

    async fn open(&self, kind: PoolKind) -> Result<Session, DbError> {
        let pool = match kind {
            PoolKind::Request => &self.pool,
            PoolKind::Admin => &self.admin_pool,
        };
        let opened = async {
            // sqlx keeps retrying refused connects until the acquire timeout,
            // so an empty pool is checked with one direct attempt first
            if pool.size() == 0 && !pool.is_closed() {
                self.ensure_reachable().await?;
            }
            pool.begin().await.map_err(DbError::from)
        }
        .await;

        let tx = opened.map_err(|e| {
            error!(pool = %kind, error = %e, "Failed to open database session");
            e
        })?;
        Ok(Session::open(tx, kind, self.observers.clone()))
    }

    /// One direct connection attempt, bounded by [`CONNECT_TIMEOUT`] or the
    /// acquire timeout, whichever is shorter
    async fn ensure_reachable(&self) -> Result<(), DbError> {
        let limit = CONNECT_TIMEOUT.min(self.pool_settings.acquire_timeout);
        let url = driver_url(&self.url);

        match tokio::time::timeout(limit, AnyConnection::connect(&url)).await {
            Ok(Ok(conn)) => {
                if let Err(e) = conn.close().await {
                    warn!(error = %e, "Failed to close reachability connection");
                }
                Ok(())
            }
            Ok(Err(e)) => Err(DbError::Connect(e)),
            Err(_) => Err(DbError::ConnectTimeout(limit)),
        }
    }

    /// Run `f` inside a request-pool session.
    ///
    /// `Ok` commits. `Err` rolls back before the error is returned. The
    /// connection is released either way.
    ///
    /// ```ignore
    /// let rows = db
    ///     .scoped(|session| Box::pin(async move { session.execute("DELETE FROM trips").await }))
    ///     .await?;
    /// ```
    pub async fn scoped<F, T, E>(&self, f: F) -> Result<T, E>
    where
        F: for<'s> FnOnce(&'s mut Session) -> BoxFuture<'s, Result<T, E>>,
        E: From<DbError> + std::fmt::Display,
    {
        let session = self.session().await?;
        run_scoped(session, f).await
    }

    /// [`scoped`](Self::scoped) on the admin pool
    pub async fn admin_scoped<F, T, E>(&self, f: F) -> Result<T, E>
    where
        F: for<'s> FnOnce(&'s mut Session) -> BoxFuture<'s, Result<T, E>>,
        E: From<DbError> + std::fmt::Display,
    {
        let session = self.admin_session().await?;
        run_scoped(session, f).await
    }

    /// Create every table in `schema`, in order, in one transaction
    pub async fn create_all(&self, schema: &Schema) -> Result<(), DbError> {
        let result = self.apply(schema.tables().iter().map(|t| (t.name.as_str(), t.ddl.clone()))).await;
        match &result {
            Ok(()) => info!(tables = schema.tables().len(), "Database tables created successfully"),
            Err(e) => error!(error = %e, "Failed to create tables"),
        }
        result
    }

    /// Drop every table in `schema`, in reverse order. Development use only.
    pub async fn drop_all(&self, schema: &Schema) -> Result<(), DbError> {
        let result = self
            .apply(schema.tables().iter().rev().map(|t| (t.name.as_str(), t.drop_statement())))
            .await;
        match &result {
            Ok(()) => warn!(tables = schema.tables().len(), "All database tables dropped"),
            Err(e) => error!(error = %e, "Failed to drop tables"),
        }
        result
    }

    async fn apply<'a>(
        &self,
        statements: impl Iterator<Item = (&'a str, String)>,
    ) -> Result<(), DbError> {
        let mut session = self.admin_session().await?;
        for (table, sql) in statements {
            let conn = session.conn()?;
            sqlx::query(&sql)
                .execute(conn)
                .await
                .map_err(|source| DbError::Schema {
                    table: table.to_string(),
                    source,
                })?;
        }
        session.commit().await
    }

    /// `SELECT 1` on the request pool. Logs the outcome, never fails.
    pub async fn check_connection(&self) -> bool {
        let result = async {
            let mut session = self.session().await?;
            session.ping().await?;
            session.commit().await
        }
        .await;

        match result {
            Ok(()) => {
                info!("Database connection healthy");
                true
            }
            Err(e) => {
                error!(error = %e, "Database connection failed");
                false
            }
        }
    }

    /// Current occupancy of the request pool
    pub fn connection_info(&self) -> ConnectionInfo {
        ConnectionInfo::snapshot(&self.pool, &self.url, &self.pool_settings)
    }

    /// Probe the database in a fresh scoped session.
    ///
    /// Never returns an error: failures come back as an unhealthy report.
    pub async fn health_check(&self) -> DatabaseHealth {
        let started = Instant::now();
        let result = self
            .scoped(|session| Box::pin(async move { session.ping().await }))
            .await;

        match result {
            Ok(()) => {
                let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
                DatabaseHealth::healthy(elapsed_ms, self.connection_info())
            }
            Err(e) => {
                error!(error = %e, "Database health check failed");
                DatabaseHealth::unhealthy(e.to_string())
            }
        }
    }

    /// Startup hook: verify connectivity, then create the schema when
    /// running in debug mode. Deployed environments manage schema externally.
    pub async fn init(&self, settings: &Settings, schema: &Schema) -> Result<(), DbError> {
        self.check_connection().await;

        if settings.debug {
            self.create_all(schema).await.map_err(|e| {
                error!(error = %e, "Database initialization failed");
                e
            })?;
        }

        info!("Database initialized successfully");
        Ok(())
    }

    /// Shutdown hook: close both pools. Best effort, never fails.
    pub async fn close(&self) {
        let closing = async {
            self.pool.close().await;
            self.admin_pool.close().await;
        };

        match tokio::time::timeout(CLOSE_TIMEOUT, closing).await {
            Ok(()) => info!("Database connections closed"),
            Err(_) => error!(
                timeout_secs = CLOSE_TIMEOUT.as_secs(),
                "Error closing database connections: sessions still checked out"
            ),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed() && self.admin_pool.is_closed()
    }
}

async fn run_scoped<F, T, E>(mut session: Session, f: F) -> Result<T, E>
where
    F: for<'s> FnOnce(&'s mut Session) -> BoxFuture<'s, Result<T, E>>,
    E: From<DbError> + std::fmt::Display,
{
    let pool = session.pool();
    match f(&mut session).await {
        Ok(value) => {
            session.commit().await?;
            Ok(value)
        }
        Err(e) => {
            error!(pool = %pool, error = %e, "Database session error, rolling back");
            if let Err(rollback_error) = session.rollback().await {
                warn!(pool = %pool, error = %rollback_error, "Rollback failed");
            }
            Err(e)
        }
    }
}
