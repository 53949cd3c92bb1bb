//! Scoped database sessions
//!
//! A [`Session`] owns one pooled connection inside an open transaction.
//! Committing consumes it. Any other exit (an explicit rollback, an early
//! return through `?`, a panic unwinding past it) rolls back and hands the
//! connection back to the pool when the session is dropped.

use std::sync::Arc;

use sqlx::any::Any;
use sqlx::{AnyConnection, Transaction};
use tracing::debug;

use super::pool::PoolKind;
use super::DbError;

/// Callbacks fired as sessions move through their lifecycle.
///
/// Register implementations with [`Database::register_observer`](super::Database::register_observer).
/// Every method has a no-op default.
pub trait SessionObserver: Send + Sync + 'static {
    /// A connection was checked out and a transaction opened
    fn on_checkout(&self, _pool: PoolKind) {}

    /// The session ended and its connection went back to the pool
    fn on_checkin(&self, _pool: PoolKind) {}

    fn on_commit(&self, _pool: PoolKind) {}

    /// The transaction was rolled back, explicitly or by dropping the session
    fn on_rollback(&self, _pool: PoolKind) {}
}

/// Emits a debug record for every lifecycle event
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingObserver;

impl SessionObserver for LoggingObserver {
    fn on_checkout(&self, pool: PoolKind) {
        debug!(pool = %pool, "Database connection checked out from pool");
    }

    fn on_checkin(&self, pool: PoolKind) {
        debug!(pool = %pool, "Database connection returned to pool");
    }

    fn on_commit(&self, pool: PoolKind) {
        debug!(pool = %pool, "Database transaction committed");
    }

    fn on_rollback(&self, pool: PoolKind) {
        debug!(pool = %pool, "Database transaction rolled back");
    }
}

/// Registered observers, shared by every session of a `Database`
#[derive(Clone, Default)]
pub(crate) struct Observers(Arc<Vec<Arc<dyn SessionObserver>>>);

impl Observers {
    pub(crate) fn push(&mut self, observer: Arc<dyn SessionObserver>) {
        Arc::make_mut(&mut self.0).push(observer);
    }

    fn each(&self, f: impl Fn(&dyn SessionObserver)) {
        for observer in self.0.iter() {
            f(observer.as_ref());
        }
    }
}

/// One unit of work on one pooled connection
pub struct Session {
    tx: Option<Transaction<'static, Any>>,
    pool: PoolKind,
    observers: Observers,
}

impl Session {
    pub(crate) fn open(tx: Transaction<'static, Any>, pool: PoolKind, observers: Observers) -> Self {
        observers.each(|o| o.on_checkout(pool));
        Self {
            tx: Some(tx),
            pool,
            observers,
        }
    }

    /// Pool this session was drawn from
    pub fn pool(&self) -> PoolKind {
        self.pool
    }

    /// Connection for running sqlx queries inside the transaction
    pub fn conn(&mut self) -> Result<&mut AnyConnection, DbError> {
        match self.tx.as_mut() {
            Some(tx) => Ok(&mut **tx),
            None => Err(DbError::SessionClosed),
        }
    }

    /// Execute a statement, returning the number of affected rows
    pub async fn execute(&mut self, sql: &str) -> Result<u64, DbError> {
        let conn = self.conn()?;
        let result = sqlx::query(sql).execute(conn).await?;
        Ok(result.rows_affected())
    }

    /// Round-trip a trivial query
    pub async fn ping(&mut self) -> Result<(), DbError> {
        self.execute("SELECT 1").await.map(|_| ())
    }

    pub async fn commit(mut self) -> Result<(), DbError> {
        if let Some(tx) = self.tx.take() {
            tx.commit().await?;
            self.observers.each(|o| o.on_commit(self.pool));
        }
        Ok(())
    }

    pub async fn rollback(mut self) -> Result<(), DbError> {
        if let Some(tx) = self.tx.take() {
            // Observers hear about the rollback even if the driver call fails;
            // the connection is discarded or reset by the pool either way.
            self.observers.each(|o| o.on_rollback(self.pool));
            tx.rollback().await?;
        }
        Ok(())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        // sqlx queues a ROLLBACK for an unfinished transaction when it is dropped
        if self.tx.take().is_some() {
            self.observers.each(|o| o.on_rollback(self.pool));
        }
        self.observers.each(|o| o.on_checkin(self.pool));
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("pool", &self.pool)
            .field("open", &self.tx.is_some())
            .finish()
    }
}
