//! Shared application state

use std::sync::Arc;
use std::time::{Duration, Instant};

use commute_core::Settings;

use crate::db::Database;

/// State handed to every handler. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    settings: Arc<Settings>,
    db: Database,
    started_at: Instant,
}

impl AppState {
    pub fn new(settings: Arc<Settings>, db: Database) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                settings,
                db,
                started_at: Instant::now(),
            }),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub fn settings_arc(&self) -> Arc<Settings> {
        Arc::clone(&self.inner.settings)
    }

    pub fn db(&self) -> &Database {
        &self.inner.db
    }

    /// Time since the state was built
    pub fn uptime(&self) -> Duration {
        self.inner.started_at.elapsed()
    }
}
