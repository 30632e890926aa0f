use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::Config;
use crate::domain::TaskdeckError;

#[derive(Clone, Debug)]
pub struct AppState {
    pub db: Option<SqlitePool>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: Option<SqlitePool>, config: Arc<Config>) -> Self {
        Self { db, config }
    }

    pub fn require_db(&self) -> Result<&SqlitePool, TaskdeckError> {
        self.db
            .as_ref()
            .ok_or_else(|| TaskdeckError::Internal("Database not available".into()))
    }
}
