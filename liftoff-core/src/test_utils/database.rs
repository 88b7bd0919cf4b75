//! FakeDatabaseManager: hands out recording database handles.

use super::CallLog;
use crate::database::{Database, DatabaseManager, DatabaseRequest};
use crate::error::DatabaseError;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Barrier;

/// Records `database.open` and creates a [`FakeDatabase`].
pub struct FakeDatabaseManager {
    log: CallLog,
    url: Result<String, DatabaseError>,
    clean_up: Result<(), DatabaseError>,
    barrier: Option<Arc<Barrier>>,
}

impl FakeDatabaseManager {
    /// Databases that start at `mongodb://localhost:27017/app` and clean up fine.
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            url: Ok("mongodb://localhost:27017/app".to_string()),
            clean_up: Ok(()),
            barrier: None,
        }
    }

    /// Databases that never start.
    pub fn failing(mut self, message: &str) -> Self {
        self.url = Err(DatabaseError::Start(message.to_string()));
        self
    }

    /// Databases whose cleanup fails.
    pub fn failing_clean_up(mut self, message: &str) -> Self {
        self.clean_up = Err(DatabaseError::CleanUp(message.to_string()));
        self
    }

    /// Databases that wait on `barrier` before reporting their URL.
    pub fn with_barrier(mut self, barrier: Arc<Barrier>) -> Self {
        self.barrier = Some(barrier);
        self
    }
}

impl DatabaseManager for FakeDatabaseManager {
    fn open(&self, _request: &DatabaseRequest) -> Arc<dyn Database> {
        self.log.record("database.open");
        Arc::new(FakeDatabase {
            log: self.log.clone(),
            url: self.url.clone(),
            clean_up: self.clean_up.clone(),
            barrier: self.barrier.clone(),
        })
    }
}

/// Records `database.url` and `database.clean_up`.
pub struct FakeDatabase {
    log: CallLog,
    url: Result<String, DatabaseError>,
    clean_up: Result<(), DatabaseError>,
    barrier: Option<Arc<Barrier>>,
}

#[async_trait]
impl Database for FakeDatabase {
    async fn connection_url(&self) -> Result<String, DatabaseError> {
        self.log.record("database.url");
        if let Some(barrier) = &self.barrier {
            barrier.wait().await;
        }
        self.url.clone()
    }

    async fn clean_up(&self) -> Result<(), DatabaseError> {
        self.log.record("database.clean_up");
        self.clean_up.clone()
    }
}
