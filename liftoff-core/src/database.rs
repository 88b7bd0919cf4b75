//! The Database protocol: a document database owned by the harness.

use crate::error::{DatabaseError, HarnessError};
use async_trait::async_trait;
use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;

/// A connection string that becomes available later.
pub type DeferredUrl = Pin<Box<dyn Future<Output = Result<String, DatabaseError>> + Send>>;

/// An externally supplied database connection string.
///
/// When present the harness never starts a database of its own, and so
/// never cleans one up either.
pub enum MongoUrl {
    /// A connection string known up front.
    Fixed(String),
    /// A connection string produced by a future, awaited at most once.
    Deferred(DeferredUrl),
}

impl MongoUrl {
    /// Wrap a future that yields the connection string.
    pub fn deferred<F>(future: F) -> Self
    where
        F: Future<Output = Result<String, DatabaseError>> + Send + 'static,
    {
        Self::Deferred(Box::pin(future))
    }

    /// Check a fixed connection string. Deferred values are checked when
    /// they resolve.
    pub fn validate(&self) -> Result<(), HarnessError> {
        match self {
            Self::Fixed(url) => check_mongo_url(url),
            Self::Deferred(_) => Ok(()),
        }
    }

    /// Await the connection string.
    pub async fn resolve(self) -> Result<String, HarnessError> {
        match self {
            Self::Fixed(url) => Ok(url),
            Self::Deferred(future) => {
                let url = future.await?;
                check_mongo_url(&url)?;
                Ok(url)
            }
        }
    }
}

impl From<String> for MongoUrl {
    fn from(url: String) -> Self {
        Self::Fixed(url)
    }
}

impl From<&str> for MongoUrl {
    fn from(url: &str) -> Self {
        Self::Fixed(url.to_string())
    }
}

impl fmt::Debug for MongoUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(url) => f.debug_tuple("Fixed").field(url).finish(),
            Self::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

fn check_mongo_url(url: &str) -> Result<(), HarnessError> {
    if url.starts_with("mongodb://") || url.starts_with("mongodb+srv://") {
        Ok(())
    } else {
        Err(HarnessError::Construction(format!(
            "mongo_url must be a mongodb:// connection string, got {url:?}"
        )))
    }
}

/// Arguments for opening a harness-owned database.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseRequest {
    /// Root directory of the app under test.
    pub app_root: PathBuf,
    /// Connection string to reuse instead of starting a server, if any.
    pub mongo_url: Option<String>,
}

impl DatabaseRequest {
    /// Create a request for the app at `app_root`.
    pub fn new(app_root: impl Into<PathBuf>) -> Self {
        Self {
            app_root: app_root.into(),
            mongo_url: None,
        }
    }
}

/// Creates database handles.
///
/// Opening is synchronous; the handle exists (and owns cleanup) before its
/// server is reachable.
pub trait DatabaseManager: Send + Sync {
    /// Create a handle for the requested database.
    fn open(&self, request: &DatabaseRequest) -> Arc<dyn Database>;
}

/// A database started for one harness instance.
#[async_trait]
pub trait Database: Send + Sync {
    /// Resolve once the database accepts connections.
    async fn connection_url(&self) -> Result<String, DatabaseError>;

    /// Stop the database and remove its data.
    async fn clean_up(&self) -> Result<(), DatabaseError>;
}
