//! The Process protocol: the spawned app under test.

use crate::error::ProcessError;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Everything needed to spawn the app.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnRequest {
    /// Entry point produced by the build.
    pub path_to_entry: PathBuf,
    /// Runtime that executes the entry point.
    pub runtime_path: PathBuf,
    /// Connection string of the database the app should use.
    pub database_url: String,
}

impl SpawnRequest {
    /// Create a spawn request.
    pub fn new(
        path_to_entry: impl Into<PathBuf>,
        runtime_path: impl Into<PathBuf>,
        database_url: impl Into<String>,
    ) -> Self {
        Self {
            path_to_entry: path_to_entry.into(),
            runtime_path: runtime_path.into(),
            database_url: database_url.into(),
        }
    }
}

/// Spawns managed processes.
#[async_trait]
pub trait ProcessManager: Send + Sync {
    /// Spawn the app and resolve once it is listening.
    async fn spawn(&self, request: &SpawnRequest) -> Result<Arc<dyn ManagedProcess>, ProcessError>;
}

/// A running app under test.
///
/// The handle outlives restarts: [`ManagedProcess::restart`] recycles the
/// underlying process but keeps the same handle, port and protocol endpoint.
#[async_trait]
pub trait ManagedProcess: Send + Sync {
    /// Port the app listens on.
    fn port(&self) -> u16;

    /// Operating system process id.
    fn pid(&self) -> u32;

    /// Terminate the process. Resolves once it is confirmed dead.
    async fn kill(&self) -> Result<(), ProcessError>;

    /// Stop and respawn the process, optionally waiting `delay` in between.
    async fn restart(&self, delay: Option<Duration>) -> Result<(), ProcessError>;
}

impl std::fmt::Debug for dyn ManagedProcess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagedProcess")
            .field("port", &self.port())
            .field("pid", &self.pid())
            .finish()
    }
}
