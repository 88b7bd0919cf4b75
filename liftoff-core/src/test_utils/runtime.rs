//! FakeRuntime: a fixed runtime path.

use super::CallLog;
use crate::error::RuntimeError;
use crate::runtime::RuntimeLocator;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Barrier;

/// Records `runtime.path` and answers with a canned result.
pub struct FakeRuntime {
    log: CallLog,
    result: Result<PathBuf, RuntimeError>,
    delay: Option<Duration>,
    barrier: Option<Arc<Barrier>>,
}

impl FakeRuntime {
    /// A lookup that finds `/usr/bin/node`.
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            result: Ok(PathBuf::from("/usr/bin/node")),
            delay: None,
            barrier: None,
        }
    }

    /// Fail every lookup with `message`.
    pub fn failing(mut self, message: &str) -> Self {
        self.result = Err(RuntimeError::NotFound(message.to_string()));
        self
    }

    /// Sleep before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Wait on `barrier` before answering, so a test can require another
    /// collaborator to be in flight at the same time.
    pub fn with_barrier(mut self, barrier: Arc<Barrier>) -> Self {
        self.barrier = Some(barrier);
        self
    }
}

#[async_trait]
impl RuntimeLocator for FakeRuntime {
    async fn runtime_path(&self, _app_root: &Path) -> Result<PathBuf, RuntimeError> {
        self.log.record("runtime.path");
        if let Some(barrier) = &self.barrier {
            barrier.wait().await;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.result.clone()
    }
}
