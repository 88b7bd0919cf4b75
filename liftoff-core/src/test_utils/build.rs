//! FakeBuild: returns a fixed entry point or a fixed failure.

use super::CallLog;
use crate::build::{Build, BuildRequest};
use crate::error::BuildError;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

/// Records `build.start` and answers with a canned result.
pub struct FakeBuild {
    log: CallLog,
    result: Result<PathBuf, BuildError>,
    delay: Option<Duration>,
    requests: Mutex<Vec<BuildRequest>>,
}

impl FakeBuild {
    /// A build that succeeds with `/app/.build/main.js`.
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            result: Ok(PathBuf::from("/app/.build/main.js")),
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Fail every build with `message`.
    pub fn failing(mut self, message: &str) -> Self {
        self.result = Err(BuildError::Failed(message.to_string()));
        self
    }

    /// Sleep before answering, so concurrent requesters overlap.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<BuildRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Build for FakeBuild {
    async fn start(&self, request: &BuildRequest) -> Result<PathBuf, BuildError> {
        self.log.record("build.start");
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.result.clone()
    }
}
