//! FakeProcessManager: spawns recording process handles.

use super::CallLog;
use crate::error::ProcessError;
use crate::process::{ManagedProcess, ProcessManager, SpawnRequest};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Records `process.spawn` and creates a [`FakeProcess`].
pub struct FakeProcessManager {
    log: CallLog,
    spawn: Result<(), ProcessError>,
    kill: Result<(), ProcessError>,
    port: u16,
    pid: u32,
    requests: Mutex<Vec<SpawnRequest>>,
}

impl FakeProcessManager {
    /// Processes on port 3000 with pid 4242.
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            spawn: Ok(()),
            kill: Ok(()),
            port: 3000,
            pid: 4242,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Fail every spawn.
    pub fn failing(mut self, message: &str) -> Self {
        self.spawn = Err(ProcessError::Spawn(message.to_string()));
        self
    }

    /// Spawned processes refuse to die.
    pub fn failing_kill(mut self, message: &str) -> Self {
        self.kill = Err(ProcessError::Kill(message.to_string()));
        self
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<SpawnRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProcessManager for FakeProcessManager {
    async fn spawn(&self, request: &SpawnRequest) -> Result<Arc<dyn ManagedProcess>, ProcessError> {
        self.log.record("process.spawn");
        self.requests.lock().unwrap().push(request.clone());
        self.spawn.clone()?;
        Ok(Arc::new(FakeProcess {
            log: self.log.clone(),
            kill: self.kill.clone(),
            port: self.port,
            pid: self.pid,
            restarts: AtomicUsize::new(0),
        }))
    }
}

/// Records `process.kill` and `process.restart`.
pub struct FakeProcess {
    log: CallLog,
    kill: Result<(), ProcessError>,
    port: u16,
    pid: u32,
    restarts: AtomicUsize,
}

impl FakeProcess {
    /// How many times the process was restarted.
    pub fn restarts(&self) -> usize {
        self.restarts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ManagedProcess for FakeProcess {
    fn port(&self) -> u16 {
        self.port
    }

    fn pid(&self) -> u32 {
        self.pid
    }

    async fn kill(&self) -> Result<(), ProcessError> {
        self.log.record("process.kill");
        self.kill.clone()
    }

    async fn restart(&self, delay: Option<Duration>) -> Result<(), ProcessError> {
        self.log.record("process.restart");
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.restarts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
