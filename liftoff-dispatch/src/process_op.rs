use crate::dispatcher::{CommandDispatcher, Pending};
use liftoff_core::HarnessError;
use std::time::Duration;

/// Operations that act on the managed process itself.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOp {
    /// Recycle the process, keeping the same protocol client.
    Restart {
        /// Pause between stopping and respawning.
        delay: Option<Duration>,
    },
}

impl CommandDispatcher {
    /// Queue a process operation.
    ///
    /// Fails with [`HarnessError::NoProcess`] when the operand has no
    /// process, which is always the case against a remote server.
    pub fn process_op(&self, op: ProcessOp) -> Pending<()> {
        self.queue(move |operand| async move {
            let process = operand.process()?;
            match op {
                ProcessOp::Restart { delay } => {
                    tracing::info!(pid = process.pid(), ?delay, "liftoff.process.restarting");
                    process.restart(delay).await.map_err(HarnessError::from)
                }
            }
        })
    }
}
