use std::sync::{Arc, Mutex, PoisonError};

/// Where a harness is in its life.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    /// Built, not yet started. Config may or may not be set.
    Uninitialized,
    /// Startup submitted, waiting for the app to report ready.
    Starting,
    /// Ready and any startup callback has completed.
    Running,
    /// Teardown is queued or running.
    Stopping,
    /// Teardown finished. Terminal.
    Stopped,
}

/// Shared, monotonic state tracker.
#[derive(Debug, Clone)]
pub(crate) struct Lifecycle {
    state: Arc<Mutex<LifecycleState>>,
}

impl Lifecycle {
    pub(crate) fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(LifecycleState::Uninitialized)),
        }
    }

    pub(crate) fn get(&self) -> LifecycleState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Move to `next` unless the harness is already stopping or stopped.
    pub(crate) fn advance(&self, next: LifecycleState) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if matches!(*state, LifecycleState::Stopping | LifecycleState::Stopped)
            && next != LifecycleState::Stopped
        {
            return;
        }
        tracing::debug!(from = ?*state, to = ?next, "liftoff.lifecycle.transition");
        *state = next;
    }
}
