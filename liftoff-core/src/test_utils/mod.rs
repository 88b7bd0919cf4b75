//! Recording fakes for every collaborator.
//!
//! Available behind the `test-utils` feature flag. Each fake appends to a
//! shared [`CallLog`] so tests can assert which collaborators ran and in
//! what order.

mod build;
mod call_log;
mod database;
mod process;
mod protocol;
mod runtime;

pub use build::FakeBuild;
pub use call_log::CallLog;
pub use database::{FakeDatabase, FakeDatabaseManager};
pub use process::{FakeProcess, FakeProcessManager};
pub use protocol::{FakeClient, FakeClientManager};
pub use runtime::FakeRuntime;

/// Collaborators wired to one log, all succeeding by default.
pub struct FakeStack {
    /// Shared call log.
    pub log: CallLog,
    /// Build fake.
    pub build: std::sync::Arc<FakeBuild>,
    /// Runtime fake.
    pub runtime: std::sync::Arc<FakeRuntime>,
    /// Database fake.
    pub database: std::sync::Arc<FakeDatabaseManager>,
    /// Process fake.
    pub processes: std::sync::Arc<FakeProcessManager>,
    /// Protocol fake.
    pub clients: std::sync::Arc<FakeClientManager>,
}

impl FakeStack {
    /// Create a stack of succeeding fakes.
    pub fn new() -> Self {
        let log = CallLog::new();
        Self {
            build: std::sync::Arc::new(FakeBuild::new(log.clone())),
            runtime: std::sync::Arc::new(FakeRuntime::new(log.clone())),
            database: std::sync::Arc::new(FakeDatabaseManager::new(log.clone())),
            processes: std::sync::Arc::new(FakeProcessManager::new(log.clone())),
            clients: std::sync::Arc::new(FakeClientManager::new(log.clone())),
            log,
        }
    }
}

impl Default for FakeStack {
    fn default() -> Self {
        Self::new()
    }
}
