//! # liftoff-core: protocol traits for the liftoff test harness
//!
//! A harness drives one application under test through build, spawn and
//! connect, then serializes every caller operation against a single resolved
//! [`Operand`]. This crate defines the seams between that core and the
//! collaborators it orchestrates, plus the shared vocabulary both sides use.
//!
//! ## The Collaborators
//!
//! | Collaborator | Trait | What it does |
//! |--------------|-------|-------------|
//! | Build | [`Build`] | Compiles the app into a runnable entry point |
//! | Runtime | [`RuntimeLocator`] | Finds the runtime that executes the entry point |
//! | Database | [`DatabaseManager`], [`Database`] | Provides and tears down a document database |
//! | Process | [`ProcessManager`], [`ManagedProcess`] | Spawns and controls the app process |
//! | Protocol | [`ProtocolClientManager`], [`ProtocolClient`] | Remote-procedure connection into the app |
//!
//! Every trait is operation-defined. [`ProcessManager::spawn`] means "give me
//! a running app", not "fork this binary", so a container runtime and a plain
//! child process implement the same contract.
//!
//! ## Errors
//!
//! Each collaborator has its own error enum; [`HarnessError`] wraps them all.
//! Every error type is `Clone` because resolutions are memoized and a failed
//! resolution hands the same error to every requester.

#![deny(missing_docs)]

pub mod build;
pub mod closure;
pub mod database;
pub mod endpoint;
pub mod error;
pub mod operand;
pub mod process;
pub mod protocol;
pub mod runtime;

#[cfg(feature = "test-utils")]
pub mod test_utils;

pub use build::{Build, BuildArtifact, BuildRequest};
pub use closure::{Closure, ClosureScope, EXECUTE_METHOD};
pub use database::{Database, DatabaseManager, DatabaseRequest, DeferredUrl, MongoUrl};
pub use endpoint::RemoteEndpoint;
pub use error::{
    BuildError, DatabaseError, HarnessError, ProcessError, ProtocolError, RuntimeError,
};
pub use operand::{Operand, OperandSource};
pub use process::{ManagedProcess, ProcessManager, SpawnRequest};
pub use protocol::{ProtocolClient, ProtocolClientManager, ProtocolSetup};
pub use runtime::RuntimeLocator;
