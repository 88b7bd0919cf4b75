//! Error types for each collaborator and for the harness as a whole.
//!
//! All payloads are strings so the enums stay `Clone`: a memoized failure is
//! handed out to every requester, now and later.

use thiserror::Error;

/// Build toolchain errors.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// The build ran and failed.
    #[error("build failed: {0}")]
    Failed(String),

    /// The build finished but produced no runnable entry point.
    #[error("entry point not found: {0}")]
    EntryNotFound(String),
}

/// Runtime lookup errors.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// No runtime could be located for the app.
    #[error("runtime not found: {0}")]
    NotFound(String),

    /// The lookup itself failed.
    #[error("runtime lookup failed: {0}")]
    Lookup(String),
}

/// Document database errors.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DatabaseError {
    /// The database could not be started or reached.
    #[error("database failed to start: {0}")]
    Start(String),

    /// Tearing the database down failed.
    #[error("database cleanup failed: {0}")]
    CleanUp(String),

    /// Catch-all.
    #[error("{0}")]
    Other(String),
}

/// Managed process errors.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProcessError {
    /// The process could not be spawned or never became reachable.
    #[error("spawn failed: {0}")]
    Spawn(String),

    /// The process could not be killed.
    #[error("kill failed: {0}")]
    Kill(String),

    /// The process could not be restarted.
    #[error("restart failed: {0}")]
    Restart(String),
}

/// Remote-procedure protocol errors.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Opening the connection failed.
    #[error("connection failed: {0}")]
    Connect(String),

    /// A remote call failed.
    #[error("call to {method} failed: {message}")]
    Call {
        /// The remote method that was called.
        method: String,
        /// Error message.
        message: String,
    },

    /// Closing the connection failed.
    #[error("close failed: {0}")]
    Close(String),
}

/// Harness errors.
///
/// Construction errors come back from the builder. Initialization errors
/// (version, build, runtime, database) surface as the failed resolution of
/// whatever queued command needed them and stay cached for the life of the
/// harness. Operational errors belong to the one command that triggered them.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HarnessError {
    /// The harness options are invalid.
    #[error("invalid harness options: {0}")]
    Construction(String),

    /// A resource was requested before `init` supplied a config.
    #[error("harness must be initialized before use")]
    NotInitialized,

    /// The target app does not declare the harness marker at all.
    #[error("{marker} is not installed in the target app; add it before running tests")]
    NotInstalled {
        /// The marker namespace that was looked for.
        marker: String,
    },

    /// The target app declares a different harness version.
    #[error(
        "versions of the harness ({harness}) and the target app package ({target}) are not compatible; please update"
    )]
    VersionMismatch {
        /// Version of the running harness.
        harness: String,
        /// Version declared by the target app.
        target: String,
    },

    /// The version manifest exists but could not be read.
    #[error("cannot read version manifest {path}: {message}")]
    Manifest {
        /// Path of the manifest.
        path: String,
        /// Error message.
        message: String,
    },

    /// A build error.
    #[error("build error: {0}")]
    Build(#[from] BuildError),

    /// A runtime lookup error.
    #[error("runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    /// A database error.
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// A managed process error.
    #[error("process error: {0}")]
    Process(#[from] ProcessError),

    /// A protocol error.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// A process operation was issued against an operand without a process.
    #[error("operand has no process")]
    NoProcess,

    /// A database URL was requested while running against a remote server.
    #[error("database url is not available when running against a remote server")]
    RemoteDatabase,

    /// The harness was stopped; no further commands run.
    #[error("harness has been stopped")]
    Stopped,

    /// The command queue went away before the command completed.
    #[error("command queue closed: {0}")]
    QueueClosed(String),

    /// Catch-all. Include context.
    #[error("{0}")]
    Other(String),
}
