//! The Build protocol: turning an app into a runnable entry point.

use crate::error::BuildError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// What to build and how.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    /// Root directory of the app under test.
    pub app_root: PathBuf,
    /// Reuse a previous build output instead of compiling again.
    pub skip_build: bool,
    /// Forward build output to the console.
    pub verbose: bool,
}

impl BuildRequest {
    /// Create a build request for the app at `app_root`.
    pub fn new(app_root: impl Into<PathBuf>) -> Self {
        Self {
            app_root: app_root.into(),
            skip_build: false,
            verbose: false,
        }
    }

    /// Set whether a previous build output may be reused.
    pub fn with_skip_build(mut self, skip_build: bool) -> Self {
        self.skip_build = skip_build;
        self
    }

    /// Set whether build output is forwarded.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

/// The output of a successful build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildArtifact {
    /// Path to the runnable entry point.
    pub path_to_entry: PathBuf,
}

impl BuildArtifact {
    /// Wrap an entry point path.
    pub fn new(path_to_entry: impl Into<PathBuf>) -> Self {
        Self {
            path_to_entry: path_to_entry.into(),
        }
    }

    /// Path to the runnable entry point.
    pub fn path(&self) -> &Path {
        &self.path_to_entry
    }
}

/// Build toolchain.
///
/// The harness calls [`Build::start`] at most once per harness instance and
/// caches the outcome, so implementations do not need their own memoization.
#[async_trait]
pub trait Build: Send + Sync {
    /// Build the app and return the path to its entry point.
    async fn start(&self, request: &BuildRequest) -> Result<PathBuf, BuildError>;
}
