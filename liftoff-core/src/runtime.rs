//! The Runtime protocol: locating the interpreter for a built app.

use crate::error::RuntimeError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Finds the runtime executable the app's entry point runs under.
#[async_trait]
pub trait RuntimeLocator: Send + Sync {
    /// Return the runtime path for the app rooted at `app_root`.
    async fn runtime_path(&self, app_root: &Path) -> Result<PathBuf, RuntimeError>;
}
