#![deny(missing_docs)]
//! Checks that the app under test declares a matching harness version.
//!
//! The target app lists its installed packages in a plain-text manifest, one
//! `<namespace>@<version>` per line. The harness refuses to run against an
//! app that pins a different version of its companion package.
//!
//! | Manifest | Outcome |
//! |----------|---------|
//! | absent | compatible (older targets predate the manifest) |
//! | no `<namespace>@` line | [`HarnessError::NotInstalled`] |
//! | `<namespace>@<other>` | [`HarnessError::VersionMismatch`] |
//! | `<namespace>@<ours>` | compatible |

use liftoff_core::HarnessError;
use liftoff_memo::Memo;
use std::path::{Path, PathBuf};

/// Manifest location relative to the app root.
pub const DEFAULT_MANIFEST: &str = ".meteor/versions";

/// Package namespace the target app installs to talk to the harness.
pub const DEFAULT_NAMESPACE: &str = "liftoff:harness";

/// Version of the running harness.
pub const HARNESS_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Memoized manifest check for one app.
#[derive(Debug)]
pub struct VersionGuard {
    manifest: PathBuf,
    namespace: String,
    version: String,
    checked: Memo<()>,
}

impl VersionGuard {
    /// Guard the app at `app_root` with the default manifest, namespace and
    /// the running harness version.
    pub fn new(app_root: &Path) -> Self {
        Self {
            manifest: app_root.join(DEFAULT_MANIFEST),
            namespace: DEFAULT_NAMESPACE.to_string(),
            version: HARNESS_VERSION.to_string(),
            checked: Memo::new(),
        }
    }

    /// Read the manifest from `path` instead.
    pub fn with_manifest(mut self, path: impl Into<PathBuf>) -> Self {
        self.manifest = path.into();
        self
    }

    /// Look for `namespace@` instead.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Require `version` instead of the running harness version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Path of the manifest being checked.
    pub fn manifest(&self) -> &Path {
        &self.manifest
    }

    /// Run the check once; later calls return the first outcome.
    pub async fn ensure(&self) -> Result<(), HarnessError> {
        self.checked.get_or_resolve(|| self.check()).await
    }

    /// Run the check without memoization.
    pub async fn check(&self) -> Result<(), HarnessError> {
        let content = match tokio::fs::read_to_string(&self.manifest).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(
                    manifest = %self.manifest.display(),
                    "liftoff.version.manifest_absent"
                );
                return Ok(());
            }
            Err(e) => {
                return Err(HarnessError::Manifest {
                    path: self.manifest.display().to_string(),
                    message: e.to_string(),
                });
            }
        };
        let target = find_marker(&content, &self.namespace).ok_or_else(|| {
            HarnessError::NotInstalled {
                marker: self.namespace.clone(),
            }
        })?;
        if target != self.version {
            return Err(HarnessError::VersionMismatch {
                harness: self.version.clone(),
                target: target.to_string(),
            });
        }
        tracing::debug!(version = %self.version, "liftoff.version.compatible");
        Ok(())
    }
}

/// The version recorded for `namespace` in a manifest, if any.
///
/// The marker may appear anywhere on a line; the version runs to the end of
/// that line.
pub fn find_marker<'a>(content: &'a str, namespace: &str) -> Option<&'a str> {
    let needle = format!("{namespace}@");
    content.lines().find_map(|line| {
        let start = line.find(&needle)? + needle.len();
        Some(line[start..].trim())
    })
}
