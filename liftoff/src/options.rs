use liftoff_core::MongoUrl;
use std::path::PathBuf;

/// Construction options for a [`Harness`](crate::Harness).
///
/// A bare path converts into options for a local app at that path:
///
/// ```
/// use liftoff::HarnessOptions;
///
/// let options = HarnessOptions::from("/srv/app").with_skip_build(true);
/// assert_eq!(options.path_to_app.as_deref(), Some(std::path::Path::new("/srv/app")));
/// ```
#[non_exhaustive]
#[derive(Debug, Default)]
pub struct HarnessOptions {
    /// App root. Defaults to the current directory.
    pub path_to_app: Option<PathBuf>,
    /// Reuse the previous build output.
    pub skip_build: bool,
    /// Let the build report progress.
    pub verbose: bool,
    /// Drive an already running server at this URL instead of spawning one.
    pub remote_server: Option<String>,
    /// Use this database instead of starting one.
    pub mongo_url: Option<MongoUrl>,
    /// Version manifest, relative to the app root unless absolute.
    pub manifest: Option<PathBuf>,
    /// Package name whose `<name>@<version>` marker the manifest must carry.
    pub marker_namespace: Option<String>,
}

impl HarnessOptions {
    /// Options for the app in the current directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the app root.
    pub fn with_path_to_app(mut self, path: impl Into<PathBuf>) -> Self {
        self.path_to_app = Some(path.into());
        self
    }

    /// Skip the build and reuse its previous output.
    pub fn with_skip_build(mut self, skip_build: bool) -> Self {
        self.skip_build = skip_build;
        self
    }

    /// Make the build verbose.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Target a remote server.
    pub fn with_remote_server(mut self, url: impl Into<String>) -> Self {
        self.remote_server = Some(url.into());
        self
    }

    /// Use an existing database, given now or resolved later.
    pub fn with_mongo_url(mut self, url: impl Into<MongoUrl>) -> Self {
        self.mongo_url = Some(url.into());
        self
    }

    /// Read the version marker from another manifest.
    pub fn with_manifest(mut self, path: impl Into<PathBuf>) -> Self {
        self.manifest = Some(path.into());
        self
    }

    /// Look for a different package marker in the manifest.
    pub fn with_marker_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.marker_namespace = Some(namespace.into());
        self
    }
}

impl From<&str> for HarnessOptions {
    fn from(path: &str) -> Self {
        Self::new().with_path_to_app(path)
    }
}

impl From<PathBuf> for HarnessOptions {
    fn from(path: PathBuf) -> Self {
        Self::new().with_path_to_app(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_local_and_unset() {
        let options = HarnessOptions::default();
        assert!(options.path_to_app.is_none());
        assert!(!options.skip_build);
        assert!(!options.verbose);
        assert!(options.remote_server.is_none());
        assert!(options.mongo_url.is_none());
    }

    #[test]
    fn bare_path_becomes_app_root() {
        let options = HarnessOptions::from(PathBuf::from("/app"));
        assert_eq!(options.path_to_app, Some(PathBuf::from("/app")));
    }

    #[test]
    fn builders_chain() {
        let options = HarnessOptions::new()
            .with_remote_server("https://example.com")
            .with_verbose(true)
            .with_manifest("custom/versions")
            .with_marker_namespace("acme:harness");
        assert_eq!(options.remote_server.as_deref(), Some("https://example.com"));
        assert!(options.verbose);
        assert_eq!(options.manifest, Some(PathBuf::from("custom/versions")));
        assert_eq!(options.marker_namespace.as_deref(), Some("acme:harness"));
    }
}
