use liftoff_core::{
    Build, BuildRequest, Database, DatabaseManager, MongoUrl, ProcessManager, RuntimeLocator,
};
use liftoff_version::VersionGuard;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

/// Collaborators and settings used only when the harness spawns the app.
///
/// Held inside [`HarnessMode::Local`](crate::HarnessMode::Local), so remote
/// harnesses cannot reach them at all.
pub struct LocalStack {
    pub(crate) build: Arc<dyn Build>,
    pub(crate) runtime: Arc<dyn RuntimeLocator>,
    pub(crate) database: Arc<dyn DatabaseManager>,
    pub(crate) processes: Arc<dyn ProcessManager>,
    pub(crate) request: BuildRequest,
    pub(crate) guard: VersionGuard,
    mongo_url: Mutex<Option<MongoUrl>>,
    owned_database: OnceLock<Arc<dyn Database>>,
}

impl LocalStack {
    /// Wire the local collaborators for the app at `app_root`.
    pub fn new(
        app_root: impl Into<PathBuf>,
        build: Arc<dyn Build>,
        runtime: Arc<dyn RuntimeLocator>,
        database: Arc<dyn DatabaseManager>,
        processes: Arc<dyn ProcessManager>,
    ) -> Self {
        let app_root = app_root.into();
        Self {
            build,
            runtime,
            database,
            processes,
            guard: VersionGuard::new(&app_root),
            request: BuildRequest::new(app_root),
            mongo_url: Mutex::new(None),
            owned_database: OnceLock::new(),
        }
    }

    /// Forward `skip_build` and `verbose` to the build.
    pub fn with_build_flags(mut self, skip_build: bool, verbose: bool) -> Self {
        self.request = self
            .request
            .with_skip_build(skip_build)
            .with_verbose(verbose);
        self
    }

    /// Use an existing database instead of starting one.
    pub fn with_mongo_url(self, url: MongoUrl) -> Self {
        *self.mongo_url.lock().unwrap_or_else(PoisonError::into_inner) = Some(url);
        self
    }

    /// Replace the default version guard.
    pub fn with_version_guard(mut self, guard: VersionGuard) -> Self {
        self.guard = guard;
        self
    }

    /// Root directory of the app under test.
    pub fn app_root(&self) -> &Path {
        &self.request.app_root
    }

    /// Take the external database URL, if one was supplied and not yet taken.
    pub(crate) fn take_mongo_url(&self) -> Option<MongoUrl> {
        self.mongo_url
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Remember the database this harness started, for cleanup on stop.
    pub(crate) fn adopt_database(&self, database: Arc<dyn Database>) {
        let _ = self.owned_database.set(database);
    }

    /// The database this harness started, if it started one.
    pub fn owned_database(&self) -> Option<Arc<dyn Database>> {
        self.owned_database.get().cloned()
    }
}

impl fmt::Debug for LocalStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalStack")
            .field("request", &self.request)
            .field("guard", &self.guard)
            .field("owns_database", &self.owned_database.get().is_some())
            .finish_non_exhaustive()
    }
}
