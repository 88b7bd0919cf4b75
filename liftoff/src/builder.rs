use crate::harness::Harness;
use crate::options::HarnessOptions;
use liftoff_core::{
    Build, DatabaseManager, HarnessError, ProcessManager, ProtocolClientManager, RemoteEndpoint,
    RuntimeLocator,
};
use liftoff_graph::{HarnessMode, LocalStack, ResourceGraph};
use liftoff_memo::ConfigCell;
use liftoff_version::VersionGuard;
use std::fmt;
use std::sync::Arc;

/// Assembles a [`Harness`] from options and collaborators.
///
/// A protocol client manager is always required. The build, runtime,
/// database and process collaborators are required unless the options name a
/// remote server, in which case they are ignored.
pub struct HarnessBuilder<H = ()> {
    options: HarnessOptions,
    build: Option<Arc<dyn Build>>,
    runtime: Option<Arc<dyn RuntimeLocator>>,
    database: Option<Arc<dyn DatabaseManager>>,
    processes: Option<Arc<dyn ProcessManager>>,
    clients: Option<Arc<dyn ProtocolClientManager>>,
    helpers: H,
}

impl HarnessBuilder {
    /// Start from `options`, with no collaborators and no helpers.
    pub fn new(options: impl Into<HarnessOptions>) -> Self {
        Self {
            options: options.into(),
            build: None,
            runtime: None,
            database: None,
            processes: None,
            clients: None,
            helpers: (),
        }
    }
}

impl<H> HarnessBuilder<H> {
    /// Set the build collaborator.
    pub fn with_build(mut self, build: Arc<dyn Build>) -> Self {
        self.build = Some(build);
        self
    }

    /// Set the runtime locator.
    pub fn with_runtime(mut self, runtime: Arc<dyn RuntimeLocator>) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Set the database manager.
    pub fn with_database(mut self, database: Arc<dyn DatabaseManager>) -> Self {
        self.database = Some(database);
        self
    }

    /// Set the process manager.
    pub fn with_processes(mut self, processes: Arc<dyn ProcessManager>) -> Self {
        self.processes = Some(processes);
        self
    }

    /// Set the protocol client manager.
    pub fn with_clients(mut self, clients: Arc<dyn ProtocolClientManager>) -> Self {
        self.clients = Some(clients);
        self
    }

    /// Attach caller-defined helpers, reachable through
    /// [`Harness::helpers`].
    pub fn with_helpers<T>(self, helpers: T) -> HarnessBuilder<T> {
        HarnessBuilder {
            options: self.options,
            build: self.build,
            runtime: self.runtime,
            database: self.database,
            processes: self.processes,
            clients: self.clients,
            helpers,
        }
    }

    /// Validate the options and wire the harness.
    ///
    /// Fails with [`HarnessError::Construction`] when the remote server URL
    /// does not parse or has no host, when the database URL is not a mongodb
    /// URL, or when a required collaborator is missing.
    pub fn build(self) -> Result<Harness<H>, HarnessError> {
        let clients = self
            .clients
            .ok_or_else(|| missing("protocol client manager"))?;
        let options = self.options;

        let mode = match options.remote_server.as_deref() {
            Some(server) => {
                let endpoint = RemoteEndpoint::parse(server)?;
                if options.mongo_url.is_some() {
                    tracing::warn!(server, "liftoff.harness.mongo_url_ignored");
                }
                HarnessMode::Remote(endpoint)
            }
            None => {
                let app_root = match options.path_to_app {
                    Some(path) => path,
                    None => std::env::current_dir().map_err(|e| {
                        HarnessError::Construction(format!("cannot read current directory: {e}"))
                    })?,
                };
                let mut guard = VersionGuard::new(&app_root);
                if let Some(manifest) = options.manifest {
                    guard = guard.with_manifest(app_root.join(manifest));
                }
                if let Some(namespace) = options.marker_namespace {
                    guard = guard.with_namespace(namespace);
                }
                let mut stack = LocalStack::new(
                    app_root,
                    self.build.ok_or_else(|| missing("build"))?,
                    self.runtime.ok_or_else(|| missing("runtime locator"))?,
                    self.database.ok_or_else(|| missing("database manager"))?,
                    self.processes.ok_or_else(|| missing("process manager"))?,
                )
                .with_build_flags(options.skip_build, options.verbose)
                .with_version_guard(guard);
                if let Some(url) = options.mongo_url {
                    url.validate()?;
                    stack = stack.with_mongo_url(url);
                }
                HarnessMode::Local(stack)
            }
        };

        tracing::info!(
            remote = matches!(mode, HarnessMode::Remote(_)),
            "liftoff.harness.built"
        );
        let config = Arc::new(ConfigCell::new());
        let graph = ResourceGraph::new(mode, clients, Arc::clone(&config));
        Ok(Harness::assemble(graph, config, self.helpers))
    }
}

fn missing(collaborator: &str) -> HarnessError {
    HarnessError::Construction(format!("a {collaborator} is required"))
}

impl<H> fmt::Debug for HarnessBuilder<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HarnessBuilder")
            .field("options", &self.options)
            .field("build", &self.build.is_some())
            .field("runtime", &self.runtime.is_some())
            .field("database", &self.database.is_some())
            .field("processes", &self.processes.is_some())
            .field("clients", &self.clients.is_some())
            .finish_non_exhaustive()
    }
}
