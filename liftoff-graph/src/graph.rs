use crate::local::LocalStack;
use async_trait::async_trait;
use liftoff_core::{
    BuildArtifact, Closure, ClosureScope, Database, DatabaseRequest, HarnessError,
    ManagedProcess, Operand, OperandSource, ProtocolClientManager, ProtocolSetup, RemoteEndpoint,
    SpawnRequest,
};
use liftoff_memo::{ConfigCell, Memo};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Where the app under test comes from. Fixed for the life of a graph.
#[derive(Debug)]
pub enum HarnessMode {
    /// Build, spawn and own the app.
    Local(LocalStack),
    /// Connect to a server that is already running.
    Remote(RemoteEndpoint),
}

/// Memoized resolution of every resource a harness needs.
pub struct ResourceGraph {
    mode: HarnessMode,
    clients: Arc<dyn ProtocolClientManager>,
    config: Arc<ConfigCell>,
    scope: ClosureScope,
    artifact: Memo<BuildArtifact>,
    database_url: Memo<String>,
    process: Memo<Option<Arc<dyn ManagedProcess>>>,
    operand: Memo<Operand>,
}

impl ResourceGraph {
    /// Create a graph. Nothing resolves until something is requested.
    pub fn new(
        mode: HarnessMode,
        clients: Arc<dyn ProtocolClientManager>,
        config: Arc<ConfigCell>,
    ) -> Self {
        Self {
            mode,
            clients,
            config,
            scope: ClosureScope::new(),
            artifact: Memo::new(),
            database_url: Memo::new(),
            process: Memo::new(),
            operand: Memo::new(),
        }
    }

    /// Share `scope` with the closure channel of the operand.
    pub fn with_closure_scope(mut self, scope: ClosureScope) -> Self {
        self.scope = scope;
        self
    }

    /// The harness mode.
    pub fn mode(&self) -> &HarnessMode {
        &self.mode
    }

    /// Whether the graph targets a pre-existing remote server.
    pub fn is_remote(&self) -> bool {
        matches!(self.mode, HarnessMode::Remote(_))
    }

    /// The closure variables shared with the operand.
    pub fn closure_scope(&self) -> &ClosureScope {
        &self.scope
    }

    fn local(&self) -> Result<&LocalStack, HarnessError> {
        match &self.mode {
            HarnessMode::Local(stack) => Ok(stack),
            HarnessMode::Remote(_) => Err(HarnessError::Other(
                "local resources are not available against a remote server".into(),
            )),
        }
    }

    /// Build the app, once. Requires an initialized config.
    pub async fn artifact(&self) -> Result<BuildArtifact, HarnessError> {
        self.artifact
            .get_or_resolve(|| async {
                let stack = self.local()?;
                self.config.get()?;
                tracing::debug!(app_root = %stack.app_root().display(), "liftoff.build.start");
                let path = stack.build.start(&stack.request).await?;
                tracing::debug!(entry = %path.display(), "liftoff.build.done");
                Ok(BuildArtifact::new(path))
            })
            .await
    }

    /// Locate the runtime for the app.
    ///
    /// Only ever called from the process branch, which is itself memoized.
    async fn runtime_path(&self) -> Result<PathBuf, HarnessError> {
        let stack = self.local()?;
        Ok(stack.runtime.runtime_path(stack.app_root()).await?)
    }

    /// The database connection string, once.
    ///
    /// An externally supplied URL is used as is. Otherwise the graph starts a
    /// database of its own and keeps the handle for [`Self::owned_database`].
    pub async fn database_url(&self) -> Result<String, HarnessError> {
        self.database_url
            .get_or_resolve(|| async {
                let stack = match &self.mode {
                    HarnessMode::Local(stack) => stack,
                    HarnessMode::Remote(_) => return Err(HarnessError::RemoteDatabase),
                };
                if let Some(url) = stack.take_mongo_url() {
                    return url.resolve().await;
                }
                let database = stack
                    .database
                    .open(&DatabaseRequest::new(stack.app_root()));
                stack.adopt_database(Arc::clone(&database));
                let url = database.connection_url().await?;
                tracing::debug!("liftoff.database.ready");
                Ok(url)
            })
            .await
    }

    /// The database started by this graph, if any.
    pub fn owned_database(&self) -> Option<Arc<dyn Database>> {
        match &self.mode {
            HarnessMode::Local(stack) => stack.owned_database(),
            HarnessMode::Remote(_) => None,
        }
    }

    /// The process spawned so far, without triggering a spawn.
    pub fn spawned_process(&self) -> Option<Arc<dyn ManagedProcess>> {
        match self.process.peek() {
            Some(Ok(process)) => process.clone(),
            _ => None,
        }
    }

    /// Spawn the app, once. `None` in remote mode.
    ///
    /// The build must succeed before the runtime lookup and database start,
    /// which run concurrently. The version check runs only after all three
    /// succeeded, and the spawn only after the version check.
    pub async fn process(&self) -> Result<Option<Arc<dyn ManagedProcess>>, HarnessError> {
        let stack = match &self.mode {
            HarnessMode::Local(stack) => stack,
            HarnessMode::Remote(_) => return Ok(None),
        };
        self.process
            .get_or_resolve(|| async {
                let artifact = self.artifact().await?;
                // Both branches run to completion so the database memo
                // settles even when the runtime lookup fails first.
                let (runtime_path, database_url) =
                    tokio::join!(self.runtime_path(), self.database_url());
                let (runtime_path, database_url) = (runtime_path?, database_url?);
                stack.guard.ensure().await?;
                let request = SpawnRequest::new(artifact.path_to_entry, runtime_path, database_url);
                let process = stack.processes.spawn(&request).await?;
                tracing::info!(
                    pid = process.pid(),
                    port = process.port(),
                    "liftoff.process.spawned"
                );
                Ok(Some(process))
            })
            .await
    }

    /// Connection parameters for the protocol client.
    pub async fn protocol_setup(&self) -> Result<ProtocolSetup, HarnessError> {
        match &self.mode {
            HarnessMode::Remote(endpoint) => Ok(endpoint.setup()),
            HarnessMode::Local(_) => {
                let process = self.process().await?.ok_or(HarnessError::NoProcess)?;
                Ok(ProtocolSetup::Local {
                    port: process.port(),
                    process_id: process.pid(),
                })
            }
        }
    }

    /// Join protocol setup, process and config into the operand, once.
    pub async fn resolve_operand(&self) -> Result<Operand, HarnessError> {
        self.operand
            .get_or_resolve(|| async {
                let (setup, process, config) = tokio::join!(
                    self.protocol_setup(),
                    self.process(),
                    async { self.config.get().map(|_| ()) },
                );
                let (setup, process, ()) = (setup?, process?, config?);
                let client = self.clients.connect(&setup).await?;
                tracing::info!(
                    hostname = setup.hostname(),
                    port = setup.port(),
                    "liftoff.protocol.connected"
                );
                let closure = Closure::new(Arc::clone(&client), self.scope.clone());
                Ok(Operand::new(client, process, closure))
            })
            .await
    }
}

#[async_trait]
impl OperandSource for ResourceGraph {
    async fn operand(&self) -> Result<Operand, HarnessError> {
        self.resolve_operand().await
    }
}

impl fmt::Debug for ResourceGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceGraph")
            .field("mode", &self.mode)
            .field("artifact", &self.artifact)
            .field("database_url", &self.database_url)
            .field("process", &self.process)
            .field("operand", &self.operand)
            .finish_non_exhaustive()
    }
}
