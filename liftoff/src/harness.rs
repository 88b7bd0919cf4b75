use crate::builder::HarnessBuilder;
use crate::lifecycle::{Lifecycle, LifecycleState};
use crate::options::HarnessOptions;
use liftoff_core::{Closure, ClosureScope, HarnessError, Operand, OperandSource, ProtocolSetup};
use liftoff_dispatch::{ClosureExecutor, CommandDispatcher, Pending, ProcessOp};
use liftoff_graph::ResourceGraph;
use liftoff_memo::ConfigCell;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Drives one app under test from build to teardown.
///
/// Every operation goes through a single FIFO against one lazily resolved
/// operand, so commands never race each other and the app is built, spawned
/// and connected at most once. A stopped harness stays stopped; build a new
/// one to start over.
pub struct Harness<H = ()> {
    config: Arc<ConfigCell>,
    graph: Arc<ResourceGraph>,
    commands: CommandDispatcher,
    lifecycle: Lifecycle,
    helpers: H,
}

impl Harness {
    /// Start building a harness.
    pub fn builder(options: impl Into<HarnessOptions>) -> HarnessBuilder {
        HarnessBuilder::new(options)
    }
}

impl<H> Harness<H> {
    pub(crate) fn assemble(graph: ResourceGraph, config: Arc<ConfigCell>, helpers: H) -> Self {
        let graph = Arc::new(graph);
        let commands = CommandDispatcher::new(Arc::clone(&graph) as Arc<dyn OperandSource>);
        Self {
            config,
            graph,
            commands,
            lifecycle: Lifecycle::new(),
            helpers,
        }
    }

    /// Hand the harness its config. Only the first call takes effect.
    pub fn init(&self, config: Value) -> &Self {
        if !self.config.init(config) {
            tracing::debug!("liftoff.harness.init_ignored");
        }
        self
    }

    /// Whether [`Harness::init`] has been called.
    pub fn is_initialized(&self) -> bool {
        self.config.is_initialized()
    }

    /// The config given to [`Harness::init`].
    pub fn config(&self) -> Result<&Value, HarnessError> {
        self.config.get()
    }

    /// Resolve the operand and wait for the app to report ready.
    pub async fn startup(&self) -> Result<(), HarnessError> {
        self.wait_ready().await?;
        self.lifecycle.advance(LifecycleState::Running);
        tracing::info!("liftoff.harness.running");
        Ok(())
    }

    /// Like [`Harness::startup`], then run `callback` as a queued command.
    ///
    /// The callback occupies its slot in the queue but later commands do not
    /// wait for it. The harness is running once it completes.
    pub async fn startup_with<T, F, Fut>(&self, callback: F) -> Result<T, HarnessError>
    where
        T: Send + 'static,
        F: FnOnce(Operand) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, HarnessError>> + Send + 'static,
    {
        self.wait_ready().await?;
        let value = self.commands.no_wait(callback).await?;
        self.lifecycle.advance(LifecycleState::Running);
        tracing::info!("liftoff.harness.running");
        Ok(value)
    }

    /// Old name of [`Harness::startup`].
    #[deprecated(note = "use `startup` instead")]
    pub async fn start(&self) -> Result<(), HarnessError> {
        tracing::warn!("liftoff.harness.start_deprecated");
        self.startup().await
    }

    async fn wait_ready(&self) -> Result<(), HarnessError> {
        self.lifecycle.advance(LifecycleState::Starting);
        self.commands
            .queue(|operand| async move { operand.client.ready().await.map_err(HarnessError::from) })
            .await
    }

    /// Tear everything down as the last queued command.
    ///
    /// Closes the protocol client, then kills the process and, once it is
    /// dead, cleans up the database the harness started. A failed close does
    /// not prevent the kill; a failed kill skips the cleanup. Every command
    /// submitted afterwards fails with [`HarnessError::Stopped`].
    ///
    /// If the operand never resolved, the resolution error is returned, and
    /// whatever was already spawned or started is still killed and cleaned
    /// up.
    pub async fn stop(&self) -> Result<(), HarnessError> {
        self.lifecycle.advance(LifecycleState::Stopping);
        let graph = Arc::clone(&self.graph);
        let torn_down = Arc::new(AtomicBool::new(false));
        let ran = Arc::clone(&torn_down);
        let result = self
            .commands
            .queue_terminal(move |operand| {
                ran.store(true, Ordering::SeqCst);
                teardown(operand, graph)
            })
            .await;
        if !torn_down.load(Ordering::SeqCst) && result != Err(HarnessError::Stopped) {
            release_unresolved(&self.graph).await;
        }
        self.lifecycle.advance(LifecycleState::Stopped);
        match &result {
            Ok(()) => tracing::info!("liftoff.harness.stopped"),
            Err(e) => tracing::warn!(error = %e, "liftoff.harness.stop_failed"),
        }
        result
    }

    /// Recycle the app process, keeping the protocol client.
    ///
    /// Fails with [`HarnessError::NoProcess`] against a remote server.
    pub async fn restart(&self, delay: Option<Duration>) -> Result<(), HarnessError> {
        self.commands.process_op(ProcessOp::Restart { delay }).await
    }

    /// Where the protocol client connects.
    pub async fn protocol_setup(&self) -> Result<ProtocolSetup, HarnessError> {
        self.graph.protocol_setup().await
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        self.lifecycle.get()
    }

    /// Whether the harness targets a remote server.
    pub fn is_remote(&self) -> bool {
        self.graph.is_remote()
    }

    /// Helpers attached at build time.
    pub fn helpers(&self) -> &H {
        &self.helpers
    }

    /// Variables injected into every closure execution.
    pub fn closure_scope(&self) -> &ClosureScope {
        self.graph.closure_scope()
    }

    /// The command queue, for submitting arbitrary operations.
    pub fn commands(&self) -> &CommandDispatcher {
        &self.commands
    }

    /// The resource graph behind the queue.
    pub fn graph(&self) -> &ResourceGraph {
        &self.graph
    }
}

async fn teardown(operand: Operand, graph: Arc<ResourceGraph>) -> Result<(), HarnessError> {
    let closed = operand.client.close().await;
    if let Err(e) = &closed {
        tracing::warn!(error = %e, "liftoff.harness.close_failed");
    }
    if let Some(process) = &operand.process {
        process.kill().await?;
        tracing::info!(pid = process.pid(), "liftoff.process.killed");
        if let Some(database) = graph.owned_database() {
            database.clean_up().await?;
            tracing::debug!("liftoff.database.cleaned_up");
        }
    }
    closed.map_err(HarnessError::from)
}

/// Best-effort release after a failed resolution. Errors are logged; the
/// caller reports the resolution error instead.
async fn release_unresolved(graph: &ResourceGraph) {
    if let Some(process) = graph.spawned_process() {
        if let Err(e) = process.kill().await {
            tracing::warn!(error = %e, "liftoff.harness.partial_kill_failed");
            return;
        }
        tracing::info!(pid = process.pid(), "liftoff.process.killed");
    }
    if let Some(database) = graph.owned_database() {
        match database.clean_up().await {
            Ok(()) => tracing::debug!("liftoff.database.cleaned_up"),
            Err(e) => tracing::warn!(error = %e, "liftoff.harness.partial_clean_up_failed"),
        }
    }
}

impl<H> ClosureExecutor for Harness<H> {
    fn closure<T, F, Fut>(&self, action: F) -> Pending<T>
    where
        T: Send + 'static,
        F: FnOnce(Closure) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, HarnessError>> + Send + 'static,
    {
        self.commands.closure(action)
    }
}

impl<H: fmt::Debug> fmt::Debug for Harness<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Harness")
            .field("state", &self.state())
            .field("initialized", &self.is_initialized())
            .field("graph", &self.graph)
            .field("helpers", &self.helpers)
            .finish_non_exhaustive()
    }
}
