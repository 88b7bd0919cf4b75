//! The operand: the one composite value every queued command runs against.

use crate::closure::Closure;
use crate::error::HarnessError;
use crate::process::ManagedProcess;
use crate::protocol::ProtocolClient;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// A fully resolved protocol client, process and closure channel.
///
/// Operands are built whole or not at all. Clones share the same client and
/// process handles.
#[derive(Clone)]
pub struct Operand {
    /// Connection into the app.
    pub client: Arc<dyn ProtocolClient>,
    /// The managed process, absent when running against a remote server.
    pub process: Option<Arc<dyn ManagedProcess>>,
    /// Remote-execution channel bound to `client`.
    pub closure: Closure,
}

impl Operand {
    /// Assemble an operand.
    pub fn new(
        client: Arc<dyn ProtocolClient>,
        process: Option<Arc<dyn ManagedProcess>>,
        closure: Closure,
    ) -> Self {
        Self {
            client,
            process,
            closure,
        }
    }

    /// The managed process, or [`HarnessError::NoProcess`] in remote mode.
    pub fn process(&self) -> Result<&Arc<dyn ManagedProcess>, HarnessError> {
        self.process.as_ref().ok_or(HarnessError::NoProcess)
    }
}

impl fmt::Debug for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operand")
            .field("pid", &self.process.as_ref().map(|p| p.pid()))
            .field("closure", &self.closure)
            .finish_non_exhaustive()
    }
}

/// Anything that can hand out the operand.
///
/// Implementations resolve lazily and memoize: every call after the first
/// returns the same operand, or the same error.
#[async_trait]
pub trait OperandSource: Send + Sync {
    /// Resolve the operand.
    async fn operand(&self) -> Result<Operand, HarnessError>;
}
