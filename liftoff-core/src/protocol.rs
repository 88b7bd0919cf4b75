//! The Protocol layer: the remote-procedure connection into the app.

use crate::error::ProtocolError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Hostname used to reach a locally spawned app.
pub const LOCAL_HOSTNAME: &str = "localhost";

/// Connection parameters for a protocol client.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProtocolSetup {
    /// A pre-existing server somewhere else.
    Remote {
        /// Host to connect to.
        hostname: String,
        /// Port to connect to.
        port: u16,
    },
    /// A process spawned by this harness.
    Local {
        /// Port the process listens on.
        port: u16,
        /// Id of the process.
        process_id: u32,
    },
}

impl ProtocolSetup {
    /// Hostname to connect to.
    pub fn hostname(&self) -> &str {
        match self {
            Self::Remote { hostname, .. } => hostname,
            Self::Local { .. } => LOCAL_HOSTNAME,
        }
    }

    /// Port to connect to.
    pub fn port(&self) -> u16 {
        match self {
            Self::Remote { port, .. } | Self::Local { port, .. } => *port,
        }
    }

    /// Id of the local process, if this setup targets one.
    pub fn process_id(&self) -> Option<u32> {
        match self {
            Self::Remote { .. } => None,
            Self::Local { process_id, .. } => Some(*process_id),
        }
    }
}

/// Opens protocol connections.
#[async_trait]
pub trait ProtocolClientManager: Send + Sync {
    /// Connect using the given setup.
    async fn connect(&self, setup: &ProtocolSetup) -> Result<Arc<dyn ProtocolClient>, ProtocolError>;
}

/// An open remote-procedure connection.
#[async_trait]
pub trait ProtocolClient: Send + Sync {
    /// Resolve once the app reports that its startup hooks have run.
    async fn ready(&self) -> Result<(), ProtocolError>;

    /// Call a remote method.
    async fn call(
        &self,
        method: &str,
        params: Vec<serde_json::Value>,
    ) -> Result<serde_json::Value, ProtocolError>;

    /// Close the connection.
    async fn close(&self) -> Result<(), ProtocolError>;
}
