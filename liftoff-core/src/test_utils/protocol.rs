//! FakeClientManager: opens recording protocol clients.

use super::CallLog;
use crate::closure::EXECUTE_METHOD;
use crate::error::ProtocolError;
use crate::protocol::{ProtocolClient, ProtocolClientManager, ProtocolSetup};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};

/// Answers a remote call.
pub type CallHandler = Arc<dyn Fn(&str, &[Value]) -> Result<Value, ProtocolError> + Send + Sync>;

/// Records `protocol.connect` and creates a [`FakeClient`].
pub struct FakeClientManager {
    log: CallLog,
    connect: Result<(), ProtocolError>,
    close: Result<(), ProtocolError>,
    handler: CallHandler,
    setups: Mutex<Vec<ProtocolSetup>>,
}

impl FakeClientManager {
    /// Clients that connect, close cleanly, and echo closure arguments.
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            connect: Ok(()),
            close: Ok(()),
            handler: Arc::new(default_handler),
            setups: Mutex::new(Vec::new()),
        }
    }

    /// Fail every connection attempt.
    pub fn failing(mut self, message: &str) -> Self {
        self.connect = Err(ProtocolError::Connect(message.to_string()));
        self
    }

    /// Clients whose close fails.
    pub fn failing_close(mut self, message: &str) -> Self {
        self.close = Err(ProtocolError::Close(message.to_string()));
        self
    }

    /// Answer remote calls with `handler`.
    pub fn with_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&str, &[Value]) -> Result<Value, ProtocolError> + Send + Sync + 'static,
    {
        self.handler = Arc::new(handler);
        self
    }

    /// Setups received so far.
    pub fn setups(&self) -> Vec<ProtocolSetup> {
        self.setups.lock().unwrap().clone()
    }
}

/// Closure executions return their arguments and leave the scope untouched;
/// other calls return null.
fn default_handler(method: &str, params: &[Value]) -> Result<Value, ProtocolError> {
    if method == EXECUTE_METHOD {
        Ok(json!({ "value": params.get(1).cloned().unwrap_or(Value::Null) }))
    } else {
        Ok(Value::Null)
    }
}

#[async_trait]
impl ProtocolClientManager for FakeClientManager {
    async fn connect(&self, setup: &ProtocolSetup) -> Result<Arc<dyn ProtocolClient>, ProtocolError> {
        self.log.record("protocol.connect");
        self.setups.lock().unwrap().push(setup.clone());
        self.connect.clone()?;
        Ok(Arc::new(FakeClient {
            log: self.log.clone(),
            close: self.close.clone(),
            handler: Arc::clone(&self.handler),
        }))
    }
}

/// Records `client.ready`, `client.call:<method>` and `client.close`.
pub struct FakeClient {
    log: CallLog,
    close: Result<(), ProtocolError>,
    handler: CallHandler,
}

#[async_trait]
impl ProtocolClient for FakeClient {
    async fn ready(&self) -> Result<(), ProtocolError> {
        self.log.record("client.ready");
        Ok(())
    }

    async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, ProtocolError> {
        self.log.record(format!("client.call:{method}"));
        (self.handler)(method, &params)
    }

    async fn close(&self) -> Result<(), ProtocolError> {
        self.log.record("client.close");
        self.close.clone()
    }
}
