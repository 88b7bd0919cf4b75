//! Closures: code run inside the app with shared variables injected.
//!
//! A [`ClosureScope`] holds named JSON values owned by the harness. Each
//! [`Closure::execute`] ships the current values along with the code; the app
//! sends back whatever the code reassigned, and those values are merged into
//! the scope so the next call sees them.

use crate::error::{HarnessError, ProtocolError};
use crate::protocol::ProtocolClient;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

/// Remote method that evaluates closure code inside the app.
pub const EXECUTE_METHOD: &str = "/liftoff/execute";

/// Shared closure variables.
///
/// Clones share the same variables.
#[derive(Debug, Clone, Default)]
pub struct ClosureScope {
    vars: Arc<Mutex<Map<String, Value>>>,
}

impl ClosureScope {
    /// Create an empty scope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable.
    pub fn set(&self, name: impl Into<String>, value: Value) {
        self.lock().insert(name.into(), value);
    }

    /// Read a variable.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.lock().get(name).cloned()
    }

    /// Copy of every variable.
    pub fn snapshot(&self) -> Map<String, Value> {
        self.lock().clone()
    }

    /// Overwrite variables with the given values; others are kept.
    pub fn merge(&self, values: Map<String, Value>) {
        self.lock().extend(values);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Map<String, Value>> {
        self.vars.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The remote-execution channel of an operand.
#[derive(Clone)]
pub struct Closure {
    client: Arc<dyn ProtocolClient>,
    scope: ClosureScope,
}

impl Closure {
    /// Bind a scope to a protocol client.
    pub fn new(client: Arc<dyn ProtocolClient>, scope: ClosureScope) -> Self {
        Self { client, scope }
    }

    /// The variables injected into every execution.
    pub fn scope(&self) -> &ClosureScope {
        &self.scope
    }

    /// Run `code` inside the app with `args` and the closure variables.
    ///
    /// The app answers `{"value": .., "closure": {..}}`. Any other shape is
    /// taken as the bare return value.
    pub async fn execute(&self, code: &str, args: Vec<Value>) -> Result<Value, HarnessError> {
        let params = vec![
            Value::String(code.to_string()),
            Value::Array(args),
            Value::Object(self.scope.snapshot()),
        ];
        let reply = self.client.call(EXECUTE_METHOD, params).await?;
        match reply {
            Value::Object(mut fields) if fields.contains_key("value") => {
                match fields.remove("closure") {
                    Some(Value::Object(updates)) => self.scope.merge(updates),
                    Some(Value::Null) | None => {}
                    Some(other) => {
                        return Err(ProtocolError::Call {
                            method: EXECUTE_METHOD.to_string(),
                            message: format!("closure update must be an object, got {other}"),
                        }
                        .into());
                    }
                }
                Ok(fields.remove("value").unwrap_or(Value::Null))
            }
            other => Ok(other),
        }
    }
}

impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Closure")
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}
