use crate::dispatcher::{CommandDispatcher, Pending};
use liftoff_core::{Closure, HarnessError};
use serde_json::Value;
use std::future::Future;

/// Runs code inside the app under test, one queue entry per call.
pub trait ClosureExecutor {
    /// Queue `action` with the operand's closure channel.
    fn closure<T, F, Fut>(&self, action: F) -> Pending<T>
    where
        T: Send + 'static,
        F: FnOnce(Closure) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, HarnessError>> + Send + 'static;

    /// Queue a single remote evaluation of `code` with `args`.
    fn execute_remote(&self, code: impl Into<String>, args: Vec<Value>) -> Pending<Value> {
        let code = code.into();
        self.closure(move |closure| async move { closure.execute(&code, args).await })
    }
}

impl ClosureExecutor for CommandDispatcher {
    fn closure<T, F, Fut>(&self, action: F) -> Pending<T>
    where
        T: Send + 'static,
        F: FnOnce(Closure) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, HarnessError>> + Send + 'static,
    {
        self.queue(move |operand| action(operand.closure))
    }
}
