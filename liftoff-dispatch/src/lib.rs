#![deny(missing_docs)]
//! Serialized command dispatch against a lazily resolved operand.
//!
//! [`CommandDispatcher`] owns a FIFO drained by a single tokio task. The
//! first submission starts the task, and the task asks its
//! [`OperandSource`](liftoff_core::OperandSource) for the operand before
//! running anything. Commands run strictly in submission order; each one
//! completes before the next starts, except [`CommandDispatcher::no_wait`]
//! entries, which are started in their slot and then left to finish on their
//! own.
//!
//! If the operand cannot be resolved, every queued and future command fails
//! with that error without running.

mod closure;
mod dispatcher;
mod process_op;

pub use closure::ClosureExecutor;
pub use dispatcher::{CommandDispatcher, Pending};
pub use process_op::ProcessOp;
