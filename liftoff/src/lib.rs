#![deny(missing_docs)]
//! # liftoff: umbrella crate
//!
//! One import surface for driving an app under test. A [`Harness`] is
//! assembled from [`HarnessOptions`] and a set of collaborators through
//! [`HarnessBuilder`]; nothing is built, spawned or connected until the first
//! command reaches its queue.
//!
//! ```text
//! HarnessBuilder ──build()──> Harness
//!                               ├── ConfigCell        (init, first wins)
//!                               ├── ResourceGraph     (memoized build → spawn → connect)
//!                               ├── CommandDispatcher (FIFO over the operand)
//!                               └── helpers: H
//! ```

mod builder;
mod harness;
mod lifecycle;
mod options;

pub use builder::HarnessBuilder;
pub use harness::Harness;
pub use lifecycle::LifecycleState;
pub use options::HarnessOptions;

pub use liftoff_core;
pub use liftoff_dispatch;
pub use liftoff_graph;
pub use liftoff_memo;
pub use liftoff_version;

/// Happy-path imports for writing harness-driven tests.
pub mod prelude {
    pub use crate::{Harness, HarnessBuilder, HarnessOptions, LifecycleState};

    pub use liftoff_core::{
        Build, Closure, ClosureScope, Database, DatabaseManager, HarnessError, ManagedProcess,
        MongoUrl, Operand, ProcessManager, ProtocolClient, ProtocolClientManager, ProtocolSetup,
        RuntimeLocator,
    };

    pub use liftoff_dispatch::{ClosureExecutor, Pending, ProcessOp};
}
