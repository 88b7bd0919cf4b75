#![deny(missing_docs)]
//! The lazy resource graph behind a liftoff harness.
//!
//! ```text
//!            operand
//!          /    |    \
//!   protocol  process  config
//!     setup     |
//!       \       |
//!        +-- artifact --> (runtime path || database url) --> version --> spawn
//! ```
//!
//! Every node resolves at most once per [`ResourceGraph`] and caches its
//! outcome, failures included. The build artifact gates everything after it:
//! no runtime lookup, database or spawn is attempted when the build fails.
//! In remote mode the process branch short-circuits to `None` and none of the
//! local collaborators are ever called.

mod graph;
mod local;

pub use graph::{HarnessMode, ResourceGraph};
pub use local::LocalStack;
