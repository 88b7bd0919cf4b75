#![deny(missing_docs)]
//! Single-assignment resolutions scoped to one harness instance.
//!
//! [`Memo`] runs its resolver at most once. Requesters that arrive while the
//! resolver is in flight wait on it; requesters that arrive later get the
//! settled outcome. Failures settle too: there is no retry.
//!
//! [`ConfigCell`] holds the caller's config. It rejects reads until the first
//! `init` and ignores every `init` after that.

mod config;
mod memo;

pub use config::ConfigCell;
pub use memo::Memo;
