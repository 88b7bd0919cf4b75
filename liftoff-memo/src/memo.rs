use liftoff_core::HarnessError;
use std::fmt;
use std::future::Future;
use tokio::sync::OnceCell;

/// A lazily resolved value, settled at most once.
///
/// Backed by [`tokio::sync::OnceCell`] holding the whole `Result`, so both
/// outcomes are cached. If the first requester is dropped mid-resolution the
/// next requester runs the resolver; nothing in the harness cancels requesters.
pub struct Memo<T, E = HarnessError> {
    cell: OnceCell<Result<T, E>>,
}

impl<T, E> Memo<T, E>
where
    T: Clone,
    E: Clone,
{
    /// Create an unresolved memo.
    pub fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    /// Return the settled outcome, running `resolve` if nobody has yet.
    pub async fn get_or_resolve<F, Fut>(&self, resolve: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.cell.get_or_init(resolve).await.clone()
    }

    /// The settled outcome, if any.
    pub fn peek(&self) -> Option<&Result<T, E>> {
        self.cell.get()
    }

    /// Whether the resolver has finished.
    pub fn is_settled(&self) -> bool {
        self.cell.initialized()
    }
}

impl<T: Clone, E: Clone> Default for Memo<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> fmt::Debug for Memo<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.cell.get() {
            None => "pending",
            Some(Ok(_)) => "resolved",
            Some(Err(_)) => "failed",
        };
        f.debug_struct("Memo").field("state", &state).finish()
    }
}
