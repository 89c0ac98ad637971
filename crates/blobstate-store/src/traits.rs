use async_trait::async_trait;

use crate::error::StoreResult;
use crate::item::Item;

/// Which implementation sits behind a [`Store`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    Ephemeral,
    Persistent,
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ephemeral => write!(f, "ephemeral"),
            Self::Persistent => write!(f, "persistent"),
        }
    }
}

/// Name-keyed item store shared by all request handlers.
///
/// All implementations must satisfy these invariants:
/// - At most one item exists per name; `add` replaces, it never merges.
/// - An absent name is `Ok(None)` from `fetch` and a no-op for `remove`.
/// - Backend failures are returned as `Err`, never as an empty result.
/// - After `disconnect`, every other operation returns
///   [`StoreError::Disconnected`](crate::StoreError::Disconnected).
/// - Concurrent callers need no external locking.
#[async_trait]
pub trait Store: Send + Sync {
    /// Insert `item`, replacing any item stored under the same name.
    async fn add(&self, item: Item) -> StoreResult<()>;

    /// Delete the item stored under `name`, if any.
    async fn remove(&self, name: &str) -> StoreResult<()>;

    /// Read the item stored under `name`.
    ///
    /// Returns `Ok(None)` if nothing is stored under that name.
    async fn fetch(&self, name: &str) -> StoreResult<Option<Item>>;

    /// Names of all stored items, in no particular order.
    async fn list(&self) -> StoreResult<Vec<String>>;

    /// Release the backend. Calling it again is a no-op.
    async fn disconnect(&self) -> StoreResult<()>;

    /// The implementation kind, for logs and diagnostics.
    fn backend(&self) -> Backend;
}
