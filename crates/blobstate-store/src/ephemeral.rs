use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::error::{StoreError, StoreResult};
use crate::item::Item;
use crate::traits::{Backend, Store};

type Items = Option<HashMap<String, Item>>;

/// In-memory, HashMap-based item store.
///
/// The map lives behind a `Mutex` that is held only for a single map access.
/// `disconnect` drops the map and leaves `None` behind, which every later
/// call reports as [`StoreError::Disconnected`]. Contents vanish with the
/// process.
pub struct EphemeralStore {
    items: Mutex<Items>,
}

impl EphemeralStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            items: Mutex::new(Some(HashMap::new())),
        }
    }

    /// Number of items currently stored. Zero once disconnected.
    pub fn len(&self) -> usize {
        self.lock()
            .ok()
            .and_then(|guard| guard.as_ref().map(HashMap::len))
            .unwrap_or(0)
    }

    /// Returns `true` if the store holds no items.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` until `disconnect` has been called.
    pub fn is_connected(&self) -> bool {
        self.lock().map(|guard| guard.is_some()).unwrap_or(false)
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Items>> {
        self.items.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Run `f` against the live map, or fail if the store was torn down.
    fn with_items<T>(&self, f: impl FnOnce(&mut HashMap<String, Item>) -> T) -> StoreResult<T> {
        let mut guard = self.lock()?;
        let items = guard.as_mut().ok_or(StoreError::Disconnected)?;
        Ok(f(items))
    }
}

impl Default for EphemeralStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for EphemeralStore {
    async fn add(&self, item: Item) -> StoreResult<()> {
        tracing::debug!(name = item.name(), bytes = item.len(), "ephemeral add");
        self.with_items(|items| {
            items.insert(item.name().to_owned(), item);
        })
    }

    async fn remove(&self, name: &str) -> StoreResult<()> {
        tracing::debug!(name, "ephemeral remove");
        self.with_items(|items| {
            items.remove(name);
        })
    }

    async fn fetch(&self, name: &str) -> StoreResult<Option<Item>> {
        self.with_items(|items| items.get(name).cloned())
    }

    async fn list(&self) -> StoreResult<Vec<String>> {
        self.with_items(|items| items.keys().cloned().collect())
    }

    async fn disconnect(&self) -> StoreResult<()> {
        let mut guard = self.lock()?;
        if guard.take().is_some() {
            tracing::info!("ephemeral store disconnected");
        }
        Ok(())
    }

    fn backend(&self) -> Backend {
        Backend::Ephemeral
    }
}

impl std::fmt::Debug for EphemeralStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EphemeralStore")
            .field("item_count", &self.len())
            .field("connected", &self.is_connected())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    use proptest::prelude::*;

    fn test_items() -> Vec<Item> {
        vec![
            Item::new("foo", "bar", b"fasel".to_vec()),
            Item::new("qwertyASDFGH", "text/html; charset=utf-8", Vec::new()),
            Item::new("Som!_🎵nam3", "any kind of string", vec![1u8, 2, 3, 4, 5, 6, 7, 8]),
        ]
    }

    fn names(list: Vec<String>) -> HashSet<String> {
        list.into_iter().collect()
    }

    // -----------------------------------------------------------------------
    // Core operations
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn add_and_fetch() {
        let store = EphemeralStore::new();
        let item = Item::new("just-a-test", "text/plain", "just a test body");
        store.add(item.clone()).await.unwrap();

        let read_back = store.fetch("just-a-test").await.unwrap().expect("should exist");
        assert_eq!(read_back, item);
        assert_eq!(read_back.mime_type(), "text/plain");
        assert_eq!(read_back.data().as_ref(), b"just a test body");
    }

    #[tokio::test]
    async fn fetch_missing_is_none() {
        let store = EphemeralStore::new();
        assert!(store.fetch("never-written").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn add_replaces_previous_item() {
        let store = EphemeralStore::new();
        store.add(Item::new("n", "text/plain", "first")).await.unwrap();
        store.add(Item::new("n", "application/json", "{}")).await.unwrap();

        let item = store.fetch("n").await.unwrap().unwrap();
        assert_eq!(item.mime_type(), "application/json");
        assert_eq!(item.data().as_ref(), b"{}");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn remove_then_fetch_is_none() {
        let store = EphemeralStore::new();
        store.add(Item::new("gone", "text/plain", "x")).await.unwrap();
        store.remove("gone").await.unwrap();
        assert!(store.fetch("gone").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn remove_missing_is_ok() {
        let store = EphemeralStore::new();
        store.remove("never-written").await.unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn list_empty_and_populated() {
        let store = EphemeralStore::new();
        assert!(store.list().await.unwrap().is_empty());

        store.add(Item::new("a", "text/plain", "1")).await.unwrap();
        store.add(Item::new("b", "text/plain", "2")).await.unwrap();
        let expected: HashSet<String> = ["a", "b"].iter().map(|s| s.to_string()).collect();
        assert_eq!(names(store.list().await.unwrap()), expected);
    }

    // -----------------------------------------------------------------------
    // End-to-end lifecycle
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn just_a_test_lifecycle() {
        let store = EphemeralStore::new();
        assert!(store.list().await.unwrap().is_empty());

        let first = Item::new("just-a-test", "text/plain", "just a test body");
        store.add(first.clone()).await.unwrap();
        store.add(first.clone()).await.unwrap();
        assert_eq!(store.fetch("just-a-test").await.unwrap(), Some(first));

        store
            .add(Item::new("just-a-test", "text/plain", "this body just changed"))
            .await
            .unwrap();
        let changed = store.fetch("just-a-test").await.unwrap().unwrap();
        assert_eq!(changed.data().as_ref(), b"this body just changed");

        store
            .add(Item::new("another-test", "application/octet-stream", vec![7u8; 128]))
            .await
            .unwrap();
        assert_eq!(store.list().await.unwrap().len(), 2);

        store.remove("just-a-test").await.unwrap();
        assert!(store.fetch("just-a-test").await.unwrap().is_none());
    }

    // -----------------------------------------------------------------------
    // Disconnect
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn operations_fail_after_disconnect() {
        let store = EphemeralStore::new();
        store.add(Item::new("a", "text/plain", "1")).await.unwrap();
        store.disconnect().await.unwrap();

        assert!(!store.is_connected());
        assert!(matches!(
            store.add(Item::new("b", "text/plain", "2")).await,
            Err(StoreError::Disconnected)
        ));
        assert!(matches!(store.remove("a").await, Err(StoreError::Disconnected)));
        assert!(matches!(store.fetch("a").await, Err(StoreError::Disconnected)));
        assert!(matches!(store.list().await, Err(StoreError::Disconnected)));
    }

    #[tokio::test]
    async fn disconnect_twice_is_ok() {
        let store = EphemeralStore::new();
        store.disconnect().await.unwrap();
        store.disconnect().await.unwrap();
        assert_eq!(store.len(), 0);
    }

    // -----------------------------------------------------------------------
    // Concurrency
    // -----------------------------------------------------------------------

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_adds_are_not_lost() {
        let store = Arc::new(EphemeralStore::new());

        let handles: Vec<_> = (0..64)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    store
                        .add(Item::new(format!("item-{i}"), "text/plain", format!("{i}")))
                        .await
                })
            })
            .collect();
        for h in handles {
            h.await.expect("task should not panic").unwrap();
        }

        assert_eq!(store.len(), 64);
        assert_eq!(store.list().await.unwrap().len(), 64);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_fixture_items() {
        let store = Arc::new(EphemeralStore::new());
        let items = test_items();

        let handles: Vec<_> = items
            .iter()
            .cloned()
            .map(|item| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.add(item).await })
            })
            .collect();
        for h in handles {
            h.await.unwrap().unwrap();
        }

        assert_eq!(store.len(), items.len());
        for item in &items {
            assert_eq!(store.fetch(item.name()).await.unwrap().as_ref(), Some(item));
        }
    }

    #[test]
    fn debug_format() {
        let store = EphemeralStore::new();
        let debug = format!("{store:?}");
        assert!(debug.contains("EphemeralStore"));
        assert!(debug.contains("item_count"));
    }

    // -----------------------------------------------------------------------
    // Properties
    // -----------------------------------------------------------------------

    fn block_on<F: std::future::Future>(f: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .expect("runtime")
            .block_on(f)
    }

    proptest! {
        #[test]
        fn last_write_wins(
            name in "[a-zA-Z0-9_-]{1,16}",
            first in proptest::collection::vec(any::<u8>(), 0..64),
            second in proptest::collection::vec(any::<u8>(), 0..64),
        ) {
            let store = EphemeralStore::new();
            let latest = Item::new(name.clone(), "application/octet-stream", second);
            let fetched = block_on(async {
                store.add(Item::new(name.clone(), "text/plain", first)).await.unwrap();
                store.add(latest.clone()).await.unwrap();
                store.fetch(&name).await.unwrap()
            });
            prop_assert_eq!(fetched, Some(latest));
        }

        #[test]
        fn list_matches_added_names(
            added in proptest::collection::hash_set("[a-z]{1,8}", 0..16),
        ) {
            let store = EphemeralStore::new();
            let listed = block_on(async {
                for name in &added {
                    store.add(Item::new(name.clone(), "text/plain", "x")).await.unwrap();
                }
                store.list().await.unwrap()
            });
            prop_assert_eq!(names(listed), added);
        }
    }
}
