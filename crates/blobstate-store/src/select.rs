use std::sync::Arc;

use crate::ephemeral::EphemeralStore;
use crate::error::StoreResult;
use crate::persistent::{PersistentConfig, PersistentStore};
use crate::traits::Store;

/// Build the store for this process.
///
/// Without persistent settings the store is ephemeral; otherwise it talks
/// to the configured Redis server. The choice is fixed for the lifetime of
/// the returned handle.
pub fn open_store(persistent: Option<&PersistentConfig>) -> StoreResult<Arc<dyn Store>> {
    match persistent {
        None => {
            tracing::info!("using ephemeral store");
            Ok(Arc::new(EphemeralStore::new()))
        }
        Some(config) => {
            let store = PersistentStore::new(config)?;
            tracing::info!(
                addr = store.addr(),
                pool_size = store.pool_size(),
                "using persistent store"
            );
            Ok(Arc::new(store))
        }
    }
}
