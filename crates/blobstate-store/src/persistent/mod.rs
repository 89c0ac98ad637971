//! Redis-backed store.
//!
//! Each item is one Redis hash keyed by the item name with two fields,
//! `mime` and `data`. Writes use a single `HSET` and reads a single
//! `HGETALL`, so the media type and payload always travel together.
//! Listing walks `SCAN` from cursor zero until the server hands back zero.
//!
//! Every call runs under its own deadline. Transient failures (refused or
//! dropped connections, I/O errors, timeouts) are retried with exponential
//! backoff inside that deadline; whatever is left is returned to the caller.

mod config;
mod pool;

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::{Cmd, FromRedisValue};
use tokio_retry2::strategy::ExponentialBackoff;
use tokio_retry2::{Retry, RetryError};

pub use config::{default_pool_size, PersistentConfig};
use pool::ConnectionPool;

use crate::error::{StoreError, StoreResult};
use crate::item::Item;
use crate::traits::{Backend, Store};

/// Hash field holding the media type.
pub const MIME_FIELD: &str = "mime";
/// Hash field holding the payload.
pub const DATA_FIELD: &str = "data";

const SCAN_PAGE_SIZE: usize = 1000;

/// Store backed by a Redis server.
pub struct PersistentStore {
    pool: ConnectionPool,
    addr: String,
    call_timeout: Duration,
    max_retries: usize,
    min_retry_backoff: Duration,
    max_retry_backoff: Duration,
}

impl PersistentStore {
    /// Build a store from `config`.
    ///
    /// Reads the password file but does not dial; connections are opened on
    /// first use.
    pub fn new(config: &PersistentConfig) -> StoreResult<Self> {
        let url = config.connection_url()?;
        let client = redis::Client::open(url.as_str())
            .map_err(|e| StoreError::InvalidAddress(format!("{}: {e}", config.display_addr())))?;

        Ok(Self {
            pool: ConnectionPool::new(client, config.dial_timeout, config.pool_size),
            addr: config.display_addr(),
            call_timeout: config.call_timeout,
            max_retries: config.max_retries,
            min_retry_backoff: config.min_retry_backoff,
            max_retry_backoff: config.max_retry_backoff,
        })
    }

    /// Backend address without credentials.
    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub fn is_connected(&self) -> bool {
        !self.pool.is_closed()
    }

    /// Most commands that may be in flight at once.
    pub fn pool_size(&self) -> usize {
        self.pool.capacity()
    }

    /// Run `op` under the per-call deadline.
    async fn bounded<T>(&self, op: impl Future<Output = StoreResult<T>>) -> StoreResult<T> {
        if self.pool.is_closed() {
            return Err(StoreError::Disconnected);
        }
        tokio::time::timeout(self.call_timeout, op)
            .await
            .unwrap_or(Err(StoreError::Timeout(self.call_timeout)))
    }

    /// Run one command, retrying transient failures.
    async fn query<T: FromRedisValue>(&self, cmd: &Cmd) -> StoreResult<T> {
        let schedule =
            backoff_schedule(self.min_retry_backoff, self.max_retry_backoff, self.max_retries);
        Retry::spawn(schedule, || async {
            self.pool.query(cmd).await.map_err(|err| {
                if err.is_transient() {
                    tracing::warn!(
                        addr = %self.addr,
                        error = %err,
                        "transient backend error, retrying"
                    );
                    RetryError::Transient {
                        err,
                        retry_after: None,
                    }
                } else {
                    RetryError::Permanent(err)
                }
            })
        })
        .await
    }

    async fn scan_all(&self) -> StoreResult<Vec<String>> {
        let mut names = Vec::new();
        let mut cursor: u64 = 0;
        loop {
            let mut cmd = redis::cmd("SCAN");
            cmd.arg(cursor).arg("COUNT").arg(SCAN_PAGE_SIZE);
            let (next, page): (u64, Vec<String>) = self.query(&cmd).await?;
            names.extend(page);
            if next == 0 {
                break;
            }
            cursor = next;
        }
        // SCAN may report a key more than once while the keyspace rehashes.
        names.sort_unstable();
        names.dedup();
        Ok(names)
    }
}

/// Delays between attempts: exponential from `min`, capped at `max`.
pub(crate) fn backoff_schedule(
    min: Duration,
    max: Duration,
    retries: usize,
) -> impl Iterator<Item = Duration> {
    let factor = (min.as_millis() as u64 / 2).max(1);
    ExponentialBackoff::from_millis(2)
        .factor(factor)
        .max_delay(max)
        .take(retries)
}

fn item_from_fields(name: &str, mut fields: HashMap<String, Vec<u8>>) -> Option<Item> {
    if fields.is_empty() {
        return None;
    }
    let mime_type = fields
        .remove(MIME_FIELD)
        .map(|raw| String::from_utf8_lossy(&raw).into_owned())
        .unwrap_or_default();
    let data = fields.remove(DATA_FIELD).unwrap_or_default();
    Some(Item::new(name, mime_type, data))
}

#[async_trait]
impl Store for PersistentStore {
    async fn add(&self, item: Item) -> StoreResult<()> {
        tracing::debug!(name = item.name(), bytes = item.len(), "persistent add");
        let mut cmd = redis::cmd("HSET");
        cmd.arg(item.name())
            .arg(MIME_FIELD)
            .arg(item.mime_type())
            .arg(DATA_FIELD)
            .arg(item.data().as_ref());
        self.bounded(async {
            let _: i64 = self.query(&cmd).await?;
            Ok(())
        })
        .await
    }

    async fn remove(&self, name: &str) -> StoreResult<()> {
        tracing::debug!(name, "persistent remove");
        let mut cmd = redis::cmd("DEL");
        cmd.arg(name);
        self.bounded(async {
            let _: i64 = self.query(&cmd).await?;
            Ok(())
        })
        .await
    }

    async fn fetch(&self, name: &str) -> StoreResult<Option<Item>> {
        let mut cmd = redis::cmd("HGETALL");
        cmd.arg(name);
        self.bounded(async {
            let fields: HashMap<String, Vec<u8>> = self.query(&cmd).await?;
            Ok(item_from_fields(name, fields))
        })
        .await
    }

    async fn list(&self) -> StoreResult<Vec<String>> {
        self.bounded(self.scan_all()).await
    }

    async fn disconnect(&self) -> StoreResult<()> {
        if self.pool.close() {
            tracing::info!(addr = %self.addr, "persistent store disconnected");
        }
        Ok(())
    }

    fn backend(&self) -> Backend {
        Backend::Persistent
    }
}

impl std::fmt::Debug for PersistentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistentStore")
            .field("addr", &self.addr)
            .field("connected", &self.is_connected())
            .field("pool_size", &self.pool_size())
            .field("pool", &self.pool)
            .field("call_timeout", &self.call_timeout)
            .finish()
    }
}
