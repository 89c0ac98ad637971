use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use redis::aio::MultiplexedConnection;
use redis::{Client, Cmd, FromRedisValue, RedisError};
use tokio::sync::Semaphore;

use crate::error::{StoreError, StoreResult};

/// Bounded pool of multiplexed Redis connections.
///
/// At most `capacity` commands are in flight at once; connections that
/// finish cleanly go back to the idle list. Closing the pool drops every
/// idle connection and wakes waiters with [`StoreError::Disconnected`].
pub(crate) struct ConnectionPool {
    client: Client,
    dial_timeout: Duration,
    capacity: usize,
    idle: Mutex<Vec<MultiplexedConnection>>,
    permits: Semaphore,
    closed: AtomicBool,
}

impl ConnectionPool {
    pub fn new(client: Client, dial_timeout: Duration, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            client,
            dial_timeout,
            capacity,
            idle: Mutex::new(Vec::with_capacity(capacity)),
            permits: Semaphore::new(capacity),
            closed: AtomicBool::new(false),
        }
    }

    /// Run one command on a pooled connection.
    pub async fn query<T: FromRedisValue>(&self, cmd: &Cmd) -> StoreResult<T> {
        let _permit = self.permits.acquire().await.map_err(|_| StoreError::Disconnected)?;
        let mut conn = match self.checkout()? {
            Some(conn) => conn,
            None => self.dial().await?,
        };

        let result: Result<T, RedisError> = cmd.query_async(&mut conn).await;
        match result {
            Ok(value) => {
                self.checkin(conn);
                Ok(value)
            }
            Err(err) => {
                // A broken connection is dropped rather than reused.
                if !is_connection_failure(&err) {
                    self.checkin(conn);
                }
                Err(err.into())
            }
        }
    }

    /// Close the pool. Returns `false` if it was already closed.
    pub fn close(&self) -> bool {
        let was_closed = self.closed.swap(true, Ordering::SeqCst);
        self.permits.close();
        if let Ok(mut idle) = self.idle.lock() {
            idle.clear();
        }
        !was_closed
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn idle_count(&self) -> usize {
        self.idle.lock().map(|idle| idle.len()).unwrap_or(0)
    }

    fn checkout(&self) -> StoreResult<Option<MultiplexedConnection>> {
        if self.is_closed() {
            return Err(StoreError::Disconnected);
        }
        let mut idle = self.idle.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(idle.pop())
    }

    fn checkin(&self, conn: MultiplexedConnection) {
        if self.is_closed() {
            return;
        }
        if let Ok(mut idle) = self.idle.lock() {
            if idle.len() < self.capacity {
                idle.push(conn);
            }
        }
    }

    async fn dial(&self) -> StoreResult<MultiplexedConnection> {
        tracing::debug!("dialing new backend connection");
        let dial = self.client.get_multiplexed_async_connection();
        let conn = tokio::time::timeout(self.dial_timeout, dial)
            .await
            .map_err(|_| StoreError::Timeout(self.dial_timeout))??;
        Ok(conn)
    }
}

fn is_connection_failure(err: &RedisError) -> bool {
    err.is_io_error()
        || err.is_connection_dropped()
        || err.is_connection_refusal()
        || err.is_timeout()
}

impl std::fmt::Debug for ConnectionPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionPool")
            .field("capacity", &self.capacity)
            .field("idle", &self.idle_count())
            .field("closed", &self.is_closed())
            .finish()
    }
}
