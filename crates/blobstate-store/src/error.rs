use std::path::PathBuf;
use std::time::Duration;

/// Errors from store operations.
///
/// A name that is not present is not an error; see [`crate::Store::fetch`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store has been torn down by `disconnect`.
    #[error("store is disconnected")]
    Disconnected,

    /// A call did not finish within its deadline.
    #[error("backend call timed out after {0:?}")]
    Timeout(Duration),

    /// The Redis driver reported a failure.
    #[error("backend error: {0}")]
    Backend(#[from] redis::RedisError),

    /// The in-memory map lock was poisoned by a panicking writer.
    #[error("ephemeral store lock poisoned")]
    Poisoned,

    /// The database password file could not be read.
    #[error("cannot read database password from {}: {source}", path.display())]
    Credentials {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The configured host, port or credentials do not form a valid address.
    #[error("invalid backend address: {0}")]
    InvalidAddress(String),
}

impl StoreError {
    /// Whether the store could not service the request.
    ///
    /// True for every error an operation can return. The construction-time
    /// variants are the only exceptions.
    pub fn is_unavailable(&self) -> bool {
        !matches!(self, Self::Credentials { .. } | Self::InvalidAddress(_))
    }

    /// Whether repeating the call may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout(_) => true,
            Self::Backend(e) => {
                e.is_io_error()
                    || e.is_timeout()
                    || e.is_connection_dropped()
                    || e.is_connection_refusal()
            }
            _ => false,
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
