//! HTTP server for blobstate.
//!
//! Exposes the item store under `/state/{name}` with GET, HEAD, PUT and
//! DELETE, a listing under `/states`, and `/health` for orchestration.
//! Shutdown is signal-driven: health flips to failing, the listener drains
//! for a bounded grace period and the store is disconnected once.

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;
pub mod shutdown;
pub mod templates;

pub use config::{Environment, ServerConfig, BODY_SIZE_LIMIT};
pub use error::{ServerError, ServerResult};
pub use handler::{AppState, HealthResponse};
pub use server::{BlobServer, SHUTDOWN_GRACE};
pub use shutdown::shutdown_signal;
