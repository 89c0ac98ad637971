//! Named blob storage for blobstate.
//!
//! Every resource served over HTTP is an [`Item`]: a name, a media type and
//! an opaque byte payload. Items live in a [`Store`], which maps each name to
//! at most one item.
//!
//! # Storage Backends
//!
//! All backends implement the [`Store`] trait:
//!
//! - [`EphemeralStore`] -- process-local `HashMap` behind a mutex
//! - [`PersistentStore`] -- Redis hashes reached through a connection pool
//!
//! [`open_store`] picks one of them from an optional [`PersistentConfig`].
//!
//! # Design Rules
//!
//! 1. Items are immutable; writing a name replaces whatever was there.
//! 2. A missing name is `Ok(None)`, never an error.
//! 3. Backend failures are always returned, never mapped to an empty result.
//! 4. After [`Store::disconnect`] every operation fails with
//!    [`StoreError::Disconnected`].

pub mod ephemeral;
pub mod error;
pub mod item;
pub mod persistent;
pub mod select;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use ephemeral::EphemeralStore;
pub use error::{StoreError, StoreResult};
pub use item::Item;
pub use persistent::{PersistentConfig, PersistentStore};
pub use select::open_store;
pub use traits::{Backend, Store};
