//! Deferred key-value storage.
//!
//! Callers talk to a [`StorageProxy`]. The proxy waits for a
//! [`BackendSelector`] to pick a medium once, then forwards every operation
//! to the chosen [`StorageBackend`].
//!
//! ## Usage
//!
//! ```rust,no_run
//! use hubstore::host::{LocalHost, MemoryHubStorage};
//! use hubstore::storage::{SelectionConfig, StorageProxy, StorageResult};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! async fn example() -> StorageResult<()> {
//!     let host = Arc::new(LocalHost::with_bridge(Arc::new(MemoryHubStorage::new())));
//!     let storage = StorageProxy::new(host, SelectionConfig::default());
//!
//!     storage.set("panel", json!({"width": 640})).await?;
//!     let panel = storage.get("panel").await?;
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod probe;
pub mod proxy;
pub mod selector;

pub use backend::{
    BackendKind, HubStorageBackend, MemoryBackend, StorageBackend, StorageBackendExt,
    StorageError, StorageResult,
};
pub use probe::probe;
pub use proxy::StorageProxy;
pub use selector::{BackendSelector, SelectionConfig, SelectionState, FALLBACK_NOTICE};
