//! Storage Backend Abstraction
//!
//! Every medium the proxy can end up on implements [`StorageBackend`].
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │    StorageProxy     │
//! │  (caller-facing)    │
//! └──────────┬──────────┘
//!            │
//! ┌──────────▼──────────┐
//! │   StorageBackend    │  <-- Trait
//! │      (async)        │
//! └──────────┬──────────┘
//!            │
//!     ┌──────┴──────┬─────────────────┐
//!     │             │                 │
//! ┌───▼───┐   ┌─────▼─────┐   ┌───────▼───────┐
//! │Memory │   │HubStorage │   │  Structured   │
//! │Backend│   │  Backend  │   │  (reserved)   │
//! └───────┘   └───────────┘   └───────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use hubstore::storage::backend::{MemoryBackend, StorageBackend};
//! use serde_json::json;
//!
//! async fn example() -> hubstore::storage::backend::StorageResult<()> {
//!     let backend = MemoryBackend::new();
//!     backend.set("key", json!({"x": 1})).await?;
//!     let value = backend.get("key").await?;
//!     assert_eq!(value, Some(json!({"x": 1})));
//!     Ok(())
//! }
//! ```

mod hub_backend;
mod memory_backend;
mod traits;

pub use hub_backend::HubStorageBackend;
pub use memory_backend::MemoryBackend;
pub use traits::*;
