//! Hubstore - Deferred key-value storage negotiated with the host
//!
//! Hubstore gives callers one asynchronous key-value interface while the
//! storage medium is decided at runtime, possibly only after a handshake
//! with the hosting environment:
//!
//! - **`storage`** - Backend contract, capability probe, one-time backend
//!   selector and the caller-facing proxy
//! - **`host`** - Host environment traits, event bus and bridges
//! - **`config`** - TOML configuration and environment overrides
//! - **`observability`** - Tracing subscriber setup
//!
//! # Features
//!
//! ```toml
//! [dependencies]
//! hubstore = { version = "0.1", default-features = false }
//! # Or with configuration loading and tracing setup:
//! hubstore = { version = "0.1", features = ["all"] }
//! ```
//!
//! # Example
//!
//! ```no_run
//! use hubstore::prelude::*;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! async fn example() -> StorageResult<()> {
//!     // The host enables its bridge when asked
//!     let host = Arc::new(
//!         LocalHost::new().provision_on_request(Arc::new(MemoryHubStorage::new())),
//!     );
//!     let storage = StorageProxy::new(host, SelectionConfig::default());
//!
//!     storage.set("chat-settings", json!({"fontSize": 13})).await?;
//!     assert_eq!(storage.kind().await, BackendKind::HubStorage);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

/// Host environment abstraction
pub mod host;

/// Backend contract, selection and proxy
pub mod storage;

/// Configuration management (enabled with the `config` feature)
#[cfg(feature = "config")]
pub mod config;

/// Observability utilities (enabled with the `observability` feature)
#[cfg(feature = "observability")]
pub mod observability;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::host::{
        EventBus, FileHubStorage, HostEnvironment, HubStorage, LocalHost, MemoryHubStorage,
    };
    pub use crate::storage::{
        BackendKind, BackendSelector, SelectionConfig, SelectionState, StorageBackend,
        StorageBackendExt, StorageError, StorageProxy, StorageResult,
    };

    #[cfg(feature = "config")]
    pub use crate::config::{Configuration, ConfigurationLoader, EnvironmentLoader};

    #[cfg(feature = "observability")]
    pub use crate::observability::init_tracing;
}
