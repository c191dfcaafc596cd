//! Storage Backend Traits
//!
//! Defines the four-operation contract every storage medium satisfies.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Error types for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// IO error during a bridge operation
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Value could not be encoded for a string-only medium
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Stored representation could not be decoded
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// The host bridge is not reachable
    #[error("Host bridge unavailable: {0}")]
    BridgeUnavailable(String),

    /// The host failed while handing out its bridge
    #[error("Bridge error: {0}")]
    Bridge(String),
}

/// Kind of storage medium behind a backend.
///
/// The discriminants are stable identifiers and may be persisted or
/// reported to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Process-local map, lost when the process exits
    Memory = 0,
    /// Host-provided string-only key-value bridge
    HubStorage = 1,
    /// Structured storage medium. Reserved: no backend implements it yet,
    /// and the selector never resolves to it.
    StructuredStorage = 2,
}

impl BackendKind {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::HubStorage => "hub_storage",
            Self::StructuredStorage => "structured_storage",
        }
    }

    /// Whether values stored in this medium outlive the process.
    pub fn is_durable(&self) -> bool {
        !matches!(self, Self::Memory)
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Core trait for storage backends
///
/// Every medium the selector can resolve to implements these four
/// operations. Keys are opaque strings; values are JSON-compatible.
#[async_trait]
pub trait StorageBackend: Send + Sync + std::fmt::Debug {
    /// Kind of medium this backend talks to
    fn kind(&self) -> BackendKind;

    /// Read the value stored under `key`, `None` if absent
    async fn get(&self, key: &str) -> StorageResult<Option<Value>>;

    /// Store `value` under `key`, replacing any prior value
    async fn set(&self, key: &str, value: Value) -> StorageResult<()>;

    /// Delete the association for `key`
    async fn remove(&self, key: &str) -> StorageResult<()>;

    /// Delete every association
    async fn clear(&self) -> StorageResult<()>;
}

/// Extension trait for typed values
///
/// Converts through `serde_json::Value` so any backend can store
/// `Serialize` types without knowing about them.
#[async_trait]
pub trait StorageBackendExt: StorageBackend {
    /// Serialize and store a value
    async fn set_as<T: Serialize + Send + Sync>(&self, key: &str, value: &T) -> StorageResult<()> {
        let value =
            serde_json::to_value(value).map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.set(key, value).await
    }

    /// Read and deserialize a value
    async fn get_as<T: serde::de::DeserializeOwned>(&self, key: &str) -> StorageResult<Option<T>> {
        match self.get(key).await? {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| StorageError::Deserialization(e.to_string())),
            None => Ok(None),
        }
    }
}

// Blanket implementation for all StorageBackend implementors
impl<T: StorageBackend + ?Sized> StorageBackendExt for T {}
