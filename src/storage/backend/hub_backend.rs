//! Host Bridge Storage Backend
//!
//! The bridge only stores strings, so values are JSON-encoded on the way in
//! and decoded on the way out. Encoding stays inside this backend.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use super::traits::{BackendKind, StorageBackend, StorageError, StorageResult};
use crate::host::{HostEnvironment, HubStorage};

/// Storage backend talking to the host bridge
///
/// The bridge belongs to the host, so it is looked up on every operation
/// rather than captured once.
pub struct HubStorageBackend {
    host: Arc<dyn HostEnvironment>,
}

impl HubStorageBackend {
    /// Create a backend bound to `host`'s bridge
    pub fn new(host: Arc<dyn HostEnvironment>) -> Self {
        Self { host }
    }

    fn bridge(&self) -> StorageResult<Arc<dyn HubStorage>> {
        match self.host.hub_storage() {
            Ok(Some(bridge)) => Ok(bridge),
            Ok(None) => Err(StorageError::BridgeUnavailable(
                "host has not enabled the bridge".to_string(),
            )),
            Err(e) => Err(StorageError::Bridge(format!("{:#}", e))),
        }
    }
}

/// Encode a value for the string-only transport
pub(crate) fn encode(value: &Value) -> StorageResult<String> {
    serde_json::to_string(value).map_err(|e| StorageError::Serialization(e.to_string()))
}

/// Decode a stored string. `null` reads back as absence.
pub(crate) fn decode(raw: &str) -> StorageResult<Option<Value>> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| StorageError::Deserialization(e.to_string()))?;
    Ok(match value {
        Value::Null => None,
        value => Some(value),
    })
}

#[async_trait]
impl StorageBackend for HubStorageBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::HubStorage
    }

    async fn get(&self, key: &str) -> StorageResult<Option<Value>> {
        match self.bridge()?.get_item(key).await? {
            Some(raw) => decode(&raw),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: Value) -> StorageResult<()> {
        let encoded = encode(&value)?;
        self.bridge()?.set_item(key, encoded).await
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        self.bridge()?.remove_item(key).await
    }

    async fn clear(&self) -> StorageResult<()> {
        self.bridge()?.clear().await
    }
}

impl std::fmt::Debug for HubStorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HubStorageBackend").finish_non_exhaustive()
    }
}
