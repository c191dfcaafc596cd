//! Caller-facing storage proxy.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use super::backend::{BackendKind, StorageBackend, StorageBackendExt, StorageResult};
use super::selector::{BackendSelector, SelectionConfig, SelectionState};
use crate::host::HostEnvironment;

/// Storage proxy that selects the best backend available depending on the
/// environment.
///
/// Every operation first waits for the selector's single resolution, then
/// forwards to the chosen backend. The proxy keeps no storage state and
/// returns backend results untouched. Clones share the same selector.
#[derive(Debug, Clone)]
pub struct StorageProxy {
    selector: Arc<BackendSelector>,
}

impl StorageProxy {
    /// Create a proxy with its own selector for `host`
    pub fn new(host: Arc<dyn HostEnvironment>, config: SelectionConfig) -> Self {
        Self::with_selector(Arc::new(BackendSelector::new(host, config)))
    }

    /// Create a proxy over an existing selector
    pub fn with_selector(selector: Arc<BackendSelector>) -> Self {
        Self { selector }
    }

    /// The selector this proxy defers to
    pub fn selector(&self) -> &Arc<BackendSelector> {
        &self.selector
    }

    /// Resolved backend, running selection if needed
    pub async fn backend(&self) -> Arc<dyn StorageBackend> {
        self.selector.resolve().await
    }

    /// Kind of the resolved backend
    pub async fn kind(&self) -> BackendKind {
        self.backend().await.kind()
    }

    /// Selection state, without triggering selection
    pub fn state(&self) -> SelectionState {
        self.selector.state()
    }

    /// Read the value stored under `key`
    pub async fn get(&self, key: &str) -> StorageResult<Option<Value>> {
        let backend = self.backend().await;
        backend.get(key).await
    }

    /// Store `value` under `key`
    pub async fn set(&self, key: &str, value: Value) -> StorageResult<()> {
        let backend = self.backend().await;
        backend.set(key, value).await
    }

    /// Delete `key`
    pub async fn remove(&self, key: &str) -> StorageResult<()> {
        let backend = self.backend().await;
        backend.remove(key).await
    }

    /// Delete every key
    pub async fn clear(&self) -> StorageResult<()> {
        let backend = self.backend().await;
        backend.clear().await
    }

    /// Read and deserialize a typed value
    pub async fn get_as<T: DeserializeOwned>(&self, key: &str) -> StorageResult<Option<T>> {
        let backend = self.backend().await;
        backend.get_as(key).await
    }

    /// Serialize and store a typed value
    pub async fn set_as<T: Serialize + Send + Sync>(&self, key: &str, value: &T) -> StorageResult<()> {
        let backend = self.backend().await;
        backend.set_as(key, value).await
    }
}
