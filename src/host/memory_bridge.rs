//! In-memory host bridge.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::traits::HubStorage;
use crate::storage::backend::StorageResult;

/// String map standing in for a host bridge.
///
/// Useful for embedding hosts that keep state in process, and for tests.
#[derive(Debug, Default)]
pub struct MemoryHubStorage {
    items: RwLock<HashMap<String, String>>,
}

impl MemoryHubStorage {
    /// Create an empty bridge
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw string stored under `key`, bypassing the async contract
    pub async fn raw(&self, key: &str) -> Option<String> {
        self.items.read().await.get(key).cloned()
    }
}

#[async_trait]
impl HubStorage for MemoryHubStorage {
    async fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.items.read().await.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: String) -> StorageResult<()> {
        self.items.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> StorageResult<()> {
        self.items.write().await.remove(key);
        Ok(())
    }

    async fn clear(&self) -> StorageResult<()> {
        self.items.write().await.clear();
        Ok(())
    }
}
