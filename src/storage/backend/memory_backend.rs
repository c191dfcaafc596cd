//! In-Memory Storage Backend
//!
//! Fallback used when the host cannot provide a durable medium.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::traits::{BackendKind, StorageBackend, StorageResult};

/// Process-local storage backend
///
/// Values live in a map for as long as the backend does. Nothing
/// survives a restart.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    store: RwLock<HashMap<String, Value>>,
}

impl MemoryBackend {
    /// Create an empty backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently held
    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    /// Whether the backend holds no keys
    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Memory
    }

    async fn get(&self, key: &str) -> StorageResult<Option<Value>> {
        Ok(self.store.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> StorageResult<()> {
        self.store.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        self.store.write().await.remove(key);
        Ok(())
    }

    async fn clear(&self) -> StorageResult<()> {
        self.store.write().await.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::backend::StorageBackendExt;
    use serde_json::json;

    #[tokio::test]
    async fn test_memory_backend_basic_operations() {
        let backend = MemoryBackend::new();
        assert_eq!(backend.kind(), BackendKind::Memory);
        assert_eq!(backend.get("missing").await.unwrap(), None);

        let value = json!({"x": 1, "tags": ["a", "b"], "nested": {"ok": true}});
        backend.set("a", value.clone()).await.unwrap();
        assert_eq!(backend.get("a").await.unwrap(), Some(value));

        backend.set("a", json!("replaced")).await.unwrap();
        assert_eq!(backend.get("a").await.unwrap(), Some(json!("replaced")));
    }

    #[tokio::test]
    async fn test_memory_backend_remove_leaves_other_keys() {
        let backend = MemoryBackend::new();
        backend.set("a", json!(1)).await.unwrap();
        backend.set("b", json!(2)).await.unwrap();

        backend.remove("a").await.unwrap();
        assert_eq!(backend.get("a").await.unwrap(), None);
        assert_eq!(backend.get("b").await.unwrap(), Some(json!(2)));

        // Removing an unknown key is fine
        backend.remove("never-set").await.unwrap();
        assert_eq!(backend.len().await, 1);
    }

    #[tokio::test]
    async fn test_memory_backend_clear() {
        let backend = MemoryBackend::new();
        for (i, key) in ["a", "b", "c"].iter().enumerate() {
            backend.set(key, json!(i)).await.unwrap();
        }

        backend.clear().await.unwrap();
        assert!(backend.is_empty().await);
        for key in ["a", "b", "c"] {
            assert_eq!(backend.get(key).await.unwrap(), None);
        }
    }

    #[tokio::test]
    async fn test_memory_backend_keeps_null() {
        let backend = MemoryBackend::new();
        backend.set("n", Value::Null).await.unwrap();
        assert_eq!(backend.get("n").await.unwrap(), Some(Value::Null));
    }

    #[tokio::test]
    async fn test_memory_backend_typed_values() {
        #[derive(serde::Serialize, serde::Deserialize, PartialEq, Debug)]
        struct WindowPrefs {
            scale: f64,
            theme: String,
        }

        let backend = MemoryBackend::new();
        let prefs = WindowPrefs {
            scale: 1.5,
            theme: "dark".to_string(),
        };
        backend.set_as("prefs", &prefs).await.unwrap();

        let read: Option<WindowPrefs> = backend.get_as("prefs").await.unwrap();
        assert_eq!(read, Some(prefs));

        let missing: Option<WindowPrefs> = backend.get_as("other").await.unwrap();
        assert!(missing.is_none());
    }
}
