//! Host Environment Traits
//!
//! The selector never touches ambient globals. Everything it needs from
//! the hosting environment comes through these two traits.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::oneshot;

use crate::storage::backend::StorageResult;

/// String-only key-value medium exposed by the host.
///
/// Values cross this boundary as strings; encoding structured values is the
/// caller's job.
#[async_trait]
pub trait HubStorage: Send + Sync {
    /// Read the string stored under `key`
    async fn get_item(&self, key: &str) -> StorageResult<Option<String>>;

    /// Store a string under `key`
    async fn set_item(&self, key: &str, value: String) -> StorageResult<()>;

    /// Delete `key`. Deleting an absent key succeeds.
    async fn remove_item(&self, key: &str) -> StorageResult<()>;

    /// Delete every key
    async fn clear(&self) -> StorageResult<()>;
}

/// Capabilities of the hosting environment, injected at construction.
pub trait HostEnvironment: Send + Sync {
    /// Static flag for hosts that support neither the bridge nor structured
    /// storage.
    fn is_constrained(&self) -> bool;

    /// Look up the host bridge.
    ///
    /// `Ok(None)` means the bridge is not enabled yet. Errors (and panics)
    /// are tolerated by the capability probe.
    fn hub_storage(&self) -> anyhow::Result<Option<Arc<dyn HubStorage>>>;

    /// Ask the host to enable the bridge. Fire-and-forget.
    fn request_hub_storage(&self, option: &str);

    /// Register a one-shot listener for a named host event.
    ///
    /// The receiver completes the first time the host emits `event` and
    /// the listener is dropped by the host afterwards.
    fn listen_once(&self, event: &str) -> oneshot::Receiver<()>;

    /// Report a diagnostic to whoever operates the host.
    fn notice(&self, message: &str) {
        tracing::warn!(target: "hubstore::host", "{}", message);
    }
}
