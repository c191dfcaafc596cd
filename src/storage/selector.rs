//! Backend selection.
//!
//! The selector decides once which medium the proxy will use:
//!
//! 1. A constrained host gets the in-memory fallback, with a notice.
//! 2. A host whose bridge is already reachable gets the bridge backend.
//! 3. Otherwise the selector asks the host to enable the bridge and waits
//!    for the readiness event before handing out the bridge backend.
//!
//! The decision is memoized in a single-assignment cell. Concurrent first
//! callers share the same in-flight selection.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{oneshot, Mutex as AsyncMutex, OnceCell};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::backend::{HubStorageBackend, MemoryBackend, StorageBackend};
use super::probe::probe;
use crate::host::{HostEnvironment, DEFAULT_ENABLE_REQUEST, DEFAULT_READY_EVENT};

/// Notice emitted when the host supports no durable medium
pub const FALLBACK_NOTICE: &str = "No supported storage backend found. Using in-memory storage.";

/// Notice emitted when the host did not signal readiness in time
pub const HANDSHAKE_TIMEOUT_NOTICE: &str =
    "Host did not enable storage in time. Using in-memory storage.";

/// Selection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Host event announcing the bridge is ready
    pub ready_event: String,
    /// Option string passed with the enable request
    pub enable_request: String,
    /// Give up waiting for the host after this many milliseconds and fall
    /// back to memory. `None` waits forever.
    pub handshake_timeout_ms: Option<u64>,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            ready_event: DEFAULT_READY_EVENT.to_string(),
            enable_request: DEFAULT_ENABLE_REQUEST.to_string(),
            handshake_timeout_ms: None,
        }
    }
}

impl SelectionConfig {
    /// Handshake timeout as a duration
    pub fn handshake_timeout(&self) -> Option<Duration> {
        self.handshake_timeout_ms.map(Duration::from_millis)
    }
}

/// Where the selector is in its one-time run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionState {
    /// Nobody has asked for a backend yet
    Unstarted,
    /// Constrained host, resolved to memory
    ConstrainedFallback,
    /// Checking whether the bridge is reachable
    Probing,
    /// Bridge was reachable, resolved to it
    ImmediatelyAvailable,
    /// Enable request sent, waiting for the readiness event
    AwaitingHandshake,
    /// Readiness event received, resolved to the bridge
    Signaled,
    /// Readiness event never came within the configured timeout
    HandshakeTimedOut,
}

impl SelectionState {
    /// Whether a backend has been chosen
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::ConstrainedFallback
                | Self::ImmediatelyAvailable
                | Self::Signaled
                | Self::HandshakeTimedOut
        )
    }
}

/// Outstanding readiness handshake
struct Handshake {
    ready: oneshot::Receiver<()>,
    deadline: Option<Instant>,
    sender_dropped: bool,
}

impl Handshake {
    /// Wait for the readiness signal. A host that drops the listener
    /// without firing it is treated like one that never answers.
    async fn signaled(&mut self, event: &str) {
        if !self.sender_dropped {
            if (&mut self.ready).await.is_ok() {
                return;
            }
            self.sender_dropped = true;
            warn!(
                "Host dropped the '{}' listener without signaling, waiting indefinitely",
                event
            );
        }
        std::future::pending::<()>().await
    }
}

/// One-shot backend selector
pub struct BackendSelector {
    host: Arc<dyn HostEnvironment>,
    config: SelectionConfig,
    resolved: OnceCell<Arc<dyn StorageBackend>>,
    /// Handshake in flight. Kept here rather than in a caller's future, so
    /// a caller that gives up mid-handshake leaves it for the next one.
    pending: AsyncMutex<Option<Handshake>>,
    state: Mutex<SelectionState>,
    runs: AtomicUsize,
}

impl BackendSelector {
    /// Create a selector for `host`. Nothing runs until the first `resolve`.
    pub fn new(host: Arc<dyn HostEnvironment>, config: SelectionConfig) -> Self {
        Self {
            host,
            config,
            resolved: OnceCell::new(),
            pending: AsyncMutex::new(None),
            state: Mutex::new(SelectionState::Unstarted),
            runs: AtomicUsize::new(0),
        }
    }

    /// Resolve the backend, running the selection on first use.
    ///
    /// Callers arriving while the selection is in flight wait for it; later
    /// callers get the cached backend. Dropping a waiting caller never
    /// restarts the selection.
    pub async fn resolve(&self) -> Arc<dyn StorageBackend> {
        self.resolved.get_or_init(|| self.select()).await.clone()
    }

    /// The backend, if selection has finished
    pub fn resolved(&self) -> Option<Arc<dyn StorageBackend>> {
        self.resolved.get().cloned()
    }

    /// Current selection state
    pub fn state(&self) -> SelectionState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// How many times the selection procedure has started
    pub fn run_count(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }

    /// Selection settings
    pub fn config(&self) -> &SelectionConfig {
        &self.config
    }

    fn transition(&self, next: SelectionState) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        debug!("Selection state {:?} -> {:?}", *state, next);
        *state = next;
    }

    fn bridge_backend(&self) -> Arc<dyn StorageBackend> {
        Arc::new(HubStorageBackend::new(self.host.clone()))
    }

    fn memory_backend(&self, notice: &str) -> Arc<dyn StorageBackend> {
        self.host.notice(notice);
        Arc::new(MemoryBackend::new())
    }

    /// Drive the selection. Only one caller runs this at a time; a caller
    /// resuming after a cancelled one picks up the stored handshake.
    async fn select(&self) -> Arc<dyn StorageBackend> {
        let mut pending = self.pending.lock().await;

        let handshake = match *pending {
            Some(ref mut handshake) => {
                debug!("Resuming handshake left by a cancelled caller");
                handshake
            }
            ref mut slot @ None => match self.start() {
                Ok(backend) => return backend,
                Err(handshake) => slot.insert(handshake),
            },
        };

        let event = self.config.ready_event.as_str();
        match handshake.deadline {
            Some(deadline) => {
                if tokio::time::timeout_at(deadline, handshake.signaled(event))
                    .await
                    .is_err()
                {
                    warn!("No '{}' before the handshake deadline", event);
                    self.transition(SelectionState::HandshakeTimedOut);
                    return self.memory_backend(HANDSHAKE_TIMEOUT_NOTICE);
                }
            }
            None => handshake.signaled(event).await,
        }

        info!("Host signaled '{}', using hub storage", event);
        self.transition(SelectionState::Signaled);
        self.bridge_backend()
    }

    /// Synchronous part of the selection. Returns the backend when no
    /// handshake is needed, otherwise the handshake to wait on.
    fn start(&self) -> Result<Arc<dyn StorageBackend>, Handshake> {
        self.runs.fetch_add(1, Ordering::SeqCst);

        if self.host.is_constrained() {
            self.transition(SelectionState::ConstrainedFallback);
            return Ok(self.memory_backend(FALLBACK_NOTICE));
        }

        self.transition(SelectionState::Probing);
        let host = &self.host;
        if probe(|| Ok(host.hub_storage()?.is_some())) {
            info!("Host bridge reachable, using hub storage");
            self.transition(SelectionState::ImmediatelyAvailable);
            return Ok(self.bridge_backend());
        }

        // Listen before asking: a host may enable the bridge synchronously
        // inside the request
        self.transition(SelectionState::AwaitingHandshake);
        let ready = self.host.listen_once(&self.config.ready_event);
        let deadline = self.config.handshake_timeout().map(|limit| Instant::now() + limit);
        info!(
            "Host bridge not reachable, requesting '{}' and waiting for '{}'",
            self.config.enable_request, self.config.ready_event
        );
        self.host.request_hub_storage(&self.config.enable_request);

        Err(Handshake {
            ready,
            deadline,
            sender_dropped: false,
        })
    }
}

impl std::fmt::Debug for BackendSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendSelector")
            .field("config", &self.config)
            .field("state", &self.state())
            .field("runs", &self.run_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{EventBus, HubStorage, LocalHost, MemoryHubStorage};
    use crate::storage::backend::BackendKind;
    use tokio_test::{assert_pending, assert_ready, task};

    /// Host whose bridge lookup always errors and never signals
    struct BrokenHost {
        events: EventBus,
        panic_on_lookup: bool,
    }

    impl HostEnvironment for BrokenHost {
        fn is_constrained(&self) -> bool {
            false
        }

        fn hub_storage(&self) -> anyhow::Result<Option<Arc<dyn HubStorage>>> {
            if self.panic_on_lookup {
                panic!("hubStorage is not defined");
            }
            Err(anyhow::anyhow!("hubStorage is not defined"))
        }

        fn request_hub_storage(&self, _option: &str) {}

        fn listen_once(&self, event: &str) -> oneshot::Receiver<()> {
            self.events.listen_once(event)
        }
    }

    /// Host that drops every listener it is handed
    struct DeafHost;

    impl HostEnvironment for DeafHost {
        fn is_constrained(&self) -> bool {
            false
        }

        fn hub_storage(&self) -> anyhow::Result<Option<Arc<dyn HubStorage>>> {
            Ok(None)
        }

        fn request_hub_storage(&self, _option: &str) {}

        fn listen_once(&self, _event: &str) -> oneshot::Receiver<()> {
            let (_tx, rx) = oneshot::channel();
            rx
        }
    }

    #[tokio::test]
    async fn test_constrained_host_falls_back_to_memory() {
        let host = Arc::new(LocalHost::constrained());
        let selector = BackendSelector::new(host.clone(), SelectionConfig::default());
        assert_eq!(selector.state(), SelectionState::Unstarted);
        assert!(selector.resolved().is_none());

        let backend = selector.resolve().await;
        assert_eq!(backend.kind(), BackendKind::Memory);
        assert_eq!(selector.state(), SelectionState::ConstrainedFallback);

        // No probe, no handshake
        assert_eq!(host.bridge_lookups(), 0);
        assert!(host.requests().is_empty());
        assert_eq!(host.notices(), vec![FALLBACK_NOTICE.to_string()]);

        // Second resolve reuses the result
        let again = selector.resolve().await;
        assert!(Arc::ptr_eq(&backend, &again));
        assert_eq!(selector.run_count(), 1);
        assert_eq!(host.notices().len(), 1);
    }

    #[tokio::test]
    async fn test_reachable_bridge_resolves_immediately() {
        let host = Arc::new(LocalHost::with_bridge(Arc::new(MemoryHubStorage::new())));
        let selector = BackendSelector::new(host.clone(), SelectionConfig::default());

        let backend = selector.resolve().await;
        assert_eq!(backend.kind(), BackendKind::HubStorage);
        assert_eq!(selector.state(), SelectionState::ImmediatelyAvailable);
        assert!(host.requests().is_empty());
        assert_eq!(host.events().listener_count(DEFAULT_READY_EVENT), 0);
        assert!(host.notices().is_empty());
    }

    #[test]
    fn test_unreachable_bridge_waits_for_signal() {
        let host = Arc::new(LocalHost::new());
        let selector = BackendSelector::new(host.clone(), SelectionConfig::default());

        let mut resolving = task::spawn(selector.resolve());
        assert_pending!(resolving.poll());
        assert_eq!(selector.state(), SelectionState::AwaitingHandshake);
        assert_eq!(host.requests(), vec![DEFAULT_ENABLE_REQUEST.to_string()]);
        assert_eq!(host.events().listener_count(DEFAULT_READY_EVENT), 1);

        // Still waiting after a spurious poll
        assert_pending!(resolving.poll());

        assert_eq!(host.attach_bridge(Arc::new(MemoryHubStorage::new())), 1);
        assert!(resolving.is_woken());
        let backend = assert_ready!(resolving.poll());
        assert_eq!(backend.kind(), BackendKind::HubStorage);
        assert_eq!(selector.state(), SelectionState::Signaled);

        // The listener was consumed by the first signal
        assert_eq!(host.emit_ready(), 0);
        assert_eq!(selector.run_count(), 1);
    }

    #[test]
    fn test_cancelled_caller_does_not_restart_selection() {
        let host = Arc::new(LocalHost::new());
        let selector = BackendSelector::new(host.clone(), SelectionConfig::default());

        let mut first = task::spawn(selector.resolve());
        assert_pending!(first.poll());
        drop(first);

        // The handshake outlives the caller that started it
        assert_eq!(host.events().listener_count(DEFAULT_READY_EVENT), 1);

        let mut second = task::spawn(selector.resolve());
        assert_pending!(second.poll());
        assert_eq!(selector.run_count(), 1);
        assert_eq!(host.requests().len(), 1);
        assert_eq!(host.events().listener_count(DEFAULT_READY_EVENT), 1);

        assert_eq!(host.attach_bridge(Arc::new(MemoryHubStorage::new())), 1);
        assert!(second.is_woken());
        assert_eq!(assert_ready!(second.poll()).kind(), BackendKind::HubStorage);
        assert_eq!(selector.state(), SelectionState::Signaled);
    }

    #[test]
    fn test_signal_while_nobody_waits_is_kept() {
        let host = Arc::new(LocalHost::new());
        let selector = BackendSelector::new(host.clone(), SelectionConfig::default());

        let mut first = task::spawn(selector.resolve());
        assert_pending!(first.poll());
        drop(first);

        host.attach_bridge(Arc::new(MemoryHubStorage::new()));

        let mut second = task::spawn(selector.resolve());
        let backend = assert_ready!(second.poll());
        assert_eq!(backend.kind(), BackendKind::HubStorage);
        assert_eq!(selector.run_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_survives_cancelled_caller() {
        let host = Arc::new(LocalHost::new());
        let config = SelectionConfig {
            handshake_timeout_ms: Some(1000),
            ..SelectionConfig::default()
        };
        let selector = BackendSelector::new(host.clone(), config);

        let early = tokio::time::timeout(Duration::from_millis(600), selector.resolve()).await;
        assert!(early.is_err());
        assert_eq!(selector.state(), SelectionState::AwaitingHandshake);

        // Deadline counts from the enable request, not from this caller
        let started = Instant::now();
        let backend = selector.resolve().await;
        assert_eq!(backend.kind(), BackendKind::Memory);
        assert!(started.elapsed() <= Duration::from_millis(400));
        assert_eq!(selector.state(), SelectionState::HandshakeTimedOut);
        assert_eq!(selector.run_count(), 1);
        assert_eq!(host.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_provisioned_bridge_enabled_on_request() {
        let host = Arc::new(
            LocalHost::new().provision_on_request(Arc::new(MemoryHubStorage::new())),
        );
        let selector = BackendSelector::new(host.clone(), SelectionConfig::default());

        let backend = selector.resolve().await;
        assert_eq!(backend.kind(), BackendKind::HubStorage);
        assert_eq!(selector.state(), SelectionState::Signaled);
        assert_eq!(host.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_custom_event_and_request() {
        let host = Arc::new(
            LocalHost::new()
                .with_ready_event("storage-ready")
                .provision_on_request(Arc::new(MemoryHubStorage::new())),
        );
        let config = SelectionConfig {
            ready_event: "storage-ready".to_string(),
            enable_request: "+storage".to_string(),
            handshake_timeout_ms: None,
        };
        let selector = BackendSelector::new(host.clone(), config);

        assert_eq!(selector.resolve().await.kind(), BackendKind::HubStorage);
        assert_eq!(host.requests(), vec!["+storage".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_lookup_then_timeout_falls_back() {
        let host = Arc::new(BrokenHost {
            events: EventBus::new(),
            panic_on_lookup: false,
        });
        let config = SelectionConfig {
            handshake_timeout_ms: Some(250),
            ..SelectionConfig::default()
        };
        let selector = BackendSelector::new(host.clone(), config);

        let backend = selector.resolve().await;
        assert_eq!(backend.kind(), BackendKind::Memory);
        assert_eq!(selector.state(), SelectionState::HandshakeTimedOut);
    }

    #[test]
    fn test_panicking_lookup_waits_for_signal() {
        let host = Arc::new(BrokenHost {
            events: EventBus::new(),
            panic_on_lookup: true,
        });
        let selector = BackendSelector::new(host.clone(), SelectionConfig::default());

        let mut resolving = task::spawn(selector.resolve());
        assert_pending!(resolving.poll());
        assert_eq!(selector.state(), SelectionState::AwaitingHandshake);
        assert_eq!(host.events.listener_count(DEFAULT_READY_EVENT), 1);
    }

    #[test]
    fn test_dropped_listener_never_resolves() {
        let selector = BackendSelector::new(Arc::new(DeafHost), SelectionConfig::default());

        let mut resolving = task::spawn(selector.resolve());
        assert_pending!(resolving.poll());
        assert_pending!(resolving.poll());
        assert_eq!(selector.state(), SelectionState::AwaitingHandshake);
        assert!(selector.resolved().is_none());
    }

    #[test]
    fn test_selection_config_defaults() {
        let config = SelectionConfig::default();
        assert_eq!(config.ready_event, DEFAULT_READY_EVENT);
        assert_eq!(config.enable_request, DEFAULT_ENABLE_REQUEST);
        assert!(config.handshake_timeout().is_none());

        let config: SelectionConfig =
            serde_json::from_str(r#"{"handshake_timeout_ms": 1500}"#).unwrap();
        assert_eq!(config.handshake_timeout(), Some(Duration::from_millis(1500)));
        assert_eq!(config.ready_event, DEFAULT_READY_EVENT);
    }

    #[test]
    fn test_terminal_states() {
        assert!(!SelectionState::Unstarted.is_terminal());
        assert!(!SelectionState::Probing.is_terminal());
        assert!(!SelectionState::AwaitingHandshake.is_terminal());
        assert!(SelectionState::ConstrainedFallback.is_terminal());
        assert!(SelectionState::ImmediatelyAvailable.is_terminal());
        assert!(SelectionState::Signaled.is_terminal());
        assert!(SelectionState::HandshakeTimedOut.is_terminal());
    }
}
