//! In-process host environment.
//!
//! `LocalHost` lets a native composition root play the part of the host:
//! it owns the bridge slot, the readiness event and the constrained flag,
//! and records what the selector asked of it.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tokio::sync::oneshot;
use tracing::{info, warn};

use super::events::EventBus;
use super::traits::{HostEnvironment, HubStorage};
use super::DEFAULT_READY_EVENT;

/// Host environment backed by process state.
pub struct LocalHost {
    constrained: bool,
    ready_event: String,
    bridge: RwLock<Option<Arc<dyn HubStorage>>>,
    provisioned: Mutex<Option<Arc<dyn HubStorage>>>,
    events: EventBus,
    requests: Mutex<Vec<String>>,
    notices: Mutex<Vec<String>>,
    lookups: AtomicUsize,
}

impl LocalHost {
    /// Unconstrained host with no bridge enabled yet
    pub fn new() -> Self {
        Self {
            constrained: false,
            ready_event: DEFAULT_READY_EVENT.to_string(),
            bridge: RwLock::new(None),
            provisioned: Mutex::new(None),
            events: EventBus::new(),
            requests: Mutex::new(Vec::new()),
            notices: Mutex::new(Vec::new()),
            lookups: AtomicUsize::new(0),
        }
    }

    /// Host that supports no durable medium at all
    pub fn constrained() -> Self {
        Self {
            constrained: true,
            ..Self::new()
        }
    }

    /// Host whose constrained flag comes from the environment
    #[cfg(feature = "config")]
    pub fn from_environment(env: &crate::config::EnvironmentLoader) -> Self {
        Self {
            constrained: env.constrained_host().unwrap_or(false),
            ..Self::new()
        }
    }

    /// Unconstrained host whose bridge is reachable from the start
    pub fn with_bridge(bridge: Arc<dyn HubStorage>) -> Self {
        let host = Self::new();
        *host.bridge.write().unwrap_or_else(PoisonError::into_inner) = Some(bridge);
        host
    }

    /// Override the name of the readiness event emitted by `attach_bridge`
    pub fn with_ready_event(mut self, event: impl Into<String>) -> Self {
        self.ready_event = event.into();
        self
    }

    /// Keep `bridge` aside and attach it when the host receives an enable
    /// request.
    pub fn provision_on_request(self, bridge: Arc<dyn HubStorage>) -> Self {
        *self.provisioned.lock().unwrap_or_else(PoisonError::into_inner) = Some(bridge);
        self
    }

    /// Install the bridge and emit the readiness event.
    ///
    /// Returns the number of listeners woken.
    pub fn attach_bridge(&self, bridge: Arc<dyn HubStorage>) -> usize {
        *self.bridge.write().unwrap_or_else(PoisonError::into_inner) = Some(bridge);
        info!("Host bridge attached, emitting '{}'", self.ready_event);
        self.events.emit(&self.ready_event)
    }

    /// Remove the bridge. Backends already resolved to it start failing.
    pub fn detach_bridge(&self) {
        *self.bridge.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Emit the readiness event without touching the bridge slot
    pub fn emit_ready(&self) -> usize {
        self.events.emit(&self.ready_event)
    }

    /// Event bus carrying host events
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Name of the readiness event
    pub fn ready_event(&self) -> &str {
        &self.ready_event
    }

    /// Enable requests received so far, oldest first
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Diagnostic notices received so far, oldest first
    pub fn notices(&self) -> Vec<String> {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// How many times the bridge slot has been looked up
    pub fn bridge_lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl Default for LocalHost {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LocalHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalHost")
            .field("constrained", &self.constrained)
            .field("ready_event", &self.ready_event)
            .field("bridge_attached", &self.bridge.read().map(|b| b.is_some()).unwrap_or(false))
            .field("requests", &self.requests())
            .finish()
    }
}

impl HostEnvironment for LocalHost {
    fn is_constrained(&self) -> bool {
        self.constrained
    }

    fn hub_storage(&self) -> anyhow::Result<Option<Arc<dyn HubStorage>>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let bridge = self
            .bridge
            .read()
            .map_err(|_| anyhow::anyhow!("bridge slot poisoned"))?;
        Ok(bridge.clone())
    }

    fn request_hub_storage(&self, option: &str) {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(option.to_string());

        let provisioned = self
            .provisioned
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match provisioned {
            Some(bridge) => {
                self.attach_bridge(bridge);
            }
            None => info!("Enable request '{}' recorded, no bridge provisioned", option),
        }
    }

    fn listen_once(&self, event: &str) -> oneshot::Receiver<()> {
        self.events.listen_once(event)
    }

    fn notice(&self, message: &str) {
        warn!(target: "hubstore::host", "{}", message);
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_string());
    }
}
