//! Named one-shot host events.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;
use tracing::debug;

/// Dispatcher for named host events.
///
/// Every listener is one-shot: emitting an event wakes all listeners
/// registered for it and deregisters them in the same step.
#[derive(Debug, Default)]
pub struct EventBus {
    listeners: Mutex<HashMap<String, Vec<oneshot::Sender<()>>>>,
}

impl EventBus {
    /// Create a bus with no listeners
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Vec<oneshot::Sender<()>>>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a listener that completes on the next emission of `event`.
    pub fn listen_once(&self, event: &str) -> oneshot::Receiver<()> {
        let (tx, rx) = oneshot::channel();
        self.lock().entry(event.to_string()).or_default().push(tx);
        debug!("Registered one-shot listener for '{}'", event);
        rx
    }

    /// Emit `event`, returning how many live listeners were woken.
    ///
    /// Listeners whose receiver was already dropped are discarded without
    /// counting.
    pub fn emit(&self, event: &str) -> usize {
        let listeners = self.lock().remove(event).unwrap_or_default();
        let mut woken = 0;
        for tx in listeners {
            if tx.send(()).is_ok() {
                woken += 1;
            }
        }
        debug!("Emitted '{}' to {} listener(s)", event, woken);
        woken
    }

    /// Number of listeners currently waiting on `event`
    pub fn listener_count(&self, event: &str) -> usize {
        self.lock().get(event).map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_emit_wakes_listener_once() {
        let bus = EventBus::new();
        let rx = bus.listen_once("ready");
        assert_eq!(bus.listener_count("ready"), 1);

        assert_eq!(bus.emit("ready"), 1);
        assert!(rx.await.is_ok());

        // Listener was deregistered by the first emission
        assert_eq!(bus.listener_count("ready"), 0);
        assert_eq!(bus.emit("ready"), 0);
    }

    #[test]
    fn test_emit_is_scoped_by_name() {
        let bus = EventBus::new();
        let mut rx = bus.listen_once("ready");

        assert_eq!(bus.emit("other"), 0);
        assert!(rx.try_recv().is_err());
        assert_eq!(bus.listener_count("ready"), 1);

        assert_eq!(bus.emit("ready"), 1);
        assert!(rx.try_recv().is_ok());
    }

    #[test]
    fn test_dropped_listener_not_counted() {
        let bus = EventBus::new();
        let dropped = bus.listen_once("ready");
        let _kept = bus.listen_once("ready");
        drop(dropped);

        assert_eq!(bus.emit("ready"), 1);
    }
}
