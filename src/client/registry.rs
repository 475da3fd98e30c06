//! Endpoint subscription registry.
//!
//! Maps each normalized [`Endpoint`] to the ordered callbacks registered for
//! it and decides when the control channel must subscribe or unsubscribe.
//!
//! # Invariants
//!
//! - A callback handle appears at most once per endpoint.
//! - An endpoint with no callbacks has no entry.
//! - Pinned endpoints never produce an unsubscribe, even with no callbacks.
//! - The action for a change is handled before the change is visible, so
//!   control messages for one endpoint leave in registry order.

// ============================================================================
// Imports
// ============================================================================

use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::{Error, Result};
use crate::observer::Callback;
use crate::protocol::{Endpoint, PROCESS_EXIT_ENDPOINT, SubscriptionMessage};

// ============================================================================
// Types
// ============================================================================

/// Handle type for endpoint subscribers.
pub type Handler = Callback<SubscriptionMessage>;

/// What the control channel must do after a registry change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    /// Nothing to send.
    None,
    /// First callback for the endpoint: send a subscribe.
    Subscribe,
    /// Last callback removed: send an unsubscribe.
    Unsubscribe,
}

// ============================================================================
// SubscriptionRegistry
// ============================================================================

/// Concurrent endpoint → callbacks map.
///
/// Mutation takes the write lock; dispatch clones the callback list under
/// the read lock and invokes it after releasing.
#[derive(Debug)]
pub struct SubscriptionRegistry {
    entries: RwLock<FxHashMap<Endpoint, Vec<Handler>>>,
    pinned: RwLock<FxHashSet<Endpoint>>,
}

impl Default for SubscriptionRegistry {
    fn default() -> Self {
        let mut pinned = FxHashSet::default();
        pinned.insert(Endpoint::new(PROCESS_EXIT_ENDPOINT));

        Self {
            entries: RwLock::new(FxHashMap::default()),
            pinned: RwLock::new(pinned),
        }
    }
}

impl SubscriptionRegistry {
    /// Creates a registry with the process-exit endpoint pinned.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pins an endpoint so it is never unsubscribed automatically.
    pub fn pin(&self, endpoint: Endpoint) {
        self.pinned.write().insert(endpoint);
    }

    /// Returns `true` if the endpoint is pinned.
    #[must_use]
    pub fn is_pinned(&self, endpoint: &Endpoint) -> bool {
        self.pinned.read().contains(endpoint)
    }

    /// Returns every pinned endpoint.
    #[must_use]
    pub fn pinned(&self) -> Vec<Endpoint> {
        let mut pinned: Vec<Endpoint> = self.pinned.read().iter().cloned().collect();
        pinned.sort();
        pinned
    }

    /// Registers `handler` for `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateCallback`] if this handle is already
    /// registered there; the registry is left unchanged.
    pub fn add(&self, endpoint: &Endpoint, handler: Handler) -> Result<ControlAction> {
        self.add_with(endpoint, handler, |_| {})
    }

    /// Registers `handler` and runs `on_action` before releasing the lock.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateCallback`] if this handle is already
    /// registered there; `on_action` is not called.
    pub fn add_with<F>(
        &self,
        endpoint: &Endpoint,
        handler: Handler,
        on_action: F,
    ) -> Result<ControlAction>
    where
        F: FnOnce(ControlAction),
    {
        let mut entries = self.entries.write();

        let action = match entries.get_mut(endpoint) {
            Some(handlers) => {
                if handlers.contains(&handler) {
                    return Err(Error::duplicate_callback(endpoint.as_str()));
                }
                handlers.push(handler);
                ControlAction::None
            }
            None => {
                entries.insert(endpoint.clone(), vec![handler]);
                ControlAction::Subscribe
            }
        };

        on_action(action);
        Ok(action)
    }

    /// Removes one handler, or every handler when `handler` is `None`.
    ///
    /// Returns whether anything was removed and the control action to send.
    pub fn remove(&self, endpoint: &Endpoint, handler: Option<&Handler>) -> (bool, ControlAction) {
        self.remove_with(endpoint, handler, |_| {})
    }

    /// Removes like [`remove`](Self::remove) and runs `on_action` before
    /// releasing the lock.
    pub fn remove_with<F>(
        &self,
        endpoint: &Endpoint,
        handler: Option<&Handler>,
        on_action: F,
    ) -> (bool, ControlAction)
    where
        F: FnOnce(ControlAction),
    {
        let mut entries = self.entries.write();

        let removed = match handler {
            None => entries.remove(endpoint).is_some(),
            Some(handler) => match entries.get_mut(endpoint) {
                Some(handlers) => {
                    let before = handlers.len();
                    handlers.retain(|h| h != handler);
                    let removed = handlers.len() != before;
                    if handlers.is_empty() {
                        entries.remove(endpoint);
                    }
                    removed
                }
                None => false,
            },
        };

        let action = if removed && !entries.contains_key(endpoint) && !self.is_pinned(endpoint) {
            ControlAction::Unsubscribe
        } else {
            ControlAction::None
        };

        on_action(action);
        (removed, action)
    }

    /// Runs `f` over every endpoint to subscribe on a fresh connection:
    /// pinned endpoints first, then those with handlers, without repeats.
    ///
    /// Registrations wait until `f` returns.
    pub fn with_endpoints<R>(&self, f: impl FnOnce(Vec<Endpoint>) -> R) -> R {
        let entries = self.entries.read();

        let mut endpoints = self.pinned();
        let mut registered: Vec<Endpoint> = entries
            .keys()
            .filter(|endpoint| !endpoints.contains(endpoint))
            .cloned()
            .collect();
        registered.sort();
        endpoints.extend(registered);

        f(endpoints)
    }

    /// Returns a snapshot of the handlers for `endpoint`, in registration order.
    #[must_use]
    pub fn handlers(&self, endpoint: &Endpoint) -> Vec<Handler> {
        self.entries
            .read()
            .get(endpoint)
            .cloned()
            .unwrap_or_default()
    }

    /// Invokes every handler for the message's endpoint.
    ///
    /// Returns the number of handlers that ran without panicking.
    pub fn dispatch(&self, message: &SubscriptionMessage) -> usize {
        self.handlers(&message.endpoint)
            .iter()
            .filter(|handler| handler.invoke(message))
            .count()
    }

    /// Returns `true` if `endpoint` has at least one handler.
    #[must_use]
    pub fn contains(&self, endpoint: &Endpoint) -> bool {
        self.entries.read().contains_key(endpoint)
    }

    /// Returns every endpoint with handlers, sorted.
    #[must_use]
    pub fn endpoints(&self) -> Vec<Endpoint> {
        let mut endpoints: Vec<Endpoint> = self.entries.read().keys().cloned().collect();
        endpoints.sort();
        endpoints
    }

    /// Returns the number of endpoints with handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns `true` if no endpoint has handlers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Drops every handler. Pins are kept.
    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use parking_lot::Mutex;
    use serde_json::Value;

    use crate::protocol::EventType;

    fn message(endpoint: &str) -> SubscriptionMessage {
        SubscriptionMessage {
            endpoint: Endpoint::new(endpoint),
            event_type: EventType::Update,
            data: Value::Null,
        }
    }

    #[test]
    fn test_first_add_subscribes() {
        let registry = SubscriptionRegistry::new();
        let endpoint = Endpoint::new("/lol-lobby/v2/lobby");

        let first = registry.add(&endpoint, Handler::new(|_| {})).unwrap();
        let second = registry.add(&endpoint, Handler::new(|_| {})).unwrap();

        assert_eq!(first, ControlAction::Subscribe);
        assert_eq!(second, ControlAction::None);
        assert_eq!(registry.handlers(&endpoint).len(), 2);
    }

    #[test]
    fn test_duplicate_handler_rejected_and_registry_unchanged() {
        let registry = SubscriptionRegistry::new();
        let endpoint = Endpoint::new("/lol-lobby/v2/lobby");
        let handler = Handler::new(|_| {});

        registry.add(&endpoint, handler.clone()).unwrap();
        let err = registry.add(&endpoint, handler.clone()).unwrap_err();

        assert!(matches!(err, Error::DuplicateCallback { .. }));
        assert_eq!(registry.handlers(&endpoint), vec![handler]);
    }

    #[test]
    fn test_same_handler_on_different_endpoints() {
        let registry = SubscriptionRegistry::new();
        let handler = Handler::new(|_| {});

        registry.add(&Endpoint::new("/a"), handler.clone()).unwrap();
        registry.add(&Endpoint::new("/b"), handler).unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_removing_last_handler_removes_entry() {
        let registry = SubscriptionRegistry::new();
        let endpoint = Endpoint::new("/lol-chat/v1/me");
        let a = Handler::new(|_| {});
        let b = Handler::new(|_| {});
        registry.add(&endpoint, a.clone()).unwrap();
        registry.add(&endpoint, b.clone()).unwrap();

        assert_eq!(registry.remove(&endpoint, Some(&a)), (true, ControlAction::None));
        assert!(registry.contains(&endpoint));

        assert_eq!(
            registry.remove(&endpoint, Some(&b)),
            (true, ControlAction::Unsubscribe)
        );
        assert!(!registry.contains(&endpoint));
    }

    #[test]
    fn test_remove_all() {
        let registry = SubscriptionRegistry::new();
        let endpoint = Endpoint::new("/lol-chat/v1/me");
        registry.add(&endpoint, Handler::new(|_| {})).unwrap();
        registry.add(&endpoint, Handler::new(|_| {})).unwrap();

        assert_eq!(registry.remove(&endpoint, None), (true, ControlAction::Unsubscribe));
        assert!(registry.is_empty());
        assert_eq!(registry.remove(&endpoint, None), (false, ControlAction::None));
    }

    #[test]
    fn test_pinned_endpoint_never_unsubscribes() {
        let registry = SubscriptionRegistry::new();
        let endpoint = Endpoint::new(PROCESS_EXIT_ENDPOINT);
        let handler = Handler::new(|_| {});

        assert!(registry.is_pinned(&endpoint));
        registry.add(&endpoint, handler.clone()).unwrap();
        assert_eq!(registry.remove(&endpoint, Some(&handler)), (true, ControlAction::None));
        assert!(!registry.contains(&endpoint));
    }

    #[test]
    fn test_dispatch_order_and_isolation() {
        let registry = SubscriptionRegistry::new();
        let endpoint = Endpoint::new("/lol-gameflow/v1/session");
        let log = Arc::new(Mutex::new(Vec::new()));

        let first = Arc::clone(&log);
        registry
            .add(&endpoint, Handler::new(move |_| first.lock().push(1)))
            .unwrap();
        registry
            .add(&endpoint, Handler::new(|_| panic!("handler failure")))
            .unwrap();
        let third = Arc::clone(&log);
        registry
            .add(&endpoint, Handler::new(move |_| third.lock().push(3)))
            .unwrap();

        let ran = registry.dispatch(&message("/lol-gameflow/v1/session/"));
        assert_eq!(ran, 2);
        assert_eq!(*log.lock(), vec![1, 3]);
    }

    #[test]
    fn test_dispatch_unknown_endpoint() {
        let registry = SubscriptionRegistry::new();
        assert_eq!(registry.dispatch(&message("/nothing")), 0);
    }

    #[test]
    fn test_action_runs_before_change_is_released() {
        let registry = SubscriptionRegistry::new();
        let endpoint = Endpoint::new("/lol-chat/v1/me");
        let handler = Handler::new(|_| {});
        let actions = Arc::new(Mutex::new(Vec::new()));

        let log = Arc::clone(&actions);
        registry
            .add_with(&endpoint, handler.clone(), |action| log.lock().push(action))
            .unwrap();
        let log = Arc::clone(&actions);
        let duplicate = registry.add_with(&endpoint, handler, |action| log.lock().push(action));
        assert!(duplicate.is_err());
        let log = Arc::clone(&actions);
        registry.remove_with(&endpoint, None, |action| log.lock().push(action));

        assert_eq!(
            *actions.lock(),
            vec![ControlAction::Subscribe, ControlAction::Unsubscribe]
        );
    }

    #[test]
    fn test_concurrent_actions_follow_registry_order() {
        let registry = SubscriptionRegistry::new();
        let endpoints: Vec<Endpoint> = (0..500)
            .map(|i| Endpoint::new(format!("/race/{i}")))
            .collect();
        let actions = Arc::new(Mutex::new(Vec::new()));

        std::thread::scope(|scope| {
            scope.spawn(|| {
                for endpoint in &endpoints {
                    let log = Arc::clone(&actions);
                    let _ = registry.add_with(endpoint, Handler::new(|_| {}), |action| {
                        log.lock().push((endpoint.clone(), action));
                    });
                }
            });
            scope.spawn(|| {
                for endpoint in &endpoints {
                    let log = Arc::clone(&actions);
                    registry.remove_with(endpoint, None, |action| {
                        log.lock().push((endpoint.clone(), action));
                    });
                }
            });
        });

        let actions = actions.lock();
        for endpoint in &endpoints {
            let last = actions
                .iter()
                .rev()
                .find(|(e, action)| e == endpoint && *action != ControlAction::None)
                .map(|(_, action)| *action);
            if registry.contains(endpoint) {
                assert_eq!(last, Some(ControlAction::Subscribe), "{endpoint}");
            } else {
                assert_ne!(last, Some(ControlAction::Subscribe), "{endpoint}");
            }
        }
    }

    #[test]
    fn test_with_endpoints_lists_pins_first() {
        let registry = SubscriptionRegistry::new();
        registry.add(&Endpoint::new("/b"), Handler::new(|_| {})).unwrap();
        registry.add(&Endpoint::new("/a"), Handler::new(|_| {})).unwrap();
        registry
            .add(&Endpoint::new(PROCESS_EXIT_ENDPOINT), Handler::new(|_| {}))
            .unwrap();

        let endpoints = registry.with_endpoints(|endpoints| endpoints);
        assert_eq!(
            endpoints,
            vec![
                Endpoint::new(PROCESS_EXIT_ENDPOINT),
                Endpoint::new("/a"),
                Endpoint::new("/b"),
            ]
        );
    }

    #[test]
    fn test_clear_keeps_pins() {
        let registry = SubscriptionRegistry::new();
        registry.pin(Endpoint::new("/lol-gameflow/v1/gameflow-phase"));
        registry.add(&Endpoint::new("/a"), Handler::new(|_| {})).unwrap();

        registry.clear();
        assert!(registry.is_empty());
        assert_eq!(registry.pinned().len(), 2);
    }
}
