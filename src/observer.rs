//! Callback handles and observer lists.
//!
//! [`Callback`] is the handle type used everywhere a caller registers
//! interest: endpoint subscriptions on [`LcuClient`](crate::LcuClient) and
//! notification channels on [`LiveListener`](crate::LiveListener).
//!
//! Two handles are equal only when they were cloned from the same closure,
//! so registering a clone twice is detectable while two separately built
//! closures with identical bodies are not.
//!
//! # Example
//!
//! ```ignore
//! use lcu_bridge::Callback;
//!
//! let on_phase = Callback::new(|phase: &GameflowPhase| println!("{phase}"));
//! client.on_phase_changed().add(on_phase.clone());
//! client.on_phase_changed().remove(&on_phase);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::any::Any;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::warn;

// ============================================================================
// Callback
// ============================================================================

/// Shared, cloneable callback handle.
pub struct Callback<T: ?Sized> {
    inner: Arc<dyn Fn(&T) + Send + Sync>,
}

impl<T: ?Sized> Callback<T> {
    /// Wraps a closure into a handle.
    #[must_use]
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        Self { inner: Arc::new(f) }
    }

    /// Invokes the callback, containing any panic.
    ///
    /// Returns `false` if the callback panicked.
    pub fn invoke(&self, value: &T) -> bool {
        match catch_unwind(AssertUnwindSafe(|| (self.inner)(value))) {
            Ok(()) => true,
            Err(payload) => {
                warn!(panic = panic_message(&payload), "Callback panicked");
                false
            }
        }
    }
}

impl<T: ?Sized> Clone for Callback<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: ?Sized> PartialEq for Callback<T> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: ?Sized> Eq for Callback<T> {}

impl<T: ?Sized> fmt::Debug for Callback<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Callback")
            .field(&Arc::as_ptr(&self.inner).cast::<()>())
            .finish()
    }
}

/// Extracts a printable message from a panic payload.
pub(crate) fn panic_message(payload: &Box<dyn Any + Send>) -> &str {
    payload
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| payload.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic")
}

// ============================================================================
// Observers
// ============================================================================

/// Ordered list of callbacks for one notification channel.
///
/// Callbacks run in registration order. A panicking callback is logged and
/// the remaining callbacks still run.
pub struct Observers<T: ?Sized> {
    callbacks: RwLock<Vec<Callback<T>>>,
}

impl<T: ?Sized> Default for Observers<T> {
    fn default() -> Self {
        Self {
            callbacks: RwLock::new(Vec::new()),
        }
    }
}

impl<T: ?Sized> fmt::Debug for Observers<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers")
            .field("len", &self.len())
            .finish()
    }
}

impl<T: ?Sized> Observers<T> {
    /// Creates an empty list.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a callback.
    pub fn add(&self, callback: Callback<T>) {
        self.callbacks.write().push(callback);
    }

    /// Removes every registration of `callback`.
    ///
    /// Returns `true` if anything was removed.
    pub fn remove(&self, callback: &Callback<T>) -> bool {
        let mut callbacks = self.callbacks.write();
        let before = callbacks.len();
        callbacks.retain(|c| c != callback);
        callbacks.len() != before
    }

    /// Removes all callbacks.
    pub fn clear(&self) {
        self.callbacks.write().clear();
    }

    /// Returns the number of registered callbacks.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.callbacks.read().len()
    }

    /// Returns `true` if no callback is registered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.callbacks.read().is_empty()
    }

    /// Invokes every callback with `value`.
    ///
    /// The list is snapshotted first so callbacks may add or remove
    /// observers without deadlocking.
    pub fn notify(&self, value: &T) {
        let snapshot: Vec<Callback<T>> = self.callbacks.read().clone();
        for callback in &snapshot {
            callback.invoke(value);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
