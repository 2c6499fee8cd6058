//! Single-slot observer registration.
//!
//! Holds at most one observer, weakly. Registering replaces the previous
//! observer without notifying it, and an event arriving while the slot is
//! empty (or its observer has been dropped) has nowhere to go.

use crate::client::TunnelEvents;
use std::sync::{Arc, RwLock, Weak};

/// Last-writer-wins holder for the active observer.
#[derive(Default)]
pub struct ObserverSlot {
    observer: RwLock<Option<Weak<dyn TunnelEvents>>>,
}

impl ObserverSlot {
    /// Create an empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the registered observer.
    ///
    /// Passing `None` clears the slot. Returns true when a still-live
    /// observer was displaced.
    pub fn replace(&self, observer: Option<&Arc<dyn TunnelEvents>>) -> bool {
        let next = observer.map(Arc::downgrade);
        let mut guard = self.observer.write().unwrap_or_else(|e| e.into_inner());
        let previous = std::mem::replace(&mut *guard, next);
        previous.is_some_and(|weak| weak.strong_count() > 0)
    }

    /// Clear the slot only if it still holds `observer`.
    ///
    /// Returns true when the slot was cleared.
    pub fn clear_if(&self, observer: &Arc<dyn TunnelEvents>) -> bool {
        let mut guard = self.observer.write().unwrap_or_else(|e| e.into_inner());
        let held = guard
            .as_ref()
            .is_some_and(|weak| std::ptr::addr_eq(weak.as_ptr(), Arc::as_ptr(observer)));
        if held {
            *guard = None;
        }
        held
    }

    /// Current observer, if one is registered and still alive.
    pub fn current(&self) -> Option<Arc<dyn TunnelEvents>> {
        self.observer
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .and_then(Weak::upgrade)
    }

    /// Check whether a live observer is registered
    pub fn is_occupied(&self) -> bool {
        self.current().is_some()
    }
}
