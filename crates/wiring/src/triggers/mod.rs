//! Trigger building blocks
//!
//! [`TriggerListeners`] is the listener bookkeeping every trigger needs;
//! [`ManualTrigger`] is a trigger fired explicitly from code (a submit
//! button, a timer callback, a test).

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::foundation::{Disposable, Trigger, TriggerEvent, TriggerListener};

/// Ordered set of trigger listeners, compared by identity.
///
/// Firing snapshots the list first, so listeners may add or remove listeners
/// (including themselves) while being notified.
#[derive(Default)]
pub struct TriggerListeners {
    listeners: Mutex<Vec<Arc<dyn TriggerListener>>>,
}

impl TriggerListeners {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `listener` unless it is already present.
    pub fn add(&self, listener: Arc<dyn TriggerListener>) {
        let mut listeners = self.listeners.lock();
        if !listeners.iter().any(|l| Arc::ptr_eq(l, &listener)) {
            listeners.push(listener);
        }
    }

    /// Removes `listener` if present.
    pub fn remove(&self, listener: &Arc<dyn TriggerListener>) {
        self.listeners.lock().retain(|l| !Arc::ptr_eq(l, listener));
    }

    /// Notifies every listener, in registration order, that `source` fired.
    pub fn fire(&self, source: &dyn Trigger) {
        let snapshot = self.listeners.lock().clone();
        let event = TriggerEvent::new(source);
        for listener in &snapshot {
            listener.trigger_validation(&event);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.lock().is_empty()
    }

    /// Removes every listener.
    pub fn clear(&self) {
        self.listeners.lock().clear();
    }
}

impl fmt::Debug for TriggerListeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TriggerListeners")
            .field("len", &self.len())
            .finish()
    }
}

/// Trigger fired by calling [`fire`](ManualTrigger::fire).
///
/// Disposing it drops all listeners.
#[derive(Debug, Default)]
pub struct ManualTrigger {
    listeners: TriggerListeners,
}

impl ManualTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifies every listener synchronously.
    pub fn fire(&self) {
        tracing::trace!(listeners = self.listeners.len(), "manual trigger fired");
        self.listeners.fire(self);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl Trigger for ManualTrigger {
    fn add_trigger_listener(&self, listener: Arc<dyn TriggerListener>) {
        self.listeners.add(listener);
    }

    fn remove_trigger_listener(&self, listener: &Arc<dyn TriggerListener>) {
        self.listeners.remove(listener);
    }

    fn as_disposable(&self) -> Option<&dyn Disposable> {
        Some(self)
    }
}

impl Disposable for ManualTrigger {
    fn dispose(&self) {
        self.listeners.clear();
    }
}
