//! Per-trigger listener adapters
//!
//! A validator attaches exactly one adapter to each distinct trigger it
//! references. The adapter holds both the validator and the trigger weakly:
//! the trigger owns the adapter (through its listener list), so a strong
//! back-reference would form a cycle that keeps everything alive.

use std::sync::{Arc, Weak};

use indexmap::IndexMap;

use crate::foundation::{Handle, Trigger, TriggerEvent, TriggerListener};

/// Seam between an adapter and the validator that owns it.
pub(crate) trait TriggerSink: Send + Sync {
    /// Runs the validator's pipeline for `trigger`.
    fn process_trigger(&self, trigger: &Handle<dyn Trigger>);
}

/// Listener registered on a trigger on behalf of one validator.
struct TriggerAdapter {
    trigger: Weak<dyn Trigger>,
    sink: Weak<dyn TriggerSink>,
}

impl TriggerListener for TriggerAdapter {
    fn trigger_validation(&self, _event: &TriggerEvent<'_>) {
        let (Some(trigger), Some(sink)) = (self.trigger.upgrade(), self.sink.upgrade()) else {
            return;
        };
        sink.process_trigger(&Handle::new(trigger));
    }
}

/// Adapters currently registered, keyed by trigger identity.
///
/// The registry only bookkeeps. Calling `add_trigger_listener` /
/// `remove_trigger_listener` is left to the caller so it can happen after the
/// validator's lock is released.
#[derive(Default)]
pub(crate) struct ListenerRegistry {
    adapters: IndexMap<Handle<dyn Trigger>, Arc<dyn TriggerListener>>,
}

impl ListenerRegistry {
    /// Creates an adapter for `trigger` unless one exists.
    ///
    /// Returns the new adapter, which the caller must register on the trigger.
    pub(crate) fn ensure(
        &mut self,
        trigger: &Handle<dyn Trigger>,
        sink: Weak<dyn TriggerSink>,
    ) -> Option<Arc<dyn TriggerListener>> {
        if self.adapters.contains_key(trigger) {
            return None;
        }
        let adapter: Arc<dyn TriggerListener> = Arc::new(TriggerAdapter {
            trigger: trigger.downgrade(),
            sink,
        });
        self.adapters.insert(trigger.clone(), Arc::clone(&adapter));
        Some(adapter)
    }

    /// Forgets the adapter for `trigger`, returning it for detachment.
    pub(crate) fn release(&mut self, trigger: &Handle<dyn Trigger>) -> Option<Attached> {
        self.adapters
            .shift_remove_entry(trigger)
            .map(|(trigger, listener)| Attached { trigger, listener })
    }

    /// Forgets every adapter.
    pub(crate) fn release_all(&mut self) -> Vec<Attached> {
        std::mem::take(&mut self.adapters)
            .into_iter()
            .map(|(trigger, listener)| Attached { trigger, listener })
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.adapters.len()
    }
}

/// An adapter released from the registry, still registered on its trigger.
pub(crate) struct Attached {
    trigger: Handle<dyn Trigger>,
    listener: Arc<dyn TriggerListener>,
}

impl Attached {
    pub(crate) fn attach(trigger: &Handle<dyn Trigger>, listener: Arc<dyn TriggerListener>) {
        trigger.add_trigger_listener(listener);
        tracing::debug!(trigger = ?trigger, "trigger listener attached");
    }

    /// Unregisters the adapter from its trigger.
    pub(crate) fn detach(self) -> Handle<dyn Trigger> {
        self.trigger.remove_trigger_listener(&self.listener);
        tracing::debug!(trigger = ?self.trigger, "trigger listener detached");
        self.trigger
    }
}
