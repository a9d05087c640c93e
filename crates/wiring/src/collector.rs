//! Chaining validators through their results
//!
//! A [`ResultCollector`] is a result handler of one validator and, at the same
//! time, a trigger and data provider for another. Each handled result is kept
//! as the latest value and then announced to the collector's listeners.
//!
//! The usual shape is a form: one validator per field, each ending in a
//! collector, and a form-wide [`SimpleValidator`](crate::engine::SimpleValidator)
//! reading every collector and folding them with an
//! [`AndBooleanAggregator`](crate::aggregators::AndBooleanAggregator). Fields
//! that were never validated read as `None`.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::foundation::{DataProvider, Disposable, ResultHandler, Trigger, TriggerListener};
use crate::triggers::TriggerListeners;

/// Remembers the last result it handled and announces every handled result
/// to its listeners.
pub struct ResultCollector<R> {
    last: Mutex<Option<R>>,
    listeners: TriggerListeners,
}

impl<R> Default for ResultCollector<R> {
    fn default() -> Self {
        Self {
            last: Mutex::new(None),
            listeners: TriggerListeners::new(),
        }
    }
}

impl<R: Clone> ResultCollector<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last handled result, if any.
    pub fn last(&self) -> Option<R> {
        self.last.lock().clone()
    }
}

impl<R: Clone + Send + 'static> ResultHandler<R> for ResultCollector<R> {
    fn handle_result(&self, result: &R) {
        *self.last.lock() = Some(result.clone());
        // Listeners usually read `last` back, so the lock must be free here.
        self.listeners.fire(self);
    }

    fn as_disposable(&self) -> Option<&dyn Disposable> {
        Some(self)
    }
}

impl<R: Clone + Send + 'static> Trigger for ResultCollector<R> {
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

impl<R: Clone + Send + 'static> DataProvider<Option<R>> for ResultCollector<R> {
    fn data(&self) -> Option<R> {
        self.last()
    }

    fn as_disposable(&self) -> Option<&dyn Disposable> {
        Some(self)
    }
}

impl<R: Send> Disposable for ResultCollector<R> {
    fn dispose(&self) {
        self.listeners.clear();
        self.last.lock().take();
    }
}

impl<R: fmt::Debug> fmt::Debug for ResultCollector<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultCollector")
            .field("last", &*self.last.lock())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
