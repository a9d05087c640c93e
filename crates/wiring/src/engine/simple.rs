//! Simple validator: flat collections, full cross-product fan-out
//!
//! Every trigger implicitly drives every data provider, every provider's data
//! goes through every rule, and every result reaches every result handler.
//! Results are either broadcast one by one or first reduced by an
//! [`Aggregator`](crate::foundation::Aggregator).
//!
//! # Examples
//!
//! ```rust,ignore
//! use nebula_wiring::prelude::*;
//!
//! let trigger = Arc::new(ManualTrigger::new());
//! let validator: SimpleValidator<String, bool> = SimpleValidator::new();
//!
//! validator.add_trigger(trigger.clone());
//! validator.add_data_provider(Arc::new(|| "42".to_string()));
//! validator.add_rule(Arc::new(|s: &String| s.parse::<i64>().is_ok()));
//! validator.add_result_handler(Arc::new(|ok: &bool| println!("valid: {ok}")));
//!
//! trigger.fire(); // prints "valid: true"
//! ```

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use super::diagnostics::{self, Unmatched};
use super::disposal::Disposer;
use super::listener::{Attached, ListenerRegistry, TriggerSink};
use crate::config::EngineConfig;
use crate::foundation::{
    AggregatorRef, DataProvider, DataProviderRef, Handle, ResultHandler, ResultHandlerRef, Rule,
    RuleRef, Trigger, TriggerRef, address_of,
};

// ============================================================================
// RESULT REDUCTION
// ============================================================================

/// What happens to the `providers × rules` results before handlers see them.
enum Reduction<O, A> {
    /// Each result is handed to the handlers as is (only when `O == A`).
    Broadcast(fn(Vec<O>) -> Vec<A>),
    /// All results are folded into one value.
    Aggregate(AggregatorRef<O, A>),
}

impl<O, A> Reduction<O, A> {
    fn reduce(&self, results: Vec<O>) -> Vec<A> {
        match self {
            Self::Broadcast(pass_through) => pass_through(results),
            Self::Aggregate(aggregator) => vec![aggregator.transform(&results)],
        }
    }

    fn is_aggregate(&self) -> bool {
        matches!(self, Self::Aggregate(_))
    }
}

// ============================================================================
// STATE
// ============================================================================

struct SimpleState<D, O, A> {
    triggers: Vec<Handle<dyn Trigger>>,
    data_providers: Vec<Handle<dyn DataProvider<D>>>,
    rules: Vec<Handle<dyn Rule<D, O>>>,
    result_handlers: Vec<Handle<dyn ResultHandler<A>>>,
    listeners: ListenerRegistry,
}

impl<D, O, A> Default for SimpleState<D, O, A> {
    fn default() -> Self {
        Self {
            triggers: Vec::new(),
            data_providers: Vec::new(),
            rules: Vec::new(),
            result_handlers: Vec::new(),
            listeners: ListenerRegistry::default(),
        }
    }
}

/// Removes the first element with identity `addr`.
fn remove_first<T: ?Sized>(items: &mut Vec<Handle<T>>, addr: *const ()) -> Option<Handle<T>> {
    let index = items.iter().position(|item| item.addr() == addr)?;
    Some(items.remove(index))
}

fn to_arcs<T: ?Sized>(items: &[Handle<T>]) -> Vec<Arc<T>> {
    items.iter().map(|item| Arc::clone(item.as_arc())).collect()
}

struct SimpleShared<D, O, A> {
    config: EngineConfig,
    reduction: Reduction<O, A>,
    state: Mutex<SimpleState<D, O, A>>,
}

impl<D, O, A> TriggerSink for SimpleShared<D, O, A> {
    fn process_trigger(&self, trigger: &Handle<dyn Trigger>) {
        let label = self.config.label();
        let _span = tracing::trace_span!("process_trigger", validator = label, trigger = ?trigger)
            .entered();

        // Snapshot, then release the lock: collaborators may call back into
        // this validator while it is processing.
        let (data_providers, rules, result_handlers) = {
            let state = self.state.lock();
            (
                state.data_providers.clone(),
                state.rules.clone(),
                state.result_handlers.clone(),
            )
        };

        if data_providers.is_empty() {
            diagnostics::unmatched(self.config.unmatched, label, Unmatched::DataProvider);
            return;
        }
        if rules.is_empty() && !self.reduction.is_aggregate() {
            diagnostics::unmatched(self.config.unmatched, label, Unmatched::Rule);
            return;
        }

        let mut results = Vec::with_capacity(data_providers.len() * rules.len());
        for provider in &data_providers {
            let data = provider.data();
            for rule in &rules {
                results.push(rule.validate(&data));
            }
        }

        let results = self.reduction.reduce(results);
        if result_handlers.is_empty() {
            diagnostics::unmatched(self.config.unmatched, label, Unmatched::ResultHandler);
            return;
        }
        for result in &results {
            for handler in &result_handlers {
                handler.handle_result(result);
            }
        }
    }
}

// ============================================================================
// SIMPLE VALIDATOR
// ============================================================================

/// Validator wiring flat, unkeyed collections with full cross-product fan-out.
///
/// # Type Parameters
///
/// * `D` - data type supplied by providers and consumed by rules
/// * `O` - rule output
/// * `A` - value handed to result handlers; equals `O` unless an aggregator
///   is installed with [`with_aggregator`](Self::with_aggregator)
///
/// # Processing
///
/// When any added trigger fires, the validator pulls data from each provider
/// in order and evaluates each rule on it, producing `providers × rules`
/// results in provider-major, rule-minor order. Without an aggregator each
/// result is delivered to every handler; with one, the aggregator folds all of
/// them (possibly zero) into a single value that every handler receives.
///
/// No providers means nothing runs, aggregator or not.
///
/// Panics raised by providers, rules or handlers are not caught.
///
/// # Triggers
///
/// A trigger may be added several times; it still gets exactly one listener
/// from this validator, which stays attached until the last occurrence is
/// removed.
pub struct SimpleValidator<D: 'static, O: 'static, A: 'static = O> {
    shared: Arc<SimpleShared<D, O, A>>,
}

impl<D: 'static, O: 'static> SimpleValidator<D, O, O> {
    /// Creates a validator broadcasting each rule result to the handlers.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Like [`new`](Self::new), with explicit configuration.
    pub fn with_config(config: EngineConfig) -> Self {
        Self::from_parts(config, Reduction::Broadcast(|results| results))
    }
}

impl<D: 'static, O: 'static> Default for SimpleValidator<D, O, O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: 'static, O: 'static, A: 'static> SimpleValidator<D, O, A> {
    /// Creates a validator that reduces all rule results of a pass with
    /// `aggregator` and broadcasts the single reduced value.
    pub fn with_aggregator(aggregator: AggregatorRef<O, A>) -> Self {
        Self::with_aggregator_and_config(aggregator, EngineConfig::default())
    }

    /// Like [`with_aggregator`](Self::with_aggregator), with explicit configuration.
    pub fn with_aggregator_and_config(aggregator: AggregatorRef<O, A>, config: EngineConfig) -> Self {
        Self::from_parts(config, Reduction::Aggregate(aggregator))
    }

    fn from_parts(config: EngineConfig, reduction: Reduction<O, A>) -> Self {
        Self {
            shared: Arc::new(SimpleShared {
                config,
                reduction,
                state: Mutex::new(SimpleState::default()),
            }),
        }
    }

    fn sink(&self) -> Weak<dyn TriggerSink> {
        let weak: Weak<SimpleShared<D, O, A>> = Arc::downgrade(&self.shared);
        weak
    }

    fn label(&self) -> &str {
        self.shared.config.label()
    }

    /// The configuration this validator was built with.
    pub fn config(&self) -> &EngineConfig {
        &self.shared.config
    }

    // ------------------------------------------------------------------------
    // Triggers
    // ------------------------------------------------------------------------

    /// Appends `trigger`. The first occurrence attaches this validator's
    /// listener to it; later occurrences only bump its count.
    pub fn add_trigger(&self, trigger: TriggerRef) {
        let trigger = Handle::new(trigger);
        let adapter = {
            let mut state = self.shared.state.lock();
            state.triggers.push(trigger.clone());
            state.listeners.ensure(&trigger, self.sink())
        };
        if let Some(adapter) = adapter {
            Attached::attach(&trigger, adapter);
        }
        tracing::debug!(validator = self.label(), trigger = ?trigger, "trigger added");
    }

    /// Removes the first occurrence of `trigger`. When none remain, the
    /// listener is detached. Unknown triggers are ignored.
    pub fn remove_trigger<T: Trigger + ?Sized>(&self, trigger: &Arc<T>) {
        let addr = address_of(trigger);
        let released = {
            let mut state = self.shared.state.lock();
            let Some(removed) = remove_first(&mut state.triggers, addr) else {
                return;
            };
            if state.triggers.iter().any(|t| t.addr() == addr) {
                None
            } else {
                state.listeners.release(&removed)
            }
        };
        if let Some(attached) = released {
            attached.detach();
        }
        tracing::debug!(validator = self.label(), trigger = ?addr, "trigger removed");
    }

    /// Triggers in insertion order, duplicates included.
    pub fn triggers(&self) -> Vec<TriggerRef> {
        to_arcs(&self.shared.state.lock().triggers)
    }

    /// Number of listeners this validator has attached (one per distinct trigger).
    pub fn listener_count(&self) -> usize {
        self.shared.state.lock().listeners.len()
    }

    // ------------------------------------------------------------------------
    // Data providers, rules, result handlers
    // ------------------------------------------------------------------------

    /// Appends a data provider.
    pub fn add_data_provider(&self, provider: DataProviderRef<D>) {
        self.shared
            .state
            .lock()
            .data_providers
            .push(Handle::new(provider));
    }

    /// Removes the first occurrence of `provider`, if any.
    pub fn remove_data_provider<T: DataProvider<D> + ?Sized>(&self, provider: &Arc<T>) {
        remove_first(
            &mut self.shared.state.lock().data_providers,
            address_of(provider),
        );
    }

    /// Data providers in insertion order.
    pub fn data_providers(&self) -> Vec<DataProviderRef<D>> {
        to_arcs(&self.shared.state.lock().data_providers)
    }

    /// Appends a rule.
    pub fn add_rule(&self, rule: RuleRef<D, O>) {
        self.shared.state.lock().rules.push(Handle::new(rule));
    }

    /// Removes the first occurrence of `rule`, if any.
    pub fn remove_rule<T: Rule<D, O> + ?Sized>(&self, rule: &Arc<T>) {
        remove_first(&mut self.shared.state.lock().rules, address_of(rule));
    }

    /// Rules in insertion order.
    pub fn rules(&self) -> Vec<RuleRef<D, O>> {
        to_arcs(&self.shared.state.lock().rules)
    }

    /// Appends a result handler.
    pub fn add_result_handler(&self, handler: ResultHandlerRef<A>) {
        self.shared
            .state
            .lock()
            .result_handlers
            .push(Handle::new(handler));
    }

    /// Removes the first occurrence of `handler`, if any.
    pub fn remove_result_handler<T: ResultHandler<A> + ?Sized>(&self, handler: &Arc<T>) {
        remove_first(
            &mut self.shared.state.lock().result_handlers,
            address_of(handler),
        );
    }

    /// Result handlers in insertion order.
    pub fn result_handlers(&self) -> Vec<ResultHandlerRef<A>> {
        to_arcs(&self.shared.state.lock().result_handlers)
    }

    // ------------------------------------------------------------------------
    // Disposal
    // ------------------------------------------------------------------------

    /// Detaches every listener, disposes every disposable trigger, provider,
    /// rule and handler (in that order), and clears all collections.
    ///
    /// A second call finds nothing to do.
    pub fn dispose(&self) {
        let mut taken = std::mem::take(&mut *self.shared.state.lock());

        for attached in taken.listeners.release_all() {
            attached.detach();
        }

        let mut disposer = Disposer::new(self.shared.config.disposal);
        for trigger in &taken.triggers {
            disposer.dispose(trigger.addr(), trigger.as_disposable());
        }
        for provider in &taken.data_providers {
            disposer.dispose(provider.addr(), provider.as_disposable());
        }
        for rule in &taken.rules {
            disposer.dispose(rule.addr(), rule.as_disposable());
        }
        for handler in &taken.result_handlers {
            disposer.dispose(handler.addr(), handler.as_disposable());
        }

        tracing::debug!(
            validator = self.label(),
            disposed = disposer.disposed(),
            "validator disposed"
        );
    }
}

impl<D: 'static, O: 'static, A: 'static> Drop for SimpleValidator<D, O, A> {
    fn drop(&mut self) {
        let released = self.shared.state.lock().listeners.release_all();
        for attached in released {
            attached.detach();
        }
    }
}

impl<D: 'static, O: 'static, A: 'static> fmt::Debug for SimpleValidator<D, O, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("SimpleValidator")
            .field("name", &self.shared.config.name)
            .field("aggregated", &self.shared.reduction.is_aggregate())
            .field("triggers", &state.triggers.len())
            .field("data_providers", &state.data_providers.len())
            .field("rules", &state.rules.len())
            .field("result_handlers", &state.result_handlers.len())
            .field("listeners", &state.listeners.len())
            .finish()
    }
}
