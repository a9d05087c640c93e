//! Mappable validator: explicit bipartite associations
//!
//! Instead of a full cross product, each trigger is mapped to specific data
//! providers, each provider to specific rules, and each rule (or each result
//! value) to specific result handlers. Firing a trigger walks only the
//! declared edges.
//!
//! # Absent arguments
//!
//! Every `map_*` / `unmap_*` call takes both sides as `Option`. `None` on one
//! side does **not** mean "nothing yet": it means "remove all associations of
//! the other side".
//!
//! | left | right | effect |
//! |---|---|---|
//! | `None` | `None` | logged, nothing happens |
//! | `None` | `Some(v)` | `v` is removed from every key's sequence |
//! | `Some(k)` | `None` | `k` and all its associations are removed |
//! | `Some(k)` | `Some(v)` | map: append `v` to `k`; unmap: remove one `v` from `k` |
//!
//! So `map_data_provider_to_rule(Some(p), None)` wipes every rule of `p`.
//!
//! # Examples
//!
//! ```rust,ignore
//! use nebula_wiring::prelude::*;
//!
//! let validator: DefaultMappableValidator<String, bool> = MappableValidator::new();
//! let on_edit = Arc::new(ManualTrigger::new());
//! let field: DataProviderRef<String> = Arc::new(|| "42".to_string());
//! let numeric: RuleRef<String, bool> = Arc::new(|s: &String| s.parse::<i64>().is_ok());
//! let icon: ResultHandlerRef<bool> = Arc::new(|ok: &bool| println!("valid: {ok}"));
//!
//! validator.map_trigger_to_data_provider(Some(on_edit.clone()), Some(field.clone()));
//! validator.map_data_provider_to_rule(Some(field), Some(numeric.clone()));
//! validator.map_rule_to_result_handler(Some(numeric), Some(icon));
//!
//! on_edit.fire(); // prints "valid: true"
//! ```

use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use super::association::AssociationMap;
use super::diagnostics::{self, Unmatched};
use super::disposal::Disposer;
use super::listener::{Attached, ListenerRegistry, TriggerSink};
use crate::config::EngineConfig;
use crate::foundation::{
    DataProvider, DataProviderRef, Disposable, Handle, ResultHandler, ResultHandlerRef, Rule,
    RuleRef, Trigger, TriggerRef, address_of,
};

// ============================================================================
// HANDLER KEYING
// ============================================================================

/// Decides what result handlers are keyed by.
///
/// Implemented by [`ByRule`] and [`ByResult`]; the choice is made once, as the
/// third type parameter of [`MappableValidator`].
pub trait HandlerKeying<D, R>: Send + Sync + 'static {
    /// Key of the rule→handler (or result→handler) association.
    type Key: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static;

    /// Key under which handlers for `result`, produced by `rule`, are found.
    fn key_for(rule: &Handle<dyn Rule<D, R>>, result: &R) -> Self::Key;

    /// Teardown capability of a key, consulted by `dispose()`.
    fn key_disposable(key: &Self::Key) -> Option<(*const (), &dyn Disposable)>;
}

/// Result handlers are mapped to the rule that produced the result.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByRule;

/// Result handlers are mapped to result values (e.g. `true` → hide the
/// error icon, `false` → show it).
#[derive(Debug, Clone, Copy, Default)]
pub struct ByResult;

impl<D: 'static, R: 'static> HandlerKeying<D, R> for ByRule {
    type Key = Handle<dyn Rule<D, R>>;

    fn key_for(rule: &Handle<dyn Rule<D, R>>, _result: &R) -> Self::Key {
        rule.clone()
    }

    fn key_disposable(key: &Self::Key) -> Option<(*const (), &dyn Disposable)> {
        key.as_disposable().map(|d| (key.addr(), d))
    }
}

impl<D: 'static, R> HandlerKeying<D, R> for ByResult
where
    R: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static,
{
    type Key = R;

    fn key_for(_rule: &Handle<dyn Rule<D, R>>, result: &R) -> R {
        result.clone()
    }

    fn key_disposable(_key: &R) -> Option<(*const (), &dyn Disposable)> {
        None
    }
}

// ============================================================================
// STATE
// ============================================================================

struct MappableState<D, R, K> {
    triggers_to_data_providers: AssociationMap<Handle<dyn Trigger>, Handle<dyn DataProvider<D>>>,
    data_providers_to_rules: AssociationMap<Handle<dyn DataProvider<D>>, Handle<dyn Rule<D, R>>>,
    keys_to_result_handlers: AssociationMap<K, Handle<dyn ResultHandler<R>>>,
    listeners: ListenerRegistry,
}

impl<D, R, K> Default for MappableState<D, R, K> {
    fn default() -> Self {
        Self {
            triggers_to_data_providers: AssociationMap::default(),
            data_providers_to_rules: AssociationMap::default(),
            keys_to_result_handlers: AssociationMap::default(),
            listeners: ListenerRegistry::default(),
        }
    }
}

struct MappableShared<D, R, K: HandlerKeying<D, R>> {
    config: EngineConfig,
    state: Mutex<MappableState<D, R, K::Key>>,
    _keying: PhantomData<fn() -> K>,
}

impl<D: 'static, R: 'static, K: HandlerKeying<D, R>> TriggerSink for MappableShared<D, R, K> {
    fn process_trigger(&self, trigger: &Handle<dyn Trigger>) {
        let label = self.config.label();
        let level = self.config.unmatched;
        let _span = tracing::trace_span!("process_trigger", validator = label, trigger = ?trigger)
            .entered();

        // Each lookup takes its own snapshot so collaborators may call back
        // into this validator mid-pass.
        let data_providers = self.state.lock().triggers_to_data_providers.get(trigger);
        if data_providers.is_empty() {
            diagnostics::unmatched(level, label, Unmatched::DataProvider);
            return;
        }

        for provider in &data_providers {
            let data = provider.data();
            let rules = self.state.lock().data_providers_to_rules.get(provider);
            if rules.is_empty() {
                diagnostics::unmatched(level, label, Unmatched::Rule);
                continue;
            }

            for rule in &rules {
                let result = rule.validate(&data);
                let key = K::key_for(rule, &result);
                let handlers = self.state.lock().keys_to_result_handlers.get(&key);
                if handlers.is_empty() {
                    diagnostics::unmatched(level, label, Unmatched::ResultHandler);
                    continue;
                }
                for handler in &handlers {
                    handler.handle_result(&result);
                }
            }
        }
    }
}

// ============================================================================
// MAPPABLE VALIDATOR
// ============================================================================

/// Validator whose fan-out follows explicit trigger → provider → rule →
/// handler associations.
///
/// # Type Parameters
///
/// * `D` - data type supplied by providers and consumed by rules
/// * `R` - rule result, handed to result handlers
/// * `K` - [`ByRule`] (default) or [`ByResult`]: what handlers are mapped to
///
/// # Processing
///
/// Firing a trigger visits its providers in the order they were mapped, then
/// for each provider its rules in mapping order, then for each result its
/// handlers in mapping order. A missing link ends that branch with a log line;
/// sibling branches still run. Panics from collaborators are not caught.
///
/// # Listeners
///
/// A trigger gets exactly one listener from this validator while it has at
/// least one mapped provider. The listener is detached when the trigger loses
/// its last provider, whichever call removed it.
pub struct MappableValidator<D: 'static, R: 'static, K: HandlerKeying<D, R> = ByRule> {
    shared: Arc<MappableShared<D, R, K>>,
}

/// Mappable validator whose result handlers are mapped to rules.
pub type DefaultMappableValidator<D, R> = MappableValidator<D, R, ByRule>;

/// Mappable validator whose result handlers are mapped to result values.
pub type ResultMappableValidator<D, R> = MappableValidator<D, R, ByResult>;

impl<D: 'static, R: 'static, K: HandlerKeying<D, R>> Default for MappableValidator<D, R, K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: 'static, R: 'static, K: HandlerKeying<D, R>> MappableValidator<D, R, K> {
    /// Creates an empty validator.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Creates an empty validator with explicit configuration.
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            shared: Arc::new(MappableShared {
                config,
                state: Mutex::new(MappableState::default()),
                _keying: PhantomData,
            }),
        }
    }

    fn sink(&self) -> Weak<dyn TriggerSink> {
        let weak: Weak<MappableShared<D, R, K>> = Arc::downgrade(&self.shared);
        weak
    }

    fn label(&self) -> &str {
        self.shared.config.label()
    }

    /// The configuration this validator was built with.
    pub fn config(&self) -> &EngineConfig {
        &self.shared.config
    }

    fn detach(released: Vec<Attached>) {
        for attached in released {
            attached.detach();
        }
    }

    // ------------------------------------------------------------------------
    // Trigger → data provider
    // ------------------------------------------------------------------------

    /// Maps `trigger` to `provider`; see the [module docs](self) for `None`.
    ///
    /// The first provider mapped to a trigger attaches this validator's
    /// listener to it. The same provider may be mapped twice and will then be
    /// read twice per pass.
    pub fn map_trigger_to_data_provider(
        &self,
        trigger: Option<TriggerRef>,
        provider: Option<DataProviderRef<D>>,
    ) {
        match (trigger, provider) {
            (None, None) => diagnostics::ambiguous_unmap(
                self.shared.config.unmatched,
                self.label(),
                "map_trigger_to_data_provider",
            ),
            (None, Some(provider)) => self.unmap_data_provider_from_all_triggers(provider),
            (Some(trigger), None) => self.unmap_trigger_entirely(trigger),
            (Some(trigger), Some(provider)) => {
                let trigger = Handle::new(trigger);
                let adapter = {
                    let mut state = self.shared.state.lock();
                    state
                        .triggers_to_data_providers
                        .push(trigger.clone(), Handle::new(provider));
                    state.listeners.ensure(&trigger, self.sink())
                };
                if let Some(adapter) = adapter {
                    Attached::attach(&trigger, adapter);
                }
                tracing::debug!(validator = self.label(), trigger = ?trigger, "trigger mapped to data provider");
            }
        }
    }

    /// Removes one `trigger` → `provider` association; see the
    /// [module docs](self) for `None`.
    pub fn unmap_trigger_from_data_provider(
        &self,
        trigger: Option<TriggerRef>,
        provider: Option<DataProviderRef<D>>,
    ) {
        match (trigger, provider) {
            (None, None) => diagnostics::ambiguous_unmap(
                self.shared.config.unmatched,
                self.label(),
                "unmap_trigger_from_data_provider",
            ),
            (None, Some(provider)) => self.unmap_data_provider_from_all_triggers(provider),
            (Some(trigger), None) => self.unmap_trigger_entirely(trigger),
            (Some(trigger), Some(provider)) => {
                let trigger = Handle::new(trigger);
                let released = {
                    let mut state = self.shared.state.lock();
                    let emptied = state
                        .triggers_to_data_providers
                        .remove_one(&trigger, &Handle::new(provider));
                    match emptied {
                        Some(true) => state.listeners.release(&trigger),
                        _ => None,
                    }
                };
                Self::detach(released.into_iter().collect());
            }
        }
    }

    fn unmap_data_provider_from_all_triggers(&self, provider: DataProviderRef<D>) {
        let provider = Handle::new(provider);
        let released: Vec<Attached> = {
            let mut state = self.shared.state.lock();
            let emptied = state
                .triggers_to_data_providers
                .remove_value_everywhere(&provider);
            emptied
                .iter()
                .filter_map(|trigger| state.listeners.release(trigger))
                .collect()
        };
        Self::detach(released);
        tracing::debug!(validator = self.label(), data_provider = ?provider, "data provider unmapped from all triggers");
    }

    fn unmap_trigger_entirely(&self, trigger: TriggerRef) {
        let trigger = Handle::new(trigger);
        let released = {
            let mut state = self.shared.state.lock();
            state.triggers_to_data_providers.remove_key(&trigger);
            state.listeners.release(&trigger)
        };
        Self::detach(released.into_iter().collect());
        tracing::debug!(validator = self.label(), trigger = ?trigger, "trigger unmapped");
    }

    /// Distinct triggers with at least one provider, in first-mapping order.
    pub fn triggers(&self) -> Vec<TriggerRef> {
        self.shared
            .state
            .lock()
            .triggers_to_data_providers
            .keys()
            .map(|trigger| Arc::clone(trigger.as_arc()))
            .collect()
    }

    /// Providers mapped to `trigger`, in mapping order.
    pub fn data_providers_for<T: Trigger + ?Sized>(&self, trigger: &Arc<T>) -> Vec<DataProviderRef<D>> {
        let addr = address_of(trigger);
        self.shared
            .state
            .lock()
            .triggers_to_data_providers
            .find(|key| key.addr() == addr)
            .into_iter()
            .map(Handle::into_arc)
            .collect()
    }

    /// Number of listeners this validator has attached.
    pub fn listener_count(&self) -> usize {
        self.shared.state.lock().listeners.len()
    }

    // ------------------------------------------------------------------------
    // Data provider → rule
    // ------------------------------------------------------------------------

    /// Maps `provider` to `rule`; see the [module docs](self) for `None`.
    pub fn map_data_provider_to_rule(
        &self,
        provider: Option<DataProviderRef<D>>,
        rule: Option<RuleRef<D, R>>,
    ) {
        self.associate_data_provider_and_rule(
            provider,
            rule,
            Mode::Map,
            "map_data_provider_to_rule",
        );
    }

    /// Removes one `provider` → `rule` association; see the
    /// [module docs](self) for `None`.
    pub fn unmap_data_provider_from_rule(
        &self,
        provider: Option<DataProviderRef<D>>,
        rule: Option<RuleRef<D, R>>,
    ) {
        self.associate_data_provider_and_rule(
            provider,
            rule,
            Mode::Unmap,
            "unmap_data_provider_from_rule",
        );
    }

    fn associate_data_provider_and_rule(
        &self,
        provider: Option<DataProviderRef<D>>,
        rule: Option<RuleRef<D, R>>,
        mode: Mode,
        operation: &'static str,
    ) {
        let (provider, rule) = match (provider, rule) {
            (None, None) => {
                diagnostics::ambiguous_unmap(self.shared.config.unmatched, self.label(), operation);
                return;
            }
            (provider, rule) => (provider.map(Handle::new), rule.map(Handle::new)),
        };
        mode.apply(
            &mut self.shared.state.lock().data_providers_to_rules,
            provider,
            rule,
        );
        tracing::debug!(validator = self.label(), operation, "data provider → rule association changed");
    }

    /// Rules mapped to `provider`, in mapping order.
    pub fn rules_for<T: DataProvider<D> + ?Sized>(&self, provider: &Arc<T>) -> Vec<RuleRef<D, R>> {
        let addr = address_of(provider);
        self.shared
            .state
            .lock()
            .data_providers_to_rules
            .find(|key| key.addr() == addr)
            .into_iter()
            .map(Handle::into_arc)
            .collect()
    }

    // ------------------------------------------------------------------------
    // Key → result handler
    // ------------------------------------------------------------------------

    fn associate_key_and_result_handler(
        &self,
        key: Option<K::Key>,
        handler: Option<ResultHandlerRef<R>>,
        mode: Mode,
        operation: &'static str,
    ) {
        if key.is_none() && handler.is_none() {
            diagnostics::ambiguous_unmap(self.shared.config.unmatched, self.label(), operation);
            return;
        }
        mode.apply(
            &mut self.shared.state.lock().keys_to_result_handlers,
            key,
            handler.map(Handle::new),
        );
        tracing::debug!(validator = self.label(), operation, "result handler association changed");
    }

    fn result_handlers_where(&self, pred: impl Fn(&K::Key) -> bool) -> Vec<ResultHandlerRef<R>> {
        self.shared
            .state
            .lock()
            .keys_to_result_handlers
            .find(pred)
            .into_iter()
            .map(Handle::into_arc)
            .collect()
    }

    // ------------------------------------------------------------------------
    // Disposal
    // ------------------------------------------------------------------------

    /// Tears everything down, in this order:
    ///
    /// 1. for each trigger: detach the listener, dispose the trigger, dispose
    ///    each of its providers; then clear trigger → provider
    /// 2. for each provider key: dispose it, dispose each of its rules; clear
    /// 3. for each handler key: dispose it (rules only), dispose each handler;
    ///    clear
    ///
    /// With [`DisposalPolicy::Cascade`](crate::config::DisposalPolicy::Cascade)
    /// an object met in several places is disposed each time.
    pub fn dispose(&self) {
        let mut taken = std::mem::take(&mut *self.shared.state.lock());
        let mut disposer = Disposer::new(self.shared.config.disposal);

        for (trigger, providers) in taken.triggers_to_data_providers.take() {
            if let Some(attached) = taken.listeners.release(&trigger) {
                attached.detach();
            }
            disposer.dispose(trigger.addr(), trigger.as_disposable());
            for provider in &providers {
                disposer.dispose(provider.addr(), provider.as_disposable());
            }
        }
        Self::detach(taken.listeners.release_all());

        for (provider, rules) in taken.data_providers_to_rules.take() {
            disposer.dispose(provider.addr(), provider.as_disposable());
            for rule in &rules {
                disposer.dispose(rule.addr(), rule.as_disposable());
            }
        }

        for (key, handlers) in taken.keys_to_result_handlers.take() {
            if let Some((identity, disposable)) = K::key_disposable(&key) {
                disposer.dispose(identity, Some(disposable));
            }
            for handler in &handlers {
                disposer.dispose(handler.addr(), handler.as_disposable());
            }
        }

        tracing::debug!(
            validator = self.label(),
            disposed = disposer.disposed(),
            "validator disposed"
        );
    }
}

/// Map or unmap, for the two layers without listener bookkeeping.
#[derive(Debug, Clone, Copy)]
enum Mode {
    Map,
    Unmap,
}

impl Mode {
    /// Applies the absent-argument table from the module docs to `map`.
    /// At least one side is `Some`.
    fn apply<K, V>(self, map: &mut AssociationMap<K, V>, key: Option<K>, value: Option<V>)
    where
        K: Hash + Eq + Clone,
        V: PartialEq + Clone,
    {
        match (key, value) {
            (None, None) => {}
            (None, Some(value)) => {
                map.remove_value_everywhere(&value);
            }
            (Some(key), None) => {
                map.remove_key(&key);
            }
            (Some(key), Some(value)) => match self {
                Self::Map => {
                    map.push(key, value);
                }
                Self::Unmap => {
                    map.remove_one(&key, &value);
                }
            },
        }
    }
}

impl<D: 'static, R: 'static> MappableValidator<D, R, ByRule> {
    /// Maps `rule` to `handler`; see the [module docs](self) for `None`.
    pub fn map_rule_to_result_handler(
        &self,
        rule: Option<RuleRef<D, R>>,
        handler: Option<ResultHandlerRef<R>>,
    ) {
        self.associate_key_and_result_handler(
            rule.map(Handle::new),
            handler,
            Mode::Map,
            "map_rule_to_result_handler",
        );
    }

    /// Removes one `rule` → `handler` association; see the
    /// [module docs](self) for `None`.
    pub fn unmap_rule_from_result_handler(
        &self,
        rule: Option<RuleRef<D, R>>,
        handler: Option<ResultHandlerRef<R>>,
    ) {
        self.associate_key_and_result_handler(
            rule.map(Handle::new),
            handler,
            Mode::Unmap,
            "unmap_rule_from_result_handler",
        );
    }

    /// Handlers mapped to `rule`, in mapping order.
    pub fn result_handlers_for<T: Rule<D, R> + ?Sized>(&self, rule: &Arc<T>) -> Vec<ResultHandlerRef<R>> {
        let addr = address_of(rule);
        self.result_handlers_where(|key| key.addr() == addr)
    }
}

impl<D: 'static, R> MappableValidator<D, R, ByResult>
where
    R: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static,
{
    /// Maps the result value `result` to `handler`; see the
    /// [module docs](self) for `None`.
    pub fn map_result_to_result_handler(&self, result: Option<R>, handler: Option<ResultHandlerRef<R>>) {
        self.associate_key_and_result_handler(
            result,
            handler,
            Mode::Map,
            "map_result_to_result_handler",
        );
    }

    /// Removes one `result` → `handler` association; see the
    /// [module docs](self) for `None`.
    pub fn unmap_result_from_result_handler(
        &self,
        result: Option<R>,
        handler: Option<ResultHandlerRef<R>>,
    ) {
        self.associate_key_and_result_handler(
            result,
            handler,
            Mode::Unmap,
            "unmap_result_from_result_handler",
        );
    }

    /// Handlers mapped to the result value `result`, in mapping order.
    pub fn result_handlers_for(&self, result: &R) -> Vec<ResultHandlerRef<R>> {
        self.result_handlers_where(|key| key == result)
    }
}

impl<D: 'static, R: 'static, K: HandlerKeying<D, R>> Drop for MappableValidator<D, R, K> {
    fn drop(&mut self) {
        let released = self.shared.state.lock().listeners.release_all();
        Self::detach(released);
    }
}

impl<D: 'static, R: 'static, K: HandlerKeying<D, R>> fmt::Debug for MappableValidator<D, R, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("MappableValidator")
            .field("name", &self.shared.config.name)
            .field("triggers", &state.triggers_to_data_providers.len())
            .field("data_providers", &state.data_providers_to_rules.len())
            .field("handler_keys", &state.keys_to_result_handlers.len())
            .field("listeners", &state.listeners.len())
            .finish()
    }
}
