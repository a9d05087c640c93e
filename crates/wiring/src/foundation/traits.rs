//! Capability traits for the wiring engine
//!
//! A validator never knows what its collaborators are. It only sees four
//! capability families, plus two optional ones:
//!
//! - [`Trigger`]: tells the validator *when* to run
//! - [`DataProvider`]: supplies *what* to check (pulled on demand)
//! - [`Rule`]: checks it
//! - [`ResultHandler`]: reacts to the outcome
//! - [`Disposable`]: optional teardown, queried through `as_disposable`
//! - [`Aggregator`]: reduces many results to one
//!
//! Data providers, rules and result handlers are implemented for plain
//! closures, so most call sites never need a named type.

use std::fmt;

// ============================================================================
// DISPOSAL
// ============================================================================

/// Optional teardown capability.
///
/// The engine never assumes a collaborator is disposable. Each capability
/// trait exposes `as_disposable`, returning `None` by default, and the engine
/// only calls [`dispose`](Disposable::dispose) when it gets `Some`.
///
/// Implementations must be idempotent: depending on the
/// [`DisposalPolicy`](crate::config::DisposalPolicy), an object reachable from
/// two associations is disposed once per association.
pub trait Disposable: Send + Sync {
    /// Releases whatever the object holds.
    fn dispose(&self);
}

// ============================================================================
// TRIGGER
// ============================================================================

/// Notification delivered by a [`Trigger`] to its listeners.
#[derive(Clone, Copy)]
pub struct TriggerEvent<'a> {
    source: &'a dyn Trigger,
}

impl<'a> TriggerEvent<'a> {
    /// Creates an event originating from `source`.
    pub fn new(source: &'a dyn Trigger) -> Self {
        Self { source }
    }

    /// The trigger that fired.
    pub fn source(&self) -> &'a dyn Trigger {
        self.source
    }
}

impl fmt::Debug for TriggerEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TriggerEvent")
            .field("source", &std::ptr::from_ref(self.source).cast::<()>())
            .finish()
    }
}

/// Receives [`TriggerEvent`]s.
///
/// Validators register exactly one listener per distinct trigger, no matter
/// how many associations reference it.
pub trait TriggerListener: Send + Sync {
    /// Called synchronously, on the firing thread, each time the trigger fires.
    fn trigger_validation(&self, event: &TriggerEvent<'_>);
}

/// Event source signalling "validate now".
///
/// # Examples
///
/// ```rust,ignore
/// use nebula_wiring::prelude::*;
///
/// struct OnSubmit {
///     listeners: TriggerListeners,
/// }
///
/// impl Trigger for OnSubmit {
///     fn add_trigger_listener(&self, listener: Arc<dyn TriggerListener>) {
///         self.listeners.add(listener);
///     }
///
///     fn remove_trigger_listener(&self, listener: &Arc<dyn TriggerListener>) {
///         self.listeners.remove(listener);
///     }
/// }
/// ```
pub trait Trigger: Send + Sync {
    /// Registers `listener`. Adding the same listener twice must not make it
    /// fire twice.
    fn add_trigger_listener(&self, listener: std::sync::Arc<dyn TriggerListener>);

    /// Unregisters `listener`, compared by identity. Unknown listeners are ignored.
    fn remove_trigger_listener(&self, listener: &std::sync::Arc<dyn TriggerListener>);

    /// Teardown capability, if any.
    fn as_disposable(&self) -> Option<&dyn Disposable> {
        None
    }
}

// ============================================================================
// DATA PROVIDER
// ============================================================================

/// Pull-based source of the value to validate.
///
/// Called once per processing pass per association, on the firing thread.
pub trait DataProvider<D>: Send + Sync {
    /// Reads the current value.
    fn data(&self) -> D;

    /// Teardown capability, if any.
    fn as_disposable(&self) -> Option<&dyn Disposable> {
        None
    }
}

impl<D, F> DataProvider<D> for F
where
    F: Fn() -> D + Send + Sync,
{
    fn data(&self) -> D {
        self()
    }
}

// ============================================================================
// RULE
// ============================================================================

/// Pure function from input data to a result.
///
/// # Examples
///
/// ```rust,ignore
/// use nebula_wiring::prelude::*;
///
/// let is_integer: RuleRef<String, bool> = Arc::new(|s: &String| s.parse::<i64>().is_ok());
/// assert!(is_integer.validate(&"42".to_string()));
/// ```
pub trait Rule<D, R>: Send + Sync {
    /// Checks `data` and produces the result.
    fn validate(&self, data: &D) -> R;

    /// Teardown capability, if any.
    fn as_disposable(&self) -> Option<&dyn Disposable> {
        None
    }
}

impl<D, R, F> Rule<D, R> for F
where
    F: Fn(&D) -> R + Send + Sync,
{
    fn validate(&self, data: &D) -> R {
        self(data)
    }
}

// ============================================================================
// RESULT HANDLER
// ============================================================================

/// Consumer of a result, usually a UI update.
///
/// Handlers run in association order and their side effects are often
/// user-visible, so the engine never reorders them.
pub trait ResultHandler<R>: Send + Sync {
    /// Reacts to `result`.
    fn handle_result(&self, result: &R);

    /// Teardown capability, if any.
    fn as_disposable(&self) -> Option<&dyn Disposable> {
        None
    }
}

impl<R, F> ResultHandler<R> for F
where
    F: Fn(&R) + Send + Sync,
{
    fn handle_result(&self, result: &R) {
        self(result);
    }
}

// ============================================================================
// AGGREGATOR
// ============================================================================

/// Reduces a collection of results to a single value.
///
/// Aggregators must define a result for the empty collection: a simple
/// validator with no rules still hands the aggregator an empty slice.
pub trait Aggregator<I, O>: Send + Sync {
    /// Folds `elements` into one value.
    fn transform(&self, elements: &[I]) -> O;
}

impl<I, O, F> Aggregator<I, O> for F
where
    F: Fn(&[I]) -> O + Send + Sync,
{
    fn transform(&self, elements: &[I]) -> O {
        self(elements)
    }
}

// ============================================================================
// SHARED REFERENCES
// ============================================================================

/// Shared trigger reference.
pub type TriggerRef = std::sync::Arc<dyn Trigger>;

/// Shared data provider reference.
pub type DataProviderRef<D> = std::sync::Arc<dyn DataProvider<D>>;

/// Shared rule reference.
pub type RuleRef<D, R> = std::sync::Arc<dyn Rule<D, R>>;

/// Shared result handler reference.
pub type ResultHandlerRef<R> = std::sync::Arc<dyn ResultHandler<R>>;

/// Shared aggregator reference.
pub type AggregatorRef<I, O> = std::sync::Arc<dyn Aggregator<I, O>>;
