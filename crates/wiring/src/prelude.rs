//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use nebula_wiring::prelude::*;
//!
//! let trigger = Arc::new(ManualTrigger::new());
//! let validator: SimpleValidator<String, bool> = SimpleValidator::new();
//! validator.add_trigger(trigger.clone());
//! ```

pub use std::sync::Arc;

// ============================================================================
// FOUNDATION: Capability traits, identity, errors
// ============================================================================

pub use crate::foundation::{
    Aggregator, AggregatorRef, DataProvider, DataProviderRef, Disposable, Handle, ResultHandler,
    ResultHandlerRef, Rule, RuleRef, Trigger, TriggerEvent, TriggerListener, TriggerRef,
    WiringError, WiringResult,
};

// ============================================================================
// ENGINE: Validators and configuration
// ============================================================================

pub use crate::config::{DiagnosticLevel, DisposalPolicy, EngineConfig};
pub use crate::engine::{
    ByResult, ByRule, DefaultMappableValidator, HandlerKeying, MappableValidator,
    ResultMappableValidator, SimpleValidator,
};

// ============================================================================
// BUILDING BLOCKS: Aggregators, triggers, collectors
// ============================================================================

pub use crate::aggregators::{AndBooleanAggregator, OrBooleanAggregator};
pub use crate::collector::ResultCollector;
pub use crate::triggers::{ManualTrigger, TriggerListeners};
