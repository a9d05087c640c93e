//! # nebula-wiring
//!
//! Validation wiring: connects *when* to validate (triggers), *what* to
//! validate (data providers), *how* to validate (rules) and *what to do with
//! the outcome* (result handlers).
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use nebula_wiring::prelude::*;
//!
//! let submit = Arc::new(ManualTrigger::new());
//! let validator: SimpleValidator<String, bool> = SimpleValidator::new();
//!
//! validator.add_trigger(submit.clone());
//! validator.add_data_provider(Arc::new(|| "42".to_string()));
//! validator.add_rule(Arc::new(|s: &String| s.parse::<i64>().is_ok()));
//! validator.add_result_handler(Arc::new(|ok: &bool| println!("valid: {ok}")));
//!
//! submit.fire();
//! ```
//!
//! ## Validators
//!
//! - [`SimpleValidator`](engine::SimpleValidator): every trigger drives every
//!   provider, rule and handler; results may be reduced by an
//!   [`Aggregator`](foundation::Aggregator)
//! - [`MappableValidator`](engine::MappableValidator): explicit mappings
//!   trigger → providers → rules → handlers, with handlers keyed by rule
//!   ([`ByRule`](engine::ByRule)) or by result value
//!   ([`ByResult`](engine::ByResult))
//!
//! Validation runs synchronously on the thread that fires the trigger.

pub mod aggregators;
pub mod collector;
pub mod config;
pub mod engine;
pub mod foundation;
pub mod prelude;
pub mod triggers;
