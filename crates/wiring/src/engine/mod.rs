//! Validator engines
//!
//! Both validators turn trigger events into rule evaluations and hand the
//! results to result handlers. They differ in how collaborators are linked:
//!
//! - [`SimpleValidator`] links everything to everything and can reduce the
//!   results with an aggregator
//! - [`MappableValidator`] follows explicit one-to-many mappings at each stage

mod association;
mod diagnostics;
mod disposal;
mod listener;

pub mod mappable;
pub mod simple;

pub use mappable::{
    ByResult, ByRule, DefaultMappableValidator, HandlerKeying, MappableValidator,
    ResultMappableValidator,
};
pub use simple::SimpleValidator;
