//! Result aggregators
//!
//! Aggregators reduce the `providers × rules` results of a
//! [`SimpleValidator`](crate::engine::SimpleValidator) pass to a single value
//! before the result handlers see it.

pub mod boolean;

pub use boolean::{AndBooleanAggregator, OrBooleanAggregator};
