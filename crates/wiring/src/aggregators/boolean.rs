//! Boolean AND / OR aggregators
//!
//! Both aggregators share the same policy knobs:
//!
//! - `empty_collection_value`: the result for an empty input
//! - `null_element_value`: what a `None` element counts as; when this is
//!   itself `None`, such elements are skipped
//!
//! An input whose elements are all skipped folds to the operator's identity
//! (`true` for AND, `false` for OR), not to `empty_collection_value`.
//!
//! # Examples
//!
//! ```rust,ignore
//! use nebula_wiring::aggregators::{AndBooleanAggregator, OrBooleanAggregator};
//! use nebula_wiring::foundation::Aggregator;
//!
//! let and = AndBooleanAggregator::new();
//! assert!(and.transform(&[] as &[bool]));
//! assert!(!and.transform(&[Some(true), None]));
//!
//! let or = OrBooleanAggregator::new().with_null_element_value(None);
//! assert!(!or.transform(&[None, Some(false)]));
//! ```

use crate::foundation::Aggregator;

/// Folds `elements` starting at `identity`, stopping once the running value
/// equals `absorbing`.
fn fold(
    elements: impl Iterator<Item = Option<bool>>,
    empty_collection_value: bool,
    null_element_value: Option<bool>,
    identity: bool,
    absorbing: bool,
) -> bool {
    let mut elements = elements.peekable();
    if elements.peek().is_none() {
        return empty_collection_value;
    }
    let mut acc = identity;
    for element in elements {
        let Some(value) = element.or(null_element_value) else {
            continue;
        };
        acc = if absorbing { acc || value } else { acc && value };
        if acc == absorbing {
            break;
        }
    }
    acc
}

// ============================================================================
// AND
// ============================================================================

/// Logical conjunction of boolean results.
///
/// Defaults: an empty input yields `true`, a `None` element counts as `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AndBooleanAggregator {
    empty_collection_value: bool,
    null_element_value: Option<bool>,
}

impl Default for AndBooleanAggregator {
    fn default() -> Self {
        Self {
            empty_collection_value: true,
            null_element_value: Some(false),
        }
    }
}

impl AndBooleanAggregator {
    /// Creates an aggregator with the default policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the result for an empty input.
    #[must_use]
    pub fn with_empty_collection_value(mut self, value: bool) -> Self {
        self.empty_collection_value = value;
        self
    }

    /// Sets what a `None` element counts as; `None` skips such elements.
    #[must_use]
    pub fn with_null_element_value(mut self, value: Option<bool>) -> Self {
        self.null_element_value = value;
        self
    }

    pub fn empty_collection_value(&self) -> bool {
        self.empty_collection_value
    }

    pub fn null_element_value(&self) -> Option<bool> {
        self.null_element_value
    }
}

impl Aggregator<Option<bool>, bool> for AndBooleanAggregator {
    fn transform(&self, elements: &[Option<bool>]) -> bool {
        fold(
            elements.iter().copied(),
            self.empty_collection_value,
            self.null_element_value,
            true,
            false,
        )
    }
}

impl Aggregator<bool, bool> for AndBooleanAggregator {
    fn transform(&self, elements: &[bool]) -> bool {
        fold(
            elements.iter().map(|b| Some(*b)),
            self.empty_collection_value,
            self.null_element_value,
            true,
            false,
        )
    }
}

// ============================================================================
// OR
// ============================================================================

/// Logical disjunction of boolean results.
///
/// Defaults: an empty input yields `true` (like AND, not `false`), a `None`
/// element counts as `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrBooleanAggregator {
    empty_collection_value: bool,
    null_element_value: Option<bool>,
}

impl Default for OrBooleanAggregator {
    fn default() -> Self {
        Self {
            empty_collection_value: true,
            null_element_value: Some(false),
        }
    }
}

impl OrBooleanAggregator {
    /// Creates an aggregator with the default policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the result for an empty input.
    #[must_use]
    pub fn with_empty_collection_value(mut self, value: bool) -> Self {
        self.empty_collection_value = value;
        self
    }

    /// Sets what a `None` element counts as; `None` skips such elements.
    #[must_use]
    pub fn with_null_element_value(mut self, value: Option<bool>) -> Self {
        self.null_element_value = value;
        self
    }

    pub fn empty_collection_value(&self) -> bool {
        self.empty_collection_value
    }

    pub fn null_element_value(&self) -> Option<bool> {
        self.null_element_value
    }
}

impl Aggregator<Option<bool>, bool> for OrBooleanAggregator {
    fn transform(&self, elements: &[Option<bool>]) -> bool {
        fold(
            elements.iter().copied(),
            self.empty_collection_value,
            self.null_element_value,
            false,
            true,
        )
    }
}

impl Aggregator<bool, bool> for OrBooleanAggregator {
    fn transform(&self, elements: &[bool]) -> bool {
        fold(
            elements.iter().map(|b| Some(*b)),
            self.empty_collection_value,
            self.null_element_value,
            false,
            true,
        )
    }
}
