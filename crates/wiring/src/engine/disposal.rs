//! Cascading disposal
//!
//! A validator's `dispose()` walks its associations in a fixed order and
//! tears down every collaborator that reports a [`Disposable`] capability.
//! Under [`DisposalPolicy::Cascade`] an object is disposed once per place it
//! appears; under [`DisposalPolicy::AtMostOnce`] identities are remembered for
//! the duration of one pass.

use std::collections::HashSet;

use crate::config::DisposalPolicy;
use crate::foundation::Disposable;

pub(crate) struct Disposer {
    policy: DisposalPolicy,
    visited: HashSet<*const ()>,
    disposed: usize,
}

impl Disposer {
    pub(crate) fn new(policy: DisposalPolicy) -> Self {
        Self {
            policy,
            visited: HashSet::new(),
            disposed: 0,
        }
    }

    /// Disposes `target` if it is disposable.
    ///
    /// `identity` is the address of the owning object, used by
    /// [`DisposalPolicy::AtMostOnce`].
    pub(crate) fn dispose(&mut self, identity: *const (), target: Option<&dyn Disposable>) {
        let Some(target) = target else {
            return;
        };
        if self.policy == DisposalPolicy::AtMostOnce && !self.visited.insert(identity) {
            return;
        }
        target.dispose();
        self.disposed += 1;
    }

    /// Number of `dispose()` calls made so far.
    pub(crate) fn disposed(&self) -> usize {
        self.disposed
    }
}
