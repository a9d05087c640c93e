//! Identity keys for shared collaborators
//!
//! Triggers, providers, rules and handlers are compared by *which object*
//! they are, not by value. `Handle` wraps an `Arc` and implements
//! `Eq`/`Hash` on the pointer address, ignoring vtable metadata so the same
//! object seen through two trait-object coercions is still one key.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::{Arc, Weak};

/// Thin address of the object behind `arc`, the identity [`Handle`] compares.
pub fn address_of<T: ?Sized>(arc: &Arc<T>) -> *const () {
    Arc::as_ptr(arc).cast::<()>()
}

/// An `Arc` compared and hashed by address.
pub struct Handle<T: ?Sized>(Arc<T>);

impl<T: ?Sized> Handle<T> {
    /// Wraps `inner`.
    pub fn new(inner: Arc<T>) -> Self {
        Self(inner)
    }

    /// The wrapped `Arc`.
    pub fn as_arc(&self) -> &Arc<T> {
        &self.0
    }

    /// Unwraps into the inner `Arc`.
    pub fn into_arc(self) -> Arc<T> {
        self.0
    }

    /// Creates a weak reference to the same object.
    pub fn downgrade(&self) -> Weak<T> {
        Arc::downgrade(&self.0)
    }

    /// Thin address used for identity.
    pub fn addr(&self) -> *const () {
        address_of(&self.0)
    }
}

impl<T: ?Sized> Clone for Handle<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T: ?Sized> Deref for Handle<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: ?Sized> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.0), Arc::as_ptr(&other.0))
    }
}

impl<T: ?Sized> Eq for Handle<T> {}

impl<T: ?Sized> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

impl<T: ?Sized> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({:p})", self.addr())
    }
}
