//! A free-form, type-keyed bag for user values.
//!
//! Each [`Merry`](crate::Merry) owns one [`Namespace`] (reachable through
//! [`Merry::g`](crate::Merry::g)). Handlers use it to leave values for each
//! other or for the caller. The dispatch machinery never reads or writes it.
//!
//! Values are stored per type: inserting a second value of the same type
//! replaces the first. Wrap values in newtypes to keep them apart.
//!
//! # Examples
//!
//! ```rust
//! use merry::Namespace;
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct ExceptCalled(bool);
//!
//! let g = Namespace::new();
//! assert!(!g.contains::<ExceptCalled>());
//!
//! g.insert(ExceptCalled(true));
//! assert_eq!(g.get_cloned::<ExceptCalled>(), Some(ExceptCalled(true)));
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

type Slots = HashMap<TypeId, Arc<dyn Any + Send + Sync>>;

/// Shared user-data slot. Cloning yields another handle to the same storage.
#[derive(Clone, Default)]
pub struct Namespace {
    slots: Arc<Mutex<Slots>>,
}

impl Namespace {
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> MutexGuard<'_, Slots> {
        // Inserts are plain overwrites, so a poisoned map is still usable.
        self.slots.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Stores `value`, replacing any earlier value of the same type.
    pub fn insert<T: Send + Sync + 'static>(&self, value: T) {
        self.insert_arc(Arc::new(value));
    }

    /// Stores an `Arc`-wrapped value without re-wrapping it.
    pub fn insert_arc<T: Send + Sync + 'static>(&self, value: Arc<T>) {
        self.slots().insert(TypeId::of::<T>(), value);
    }

    /// Returns the stored value of type `T`, if any.
    pub fn get<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        let any_arc = self.slots().get(&TypeId::of::<T>()).cloned()?;
        any_arc.downcast::<T>().ok()
    }

    /// Returns a clone of the stored value of type `T`, if any.
    pub fn get_cloned<T: Send + Sync + Clone + 'static>(&self) -> Option<T> {
        self.get::<T>().map(|arc| (*arc).clone())
    }

    pub fn contains<T: Send + Sync + 'static>(&self) -> bool {
        self.slots().contains_key(&TypeId::of::<T>())
    }

    /// Removes and returns the stored value of type `T`.
    pub fn remove<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        let any_arc = self.slots().remove(&TypeId::of::<T>())?;
        any_arc.downcast::<T>().ok()
    }

    pub fn len(&self) -> usize {
        self.slots().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots().is_empty()
    }

    pub fn clear(&self) {
        self.slots().clear();
    }
}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Namespace")
            .field("len", &self.len())
            .finish()
    }
}
