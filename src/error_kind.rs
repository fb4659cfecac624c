//! Error kinds and the kind hierarchy.
//!
//! Exception handlers are registered against an [`ErrorKind`]. Kinds form a
//! single-parent tree: a handler registered for a kind also catches every
//! subkind of it, and the most specific registered kind wins.
//!
//! Kinds are identified by their address, so they must live in `static`s.
//! Use [`define_error_kind!`](crate::define_error_kind) to declare them.
//!
//! # Examples
//!
//! ```rust
//! use merry::kinds::{ARITHMETIC_ERROR, EXCEPTION, ZERO_DIVISION_ERROR};
//!
//! assert!(ZERO_DIVISION_ERROR.is_subkind_of(&ARITHMETIC_ERROR));
//! assert!(ZERO_DIVISION_ERROR.is_subkind_of(&EXCEPTION));
//! assert!(!ARITHMETIC_ERROR.is_subkind_of(&ZERO_DIVISION_ERROR));
//! ```

use std::fmt;
use std::hash::{Hash, Hasher};

/// A node in the error kind hierarchy.
///
/// Two kinds are equal only if they are the same `static`. Declaring the same
/// name twice produces two unrelated kinds.
pub struct ErrorKind {
    name: &'static str,
    parent: Option<&'static ErrorKind>,
}

impl ErrorKind {
    /// Creates a kind with no parent.
    pub const fn root(name: &'static str) -> Self {
        Self { name, parent: None }
    }

    /// Creates a subkind of `parent`.
    pub const fn new(name: &'static str, parent: &'static ErrorKind) -> Self {
        Self {
            name,
            parent: Some(parent),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn parent(&self) -> Option<&'static ErrorKind> {
        self.parent
    }

    /// Returns `true` if `self` is `other` or descends from it.
    pub fn is_subkind_of(&self, other: &ErrorKind) -> bool {
        self.ancestors().any(|kind| kind == other)
    }

    /// Iterates over `self` followed by each parent up to the root.
    pub fn ancestors(&self) -> Ancestors<'_> {
        Ancestors { next: Some(self) }
    }

    /// Number of parents between `self` and its root.
    pub fn depth(&self) -> usize {
        self.ancestors().count() - 1
    }
}

impl PartialEq for ErrorKind {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

impl Eq for ErrorKind {}

impl Hash for ErrorKind {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(self, state);
    }
}

impl fmt::Debug for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.parent {
            Some(parent) => write!(f, "{}({})", self.name, parent.name),
            None => write!(f, "{}", self.name),
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Iterator returned by [`ErrorKind::ancestors`].
pub struct Ancestors<'a> {
    next: Option<&'a ErrorKind>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a ErrorKind;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.parent.map(|parent| parent as &'a ErrorKind);
        Some(current)
    }
}

/// Built-in kinds, shaped after the usual base exception classes.
pub mod kinds {
    use super::ErrorKind;

    /// Root of the built-in hierarchy. A handler for it catches everything.
    pub static EXCEPTION: ErrorKind = ErrorKind::root("Exception");

    pub static ARITHMETIC_ERROR: ErrorKind = ErrorKind::new("ArithmeticError", &EXCEPTION);
    pub static ZERO_DIVISION_ERROR: ErrorKind =
        ErrorKind::new("ZeroDivisionError", &ARITHMETIC_ERROR);
    pub static OVERFLOW_ERROR: ErrorKind = ErrorKind::new("OverflowError", &ARITHMETIC_ERROR);

    pub static LOOKUP_ERROR: ErrorKind = ErrorKind::new("LookupError", &EXCEPTION);
    pub static KEY_ERROR: ErrorKind = ErrorKind::new("KeyError", &LOOKUP_ERROR);
    pub static INDEX_ERROR: ErrorKind = ErrorKind::new("IndexError", &LOOKUP_ERROR);

    pub static VALUE_ERROR: ErrorKind = ErrorKind::new("ValueError", &EXCEPTION);
    pub static TYPE_ERROR: ErrorKind = ErrorKind::new("TypeError", &EXCEPTION);

    pub static RUNTIME_ERROR: ErrorKind = ErrorKind::new("RuntimeError", &EXCEPTION);
    pub static NOT_IMPLEMENTED_ERROR: ErrorKind =
        ErrorKind::new("NotImplementedError", &RUNTIME_ERROR);

    /// Kind given to `std::io::Error` by [`Classify`](crate::Classify).
    pub static OS_ERROR: ErrorKind = ErrorKind::new("OSError", &EXCEPTION);
}
