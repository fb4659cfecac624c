//! # Merry
//!
//! Declarative `try`/`except`/`else`/`finally` for Rust functions.
//!
//! Instead of spelling out error handling around every call, register a
//! function as *protected*, then attach handlers to it separately:
//! exception handlers keyed by [`ErrorKind`], a success handler for the
//! no-value path, and a cleanup handler that always runs last. Calling the
//! protected function runs it under a block assembled from those pieces.
//!
//! ## Quick Start
//!
//! ```rust
//! use merry::kinds::{ARITHMETIC_ERROR, ZERO_DIVISION_ERROR};
//! use merry::{Exception, Merry, Outcome};
//!
//! let merry = Merry::new();
//!
//! let f = merry.protect("f", |()| -> Outcome<String> {
//!     Err(Exception::new(&ZERO_DIVISION_ERROR, "division by zero"))
//! });
//!
//! // The more specific kind wins over its parent.
//! merry
//!     .on_exception([&ARITHMETIC_ERROR])
//!     .handle(|_e: &Exception| Ok(Some("arithmetic".to_string())))
//!     .unwrap();
//! merry
//!     .on_exception([&ZERO_DIVISION_ERROR])
//!     .handle(|_e: &Exception| Ok(Some("foo".to_string())))
//!     .unwrap();
//! assert_eq!(f.call(()).unwrap().as_deref(), Some("foo"));
//!
//! // A cleanup value overrides whatever the other paths produced.
//! merry.on_cleanup().handle(|| Ok(Some("bar".to_string()))).unwrap();
//! assert_eq!(f.call(()).unwrap().as_deref(), Some("bar"));
//! ```
//!
//! ## Features
//!
//! - **Kind hierarchy**: handlers match subkinds, and the most specific
//!   registered kind is chosen
//! - **Debug mode**: re-raise matched exceptions globally or per kind so a
//!   debugger sees them
//! - **Logging**: every matched exception is logged through `tracing` with
//!   the marker `Exception caught` and a formatted traceback
//! - **Tracing callback**: structured [`MerryEvent`]s for registrations and
//!   caught exceptions
//!
//! ## Main Types
//!
//! - [`Merry`] - the manager owning all registrations
//! - [`Protected`] - a wrapped function, run with [`Protected::call`]
//! - [`Exception`] and [`ErrorKind`] - what protected code raises
//! - [`Namespace`] - a free-form slot for user values, via [`Merry::g`]

mod config;
mod error_kind;
mod exception;
mod macros;
mod merry;
mod merry_event;
mod namespace;
mod policy;
mod protected;
mod registration_error;
mod registry;
mod resolver;

pub use config::{MerryConfig, DEBUG_ENV, LOGGER_ENV};
pub use error_kind::{kinds, Ancestors, ErrorKind};
pub use exception::{Classify, Exception, Outcome};
pub use merry::{
    without_error, ClauseRegistration, ExceptRegistration, Merry, Registered, TraceCallback,
    WeakMerry,
};
pub use merry_event::MerryEvent;
pub use namespace::Namespace;
pub use protected::Protected;
pub use registration_error::RegistrationError;
pub use registry::{FunctionId, Target};
