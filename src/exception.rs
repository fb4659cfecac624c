//! Raised errors.
//!
//! An [`Exception`] is what a protected function (or a handler) "raises" by
//! returning `Err`. It carries an [`ErrorKind`] used for handler lookup, a
//! message, an optional source error, and the backtrace captured at the point
//! it was created. The value is moved through dispatch untouched, so a
//! re-raised exception is the very one the function returned.

use std::backtrace::{Backtrace, BacktraceStatus};
use std::error::Error as StdError;
use std::fmt;

use crate::error_kind::{kinds, ErrorKind};

/// Result type shared by protected functions and every handler.
///
/// `Ok(None)` is the "no value" sentinel: the function finished without
/// producing a result.
pub type Outcome<T> = Result<Option<T>, Exception>;

type BoxedSource = Box<dyn StdError + Send + Sync + 'static>;

/// Displays as `Kind: message`.
#[derive(Debug)]
pub struct Exception {
    kind: &'static ErrorKind,
    message: String,
    source: Option<BoxedSource>,
    backtrace: Backtrace,
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

// Not derived: a `Backtrace` field makes thiserror emit `Error::provide`,
// which is nightly-only.
impl StdError for Exception {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_deref()
            .map(|source| source as &(dyn StdError + 'static))
    }
}

impl Exception {
    /// Creates an exception of `kind`, capturing the current backtrace.
    pub fn new(kind: &'static ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
            backtrace: Backtrace::capture(),
        }
    }

    /// Wraps an existing error. The message is the error's `Display` output
    /// and the error stays reachable through [`StdError::source`].
    pub fn from_error<E>(kind: &'static ErrorKind, error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            kind,
            message: error.to_string(),
            source: Some(Box::new(error)),
            backtrace: Backtrace::capture(),
        }
    }

    pub fn kind(&self) -> &'static ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }

    /// Returns `true` if this exception's kind is `kind` or a subkind of it.
    pub fn is(&self, kind: &ErrorKind) -> bool {
        self.kind.is_subkind_of(kind)
    }

    /// Attempts to downcast the wrapped source error.
    pub fn source_as<E: StdError + 'static>(&self) -> Option<&E> {
        self.source.as_deref().and_then(|e| e.downcast_ref::<E>())
    }

    /// Formats the exception the way it is written to the log: a heading, the
    /// captured frames (when backtraces are enabled), the chain of sources,
    /// and a closing `Kind: message` line.
    pub fn traceback(&self) -> String {
        let mut out = String::from("Traceback:\n");
        match self.backtrace.status() {
            BacktraceStatus::Captured => {
                out.push_str(&self.backtrace.to_string());
                if !out.ends_with('\n') {
                    out.push('\n');
                }
            }
            _ => out.push_str("  <backtrace disabled; set RUST_BACKTRACE=1 to capture frames>\n"),
        }

        let mut source = StdError::source(self);
        while let Some(cause) = source {
            out.push_str(&format!("Caused by: {cause}\n"));
            source = cause.source();
        }

        out.push_str(&format!("{}: {}", self.kind, self.message));
        out
    }
}

/// Errors that know which [`ErrorKind`] they belong to.
///
/// Implementing this lets `?` turn the error into an [`Exception`] inside a
/// protected function or handler.
///
/// ```rust
/// use merry::Outcome;
///
/// fn parse(input: &str) -> Outcome<i64> {
///     Ok(Some(input.trim().parse::<i64>()?))
/// }
///
/// let err = parse("nope").unwrap_err();
/// assert_eq!(err.kind().name(), "ValueError");
/// ```
pub trait Classify: StdError + Send + Sync + 'static {
    fn kind(&self) -> &'static ErrorKind;
}

impl<E: Classify> From<E> for Exception {
    fn from(error: E) -> Self {
        let kind = error.kind();
        Exception::from_error(kind, error)
    }
}

impl Classify for std::io::Error {
    fn kind(&self) -> &'static ErrorKind {
        &kinds::OS_ERROR
    }
}

impl Classify for std::num::ParseIntError {
    fn kind(&self) -> &'static ErrorKind {
        &kinds::VALUE_ERROR
    }
}

impl Classify for std::num::ParseFloatError {
    fn kind(&self) -> &'static ErrorKind {
        &kinds::VALUE_ERROR
    }
}

impl Classify for std::num::TryFromIntError {
    fn kind(&self) -> &'static ErrorKind {
        &kinds::OVERFLOW_ERROR
    }
}
