//! The dispatch wrapper around a protected function.
//!
//! [`Protected::call`] runs the wrapped function as if it were written inside
//! a `try`/`except`/`else`/`finally` block assembled from the handlers
//! registered on its manager:
//!
//! 1. the function returns a value: no success or exception handler runs;
//! 2. the function returns `Ok(None)`: the success handler runs, if any, and
//!    its outcome becomes the result;
//! 3. the function returns `Err(e)`: the most specific matching exception
//!    handler is looked up. With no match `e` is re-raised untouched. With a
//!    match the exception is logged, then either re-raised (debug policy) or
//!    passed to the handler, whose outcome becomes the result;
//! 4. the cleanup handler, if any, always runs last. A value it returns
//!    replaces the result, even when an exception was on its way out. An
//!    exception it raises replaces the result too.
//!
//! Handlers are looked up afresh on every call and invoked without the
//! registry lock held.

use std::fmt;
use std::sync::Arc;

use crate::exception::{Exception, Outcome};
use crate::merry::Shared;
use crate::merry_event::MerryEvent;
use crate::registry::{FunctionId, Target};

type Body<A, T> = Arc<dyn Fn(A) -> Outcome<T> + Send + Sync>;

/// A function wrapped by [`Merry::protect`](crate::Merry::protect).
///
/// `A` is the argument (use a tuple for several, `()` for none) and `T` the
/// value type shared with all of the function's handlers.
pub struct Protected<A, T> {
    shared: Arc<Shared>,
    id: FunctionId,
    name: Arc<str>,
    body: Body<A, T>,
}

impl<A, T> Clone for Protected<A, T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
            id: self.id,
            name: self.name.clone(),
            body: self.body.clone(),
        }
    }
}

impl<A, T> fmt::Debug for Protected<A, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Protected")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}

impl<A, T> From<&Protected<A, T>> for Target {
    fn from(protected: &Protected<A, T>) -> Self {
        Target::Id(protected.id)
    }
}

impl<A, T: 'static> Protected<A, T> {
    pub(crate) fn new(shared: Arc<Shared>, id: FunctionId, name: String, body: Body<A, T>) -> Self {
        Self {
            shared,
            id,
            name: name.into(),
            body,
        }
    }

    pub fn id(&self) -> FunctionId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Runs the function under its registered handlers.
    ///
    /// `Ok(None)` means neither the function nor any handler produced a
    /// value. `Err` carries either the function's own exception, untouched,
    /// or one raised by a handler.
    pub fn call(&self, args: A) -> Outcome<T> {
        let tentative = match (self.body)(args) {
            Ok(Some(value)) => Ok(Some(value)),
            Ok(None) => self.on_success(),
            Err(exception) => self.on_exception(exception),
        };
        self.finalize(tentative)
    }

    fn on_success(&self) -> Outcome<T> {
        let handler = self.shared.registry().success_handler::<T>(self.id);
        match handler {
            Some(handler) => handler(),
            None => Ok(None),
        }
    }

    fn on_exception(&self, exception: Exception) -> Outcome<T> {
        let matched = self
            .shared
            .registry()
            .match_handler::<T>(self.id, &exception);
        let Some(matched) = matched else {
            return Err(exception);
        };

        tracing::error!(
            logger = %self.shared.logger_name,
            function = %self.name,
            kind = exception.kind().name(),
            "[merry] Exception caught\n{}",
            exception.traceback()
        );
        self.shared.emit_event(&MerryEvent::Caught {
            function: self.name.to_string(),
            raised: exception.kind().name(),
            matched: matched.kind.name(),
            bubbled: matched.bubble,
        });

        if matched.bubble {
            return Err(exception);
        }
        (matched.handler)(&exception)
    }

    fn finalize(&self, tentative: Outcome<T>) -> Outcome<T> {
        let handler = self.shared.registry().cleanup_handler::<T>(self.id);
        let Some(handler) = handler else {
            return tentative;
        };
        match handler() {
            Ok(None) => tentative,
            overriding => overriding,
        }
    }
}
