//! The manager that owns a protection domain.
//!
//! A [`Merry`] hands out [`Protected`] wrappers and collects the handlers that
//! govern them. Handlers are attached with small builders:
//!
//! - [`Merry::on_exception`] for kind-keyed exception handlers (`except`),
//! - [`Merry::on_success`] for the no-value success path (`else`),
//! - [`Merry::on_cleanup`] for the unconditional cleanup step (`finally`).
//!
//! Each builder targets the most recently protected function unless told
//! otherwise with `.target(..)`.
//!
//! # Examples
//!
//! ```rust
//! use merry::kinds::ZERO_DIVISION_ERROR;
//! use merry::{Exception, Merry, Outcome};
//!
//! let merry = Merry::new();
//!
//! let divide = merry.protect("divide", |(a, b): (i64, i64)| -> Outcome<i64> {
//!     if b == 0 {
//!         return Err(Exception::new(&ZERO_DIVISION_ERROR, "division by zero"));
//!     }
//!     Ok(Some(a / b))
//! });
//!
//! merry
//!     .on_exception([&ZERO_DIVISION_ERROR])
//!     .handle(|_e: &Exception| Ok(Some(0i64)))
//!     .unwrap();
//!
//! assert_eq!(divide.call((6, 3)).unwrap(), Some(2));
//! assert_eq!(divide.call((6, 0)).unwrap(), Some(0));
//! ```

use std::fmt;
use std::ops::Deref;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use crate::config::MerryConfig;
use crate::error_kind::ErrorKind;
use crate::exception::{Exception, Outcome};
use crate::merry_event::MerryEvent;
use crate::namespace::Namespace;
use crate::protected::Protected;
use crate::registration_error::RegistrationError;
use crate::registry::{ClauseHandler, ExceptHandler, FunctionId, Registry, Target};

/// Type alias for the user-supplied tracing callback.
///
/// The callback receives every [`MerryEvent`] the manager emits. It runs on
/// the thread that triggered the event, without the registry lock held.
pub type TraceCallback = dyn Fn(&MerryEvent) + Send + Sync + 'static;

pub(crate) struct Shared {
    pub(crate) logger_name: String,
    registry: Mutex<Registry>,
    trace: Mutex<Option<Arc<TraceCallback>>>,
    g: Namespace,
}

impl Shared {
    /// Locks the registry, recovering from poisoning.
    ///
    /// Registrations are overwrite-only, so a panic mid-registration cannot
    /// leave an entry half-built.
    pub(crate) fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub(crate) fn emit_event(&self, event: &MerryEvent) {
        let callback = self
            .trace
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone();
        if let Some(callback) = callback {
            callback(event);
        }
    }
}

/// Owner of all handler registrations for one protection domain.
///
/// Cloning is cheap and every clone refers to the same registrations.
/// Separate managers created with [`Merry::new`] share nothing.
///
/// Handlers and the trace callback are owned by the manager, so one that
/// captures a `Merry` clone keeps its manager alive forever. Capture a
/// [`WeakMerry`] from [`Merry::downgrade`] (or just the [`Namespace`] from
/// [`Merry::g`]) instead.
#[derive(Clone)]
pub struct Merry {
    shared: Arc<Shared>,
}

impl Default for Merry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Merry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Merry")
            .field("logger_name", &self.shared.logger_name)
            .field("debug", &self.debug())
            .finish_non_exhaustive()
    }
}

impl Merry {
    /// Creates a manager logging as `"merry"` with debug mode off.
    pub fn new() -> Self {
        Self::with_config(MerryConfig::default())
    }

    pub fn with_config(config: MerryConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                logger_name: config.logger_name,
                registry: Mutex::new(Registry::new(config.debug)),
                trace: Mutex::new(None),
                g: Namespace::new(),
            }),
        }
    }

    /// Returns a handle that does not keep the manager alive.
    pub fn downgrade(&self) -> WeakMerry {
        WeakMerry {
            shared: Arc::downgrade(&self.shared),
        }
    }

    pub fn logger_name(&self) -> &str {
        &self.shared.logger_name
    }

    /// The manager-wide debug flag.
    pub fn debug(&self) -> bool {
        self.shared.registry().default_debug()
    }

    /// The user namespace. Never touched by dispatch.
    pub fn g(&self) -> &Namespace {
        &self.shared.g
    }

    /// Sets a callback invoked for every [`MerryEvent`].
    ///
    /// The callback may call back into this manager.
    pub fn set_trace_callback(&self, callback: impl Fn(&MerryEvent) + Send + Sync + 'static) {
        let mut guard = self.shared.trace.lock().unwrap_or_else(|p| p.into_inner());
        *guard = Some(Arc::new(callback));
    }

    pub fn clear_trace_callback(&self) {
        let mut guard = self.shared.trace.lock().unwrap_or_else(|p| p.into_inner());
        *guard = None;
    }

    /// Registers `f` under `name` and returns the wrapper that runs it under
    /// its handlers.
    ///
    /// The new function becomes the implicit target for later handler
    /// registrations. Protecting a second function with the same name gives it
    /// a fresh, empty handler set; name-based targets then refer to the newer
    /// function.
    pub fn protect<A, T, F>(&self, name: impl Into<String>, f: F) -> Protected<A, T>
    where
        F: Fn(A) -> Outcome<T> + Send + Sync + 'static,
        T: 'static,
    {
        let name = name.into();
        let id = self.shared.registry().register_try::<T>(&name);

        tracing::debug!(logger = %self.shared.logger_name, function = %name, %id, "protected function");
        self.shared.emit_event(&MerryEvent::Protect {
            id,
            function: name.clone(),
        });

        Protected::new(self.shared.clone(), id, name, Arc::new(f))
    }

    /// Starts registering an exception handler for `kinds`.
    ///
    /// ```rust
    /// use merry::kinds::{KEY_ERROR, INDEX_ERROR};
    /// use merry::{without_error, Merry, Outcome};
    ///
    /// let merry = Merry::new();
    /// let lookup = merry.protect("lookup", |key: String| -> Outcome<String> { Ok(Some(key)) });
    ///
    /// merry
    ///     .on_exception([&KEY_ERROR, &INDEX_ERROR])
    ///     .target(&lookup)
    ///     .debug(false)
    ///     .handle(without_error(|| Ok(Some("missing".to_string()))))
    ///     .unwrap();
    /// ```
    pub fn on_exception<I>(&self, kinds: I) -> ExceptRegistration<'_>
    where
        I: IntoIterator<Item = &'static ErrorKind>,
    {
        ExceptRegistration {
            merry: self,
            kinds: kinds.into_iter().collect(),
            target: Target::Last,
            debug: None,
        }
    }

    /// Starts registering the success handler, run when the protected
    /// function returns `Ok(None)`.
    pub fn on_success(&self) -> ClauseRegistration<'_> {
        ClauseRegistration {
            merry: self,
            clause: Clause::Success,
            target: Target::Last,
        }
    }

    /// Starts registering the cleanup handler, run after every call.
    pub fn on_cleanup(&self) -> ClauseRegistration<'_> {
        ClauseRegistration {
            merry: self,
            clause: Clause::Cleanup,
            target: Target::Last,
        }
    }

    /// Returns `true` if `target` names a function protected by this manager.
    pub fn is_protected(&self, target: impl Into<Target>) -> bool {
        self.shared.registry().contains(&target.into())
    }

    /// Name the function `id` was protected under.
    pub fn function_name(&self, id: FunctionId) -> Option<String> {
        self.shared.registry().function_name(id).map(str::to_string)
    }

    /// Kinds with a registered exception handler, in registration order.
    pub fn handled_kinds(
        &self,
        target: impl Into<Target>,
    ) -> Result<Vec<&'static ErrorKind>, RegistrationError> {
        self.shared.registry().handled_kinds(&target.into())
    }
}

/// Non-owning handle to a [`Merry`], for handlers that call back into their
/// own manager.
///
/// ```rust
/// use merry::kinds::KEY_ERROR;
/// use merry::{Exception, Merry, Outcome};
///
/// let merry = Merry::new();
/// let _f = merry.protect("f", |()| -> Outcome<usize> { Ok(None) });
///
/// let weak = merry.downgrade();
/// merry
///     .on_exception([&KEY_ERROR])
///     .handle(move |_: &Exception| -> Outcome<usize> {
///         Ok(weak.upgrade().map(|m| m.handled_kinds("f").map_or(0, |k| k.len())))
///     })
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct WeakMerry {
    shared: Weak<Shared>,
}

impl WeakMerry {
    /// Returns the manager, or `None` once every `Merry` handle is gone.
    pub fn upgrade(&self) -> Option<Merry> {
        self.shared.upgrade().map(|shared| Merry { shared })
    }
}

impl fmt::Debug for WeakMerry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakMerry")
            .field("alive", &(self.shared.strong_count() > 0))
            .finish()
    }
}

/// Builder returned by [`Merry::on_exception`].
#[must_use = "nothing is registered until `handle` is called"]
pub struct ExceptRegistration<'m> {
    merry: &'m Merry,
    kinds: Vec<&'static ErrorKind>,
    target: Target,
    debug: Option<bool>,
}

impl ExceptRegistration<'_> {
    /// Attaches to `target` instead of the most recently protected function.
    pub fn target(mut self, target: impl Into<Target>) -> Self {
        self.target = target.into();
        self
    }

    /// Overrides the manager's debug flag: `true` always re-raises, `false`
    /// always handles.
    ///
    /// The override is recorded for the last kind passed to
    /// [`Merry::on_exception`] only, and applies manager-wide to that kind.
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = Some(debug);
        self
    }

    /// Registers `handler` and hands it back so it can still be called
    /// directly.
    pub fn handle<T, H>(self, handler: H) -> Result<Registered<H>, RegistrationError>
    where
        H: Fn(&Exception) -> Outcome<T> + Clone + Send + Sync + 'static,
        T: 'static,
    {
        let shared = &self.merry.shared;
        let stored: ExceptHandler<T> = Arc::new(handler.clone());
        let function =
            shared
                .registry()
                .register_except(stored, &self.kinds, &self.target, self.debug)?;

        for kind in &self.kinds {
            tracing::debug!(
                logger = %shared.logger_name,
                function = %function,
                kind = kind.name(),
                debug = ?self.debug,
                "registered exception handler"
            );
            shared.emit_event(&MerryEvent::Except {
                function: function.clone(),
                kind: kind.name(),
            });
        }
        Ok(Registered { handler })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Clause {
    Success,
    Cleanup,
}

/// Builder returned by [`Merry::on_success`] and [`Merry::on_cleanup`].
#[must_use = "nothing is registered until `handle` is called"]
pub struct ClauseRegistration<'m> {
    merry: &'m Merry,
    clause: Clause,
    target: Target,
}

impl ClauseRegistration<'_> {
    /// Attaches to `target` instead of the most recently protected function.
    pub fn target(mut self, target: impl Into<Target>) -> Self {
        self.target = target.into();
        self
    }

    /// Registers `handler`, replacing any earlier one for the same target, and
    /// hands it back.
    pub fn handle<T, H>(self, handler: H) -> Result<Registered<H>, RegistrationError>
    where
        H: Fn() -> Outcome<T> + Clone + Send + Sync + 'static,
        T: 'static,
    {
        let shared = &self.merry.shared;
        let stored: ClauseHandler<T> = Arc::new(handler.clone());
        let function = {
            let mut registry = shared.registry();
            match self.clause {
                Clause::Success => registry.register_else(stored, &self.target)?,
                Clause::Cleanup => registry.register_finally(stored, &self.target)?,
            }
        };

        match self.clause {
            Clause::Success => {
                tracing::debug!(logger = %shared.logger_name, function = %function, "registered success handler");
                shared.emit_event(&MerryEvent::Success { function });
            }
            Clause::Cleanup => {
                tracing::debug!(logger = %shared.logger_name, function = %function, "registered cleanup handler");
                shared.emit_event(&MerryEvent::Cleanup { function });
            }
        }
        Ok(Registered { handler })
    }
}

/// A handler returned by a successful registration.
///
/// Dereferences to the handler, so it can still be called directly. Dropping
/// it leaves the registration in place.
///
/// ```rust
/// use merry::kinds::VALUE_ERROR;
/// use merry::{Exception, Merry, Outcome};
///
/// let merry = Merry::new();
/// let _f = merry.protect("f", |()| -> Outcome<usize> { Ok(None) });
/// let handler = merry
///     .on_exception([&VALUE_ERROR])
///     .handle(|e: &Exception| -> Outcome<usize> { Ok(Some(e.message().len())) })
///     .unwrap();
///
/// assert_eq!(handler(&Exception::new(&VALUE_ERROR, "bad")).unwrap(), Some(3));
/// ```
#[derive(Clone)]
pub struct Registered<H> {
    handler: H,
}

impl<H> Registered<H> {
    pub fn into_inner(self) -> H {
        self.handler
    }
}

impl<H> Deref for Registered<H> {
    type Target = H;

    fn deref(&self) -> &H {
        &self.handler
    }
}

impl<H> fmt::Debug for Registered<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registered").finish_non_exhaustive()
    }
}

/// Adapts a zero-argument handler to the exception handler signature.
///
/// ```rust
/// use merry::kinds::VALUE_ERROR;
/// use merry::{without_error, Exception};
///
/// let handler = without_error(|| Ok(Some(1)));
/// assert_eq!(handler(&Exception::new(&VALUE_ERROR, "bad")).unwrap(), Some(1));
/// ```
pub fn without_error<T, F>(f: F) -> impl Fn(&Exception) -> Outcome<T> + Clone + Send + Sync + 'static
where
    F: Fn() -> Outcome<T> + Clone + Send + Sync + 'static,
{
    move |_: &Exception| f()
}
