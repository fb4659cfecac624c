use crate::registry::FunctionId;

/// Events emitted by a [`Merry`](crate::Merry) manager.
///
/// These are passed to the callback set via
/// [`Merry::set_trace_callback`](crate::Merry::set_trace_callback).
///
/// # Examples
///
/// ```rust
/// use merry::Merry;
/// use std::sync::{Arc, Mutex};
///
/// let merry = Merry::new();
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let sink = seen.clone();
/// merry.set_trace_callback(move |event| sink.lock().unwrap().push(event.to_string()));
///
/// let _f = merry.protect("f", |()| -> merry::Outcome<()> { Ok(None) });
/// assert_eq!(seen.lock().unwrap()[0], "protect { function: f }");
/// ```
#[derive(Debug, Clone)]
pub enum MerryEvent {
    /// A function was protected.
    Protect {
        id: FunctionId,
        function: String,
    },

    /// An exception handler was attached for one kind.
    Except {
        function: String,
        kind: &'static str,
    },

    /// A success handler was attached.
    Success { function: String },

    /// A cleanup handler was attached.
    Cleanup { function: String },

    /// A raised exception matched a registered handler.
    Caught {
        function: String,
        /// Kind of the raised exception.
        raised: &'static str,
        /// Registered kind that was selected.
        matched: &'static str,
        /// Whether the debug policy re-raised instead of handling.
        bubbled: bool,
    },
}

impl std::fmt::Display for MerryEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MerryEvent::Protect { function, .. } => {
                write!(f, "protect {{ function: {} }}", function)
            }
            MerryEvent::Except { function, kind } => {
                write!(f, "except {{ function: {}, kind: {} }}", function, kind)
            }
            MerryEvent::Success { function } => write!(f, "else {{ function: {} }}", function),
            MerryEvent::Cleanup { function } => {
                write!(f, "finally {{ function: {} }}", function)
            }
            MerryEvent::Caught {
                function,
                raised,
                matched,
                bubbled,
            } => write!(
                f,
                "caught {{ function: {}, raised: {}, matched: {}, bubbled: {} }}",
                function, raised, matched, bubbled
            ),
        }
    }
}
