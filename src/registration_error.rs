/// Errors raised while attaching handlers.
///
/// These only happen during setup. Invocation never produces a
/// `RegistrationError`; exceptions raised by protected code are returned
/// as-is.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationError {
    /// A handler was registered for the implicit target before anything was
    /// protected.
    #[error("no protected function to attach to; call `protect` first or name a target")]
    NoProtectedFunction,

    /// The named target was never protected on this manager.
    #[error("`{target}` does not exist or has not been protected")]
    UnknownTarget { target: String },

    /// The handler produces a different value type than the protected function.
    #[error("handler for `{function}` returns `{found}` but the function returns `{expected}`")]
    TypeMismatch {
        function: String,
        expected: &'static str,
        found: &'static str,
    },
}
