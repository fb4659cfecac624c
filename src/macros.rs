//! Macros for declaring error kinds.

/// Declares one or more [`ErrorKind`](crate::ErrorKind) statics.
///
/// Each entry is `VIS IDENT: "Name"` optionally followed by `extends PARENT`.
/// Without `extends` the kind descends from the built-in root
/// [`EXCEPTION`](crate::kinds::EXCEPTION), so a catch-all handler still sees it.
///
/// # Examples
///
/// ```rust
/// use merry::define_error_kind;
/// use merry::kinds::EXCEPTION;
///
/// define_error_kind! {
///     /// Anything the config loader rejects.
///     pub CONFIG_ERROR: "ConfigError";
///     pub MISSING_KEY: "MissingKey" extends CONFIG_ERROR;
/// }
///
/// assert!(MISSING_KEY.is_subkind_of(&CONFIG_ERROR));
/// assert!(CONFIG_ERROR.is_subkind_of(&EXCEPTION));
/// assert_eq!(MISSING_KEY.name(), "MissingKey");
/// ```
#[macro_export]
macro_rules! define_error_kind {
    ($($(#[$meta:meta])* $vis:vis $ident:ident : $name:literal $(extends $parent:path)?;)*) => {
        $(
            $crate::define_error_kind!(@kind [$(#[$meta])*] $vis $ident $name $(, $parent)?);
        )*
    };
    (@kind [$(#[$meta:meta])*] $vis:vis $ident:ident $name:literal) => {
        $(#[$meta])*
        $vis static $ident: $crate::ErrorKind =
            $crate::ErrorKind::new($name, &$crate::kinds::EXCEPTION);
    };
    (@kind [$(#[$meta:meta])*] $vis:vis $ident:ident $name:literal, $parent:path) => {
        $(#[$meta])*
        $vis static $ident: $crate::ErrorKind = $crate::ErrorKind::new($name, &$parent);
    };
}
