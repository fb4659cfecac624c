//! Manager configuration.

/// Environment variable read by [`MerryConfig::from_env`] for the logger name.
pub const LOGGER_ENV: &str = "MERRY_LOGGER";

/// Environment variable read by [`MerryConfig::from_env`] for the debug flag.
pub const DEBUG_ENV: &str = "MERRY_DEBUG";

/// Settings for a [`Merry`](crate::Merry) manager.
///
/// # Examples
///
/// ```rust
/// use merry::{Merry, MerryConfig};
///
/// let merry = Merry::with_config(MerryConfig::new().logger_name("billing").debug(true));
/// assert_eq!(merry.logger_name(), "billing");
/// assert!(merry.debug());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerryConfig {
    /// Value of the `logger` field on every log record. Defaults to `"merry"`.
    pub logger_name: String,
    /// When `true`, matched exceptions are re-raised instead of handled, unless
    /// the handler was registered with `debug(false)`.
    pub debug: bool,
}

impl Default for MerryConfig {
    fn default() -> Self {
        Self {
            logger_name: "merry".to_string(),
            debug: false,
        }
    }
}

impl MerryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn logger_name(mut self, name: impl Into<String>) -> Self {
        self.logger_name = name.into();
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Builds a config from `MERRY_LOGGER` and `MERRY_DEBUG`.
    ///
    /// Unset variables keep their defaults. `MERRY_DEBUG` accepts
    /// `1/true/yes/on` and `0/false/no/off` (case-insensitive); anything else
    /// is ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(name) = std::env::var(LOGGER_ENV) {
            if !name.trim().is_empty() {
                config.logger_name = name.trim().to_string();
            }
        }

        if let Some(debug) = std::env::var(DEBUG_ENV).ok().as_deref().and_then(parse_flag) {
            config.debug = debug;
        }

        config
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
