//! Debug policy: whether a matched exception is handled or re-raised.

use indexmap::IndexSet;

use crate::error_kind::ErrorKind;

/// Decides whether an exception that matched `kind` bubbles up.
///
/// The "always bubble" set wins over the "always handle" set, and both win
/// over the manager's default flag.
pub(crate) fn should_bubble(
    kind: &'static ErrorKind,
    default_debug: bool,
    always_bubble: &IndexSet<&'static ErrorKind>,
    always_handle: &IndexSet<&'static ErrorKind>,
) -> bool {
    if always_bubble.contains(kind) {
        true
    } else if always_handle.contains(kind) {
        false
    } else {
        default_debug
    }
}

/// Manager-wide debug settings: the default flag plus per-kind overrides.
#[derive(Debug, Default)]
pub(crate) struct DebugPolicy {
    default_debug: bool,
    always_bubble: IndexSet<&'static ErrorKind>,
    always_handle: IndexSet<&'static ErrorKind>,
}

impl DebugPolicy {
    pub(crate) fn new(default_debug: bool) -> Self {
        Self {
            default_debug,
            ..Self::default()
        }
    }

    pub(crate) fn default_debug(&self) -> bool {
        self.default_debug
    }

    /// Records a `debug` override given alongside a handler registration.
    ///
    /// Only the last kind of the registration is recorded. Earlier kinds in
    /// the same call keep following the default flag. An empty list records
    /// nothing.
    pub(crate) fn record_override(&mut self, kinds: &[&'static ErrorKind], debug: bool) {
        let Some(&last) = kinds.last() else {
            return;
        };
        if debug {
            self.always_bubble.insert(last);
        } else {
            self.always_handle.insert(last);
        }
    }

    pub(crate) fn should_bubble(&self, kind: &'static ErrorKind) -> bool {
        should_bubble(
            kind,
            self.default_debug,
            &self.always_bubble,
            &self.always_handle,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinds::{KEY_ERROR, VALUE_ERROR, ZERO_DIVISION_ERROR};

    #[test]
    fn test_default_flag_applies_without_overrides() {
        let empty = IndexSet::new();
        assert!(!should_bubble(&VALUE_ERROR, false, &empty, &empty));
        assert!(should_bubble(&VALUE_ERROR, true, &empty, &empty));
    }

    #[test]
    fn test_bubble_set_beats_handle_set() {
        let mut bubble = IndexSet::new();
        let mut handle = IndexSet::new();
        bubble.insert(&VALUE_ERROR);
        handle.insert(&VALUE_ERROR);
        assert!(should_bubble(&VALUE_ERROR, false, &bubble, &handle));
    }

    #[test]
    fn test_handle_set_beats_global_debug() {
        let bubble = IndexSet::new();
        let mut handle = IndexSet::new();
        handle.insert(&VALUE_ERROR);
        assert!(!should_bubble(&VALUE_ERROR, true, &bubble, &handle));
    }

    #[test]
    fn test_record_override_uses_last_kind_only() {
        let mut policy = DebugPolicy::new(false);
        policy.record_override(&[&KEY_ERROR, &ZERO_DIVISION_ERROR], true);
        assert!(policy.should_bubble(&ZERO_DIVISION_ERROR));
        assert!(!policy.should_bubble(&KEY_ERROR));
    }

    #[test]
    fn test_record_override_ignores_empty_list() {
        let mut policy = DebugPolicy::new(true);
        policy.record_override(&[], false);
        assert!(policy.should_bubble(&VALUE_ERROR));
        assert!(policy.default_debug());
    }
}
