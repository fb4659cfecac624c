//! Picks the handler kind that best matches a raised exception.

use indexmap::IndexMap;

use crate::error_kind::ErrorKind;
use crate::exception::Exception;

/// Returns the most specific registered kind that `exception` belongs to.
///
/// Kinds are visited in registration order. A candidate replaces the current
/// best only if it is a subkind of it. With a single-parent hierarchy every
/// candidate sits on the raised kind's ancestor chain, so the result does not
/// depend on the order.
pub(crate) fn resolve<V>(
    exception: &Exception,
    handlers: &IndexMap<&'static ErrorKind, V>,
) -> Option<&'static ErrorKind> {
    let mut best: Option<&'static ErrorKind> = None;
    for &kind in handlers.keys() {
        if !exception.is(kind) {
            continue;
        }
        match best {
            Some(current) if !kind.is_subkind_of(current) => {}
            _ => best = Some(kind),
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinds::{
        ARITHMETIC_ERROR, EXCEPTION, KEY_ERROR, LOOKUP_ERROR, VALUE_ERROR, ZERO_DIVISION_ERROR,
    };
    use proptest::prelude::*;

    fn mapping(kinds: &[&'static ErrorKind]) -> IndexMap<&'static ErrorKind, ()> {
        kinds.iter().map(|&k| (k, ())).collect()
    }

    #[test]
    fn test_no_candidate() {
        let e = Exception::new(&ZERO_DIVISION_ERROR, "x");
        assert_eq!(resolve(&e, &mapping(&[&LOOKUP_ERROR, &VALUE_ERROR])), None);
        assert_eq!(resolve(&e, &mapping(&[])), None);
    }

    #[test]
    fn test_exact_kind() {
        let e = Exception::new(&KEY_ERROR, "x");
        let found = resolve(&e, &mapping(&[&VALUE_ERROR, &KEY_ERROR]));
        assert_eq!(found, Some(&KEY_ERROR));
    }

    #[test]
    fn test_most_specific_wins_regardless_of_order() {
        let e = Exception::new(&ZERO_DIVISION_ERROR, "x");
        let forward = mapping(&[&EXCEPTION, &ARITHMETIC_ERROR]);
        let backward = mapping(&[&ARITHMETIC_ERROR, &EXCEPTION]);
        assert_eq!(resolve(&e, &forward), Some(&ARITHMETIC_ERROR));
        assert_eq!(resolve(&e, &backward), Some(&ARITHMETIC_ERROR));
    }

    #[test]
    fn test_catch_all() {
        let e = Exception::new(&VALUE_ERROR, "x");
        assert_eq!(resolve(&e, &mapping(&[&EXCEPTION])), Some(&EXCEPTION));
    }

    /// Leaks a fresh chain `root <- k1 <- k2 ...` of the given length.
    fn leaked_chain(len: usize) -> Vec<&'static ErrorKind> {
        let root: &'static ErrorKind = Box::leak(Box::new(ErrorKind::root("K0")));
        let mut chain = vec![root];
        for _ in 1..len {
            let parent = *chain.last().unwrap();
            chain.push(Box::leak(Box::new(ErrorKind::new("Kn", parent))));
        }
        chain
    }

    proptest! {
        #[test]
        fn prop_nearest_registered_ancestor_is_selected(
            (len, registered, raised) in (2usize..8).prop_flat_map(|len| (
                Just(len),
                proptest::sample::subsequence((0..len).collect::<Vec<_>>(), 0..=len)
                    .prop_shuffle(),
                0..len,
            ))
        ) {
            let chain = leaked_chain(len);
            let kinds: Vec<_> = registered.iter().map(|&i| chain[i]).collect();
            let e = Exception::new(chain[raised], "generated");

            let expected = registered.iter().copied().filter(|&i| i <= raised).max();
            prop_assert_eq!(resolve(&e, &mapping(&kinds)), expected.map(|i| chain[i]));
        }
    }
}
