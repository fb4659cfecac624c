//! Integration tests for handler isolation between managers and between
//! protected functions of one manager.

use merry::kinds::{KEY_ERROR, VALUE_ERROR};
use merry::{without_error, ErrorKind, Exception, Merry, Outcome, RegistrationError, Target};

fn key_error(_: ()) -> Outcome<String> {
    Err(Exception::new(&KEY_ERROR, "'missing'"))
}

#[test]
fn test_multiple_isolated_managers() {
    let first = Merry::new();
    let second = Merry::new();

    let f = first.protect("f", key_error);
    let g = second.protect("f", key_error);

    first
        .on_exception([&KEY_ERROR])
        .handle(without_error(|| Ok(Some("first".to_string()))))
        .unwrap();

    assert_eq!(f.call(()).unwrap().as_deref(), Some("first"));
    let err = g.call(()).unwrap_err();
    assert_eq!(err.kind(), &KEY_ERROR);
}

#[test]
fn test_handlers_do_not_leak_between_functions() {
    let merry = Merry::new();

    let f = merry.protect("f", key_error);
    merry
        .on_exception([&KEY_ERROR])
        .handle(without_error(|| Ok(Some("f handled".to_string()))))
        .unwrap();

    let g = merry.protect("g", key_error);

    assert_eq!(f.call(()).unwrap().as_deref(), Some("f handled"));
    assert!(g.call(()).is_err());
}

#[test]
fn test_same_name_gets_fresh_handlers() {
    let merry = Merry::new();

    let old = merry.protect("f", key_error);
    merry
        .on_exception([&KEY_ERROR])
        .handle(without_error(|| Ok(Some("old".to_string()))))
        .unwrap();

    let new = merry.protect("f", key_error);
    assert!(new.call(()).is_err());
    assert_eq!(old.call(()).unwrap().as_deref(), Some("old"));

    // Name targets resolve to the newest function with that name.
    merry
        .on_exception([&KEY_ERROR])
        .target("f")
        .handle(without_error(|| Ok(Some("new".to_string()))))
        .unwrap();
    assert_eq!(new.call(()).unwrap().as_deref(), Some("new"));
    assert_eq!(old.call(()).unwrap().as_deref(), Some("old"));
}

#[test]
fn test_explicit_targets() {
    let merry = Merry::new();

    let f = merry.protect("f", key_error);
    let g = merry.protect("g", key_error);
    let h = merry.protect("h", key_error);

    merry
        .on_exception([&KEY_ERROR])
        .target(&f)
        .handle(without_error(|| Ok(Some("by handle".to_string()))))
        .unwrap();
    merry
        .on_exception([&KEY_ERROR])
        .target(g.id())
        .handle(without_error(|| Ok(Some("by id".to_string()))))
        .unwrap();
    merry
        .on_exception([&KEY_ERROR])
        .target(Target::Name("h".into()))
        .handle(without_error(|| Ok(Some("by name".to_string()))))
        .unwrap();

    assert_eq!(f.call(()).unwrap().as_deref(), Some("by handle"));
    assert_eq!(g.call(()).unwrap().as_deref(), Some("by id"));
    assert_eq!(h.call(()).unwrap().as_deref(), Some("by name"));
}

#[test]
fn test_foreign_handle_is_rejected() {
    let first = Merry::new();
    let second = Merry::new();

    // Both are the first function of their manager.
    let a = first.protect("a", key_error);
    let c = second.protect("c", key_error);

    let result = second
        .on_exception([&KEY_ERROR])
        .target(&a)
        .handle(without_error(|| Ok(Some("leaked".to_string()))));
    assert!(matches!(
        result,
        Err(RegistrationError::UnknownTarget { .. })
    ));

    let result = second
        .on_success()
        .target(a.id())
        .handle(|| Ok(None::<String>));
    assert!(matches!(
        result,
        Err(RegistrationError::UnknownTarget { .. })
    ));

    assert!(!second.is_protected(&a));
    assert_eq!(second.function_name(a.id()), None);
    assert_eq!(a.call(()).unwrap_err().kind(), &KEY_ERROR);
    assert_eq!(c.call(()).unwrap_err().kind(), &KEY_ERROR);
}

#[test]
fn test_clones_share_registrations() {
    let merry = Merry::new();
    let clone = merry.clone();

    let f = merry.protect("f", key_error);
    clone
        .on_exception([&KEY_ERROR])
        .handle(without_error(|| Ok(Some("from clone".to_string()))))
        .unwrap();

    assert_eq!(f.call(()).unwrap().as_deref(), Some("from clone"));
    assert!(clone.is_protected(&f));
}

#[test]
fn test_namespaces_are_isolated() {
    #[derive(Debug, Clone, PartialEq)]
    struct Counter(u32);

    let first = Merry::new();
    let second = Merry::new();

    first.g().insert(Counter(1));

    assert_eq!(first.g().get_cloned::<Counter>(), Some(Counter(1)));
    assert!(!second.g().contains::<Counter>());
    assert!(first.clone().g().contains::<Counter>());
}

#[test]
fn test_unknown_kind_leaves_other_functions_untouched() {
    let merry = Merry::new();

    let f = merry.protect("f", key_error);
    let g = merry.protect("g", |_: ()| -> Outcome<String> {
        Err(Exception::new(&VALUE_ERROR, "bad"))
    });
    merry
        .on_exception([&VALUE_ERROR])
        .handle(without_error(|| Ok(Some("g".to_string()))))
        .unwrap();

    assert_eq!(merry.handled_kinds(&f).unwrap(), Vec::<&'static ErrorKind>::new());
    assert_eq!(merry.handled_kinds(&g).unwrap(), vec![&VALUE_ERROR]);
    assert_eq!(f.call(()).unwrap_err().kind(), &KEY_ERROR);
}
