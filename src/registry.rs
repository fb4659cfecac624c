//! Handler storage for protected functions.
//!
//! Every protected function gets an entry holding its exception handlers
//! (keyed by [`ErrorKind`], in registration order), an optional success
//! handler and an optional cleanup handler. Entries are keyed by an opaque
//! [`FunctionId`], with a secondary index from name to the most recent id
//! protected under that name.
//!
//! Handlers are stored type-erased as `Arc<dyn Any + Send + Sync>` and
//! downcast back at dispatch time. The result type of each protected function
//! is recorded so that mismatched handlers are rejected when registered.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error_kind::ErrorKind;
use crate::exception::{Exception, Outcome};
use crate::policy::DebugPolicy;
use crate::registration_error::RegistrationError;
use crate::resolver::resolve;

pub(crate) type ExceptHandler<T> = Arc<dyn Fn(&Exception) -> Outcome<T> + Send + Sync>;
pub(crate) type ClauseHandler<T> = Arc<dyn Fn() -> Outcome<T> + Send + Sync>;
type ErasedHandler = Arc<dyn Any + Send + Sync>;

static NEXT_REGISTRY: AtomicU64 = AtomicU64::new(0);

/// Opaque identity of a protected function.
///
/// Ids are unique across managers: an id handed out by one manager never
/// resolves in another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FunctionId {
    registry: u64,
    index: u64,
}

impl fmt::Display for FunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.index)
    }
}

/// Which protected function a handler registration applies to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Target {
    /// The function most recently passed to `protect` on this manager.
    #[default]
    Last,
    /// A specific function.
    Id(FunctionId),
    /// The most recent function protected under this name.
    Name(String),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Last => f.write_str("<last protected>"),
            Target::Id(id) => write!(f, "{id}"),
            Target::Name(name) => f.write_str(name),
        }
    }
}

impl From<FunctionId> for Target {
    fn from(id: FunctionId) -> Self {
        Target::Id(id)
    }
}

impl From<&str> for Target {
    fn from(name: &str) -> Self {
        Target::Name(name.to_string())
    }
}

impl From<String> for Target {
    fn from(name: String) -> Self {
        Target::Name(name)
    }
}

struct FunctionEntry {
    name: String,
    value_type: TypeId,
    value_type_name: &'static str,
    except: IndexMap<&'static ErrorKind, ErasedHandler>,
    on_success: Option<ErasedHandler>,
    on_cleanup: Option<ErasedHandler>,
}

impl FunctionEntry {
    fn check_type<T: 'static>(&self) -> Result<(), RegistrationError> {
        if self.value_type == TypeId::of::<T>() {
            Ok(())
        } else {
            Err(RegistrationError::TypeMismatch {
                function: self.name.clone(),
                expected: self.value_type_name,
                found: type_name::<T>(),
            })
        }
    }
}

/// The exception handler chosen for one raised exception.
pub(crate) struct Matched<T> {
    pub(crate) kind: &'static ErrorKind,
    pub(crate) handler: ExceptHandler<T>,
    pub(crate) bubble: bool,
}

pub(crate) struct Registry {
    nonce: u64,
    functions: HashMap<FunctionId, FunctionEntry>,
    names: HashMap<String, FunctionId>,
    last: Option<FunctionId>,
    next_id: u64,
    policy: DebugPolicy,
}

impl Registry {
    pub(crate) fn new(default_debug: bool) -> Self {
        Self {
            nonce: NEXT_REGISTRY.fetch_add(1, Ordering::Relaxed),
            functions: HashMap::new(),
            names: HashMap::new(),
            last: None,
            next_id: 0,
            policy: DebugPolicy::new(default_debug),
        }
    }

    pub(crate) fn default_debug(&self) -> bool {
        self.policy.default_debug()
    }

    /// Creates an empty entry for a function returning `T` and makes it the
    /// implicit target for later registrations.
    pub(crate) fn register_try<T: 'static>(&mut self, name: &str) -> FunctionId {
        let id = FunctionId {
            registry: self.nonce,
            index: self.next_id,
        };
        self.next_id += 1;

        self.functions.insert(
            id,
            FunctionEntry {
                name: name.to_string(),
                value_type: TypeId::of::<T>(),
                value_type_name: type_name::<T>(),
                except: IndexMap::new(),
                on_success: None,
                on_cleanup: None,
            },
        );
        self.names.insert(name.to_string(), id);
        self.last = Some(id);
        id
    }

    fn resolve_target(&self, target: &Target) -> Result<FunctionId, RegistrationError> {
        let id = match target {
            Target::Last => self.last.ok_or(RegistrationError::NoProtectedFunction)?,
            Target::Id(id) => *id,
            Target::Name(name) => self.names.get(name).copied().ok_or_else(|| {
                RegistrationError::UnknownTarget {
                    target: name.clone(),
                }
            })?,
        };
        if self.functions.contains_key(&id) {
            Ok(id)
        } else {
            Err(RegistrationError::UnknownTarget {
                target: target.to_string(),
            })
        }
    }

    fn entry_mut<T: 'static>(
        &mut self,
        target: &Target,
    ) -> Result<&mut FunctionEntry, RegistrationError> {
        let id = self.resolve_target(target)?;
        let entry = self
            .functions
            .get_mut(&id)
            .ok_or_else(|| RegistrationError::UnknownTarget {
                target: target.to_string(),
            })?;
        entry.check_type::<T>()?;
        Ok(entry)
    }

    /// Stores `handler` under each of `kinds`, replacing handlers previously
    /// stored for the same kind. Returns the target's name.
    pub(crate) fn register_except<T: 'static>(
        &mut self,
        handler: ExceptHandler<T>,
        kinds: &[&'static ErrorKind],
        target: &Target,
        debug: Option<bool>,
    ) -> Result<String, RegistrationError> {
        let entry = self.entry_mut::<T>(target)?;
        let erased: ErasedHandler = Arc::new(handler);
        for &kind in kinds {
            entry.except.insert(kind, erased.clone());
        }
        let name = entry.name.clone();

        if let Some(debug) = debug {
            self.policy.record_override(kinds, debug);
        }
        Ok(name)
    }

    pub(crate) fn register_else<T: 'static>(
        &mut self,
        handler: ClauseHandler<T>,
        target: &Target,
    ) -> Result<String, RegistrationError> {
        let entry = self.entry_mut::<T>(target)?;
        entry.on_success = Some(Arc::new(handler));
        Ok(entry.name.clone())
    }

    pub(crate) fn register_finally<T: 'static>(
        &mut self,
        handler: ClauseHandler<T>,
        target: &Target,
    ) -> Result<String, RegistrationError> {
        let entry = self.entry_mut::<T>(target)?;
        entry.on_cleanup = Some(Arc::new(handler));
        Ok(entry.name.clone())
    }

    pub(crate) fn success_handler<T: 'static>(&self, id: FunctionId) -> Option<ClauseHandler<T>> {
        let erased = self.functions.get(&id)?.on_success.as_ref()?;
        erased.downcast_ref::<ClauseHandler<T>>().cloned()
    }

    pub(crate) fn cleanup_handler<T: 'static>(&self, id: FunctionId) -> Option<ClauseHandler<T>> {
        let erased = self.functions.get(&id)?.on_cleanup.as_ref()?;
        erased.downcast_ref::<ClauseHandler<T>>().cloned()
    }

    /// Finds the handler for `exception` and whether the debug policy wants it
    /// re-raised instead.
    pub(crate) fn match_handler<T: 'static>(
        &self,
        id: FunctionId,
        exception: &Exception,
    ) -> Option<Matched<T>> {
        let entry = self.functions.get(&id)?;
        let kind = resolve(exception, &entry.except)?;
        let handler = entry
            .except
            .get(kind)?
            .downcast_ref::<ExceptHandler<T>>()
            .cloned()?;
        Some(Matched {
            kind,
            handler,
            bubble: self.policy.should_bubble(kind),
        })
    }

    pub(crate) fn contains(&self, target: &Target) -> bool {
        self.resolve_target(target).is_ok()
    }

    pub(crate) fn handled_kinds(
        &self,
        target: &Target,
    ) -> Result<Vec<&'static ErrorKind>, RegistrationError> {
        let id = self.resolve_target(target)?;
        Ok(self
            .functions
            .get(&id)
            .map(|entry| entry.except.keys().copied().collect())
            .unwrap_or_default())
    }

    pub(crate) fn function_name(&self, id: FunctionId) -> Option<&str> {
        self.functions.get(&id).map(|entry| entry.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinds::{ARITHMETIC_ERROR, EXCEPTION, KEY_ERROR, ZERO_DIVISION_ERROR};

    fn except_returning(value: &'static str) -> ExceptHandler<String> {
        Arc::new(move |_: &Exception| -> Outcome<String> { Ok(Some(value.to_string())) })
    }

    fn clause_returning(value: &'static str) -> ClauseHandler<String> {
        Arc::new(move || -> Outcome<String> { Ok(Some(value.to_string())) })
    }

    fn call_matched(registry: &Registry, id: FunctionId, e: &Exception) -> Option<String> {
        let matched = registry.match_handler::<String>(id, e)?;
        (matched.handler)(e).unwrap()
    }

    #[test]
    fn test_register_try_sets_last_target() {
        let mut registry = Registry::new(false);
        let first = registry.register_try::<String>("first");
        let second = registry.register_try::<String>("second");

        assert_ne!(first, second);
        assert_eq!(registry.resolve_target(&Target::Last), Ok(second));
        assert_eq!(registry.function_name(first), Some("first"));
    }

    #[test]
    fn test_register_without_target_fails() {
        let mut registry = Registry::new(false);
        let result =
            registry.register_except(except_returning("x"), &[&KEY_ERROR], &Target::Last, None);
        assert_eq!(result, Err(RegistrationError::NoProtectedFunction));

        let result = registry.register_else(clause_returning("x"), &Target::Last);
        assert_eq!(result, Err(RegistrationError::NoProtectedFunction));

        let result = registry.register_finally(clause_returning("x"), &"nope".into());
        assert_eq!(
            result,
            Err(RegistrationError::UnknownTarget {
                target: "nope".into()
            })
        );
    }

    #[test]
    fn test_unknown_id_is_rejected() {
        let registry = Registry::new(false);
        let unknown = FunctionId {
            registry: registry.nonce,
            index: 42,
        };
        assert!(!registry.contains(&Target::Id(unknown)));
    }

    #[test]
    fn test_id_from_another_registry_is_rejected() {
        let mut first = Registry::new(false);
        let mut second = Registry::new(false);
        let foreign = first.register_try::<String>("a");
        let local = second.register_try::<String>("c");

        assert_ne!(foreign, local);
        assert!(!second.contains(&Target::Id(foreign)));
        let result = second.register_except(
            except_returning("leaked"),
            &[&KEY_ERROR],
            &Target::Id(foreign),
            None,
        );
        assert_eq!(
            result,
            Err(RegistrationError::UnknownTarget {
                target: "#0".into()
            })
        );
        assert!(second.handled_kinds(&Target::Id(local)).unwrap().is_empty());
    }

    #[test]
    fn test_same_name_does_not_share_handlers() {
        let mut registry = Registry::new(false);
        let old = registry.register_try::<String>("f");
        let new = registry.register_try::<String>("f");
        registry
            .register_except(except_returning("new"), &[&KEY_ERROR], &"f".into(), None)
            .unwrap();

        let e = Exception::new(&KEY_ERROR, "k");
        assert!(registry.match_handler::<String>(old, &e).is_none());
        assert_eq!(call_matched(&registry, new, &e).as_deref(), Some("new"));
    }

    #[test]
    fn test_except_overwrites_same_kind() {
        let mut registry = Registry::new(false);
        let id = registry.register_try::<String>("f");
        let target = Target::Id(id);
        registry
            .register_except(except_returning("first"), &[&KEY_ERROR], &target, None)
            .unwrap();
        registry
            .register_except(except_returning("second"), &[&KEY_ERROR], &target, None)
            .unwrap();

        let e = Exception::new(&KEY_ERROR, "k");
        assert_eq!(call_matched(&registry, id, &e).as_deref(), Some("second"));
        assert_eq!(registry.handled_kinds(&target).unwrap().len(), 1);
    }

    #[test]
    fn test_one_handler_for_several_kinds() {
        let mut registry = Registry::new(false);
        let id = registry.register_try::<String>("f");
        registry
            .register_except(
                except_returning("either"),
                &[&KEY_ERROR, &ZERO_DIVISION_ERROR],
                &Target::Last,
                None,
            )
            .unwrap();

        assert_eq!(
            registry.handled_kinds(&Target::Last).unwrap(),
            vec![&KEY_ERROR, &ZERO_DIVISION_ERROR]
        );
        let e = Exception::new(&ZERO_DIVISION_ERROR, "z");
        assert_eq!(call_matched(&registry, id, &e).as_deref(), Some("either"));
    }

    #[test]
    fn test_match_prefers_subkind() {
        let mut registry = Registry::new(false);
        let id = registry.register_try::<String>("f");
        registry
            .register_except(except_returning("all"), &[&EXCEPTION], &Target::Last, None)
            .unwrap();
        registry
            .register_except(except_returning("arith"), &[&ARITHMETIC_ERROR], &Target::Last, None)
            .unwrap();

        let e = Exception::new(&ZERO_DIVISION_ERROR, "z");
        let matched = registry.match_handler::<String>(id, &e).unwrap();
        assert_eq!(matched.kind, &ARITHMETIC_ERROR);
        assert!(!matched.bubble);
    }

    #[test]
    fn test_debug_override_only_marks_last_kind() {
        let mut registry = Registry::new(false);
        let id = registry.register_try::<String>("f");
        registry
            .register_except(
                except_returning("x"),
                &[&KEY_ERROR, &ZERO_DIVISION_ERROR],
                &Target::Last,
                Some(true),
            )
            .unwrap();

        let zero = Exception::new(&ZERO_DIVISION_ERROR, "z");
        let key = Exception::new(&KEY_ERROR, "k");
        assert!(registry.match_handler::<String>(id, &zero).unwrap().bubble);
        assert!(!registry.match_handler::<String>(id, &key).unwrap().bubble);
    }

    #[test]
    fn test_type_mismatch_is_rejected() {
        let mut registry = Registry::new(false);
        registry.register_try::<String>("f");
        let handler: ClauseHandler<i32> = Arc::new(|| -> Outcome<i32> { Ok(Some(1)) });
        let result = registry.register_else(handler, &Target::Last);
        assert_eq!(
            result,
            Err(RegistrationError::TypeMismatch {
                function: "f".into(),
                expected: type_name::<String>(),
                found: "i32",
            })
        );
    }

    #[test]
    fn test_clause_handlers_are_replaced() {
        let mut registry = Registry::new(false);
        let id = registry.register_try::<String>("f");
        assert!(registry.success_handler::<String>(id).is_none());
        assert!(registry.cleanup_handler::<String>(id).is_none());

        registry.register_else(clause_returning("a"), &Target::Last).unwrap();
        registry.register_else(clause_returning("b"), &Target::Last).unwrap();
        registry.register_finally(clause_returning("c"), &Target::Id(id)).unwrap();

        let on_success = registry.success_handler::<String>(id).unwrap();
        assert_eq!(on_success().unwrap().as_deref(), Some("b"));
        let on_cleanup = registry.cleanup_handler::<String>(id).unwrap();
        assert_eq!(on_cleanup().unwrap().as_deref(), Some("c"));
    }

    #[test]
    fn test_target_display() {
        assert_eq!(Target::Last.to_string(), "<last protected>");
        let id = FunctionId {
            registry: 0,
            index: 3,
        };
        assert_eq!(Target::Id(id).to_string(), "#3");
        assert_eq!(Target::from("f").to_string(), "f");
    }
}
