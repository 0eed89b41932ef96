//! Execution-context resolution.
//!
//! Which context a body sees depends only on how it was invoked, captured by
//! [`InvocationKind`]. Precedence, highest first: constructor, bind, call/apply,
//! receiver, default. The constructor and bind overrides are applied by
//! [`crate::binding::invoke`] when it picks the kind; the resolver maps a kind
//! to a context.

use crate::callable::BindingSpec;
use crate::errors::{EvalError, Result};
use crate::options::Mode;
use crate::realm::Realm;
use crate::value::{ObjectRef, Value};

/// The context visible inside a body for one invocation.
#[derive(Debug, Clone)]
pub enum ContextValue {
    /// The realm's process-wide namespace.
    Global,
    Object(ObjectRef),
    /// No context at all (strict mode).
    Absent,
    /// An explicit `null` context (strict mode).
    Null,
}

impl ContextValue {
    /// Converts an explicitly supplied value into a context.
    ///
    /// `null`/`undefined` mean "no context": the global context when sloppy.
    /// Strict mode keeps them as given. Primitives and functions are rejected.
    pub fn from_value(value: &Value, mode: Mode) -> Result<Self> {
        match value {
            Value::Object(o) if o.is_global() => Ok(ContextValue::Global),
            Value::Object(o) => Ok(ContextValue::Object(o.clone())),
            Value::Undefined | Value::Null if mode == Mode::Sloppy => Ok(ContextValue::Global),
            Value::Undefined => Ok(ContextValue::Absent),
            Value::Null => Ok(ContextValue::Null),
            other => Err(EvalError::InvalidBindingTarget(other.type_name())),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            ContextValue::Global => "global",
            ContextValue::Object(_) => "object",
            ContextValue::Absent => "absent",
            ContextValue::Null => "null",
        }
    }

    pub fn is_global(&self) -> bool {
        matches!(self, ContextValue::Global)
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            ContextValue::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Reads a property. Unassigned keys yield `Undefined`.
    pub fn get(&self, key: &str, realm: &Realm) -> Result<Value> {
        match self {
            ContextValue::Global => Ok(realm.global().get(key)),
            ContextValue::Object(o) => Ok(o.get(key)),
            ContextValue::Absent | ContextValue::Null => Err(EvalError::AbsentContext { key: key.to_string() }),
        }
    }

    pub fn set(&self, key: &str, value: Value, realm: &Realm) -> Result<()> {
        match self {
            ContextValue::Global => realm.global().set(key, value),
            ContextValue::Object(o) => o.set(key, value),
            ContextValue::Absent | ContextValue::Null => {
                return Err(EvalError::AbsentContext { key: key.to_string() })
            }
        }
        Ok(())
    }

    /// The context as a script value; the global context becomes the global object.
    pub fn to_value(&self, realm: &Realm) -> Value {
        match self {
            ContextValue::Global => Value::Object(realm.global().clone()),
            ContextValue::Object(o) => Value::Object(o.clone()),
            ContextValue::Absent => Value::Undefined,
            ContextValue::Null => Value::Null,
        }
    }

    /// `this === value`.
    pub fn is(&self, value: &Value) -> bool {
        match (self, value) {
            (ContextValue::Global, Value::Object(o)) => o.is_global(),
            (ContextValue::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (ContextValue::Absent, Value::Undefined) => true,
            (ContextValue::Null, Value::Null) => true,
            _ => false,
        }
    }
}

impl PartialEq for ContextValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ContextValue::Global, ContextValue::Global) => true,
            (ContextValue::Absent, ContextValue::Absent) => true,
            (ContextValue::Null, ContextValue::Null) => true,
            (ContextValue::Object(a), ContextValue::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

/// How a callee was reached.
#[derive(Debug, Clone)]
pub enum InvocationKind {
    /// Plain `f()`.
    Default,
    /// `receiver.f()`; the receiver is the object the callee was read from.
    Implicit(ObjectRef),
    /// `f.call(ctx, ..)` / `f.apply(ctx, [..])`.
    ExplicitCall(ContextValue),
    /// Invocation of a bound spec.
    ExplicitBind(BindingSpec),
    /// `new F(..)`.
    Constructor,
}

impl InvocationKind {
    pub fn name(&self) -> &'static str {
        match self {
            InvocationKind::Default => "default",
            InvocationKind::Implicit(_) => "implicit",
            InvocationKind::ExplicitCall(_) => "call",
            InvocationKind::ExplicitBind(_) => "bind",
            InvocationKind::Constructor => "constructor",
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Resolver {
    mode: Mode,
}

impl Resolver {
    pub fn new(mode: Mode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn resolve(&self, kind: &InvocationKind) -> ContextValue {
        match kind {
            InvocationKind::Default => self.missing(),
            InvocationKind::Implicit(receiver) if receiver.is_global() => ContextValue::Global,
            InvocationKind::Implicit(receiver) => ContextValue::Object(receiver.clone()),
            InvocationKind::ExplicitCall(ctx) => self.explicit(ctx),
            InvocationKind::ExplicitBind(spec) => self.explicit(spec.context()),
            InvocationKind::Constructor => ContextValue::Object(ObjectRef::new()),
        }
    }

    fn missing(&self) -> ContextValue {
        match self.mode {
            Mode::Sloppy => ContextValue::Global,
            Mode::Strict => ContextValue::Absent,
        }
    }

    fn explicit(&self, ctx: &ContextValue) -> ContextValue {
        match ctx {
            ContextValue::Absent | ContextValue::Null => match self.mode {
                Mode::Sloppy => ContextValue::Global,
                Mode::Strict => ctx.clone(),
            },
            other => other.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callable::CallableRef;

    fn sam() -> ObjectRef {
        ObjectRef::from_pairs([("firstName", Value::from("Sam"))])
    }

    #[test]
    fn default_is_global_when_sloppy_and_absent_when_strict() {
        assert_eq!(Resolver::new(Mode::Sloppy).resolve(&InvocationKind::Default), ContextValue::Global);
        assert_eq!(Resolver::new(Mode::Strict).resolve(&InvocationKind::Default), ContextValue::Absent);
    }

    #[test]
    fn implicit_is_the_receiver() {
        let obj = sam();
        let ctx = Resolver::default().resolve(&InvocationKind::Implicit(obj.clone()));
        assert_eq!(ctx, ContextValue::Object(obj));
    }

    #[test]
    fn global_receiver_resolves_to_global() {
        let ctx = Resolver::default().resolve(&InvocationKind::Implicit(ObjectRef::global()));
        assert!(ctx.is_global());
    }

    #[test]
    fn bind_uses_the_fixed_context() {
        let obj = sam();
        let target = CallableRef::from_fn("f", 0, |_, _| Ok(Value::Undefined));
        let spec = BindingSpec::new(target, ContextValue::Object(obj.clone()), vec![]);
        let ctx = Resolver::default().resolve(&InvocationKind::ExplicitBind(spec));
        assert_eq!(ctx, ContextValue::Object(obj));
    }

    #[test]
    fn constructor_allocates_a_fresh_mapping_each_time() {
        let r = Resolver::default();
        let a = r.resolve(&InvocationKind::Constructor);
        let b = r.resolve(&InvocationKind::Constructor);
        assert_ne!(a, b);
        assert!(a.as_object().is_some_and(ObjectRef::is_empty));
    }

    #[test]
    fn absent_explicit_context_falls_back_by_mode() {
        let kind = InvocationKind::ExplicitCall(ContextValue::Absent);
        assert!(Resolver::new(Mode::Sloppy).resolve(&kind).is_global());
        assert_eq!(Resolver::new(Mode::Strict).resolve(&kind), ContextValue::Absent);
    }

    #[test]
    fn primitives_are_not_contexts() {
        let err = ContextValue::from_value(&Value::Number(5.0), Mode::Sloppy).unwrap_err();
        assert!(matches!(err, EvalError::InvalidBindingTarget("number")));
        assert_eq!(ContextValue::from_value(&Value::Null, Mode::Strict).unwrap(), ContextValue::Null);
        assert_eq!(ContextValue::from_value(&Value::Undefined, Mode::Strict).unwrap(), ContextValue::Absent);
        assert!(ContextValue::from_value(&Value::Null, Mode::Sloppy).unwrap().is_global());
    }

    #[test]
    fn strict_null_context_stays_null() {
        let kind = InvocationKind::ExplicitCall(ContextValue::Null);
        assert_eq!(Resolver::new(Mode::Strict).resolve(&kind), ContextValue::Null);
        assert!(Resolver::new(Mode::Sloppy).resolve(&kind).is_global());
        let realm = Realm::new(Mode::Strict);
        assert!(matches!(ContextValue::Null.to_value(&realm), Value::Null));
        assert!(ContextValue::Null.get("firstName", &realm).is_err());
    }
}
