//! Invocation entry points: plain, method, call/apply, bind and constructor.

use tracing::debug;

use crate::callable::{BindingSpec, Callable, CallableRef, Invocation};
use crate::errors::{EvalError, Result};
use crate::options::Mode;
use crate::realm::Realm;
use crate::resolver::{ContextValue, InvocationKind};
use crate::value::{ObjectRef, Value};

/// Invokes `callee` as reached through `kind`.
///
/// A bound callee replaces any call-site kind with its own binding, except
/// for constructor invocation, which always gets a fresh context. The bound
/// prefix is prepended to `args` either way.
pub fn invoke(callee: &CallableRef, kind: InvocationKind, args: Vec<Value>, realm: &mut Realm) -> Result<Value> {
    match callee.callable() {
        Callable::Bound(spec) => {
            let kind = match kind {
                InvocationKind::Constructor => InvocationKind::Constructor,
                _ => InvocationKind::ExplicitBind(spec.clone()),
            };
            let args = spec.arguments(args);
            invoke(spec.target(), kind, args, realm)
        }
        Callable::Native(body) => {
            let this = realm.resolver().resolve(&kind);
            debug!(
                callee = body.name(),
                kind = kind.name(),
                context = this.kind_name(),
                argc = args.len(),
                "invoke"
            );
            let is_construct = matches!(kind, InvocationKind::Constructor);
            let fresh = this.clone();
            let inv = Invocation { this, callee: callee.clone(), args };
            let out = body.call(inv, realm)?;
            if is_construct && !matches!(out, Value::Object(_)) {
                return Ok(fresh.to_value(realm));
            }
            Ok(out)
        }
    }
}

/// `receiver.key(args)`.
pub fn call_method(receiver: &ObjectRef, key: &str, args: Vec<Value>, realm: &mut Realm) -> Result<Value> {
    match receiver.get(key) {
        Value::Function(f) => invoke(&f, InvocationKind::Implicit(receiver.clone()), args, realm),
        _ => Err(EvalError::NotCallable(key.to_string())),
    }
}

/// `callee.call(this, ...args)`: explicit context, invoked immediately.
pub fn call(callee: &CallableRef, this: &Value, args: Vec<Value>, realm: &mut Realm) -> Result<Value> {
    let ctx = ContextValue::from_value(this, realm.mode())?;
    invoke(callee, InvocationKind::ExplicitCall(ctx), args, realm)
}

/// `callee.apply(this, array)`: as [`call`] with the arguments packed in one array.
/// A missing, `null` or `undefined` array means no arguments.
pub fn apply(callee: &CallableRef, this: &Value, args: &Value, realm: &mut Realm) -> Result<Value> {
    let args = match args {
        Value::Array(items) => items.clone(),
        Value::Undefined | Value::Null => Vec::new(),
        other => {
            return Err(EvalError::Runtime(format!(
                "second argument to apply must be an array, got {}",
                other.type_name()
            )))
        }
    };
    call(callee, this, args, realm)
}

/// `callee.bind(this, ...prefix)`: fixes context and leading arguments, invokes nothing.
pub fn bind(callee: &CallableRef, this: &Value, prefix: Vec<Value>, mode: Mode) -> Result<CallableRef> {
    let ctx = ContextValue::from_value(this, mode)?;
    Ok(CallableRef::bound(BindingSpec::new(callee.clone(), ctx, prefix)))
}

/// `new callee(args)`. Yields the fresh context unless the body returns an object.
pub fn construct(callee: &CallableRef, args: Vec<Value>, realm: &mut Realm) -> Result<Value> {
    invoke(callee, InvocationKind::Constructor, args, realm)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn read_first_name() -> CallableRef {
        CallableRef::from_fn("readFirstName", 0, |inv, realm| inv.this.get("firstName", realm))
    }

    fn named(name: &str) -> ObjectRef {
        ObjectRef::from_pairs([("firstName", Value::from(name))])
    }

    #[test]
    fn method_call_reads_receiver() {
        let mut realm = Realm::default();
        let obj = named("Sam");
        obj.set("method", Value::Function(read_first_name()));
        let out = call_method(&obj, "method", vec![], &mut realm).unwrap();
        assert_eq!(out.to_string(), "Sam");
    }

    #[test]
    fn call_overrides_receiver() {
        let mut realm = Realm::default();
        let f = read_first_name();
        let blake = Value::Object(named("Blake"));
        assert_eq!(call(&f, &blake, vec![], &mut realm).unwrap().to_string(), "Blake");
    }

    #[test]
    fn apply_unpacks_array() {
        let mut realm = Realm::default();
        let add = CallableRef::from_fn("add", 2, |inv, _| Ok(inv.arg(0).add(&inv.arg(1))));
        let args = Value::Array(vec![4.0.into(), 7.0.into()]);
        let out = apply(&add, &Value::Undefined, &args, &mut realm).unwrap();
        assert_eq!(out.to_string(), "11");
        let err = apply(&add, &Value::Undefined, &Value::Number(1.0), &mut realm).unwrap_err();
        assert!(matches!(err, EvalError::Runtime(_)));
    }

    #[test]
    fn bound_context_beats_call_and_receiver() {
        let mut realm = Realm::default();
        let bound = bind(&read_first_name(), &Value::Object(named("Sam")), vec![], Mode::Sloppy).unwrap();
        let other = named("Blake");
        other.set("m", Value::Function(bound.clone()));
        assert_eq!(call_method(&other, "m", vec![], &mut realm).unwrap().to_string(), "Sam");
        let blake = Value::Object(named("Blake"));
        assert_eq!(call(&bound, &blake, vec![], &mut realm).unwrap().to_string(), "Sam");
    }

    #[test]
    fn rebinding_keeps_first_context() {
        let mut realm = Realm::default();
        let once = bind(&read_first_name(), &Value::Object(named("Sam")), vec![], Mode::Sloppy).unwrap();
        let twice = bind(&once, &Value::Object(named("Blake")), vec![], Mode::Sloppy).unwrap();
        assert_eq!(invoke(&twice, InvocationKind::Default, vec![], &mut realm).unwrap().to_string(), "Sam");
    }

    #[test]
    fn constructor_returns_fresh_object_and_beats_bind() {
        let mut realm = Realm::default();
        let person = CallableRef::from_fn("Person", 1, |inv, realm| {
            inv.this.set("firstName", inv.arg(0), realm)?;
            Ok(Value::Undefined)
        });
        let sam = named("Sam");
        let bound = bind(&person, &Value::Object(sam.clone()), vec![Value::from("Ada")], Mode::Sloppy).unwrap();
        let made = construct(&bound, vec![], &mut realm).unwrap();
        let made = made.as_object().unwrap();
        assert!(!made.ptr_eq(&sam));
        assert_eq!(made.get("firstName").to_string(), "Ada");
        assert_eq!(sam.get("firstName").to_string(), "Sam");
    }

    #[test]
    fn constructor_keeps_returned_object() {
        let mut realm = Realm::default();
        let marker = named("Marker");
        let returned = marker.clone();
        let factory = CallableRef::from_fn("Factory", 0, move |_, _| Ok(Value::Object(returned.clone())));
        let out = construct(&factory, vec![], &mut realm).unwrap();
        assert!(out.as_object().unwrap().ptr_eq(&marker));
    }

    #[test]
    fn strict_default_context_is_absent() {
        let mut realm = Realm::new(Mode::Strict);
        let err = invoke(&read_first_name(), InvocationKind::Default, vec![], &mut realm).unwrap_err();
        assert!(matches!(err, EvalError::AbsentContext { ref key } if key == "firstName"));
    }

    #[test]
    fn binding_to_a_primitive_is_rejected() {
        let err = bind(&read_first_name(), &Value::from("Sam"), vec![], Mode::Sloppy).unwrap_err();
        assert!(matches!(err, EvalError::InvalidBindingTarget("string")));
    }
}
