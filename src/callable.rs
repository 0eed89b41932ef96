//! Callables, bound specs and invocations.

use std::fmt;
use std::rc::Rc;

use crate::errors::Result;
use crate::realm::Realm;
use crate::resolver::ContextValue;
use crate::value::Value;

/// A native function body.
///
/// Bodies receive the fully resolved [`Invocation`] and the realm they run in;
/// they never decide their own context.
pub trait Function {
    fn name(&self) -> &str;
    /// Number of declared parameters.
    fn arity(&self) -> usize;
    fn call(&self, inv: Invocation, realm: &mut Realm) -> Result<Value>;
}

type Body = dyn Fn(Invocation, &mut Realm) -> Result<Value>;

/// Adapter turning a closure into a [`Function`].
pub struct NativeFn {
    name: String,
    arity: usize,
    body: Box<Body>,
}

impl NativeFn {
    pub fn new<F>(name: impl Into<String>, arity: usize, body: F) -> Self
    where
        F: Fn(Invocation, &mut Realm) -> Result<Value> + 'static,
    {
        Self { name: name.into(), arity, body: Box::new(body) }
    }
}

impl Function for NativeFn {
    fn name(&self) -> &str { &self.name }
    fn arity(&self) -> usize { self.arity }
    fn call(&self, inv: Invocation, realm: &mut Realm) -> Result<Value> {
        (self.body)(inv, realm)
    }
}

/// What a [`CallableRef`] points at: a native body, or a bound spec that
/// forwards to its target with a fixed context.
pub enum Callable {
    Native(Box<dyn Function>),
    Bound(BindingSpec),
}

/// Opaque, cheaply clonable handle to a callable. Identity is by pointer.
#[derive(Clone)]
pub struct CallableRef(Rc<Callable>);

impl CallableRef {
    pub fn native<F: Function + 'static>(f: F) -> Self {
        Self(Rc::new(Callable::Native(Box::new(f))))
    }

    pub fn from_fn<F>(name: impl Into<String>, arity: usize, body: F) -> Self
    where
        F: Fn(Invocation, &mut Realm) -> Result<Value> + 'static,
    {
        Self::native(NativeFn::new(name, arity, body))
    }

    pub fn bound(spec: BindingSpec) -> Self {
        Self(Rc::new(Callable::Bound(spec)))
    }

    pub fn callable(&self) -> &Callable {
        &self.0
    }

    pub fn as_bound(&self) -> Option<&BindingSpec> {
        match self.callable() {
            Callable::Bound(spec) => Some(spec),
            Callable::Native(_) => None,
        }
    }

    pub fn name(&self) -> String {
        match self.callable() {
            Callable::Native(f) => f.name().to_string(),
            Callable::Bound(spec) => format!("bound {}", spec.target().name()),
        }
    }

    /// Declared parameters still awaiting a value.
    pub fn arity(&self) -> usize {
        match self.callable() {
            Callable::Native(f) => f.arity(),
            Callable::Bound(spec) => spec.target().arity().saturating_sub(spec.prefix().len()),
        }
    }

    pub fn ptr_eq(&self, other: &CallableRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for CallableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CallableRef({})", self.name())
    }
}

/// Result of `bind`: a target with its context and leading arguments fixed.
///
/// Immutable once created; every invocation sees the same context and prefix.
#[derive(Debug, Clone)]
pub struct BindingSpec {
    target: CallableRef,
    context: ContextValue,
    prefix: Vec<Value>,
}

impl BindingSpec {
    pub fn new(target: CallableRef, context: ContextValue, prefix: Vec<Value>) -> Self {
        Self { target, context, prefix }
    }

    pub fn target(&self) -> &CallableRef {
        &self.target
    }

    pub fn context(&self) -> &ContextValue {
        &self.context
    }

    pub fn prefix(&self) -> &[Value] {
        &self.prefix
    }

    /// Prefix followed by the call-site arguments.
    pub fn arguments(&self, suffix: Vec<Value>) -> Vec<Value> {
        let mut args = self.prefix.clone();
        args.extend(suffix);
        args
    }
}

/// One call event.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub this: ContextValue,
    pub callee: CallableRef,
    pub args: Vec<Value>,
}

impl Invocation {
    /// Argument `i`, or `Undefined` when the caller supplied fewer.
    pub fn arg(&self, i: usize) -> Value {
        self.args.get(i).cloned().unwrap_or(Value::Undefined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(name: &str, arity: usize) -> CallableRef {
        CallableRef::from_fn(name, arity, |_, _| Ok(Value::Undefined))
    }

    #[test]
    fn bound_name_and_arity() {
        let target = noop("addNumbers", 4);
        let spec = BindingSpec::new(target, ContextValue::Global, vec![1.0.into(), 2.0.into()]);
        let bound = CallableRef::bound(spec);
        assert_eq!(bound.name(), "bound addNumbers");
        assert_eq!(bound.arity(), 2);
    }

    #[test]
    fn prefix_precedes_suffix() {
        let spec = BindingSpec::new(noop("f", 0), ContextValue::Global, vec![1.0.into(), 2.0.into()]);
        let args = spec.arguments(vec![3.0.into(), 4.0.into()]);
        let nums: Vec<f64> = args.iter().map(Value::to_number).collect();
        assert_eq!(nums, vec![1.0, 2.0, 3.0, 4.0]);
        // the spec itself is untouched
        assert_eq!(spec.prefix().len(), 2);
    }

    #[test]
    fn missing_arguments_are_undefined() {
        let inv = Invocation { this: ContextValue::Global, callee: noop("f", 2), args: vec![] };
        assert!(inv.arg(1).is_undefined());
    }

    #[test]
    fn clones_share_identity() {
        let f = noop("f", 0);
        let g = f.clone();
        assert!(f.ptr_eq(&g));
        assert!(!f.ptr_eq(&noop("f", 0)));
    }
}
