use std::collections::HashMap;
use std::rc::Rc;

use crate::callable::{CallableRef, Function};

/// Named native functions visible to scripts.
#[derive(Clone, Default)]
pub struct Registry {
    inner: Rc<HashMap<String, CallableRef>>,
}

impl Registry {
    pub fn new() -> Self { Self::default() }

    pub fn with_builtins() -> Self {
        let mut reg = Self::new();
        reg.register(builtins::SayHi);
        reg.register(builtins::SayHello);
        reg.register(builtins::ReadFirstName);
        reg.register(builtins::ContextOf);
        reg.register(builtins::IsContext);
        reg.register(builtins::Add);
        reg.register(builtins::AddNumbers);
        reg.register(builtins::SumEvenArguments);
        reg.register(builtins::InvokeMax);
        reg.register(builtins::Person);
        reg.register(builtins::SetTimeout);
        reg.register(builtins::GreetLater);
        reg.register(builtins::GreetLaterBound);
        reg
    }

    pub fn register<F: Function + 'static>(&mut self, f: F) {
        let name = f.name().to_string();
        self.insert(name, CallableRef::native(f));
    }

    /// Registers an existing callable (for instance a bound one) under `name`.
    pub fn insert(&mut self, name: impl Into<String>, callable: CallableRef) {
        Rc::make_mut(&mut self.inner).insert(name.into(), callable);
    }

    pub fn get(&self, name: &str) -> Option<CallableRef> {
        self.inner.get(name).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.inner.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Function bodies used by the demonstration scripts.
pub mod builtins {
    use std::cell::Cell;

    use tracing::debug;

    use crate::binding;
    use crate::callable::{BindingSpec, CallableRef, Function, Invocation};
    use crate::errors::{EvalError, Result};
    use crate::realm::Realm;
    use crate::resolver::InvocationKind;
    use crate::value::Value;

    fn greeting(word: &str, inv: &Invocation, realm: &Realm) -> Result<Value> {
        Ok(Value::from(word).add(&inv.this.get("firstName", realm)?))
    }

    /// `console.log`.
    pub struct Log;
    impl Function for Log {
        fn name(&self) -> &str { "log" }
        fn arity(&self) -> usize { 0 }
        fn call(&self, inv: Invocation, realm: &mut Realm) -> Result<Value> {
            realm.console_mut().log(&inv.args);
            Ok(Value::Undefined)
        }
    }

    /// `"Hi " + this.firstName`
    pub struct SayHi;
    impl Function for SayHi {
        fn name(&self) -> &str { "sayHi" }
        fn arity(&self) -> usize { 0 }
        fn call(&self, inv: Invocation, realm: &mut Realm) -> Result<Value> {
            greeting("Hi ", &inv, realm)
        }
    }

    /// `"Hello " + this.firstName`
    pub struct SayHello;
    impl Function for SayHello {
        fn name(&self) -> &str { "sayHello" }
        fn arity(&self) -> usize { 0 }
        fn call(&self, inv: Invocation, realm: &mut Realm) -> Result<Value> {
            greeting("Hello ", &inv, realm)
        }
    }

    /// `this.firstName`
    pub struct ReadFirstName;
    impl Function for ReadFirstName {
        fn name(&self) -> &str { "readFirstName" }
        fn arity(&self) -> usize { 0 }
        fn call(&self, inv: Invocation, realm: &mut Realm) -> Result<Value> {
            inv.this.get("firstName", realm)
        }
    }

    /// Returns the resolved context itself.
    pub struct ContextOf;
    impl Function for ContextOf {
        fn name(&self) -> &str { "contextOf" }
        fn arity(&self) -> usize { 0 }
        fn call(&self, inv: Invocation, realm: &mut Realm) -> Result<Value> {
            Ok(inv.this.to_value(realm))
        }
    }

    /// `this === candidate`
    pub struct IsContext;
    impl Function for IsContext {
        fn name(&self) -> &str { "isContext" }
        fn arity(&self) -> usize { 1 }
        fn call(&self, inv: Invocation, _realm: &mut Realm) -> Result<Value> {
            Ok(Value::Bool(inv.this.is(&inv.arg(0))))
        }
    }

    pub struct Add;
    impl Function for Add {
        fn name(&self) -> &str { "add" }
        fn arity(&self) -> usize { 2 }
        fn call(&self, inv: Invocation, _realm: &mut Realm) -> Result<Value> {
            Ok(inv.arg(0).add(&inv.arg(1)))
        }
    }

    /// `this.firstName + " calculated: " + (a + b + c + d)`
    pub struct AddNumbers;
    impl Function for AddNumbers {
        fn name(&self) -> &str { "addNumbers" }
        fn arity(&self) -> usize { 4 }
        fn call(&self, inv: Invocation, realm: &mut Realm) -> Result<Value> {
            let sum = (1..4).fold(inv.arg(0), |acc, i| acc.add(&inv.arg(i)));
            let label = inv.this.get("firstName", realm)?.add(&Value::from(" calculated: "));
            Ok(label.add(&sum))
        }
    }

    /// Sums the even numeric arguments, however many there are.
    pub struct SumEvenArguments;
    impl Function for SumEvenArguments {
        fn name(&self) -> &str { "sumEvenArguments" }
        fn arity(&self) -> usize { 0 }
        fn call(&self, inv: Invocation, _realm: &mut Realm) -> Result<Value> {
            let sum: f64 = inv
                .args
                .iter()
                .map(Value::to_number)
                .filter(|n| n % 2.0 == 0.0)
                .sum();
            Ok(Value::Number(sum))
        }
    }

    /// `invokeMax(fn, max)`: wraps `fn` so it runs at most `max` times.
    pub struct InvokeMax;
    impl Function for InvokeMax {
        fn name(&self) -> &str { "invokeMax" }
        fn arity(&self) -> usize { 2 }
        fn call(&self, inv: Invocation, realm: &mut Realm) -> Result<Value> {
            let target = match inv.arg(0) {
                Value::Function(f) => f,
                other => return Err(EvalError::NotCallable(other.to_string())),
            };
            let max = inv.arg(1).to_number();
            let max = if max.is_nan() || max < 0.0 { 0 } else { max as usize };
            realm.console_mut().log(&[Value::from("InvokeMax initialized.")]);
            realm.console_mut().log(&[Value::from("count: 0")]);
            Ok(Value::Function(CallableRef::native(Limited { target, max, count: Cell::new(0) })))
        }
    }

    /// The wrapper returned by [`InvokeMax`]. Forwards its own context and
    /// arguments to the target, like `fn.apply(this, arguments)`.
    pub struct Limited {
        target: CallableRef,
        max: usize,
        count: Cell<usize>,
    }
    impl Function for Limited {
        fn name(&self) -> &str { "limited" }
        fn arity(&self) -> usize { 0 }
        fn call(&self, inv: Invocation, realm: &mut Realm) -> Result<Value> {
            if self.count.get() >= self.max {
                return Ok(Value::from("Maxed Out!"));
            }
            self.count.set(self.count.get() + 1);
            realm.console_mut().log(&[Value::from(format!("count: {}", self.count.get()))]);
            binding::invoke(&self.target, InvocationKind::ExplicitCall(inv.this), inv.args, realm)
        }
    }

    /// Constructor: `this.firstName = firstName`.
    pub struct Person;
    impl Function for Person {
        fn name(&self) -> &str { "Person" }
        fn arity(&self) -> usize { 1 }
        fn call(&self, inv: Invocation, realm: &mut Realm) -> Result<Value> {
            inv.this.set("firstName", inv.arg(0), realm)?;
            Ok(Value::Undefined)
        }
    }

    /// `setTimeout(callback, delay, ...args)`. Returns the task id.
    pub struct SetTimeout;
    impl Function for SetTimeout {
        fn name(&self) -> &str { "setTimeout" }
        fn arity(&self) -> usize { 2 }
        fn call(&self, inv: Invocation, realm: &mut Realm) -> Result<Value> {
            let callback = match inv.arg(0) {
                Value::Function(f) => f,
                other => return Err(EvalError::NotCallable(other.to_string())),
            };
            let delay = inv.arg(1).to_number();
            let delay = if delay.is_finite() && delay > 0.0 { delay as u64 } else { 0 };
            let rest = inv.args.iter().skip(2).cloned().collect();
            let id = realm.scheduler_mut().schedule(callback, delay, rest);
            Ok(Value::Number(id as f64))
        }
    }

    /// Logs `"Hi " + this.firstName`; the callback the greeters schedule.
    pub struct LogGreeting;
    impl Function for LogGreeting {
        fn name(&self) -> &str { "logGreeting" }
        fn arity(&self) -> usize { 0 }
        fn call(&self, inv: Invocation, realm: &mut Realm) -> Result<Value> {
            let line = greeting("Hi ", &inv, realm)?;
            realm.console_mut().log(&[line]);
            Ok(Value::Undefined)
        }
    }

    /// Schedules a greeting without binding it; the callback loses this method's receiver.
    pub struct GreetLater;
    impl Function for GreetLater {
        fn name(&self) -> &str { "greetLater" }
        fn arity(&self) -> usize { 0 }
        fn call(&self, _inv: Invocation, realm: &mut Realm) -> Result<Value> {
            realm.scheduler_mut().schedule(CallableRef::native(LogGreeting), 1000, Vec::new());
            Ok(Value::Undefined)
        }
    }

    /// Schedules a greeting bound to this method's context.
    pub struct GreetLaterBound;
    impl Function for GreetLaterBound {
        fn name(&self) -> &str { "greetLaterBound" }
        fn arity(&self) -> usize { 0 }
        fn call(&self, inv: Invocation, realm: &mut Realm) -> Result<Value> {
            debug!(context = inv.this.kind_name(), "binding deferred greeting");
            let spec = BindingSpec::new(CallableRef::native(LogGreeting), inv.this, Vec::new());
            realm.scheduler_mut().schedule(CallableRef::bound(spec), 2000, Vec::new());
            Ok(Value::Undefined)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding;
    use crate::realm::Realm;
    use crate::resolver::InvocationKind;
    use crate::value::{ObjectRef, Value};
    use pretty_assertions::assert_eq;

    fn run(reg: &Registry, name: &str, args: Vec<Value>, realm: &mut Realm) -> Value {
        let f = reg.get(name).unwrap();
        binding::invoke(&f, InvocationKind::Default, args, realm).unwrap()
    }

    #[test]
    fn sum_even_arguments() {
        let reg = Registry::with_builtins();
        let mut realm = Realm::default();
        let nums = |xs: &[f64]| xs.iter().map(|&x| Value::Number(x)).collect::<Vec<_>>();
        assert_eq!(run(&reg, "sumEvenArguments", nums(&[1.0, 2.0, 3.0, 4.0]), &mut realm).to_string(), "6");
        assert_eq!(run(&reg, "sumEvenArguments", nums(&[1.0, 2.0, 6.0]), &mut realm).to_string(), "8");
        assert_eq!(run(&reg, "sumEvenArguments", nums(&[1.0, 2.0]), &mut realm).to_string(), "2");
    }

    #[test]
    fn invoke_max_stops_after_limit() {
        let reg = Registry::with_builtins();
        let mut realm = Realm::default();
        let add = Value::Function(reg.get("add").unwrap());
        let limited = run(&reg, "invokeMax", vec![add, Value::Number(2.0)], &mut realm);
        let limited = limited.as_function().unwrap().clone();
        let mut outs = Vec::new();
        for _ in 0..3 {
            let v = binding::invoke(&limited, InvocationKind::Default, vec![1.0.into(), 4.0.into()], &mut realm);
            outs.push(v.unwrap().to_string());
        }
        assert_eq!(outs, vec!["5", "5", "Maxed Out!"]);
        assert_eq!(
            realm.console().lines(),
            &["InvokeMax initialized.".to_string(), "count: 0".into(), "count: 1".into(), "count: 2".into()]
        );
    }

    #[test]
    fn greeters_schedule_instead_of_logging() {
        let reg = Registry::with_builtins();
        let mut realm = Realm::default();
        let obj = ObjectRef::from_pairs([("firstName", Value::from("Sam"))]);
        obj.set("later", Value::Function(reg.get("greetLater").unwrap()));
        obj.set("bound", Value::Function(reg.get("greetLaterBound").unwrap()));
        binding::call_method(&obj, "later", vec![], &mut realm).unwrap();
        binding::call_method(&obj, "bound", vec![], &mut realm).unwrap();
        assert!(realm.console().lines().is_empty());
        assert_eq!(realm.scheduler().pending(), 2);
        assert!(crate::scheduler::run_pending(&mut realm).failures.is_empty());
        assert_eq!(realm.console().lines(), &["Hi undefined".to_string(), "Hi Sam".into()]);
    }

    #[test]
    fn custom_functions_can_be_registered() {
        let mut reg = Registry::new();
        reg.insert("answer", crate::callable::CallableRef::from_fn("answer", 0, |_, _| Ok(Value::Number(42.0))));
        assert_eq!(reg.names(), vec!["answer"]);
        assert!(reg.get("sayHi").is_none());
    }
}
