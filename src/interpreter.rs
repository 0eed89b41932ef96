//! Tree-walking evaluation of demonstration scripts.
//!
//! Scripts never define function bodies; every callable comes from the
//! [`Registry`] or from `call`/`apply`/`bind` over one. What this module
//! decides is the invocation kind of each call site.

use std::collections::HashMap;

use tracing::trace;

use crate::binding;
use crate::callable::CallableRef;
use crate::errors::{EvalError, Result};
use crate::expression::{BinOp, Expr, Literal, Program, Stmt};
use crate::functions::Registry;
use crate::options::Mode;
use crate::realm::Realm;
use crate::resolver::InvocationKind;
use crate::value::{ObjectRef, Value};

pub struct Interpreter<'r> {
    registry: &'r Registry,
    locals: HashMap<String, Value>,
}

impl<'r> Interpreter<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self { registry, locals: HashMap::new() }
    }

    pub fn exec_program(&mut self, program: &Program, realm: &mut Realm) -> Result<()> {
        for stmt in &program.body {
            self.exec(stmt, realm)?;
        }
        Ok(())
    }

    pub fn exec(&mut self, stmt: &Stmt, realm: &mut Realm) -> Result<()> {
        match stmt {
            Stmt::Var(name, expr) => {
                let value = self.eval(expr, realm)?;
                realm.global().set(name.as_str(), value);
            }
            Stmt::Let(name, expr) => {
                if self.locals.contains_key(name) {
                    return Err(EvalError::Runtime(format!("identifier '{name}' has already been declared")));
                }
                let value = self.eval(expr, realm)?;
                self.locals.insert(name.clone(), value);
            }
            Stmt::Assign { target, value } => {
                let value = self.eval(value, realm)?;
                self.assign(target, value, realm)?;
            }
            Stmt::Expr(expr) => {
                self.eval(expr, realm)?;
            }
        }
        Ok(())
    }

    pub fn eval(&mut self, expr: &Expr, realm: &mut Realm) -> Result<Value> {
        match expr {
            Expr::Literal(lit) => Ok(match lit {
                Literal::Number(n) => Value::Number(*n),
                Literal::Str(s) => Value::String(s.clone()),
                Literal::Bool(b) => Value::Bool(*b),
                Literal::Null => Value::Null,
                Literal::Undefined => Value::Undefined,
            }),
            // script top level: always the global object, strict or not
            Expr::This => Ok(Value::Object(realm.global().clone())),
            Expr::Ident(name) => self.lookup(name, realm),
            Expr::Object(props) => {
                let obj = ObjectRef::new();
                for (key, e) in props {
                    let v = self.eval(e, realm)?;
                    obj.set(key.as_str(), v);
                }
                Ok(Value::Object(obj))
            }
            Expr::Array(items) => Ok(Value::Array(self.eval_all(items, realm)?)),
            Expr::Member { object, property } => {
                let target = self.eval(object, realm)?;
                get_property(&target, property)
            }
            Expr::Call { callee, args } => self.eval_call(callee, args, realm),
            Expr::New { callee, args } => {
                let f = self.eval_callable(callee, realm)?;
                let args = self.eval_all(args, realm)?;
                binding::construct(&f, args, realm)
            }
            Expr::Binary { op, left, right } => {
                let l = self.eval(left, realm)?;
                let r = self.eval(right, realm)?;
                Ok(match op {
                    BinOp::Add => l.add(&r),
                    BinOp::Sub => l.sub(&r),
                    BinOp::StrictEq => Value::Bool(l.strict_equals(&r)),
                    BinOp::StrictNe => Value::Bool(!l.strict_equals(&r)),
                })
            }
        }
    }

    fn eval_call(&mut self, callee: &Expr, args: &[Expr], realm: &mut Realm) -> Result<Value> {
        let Expr::Member { object, property } = callee else {
            let f = self.eval_callable(callee, realm)?;
            let args = self.eval_all(args, realm)?;
            return binding::invoke(&f, InvocationKind::Default, args, realm);
        };

        let target = self.eval(object, realm)?;
        if let Value::Function(f) = &target {
            match property.as_str() {
                "call" => {
                    let mut args = self.eval_all(args, realm)?;
                    let this = take_first(&mut args);
                    return binding::call(f, &this, args, realm);
                }
                "apply" => {
                    let mut args = self.eval_all(args, realm)?;
                    let this = take_first(&mut args);
                    let list = take_first(&mut args);
                    return binding::apply(f, &this, &list, realm);
                }
                "bind" => {
                    let mut args = self.eval_all(args, realm)?;
                    let this = take_first(&mut args);
                    let bound = binding::bind(f, &this, args, realm.mode())?;
                    return Ok(Value::Function(bound));
                }
                _ => {}
            }
        }

        if let Value::Object(receiver) = &target {
            if receiver.get(property).as_function().is_none() {
                return Err(EvalError::NotCallable(callee.describe()));
            }
            let args = self.eval_all(args, realm)?;
            trace!(site = %callee.describe(), kind = "implicit", "call site");
            return binding::call_method(receiver, property, args, realm);
        }

        // a method read off a primitive has no receiver to bind
        let method = match get_property(&target, property)? {
            Value::Function(f) => f,
            _ => return Err(EvalError::NotCallable(callee.describe())),
        };
        let args = self.eval_all(args, realm)?;
        trace!(site = %callee.describe(), kind = "default", "call site");
        binding::invoke(&method, InvocationKind::Default, args, realm)
    }

    fn eval_callable(&mut self, expr: &Expr, realm: &mut Realm) -> Result<CallableRef> {
        match self.eval(expr, realm)? {
            Value::Function(f) => Ok(f),
            _ => Err(EvalError::NotCallable(expr.describe())),
        }
    }

    fn eval_all(&mut self, exprs: &[Expr], realm: &mut Realm) -> Result<Vec<Value>> {
        exprs.iter().map(|e| self.eval(e, realm)).collect()
    }

    /// Locals, then the global context, then the registry.
    fn lookup(&self, name: &str, realm: &Realm) -> Result<Value> {
        if let Some(v) = self.locals.get(name) {
            return Ok(v.clone());
        }
        if realm.global().has(name) {
            return Ok(realm.global().get(name));
        }
        self.registry
            .get(name)
            .map(Value::Function)
            .ok_or_else(|| EvalError::UnknownName(name.to_string()))
    }

    fn assign(&mut self, target: &Expr, value: Value, realm: &mut Realm) -> Result<()> {
        match target {
            Expr::Ident(name) => {
                if let Some(slot) = self.locals.get_mut(name) {
                    *slot = value;
                } else if realm.global().has(name) || realm.mode() == Mode::Sloppy {
                    realm.global().set(name.as_str(), value);
                } else {
                    return Err(EvalError::UnknownName(name.clone()));
                }
                Ok(())
            }
            Expr::Member { object, property } => match self.eval(object, realm)? {
                Value::Object(o) => {
                    o.set(property.as_str(), value);
                    Ok(())
                }
                other => Err(EvalError::Runtime(format!(
                    "cannot set property '{property}' on a {}",
                    other.type_name()
                ))),
            },
            other => Err(EvalError::Runtime(format!("cannot assign to {}", other.describe()))),
        }
    }
}

fn take_first(args: &mut Vec<Value>) -> Value {
    if args.is_empty() {
        Value::Undefined
    } else {
        args.remove(0)
    }
}

/// Property read on any value. Only `undefined` and `null` refuse reads.
fn get_property(target: &Value, key: &str) -> Result<Value> {
    Ok(match target {
        Value::Object(o) => o.get(key),
        Value::Function(f) => match key {
            "name" => Value::String(f.name()),
            "length" => Value::Number(f.arity() as f64),
            _ => Value::Undefined,
        },
        Value::Array(items) if key == "length" => Value::Number(items.len() as f64),
        Value::String(s) if key == "length" => Value::Number(s.chars().count() as f64),
        Value::Undefined | Value::Null => {
            return Err(EvalError::Runtime(format!(
                "cannot read properties of {} (reading '{key}')",
                target.type_name()
            )))
        }
        _ => Value::Undefined,
    })
}
