//! Runtime values.
//!
//! `Undefined` doubles as the absent marker for missing properties and
//! arguments, and `Number(NaN)` as the not-a-number marker produced by
//! arithmetic over absent values.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use itertools::Itertools;

use crate::callable::CallableRef;

/// Nested values deeper than this render as `[Object]` / `[Array]`.
const MAX_DISPLAY_DEPTH: usize = 2;

#[derive(Debug, Clone)]
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<Value>),
    Object(ObjectRef),
    Function(CallableRef),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObjectKind {
    #[default]
    Plain,
    /// The process-wide namespace owned by a realm.
    Global,
}

#[derive(Default)]
struct Object {
    kind: ObjectKind,
    props: Vec<(String, Value)>,
}

/// Shared, mutable mapping from string keys to values.
///
/// Cloning shares the mapping; use [`ObjectRef::ptr_eq`] for identity.
#[derive(Clone, Default)]
pub struct ObjectRef(Rc<RefCell<Object>>);

impl ObjectRef {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn global() -> Self {
        Self(Rc::new(RefCell::new(Object { kind: ObjectKind::Global, props: Vec::new() })))
    }

    pub fn from_pairs<K: Into<String>>(pairs: impl IntoIterator<Item = (K, Value)>) -> Self {
        let obj = Self::new();
        for (k, v) in pairs {
            obj.set(k, v);
        }
        obj
    }

    pub fn kind(&self) -> ObjectKind {
        self.0.borrow().kind
    }

    pub fn is_global(&self) -> bool {
        self.kind() == ObjectKind::Global
    }

    /// Reads `key`; a key that was never assigned yields `Undefined`.
    pub fn get(&self, key: &str) -> Value {
        self.0
            .borrow()
            .props
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
            .unwrap_or(Value::Undefined)
    }

    pub fn has(&self, key: &str) -> bool {
        self.0.borrow().props.iter().any(|(k, _)| k == key)
    }

    pub fn set(&self, key: impl Into<String>, value: Value) {
        let key = key.into();
        let mut obj = self.0.borrow_mut();
        match obj.props.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => obj.props.push((key, value)),
        }
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> Vec<String> {
        self.0.borrow().props.iter().map(|(k, _)| k.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().props.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ObjectRef {
    // Objects may reference themselves; never recurse into values here.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectRef")
            .field("kind", &self.kind())
            .field("keys", &self.keys())
            .finish()
    }
}

impl Value {
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn is_nan(&self) -> bool {
        matches!(self, Value::Number(n) if n.is_nan())
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&CallableRef> {
        match self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Function(_) => "function",
        }
    }

    /// Numeric coercion. Absent values become NaN.
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Bool(b) => f64::from(u8::from(*b)),
            Value::Number(n) => *n,
            Value::String(s) => {
                let t = s.trim();
                if t.is_empty() {
                    0.0
                } else {
                    t.parse().unwrap_or(f64::NAN)
                }
            }
            Value::Array(_) | Value::Object(_) | Value::Function(_) => f64::NAN,
        }
    }

    /// String coercion as used by `+` concatenation.
    pub fn to_js_string(&self) -> String {
        match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::String(s) => s.clone(),
            Value::Array(items) => items
                .iter()
                .map(|v| match v {
                    Value::Undefined | Value::Null => String::new(),
                    other => other.to_js_string(),
                })
                .join(","),
            Value::Object(o) if o.is_global() => "[object global]".to_string(),
            Value::Object(_) => "[object Object]".to_string(),
            Value::Function(f) => format!("function {}() {{ [native code] }}", f.name()),
        }
    }

    /// `+`: concatenates when either side is a string or a composite, otherwise adds numerically.
    pub fn add(&self, other: &Value) -> Value {
        let concat = |v: &Value| {
            matches!(v, Value::String(_) | Value::Array(_) | Value::Object(_) | Value::Function(_))
        };
        if concat(self) || concat(other) {
            Value::String(format!("{}{}", self.to_js_string(), other.to_js_string()))
        } else {
            Value::Number(self.to_number() + other.to_number())
        }
    }

    pub fn sub(&self, other: &Value) -> Value {
        Value::Number(self.to_number() - other.to_number())
    }

    /// `===`: identity for objects and functions, NaN never equals itself.
    pub fn strict_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// Builds a value from JSON. Every JSON object becomes a fresh mapping.
    pub fn from_json(json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => Value::Array(items.iter().map(Value::from_json).collect()),
            serde_json::Value::Object(map) => Value::Object(ObjectRef::from_pairs(
                map.iter().map(|(k, v)| (k.clone(), Value::from_json(v))),
            )),
        }
    }

    fn fmt_nested(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "'{s}'"),
            Value::Array(items) => {
                if items.is_empty() {
                    return write!(f, "[]");
                }
                if depth > MAX_DISPLAY_DEPTH {
                    return write!(f, "[Array]");
                }
                write!(f, "[ ")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    item.fmt_nested(f, depth + 1)?;
                }
                write!(f, " ]")
            }
            Value::Object(o) if o.is_global() => write!(f, "[object global]"),
            Value::Object(o) => {
                let entries = o.0.borrow().props.clone();
                if entries.is_empty() {
                    return write!(f, "{{}}");
                }
                if depth > MAX_DISPLAY_DEPTH {
                    return write!(f, "[Object]");
                }
                write!(f, "{{ ")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: ")?;
                    v.fmt_nested(f, depth + 1)?;
                }
                write!(f, " }}")
            }
            other => write!(f, "{other}"),
        }
    }
}

/// Console rendering: top-level strings are printed raw, nested ones quoted.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::String(s) => write!(f, "{s}"),
            Value::Function(c) => write!(f, "[Function: {}]", c.name()),
            Value::Array(_) | Value::Object(_) => self.fmt_nested(f, 0),
        }
    }
}

pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let s = if n > 0.0 { "Infinity" } else { "-Infinity" };
        s.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else {
        n.to_string()
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<ObjectRef> for Value {
    fn from(o: ObjectRef) -> Self {
        Value::Object(o)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn arithmetic_over_absent_is_nan() {
        let sum = Value::Number(1.0).add(&Value::Number(2.0)).add(&Value::Undefined);
        assert!(sum.is_nan());
        assert_eq!(sum.to_string(), "NaN");
    }

    #[test]
    fn string_concatenation_renders_absent_as_undefined() {
        let out = Value::from("Hi ").add(&Value::Undefined);
        assert_eq!(out.to_string(), "Hi undefined");
    }

    #[test]
    fn integral_numbers_print_without_fraction() {
        assert_eq!(format_number(10.0), "10");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(f64::INFINITY), "Infinity");
    }

    #[test]
    fn missing_keys_read_as_undefined() {
        let obj = ObjectRef::from_pairs([("firstName", Value::from("Sam"))]);
        assert!(obj.get("lastName").is_undefined());
        assert!(obj.has("firstName"));
    }

    #[test]
    fn set_overwrites_in_place_and_keeps_order() {
        let obj = ObjectRef::new();
        obj.set("a", 1.0.into());
        obj.set("b", 2.0.into());
        obj.set("a", 3.0.into());
        assert_eq!(obj.keys(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(Value::Object(obj).to_string(), "{ a: 3, b: 2 }");
    }

    #[test]
    fn json_objects_are_fresh_mappings() {
        let json = json!({"firstName": "Sam", "tags": [1, "x"]});
        let a = Value::from_json(&json);
        let b = Value::from_json(&json);
        assert!(!a.strict_equals(&b));
        assert_eq!(a.to_string(), "{ firstName: 'Sam', tags: [ 1, 'x' ] }");
    }

    #[test]
    fn self_referencing_objects_render() {
        let obj = ObjectRef::new();
        obj.set("me", Value::Object(obj.clone()));
        assert_eq!(Value::Object(obj).to_string(), "{ me: { me: { me: [Object] } } }");
    }
}
