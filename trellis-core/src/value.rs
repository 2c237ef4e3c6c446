//! Value Model
//!
//! The store holds dynamically typed data, so values are represented as a
//! closed tagged enum rather than a generic parameter. This keeps the store
//! heterogeneous (one store can hold numbers, text, and nested structures
//! under different keys) and gives change detection a single place to live.
//!
//! # Change Detection
//!
//! [`Value::same_value`] implements the semantics the store uses to decide
//! whether a write actually changed anything:
//!
//! - `Number` uses SameValueZero: `NaN` is equal to `NaN`, and `+0.0` is
//!   equal to `-0.0`. Plain `f64` equality would treat every write of `NaN`
//!   as a change and notify forever.
//! - `List` and `Map` compare by reference identity (`Arc::ptr_eq`), not by
//!   content. Writing a freshly built list always counts as a change;
//!   writing back the same shared handle does not.
//!
//! The derived `PartialEq` is structural and exists for tests and consumers;
//! it is NOT what the store consults on write.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A dynamically typed value stored under a reactive key.
///
/// `List` and `Map` contents are plain data: nesting a map inside a store
/// value does not make the inner keys reactive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Absent / explicitly empty.
    Null,
    /// A boolean.
    Bool(bool),
    /// A double-precision number. `NaN` is a legal stored value.
    Number(f64),
    /// An immutable string.
    Text(Arc<str>),
    /// A shared, non-reactive sequence.
    List(Arc<Vec<Value>>),
    /// A shared, non-reactive mapping. Insertion order is preserved.
    Map(Arc<IndexMap<String, Value>>),
}

impl Value {
    /// SameValueZero comparison, the semantics behind the store's
    /// write short-circuit.
    pub fn same_value(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::List(a), Value::List(b)) => Arc::ptr_eq(a, b),
            (Value::Map(a), Value::Map(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Name of the variant, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::Text(_) => "text",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::Text(s) => f.write_str(s),
            Value::List(items) => write!(f, "[{} items]", items.len()),
            Value::Map(map) => write!(f, "{{{} keys}}", map.len()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s.into())
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(Arc::new(items))
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(map: IndexMap<String, Value>) -> Self {
        Value::Map(Arc::new(map))
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            // Integers outside f64 range degrade to NaN rather than panic.
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::Text(s.into()),
            serde_json::Value::Array(items) => {
                Value::List(Arc::new(items.into_iter().map(Value::from).collect()))
            }
            serde_json::Value::Object(fields) => Value::Map(Arc::new(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_value_on_primitives() {
        assert!(Value::Null.same_value(&Value::Null));
        assert!(Value::from(true).same_value(&Value::from(true)));
        assert!(!Value::from(true).same_value(&Value::from(false)));
        assert!(Value::from("a").same_value(&Value::from("a")));
        assert!(!Value::from("a").same_value(&Value::from("b")));
        assert!(!Value::Null.same_value(&Value::from(0.0)));
    }

    #[test]
    fn same_value_zero_on_numbers() {
        assert!(Value::from(1.5).same_value(&Value::from(1.5)));
        assert!(!Value::from(1.0).same_value(&Value::from(2.0)));

        // NaN is equal to itself; +0.0 is equal to -0.0.
        assert!(Value::from(f64::NAN).same_value(&Value::from(f64::NAN)));
        assert!(Value::from(0.0).same_value(&Value::from(-0.0)));
    }

    #[test]
    fn containers_compare_by_identity() {
        let shared = Arc::new(vec![Value::from(1.0)]);
        let a = Value::List(Arc::clone(&shared));
        let b = Value::List(shared);
        let rebuilt = Value::List(Arc::new(vec![Value::from(1.0)]));

        assert!(a.same_value(&b));
        assert!(!a.same_value(&rebuilt));
        // Structural equality still sees them as equal.
        assert_eq!(a, rebuilt);
    }

    #[test]
    fn from_json_converts_recursively() {
        let json: serde_json::Value = serde_json::json!({
            "count": 1,
            "label": "hi",
            "nested": { "inner": [1, 2] }
        });

        let value = Value::from(json);
        let map = value.as_map().unwrap();
        assert_eq!(map["count"].as_number(), Some(1.0));
        assert_eq!(map["label"].as_text(), Some("hi"));
        let nested = map["nested"].as_map().unwrap();
        assert_eq!(nested["inner"].as_list().unwrap().len(), 2);
    }

    #[test]
    fn serde_round_trip() {
        let value = Value::from(serde_json::json!({ "a": 1, "b": [true, null] }));
        let text = serde_json::to_string(&value).unwrap();
        let back: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value, back);
    }
}
