//! Loosely-typed widget property values.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Ordered property bag attached to every widget.
///
/// Insertion order is preserved so generated documents stay stable
/// across edit/export cycles.
pub type PropMap = IndexMap<String, PropValue>;

/// A single widget property.
///
/// Properties arrive from hand-edited documents as well as saved
/// layouts, so the value space is deliberately loose. The untagged
/// representation keeps saved layouts plain JSON (`"fill": false`,
/// `"font_size": 20`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<PropValue>),
}

impl PropValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Integer view; floats are truncated, numeric strings parsed.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PropValue::Int(n) => Some(*n),
            PropValue::Float(f) => Some(*f as i64),
            PropValue::Str(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropValue::Int(n) => Some(*n as f64),
            PropValue::Float(f) => Some(*f),
            PropValue::Str(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[PropValue]> {
        match self {
            PropValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Truthiness the way document templates treat values: false,
    /// zero, and the empty string are falsy.
    pub fn truthy(&self) -> bool {
        match self {
            PropValue::Bool(b) => *b,
            PropValue::Int(n) => *n != 0,
            PropValue::Float(f) => *f != 0.0,
            PropValue::Str(s) => !s.is_empty() && s != "false",
            PropValue::List(items) => !items.is_empty(),
        }
    }

    /// Render as marker/document text. Lists collapse to a
    /// comma-separated scalar form.
    pub fn to_plain_string(&self) -> String {
        match self {
            PropValue::Bool(b) => b.to_string(),
            PropValue::Int(n) => n.to_string(),
            PropValue::Float(f) => {
                if f.fract() == 0.0 && f.abs() < 1e15 {
                    format!("{}", *f as i64)
                } else {
                    f.to_string()
                }
            }
            PropValue::Str(s) => s.clone(),
            PropValue::List(items) => items
                .iter()
                .map(PropValue::to_plain_string)
                .collect::<Vec<_>>()
                .join(","),
        }
    }
}

impl From<bool> for PropValue {
    fn from(v: bool) -> Self {
        PropValue::Bool(v)
    }
}

impl From<i64> for PropValue {
    fn from(v: i64) -> Self {
        PropValue::Int(v)
    }
}

impl From<i32> for PropValue {
    fn from(v: i32) -> Self {
        PropValue::Int(v as i64)
    }
}

impl From<f64> for PropValue {
    fn from(v: f64) -> Self {
        PropValue::Float(v)
    }
}

impl From<&str> for PropValue {
    fn from(v: &str) -> Self {
        PropValue::Str(v.to_string())
    }
}

impl From<String> for PropValue {
    fn from(v: String) -> Self {
        PropValue::Str(v)
    }
}

impl From<&serde_json::Value> for PropValue {
    fn from(v: &serde_json::Value) -> Self {
        match v {
            serde_json::Value::Bool(b) => PropValue::Bool(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    PropValue::Int(i)
                } else {
                    PropValue::Float(n.as_f64().unwrap_or(0.0))
                }
            }
            serde_json::Value::String(s) => PropValue::Str(s.clone()),
            serde_json::Value::Array(items) => {
                PropValue::List(items.iter().map(PropValue::from).collect())
            }
            _ => PropValue::Str(String::new()),
        }
    }
}

impl From<&PropValue> for serde_json::Value {
    fn from(v: &PropValue) -> Self {
        match v {
            PropValue::Bool(b) => serde_json::Value::Bool(*b),
            PropValue::Int(n) => serde_json::Value::from(*n),
            PropValue::Float(f) => serde_json::Value::from(*f),
            PropValue::Str(s) => serde_json::Value::String(s.clone()),
            PropValue::List(items) => {
                serde_json::Value::Array(items.iter().map(serde_json::Value::from).collect())
            }
        }
    }
}
