//! Field values carried by generated documents.

use crate::document::Document;
use crate::id::ObjectId;
use serde::Serialize;
use std::collections::BTreeMap;

/// A document field value.
///
/// Arrays are ordered, objects are keyed maps; equality is structural.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Bytes(Vec<u8>),
    Int32(i32),
    Int64(i64),
    Double(f64),
    String(String),
    Null,
    Array(Vec<Value>),
    Object(BTreeMap<String, Value>),
    ObjectId(ObjectId),
    Document(Box<Document>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Integer view of any integral variant.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int32(i) => Some(i64::from(*i)),
            Value::Int64(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(f) => Some(*f),
            Value::Int32(i) => Some(f64::from(*i)),
            Value::Int64(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_object_id(&self) -> Option<&ObjectId> {
        match self {
            Value::ObjectId(id) => Some(id),
            _ => None,
        }
    }

    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Value::Document(doc) => Some(doc),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int32(i)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int64(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Double(f)
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

impl From<ObjectId> for Value {
    fn from(id: ObjectId) -> Self {
        Value::ObjectId(id)
    }
}

impl From<Document> for Value {
    fn from(doc: Document) -> Self {
        Value::Document(Box::new(doc))
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Value::Array(values.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::IdLong;

    #[test]
    fn test_accessors() {
        assert_eq!(Value::Int32(7).as_i64(), Some(7));
        assert_eq!(Value::Int64(7).as_f64(), Some(7.0));
        assert_eq!(Value::from("x").as_str(), Some("x"));
        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert!(Value::Null.is_null());
        assert_eq!(Value::String("1".into()).as_i64(), None);
    }

    #[test]
    fn test_structural_equality() {
        let a = Value::from(vec![1i64, 2, 3]);
        let b = Value::Array(vec![Value::Int64(1), Value::Int64(2), Value::Int64(3)]);
        assert_eq!(a, b);

        let mut left = BTreeMap::new();
        left.insert("a".to_string(), Value::Int32(1));
        left.insert("b".to_string(), Value::Null);
        let mut right = BTreeMap::new();
        right.insert("b".to_string(), Value::Null);
        right.insert("a".to_string(), Value::Int32(1));
        assert_eq!(Value::Object(left), Value::Object(right));
    }

    #[test]
    fn test_serialize_untagged() {
        let oid = IdLong::new(1).object_id();
        let json = serde_json::to_value(Value::from(vec![Value::from(oid), Value::Null])).unwrap();
        assert_eq!(json, serde_json::json!([oid.to_hex(), null]));
    }
}
