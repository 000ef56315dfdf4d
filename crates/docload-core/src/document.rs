//! Generated documents.

use crate::id::{IdLong, ObjectId};
use crate::values::Value;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use thiserror::Error;

/// Name of the reserved identity field.
pub const ID_FIELD: &str = "_id";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    #[error("Field '_id' is reserved for the document identity")]
    ReservedField,
}

/// A document: a fixed identity plus named field values.
///
/// The identity is set at construction and cannot be overwritten through
/// [`Document::insert`].
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    id: ObjectId,
    fields: BTreeMap<String, Value>,
}

impl Document {
    pub fn new(id: ObjectId) -> Self {
        Self {
            id,
            fields: BTreeMap::new(),
        }
    }

    /// Document whose identity is the hash of `id`.
    pub fn for_id(id: IdLong) -> Self {
        Self::new(id.object_id())
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Set a field, replacing any previous value.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<(), DocumentError> {
        let name = name.into();
        if name == ID_FIELD {
            return Err(DocumentError::ReservedField);
        }
        self.fields.insert(name, value.into());
        Ok(())
    }

    /// Builder form of [`Document::insert`].
    pub fn with_field(
        mut self,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<Self, DocumentError> {
        self.insert(name, value)?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Field lookup that also resolves the reserved identity field.
    pub fn get_value(&self, name: &str) -> Option<Value> {
        if name == ID_FIELD {
            Some(Value::ObjectId(self.id))
        } else {
            self.fields.get(name).cloned()
        }
    }

    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
        map.serialize_entry(ID_FIELD, &self.id)?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_id_field() {
        let mut doc = Document::for_id(IdLong::new(1));
        assert_eq!(doc.insert("_id", 5i64), Err(DocumentError::ReservedField));
        assert!(doc.is_empty());
    }

    #[test]
    fn test_insert_and_get() {
        let doc = Document::for_id(IdLong::new(3))
            .with_field("name", "widget")
            .unwrap()
            .with_field("qty", 4i32)
            .unwrap();
        assert_eq!(doc.get("name"), Some(&Value::from("widget")));
        assert_eq!(doc.get("qty").and_then(Value::as_i64), Some(4));
        assert_eq!(doc.get("missing"), None);
        assert_eq!(doc.get_value(ID_FIELD), Some(Value::ObjectId(doc.id())));
        assert_eq!(doc.len(), 2);
    }

    #[test]
    fn test_serialize_includes_id_first() {
        let doc = Document::for_id(IdLong::new(9)).with_field("a", true).unwrap();
        let json = serde_json::to_string(&doc).unwrap();
        assert!(json.starts_with("{\"_id\":\""));
        assert!(json.ends_with("\"a\":true}"));
    }
}
