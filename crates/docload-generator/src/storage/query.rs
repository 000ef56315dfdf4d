use docload_core::{CollectionName, Document, ObjectId, Value};
use serde::{Deserialize, Serialize};

/// Read query against a single collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub collection: CollectionName,
    pub filter: QueryFilter,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryFilter {
    All,
    ById(ObjectId),
    FieldEquals { field: String, value: Value },
}

impl Query {
    pub fn by_id(collection: CollectionName, id: ObjectId) -> Self {
        Self {
            collection,
            filter: QueryFilter::ById(id),
            limit: Some(1),
        }
    }

    pub fn field_equals(collection: CollectionName, field: impl Into<String>, value: Value) -> Self {
        Self {
            collection,
            filter: QueryFilter::FieldEquals {
                field: field.into(),
                value,
            },
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, document: &Document) -> bool {
        match &self.filter {
            QueryFilter::All => true,
            QueryFilter::ById(id) => document.id() == *id,
            QueryFilter::FieldEquals { field, value } => document
                .get_value(field)
                .is_some_and(|actual| values_equal(&actual, value)),
        }
    }
}

/// Equality where integers of different widths compare by value.
fn values_equal(actual: &Value, expected: &Value) -> bool {
    match (actual.as_i64(), expected.as_i64()) {
        (Some(a), Some(b)) => a == b,
        _ => actual == expected,
    }
}

/// Index declaration, created before the load phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSpec {
    pub collection: CollectionName,
    pub fields: Vec<String>,
    #[serde(default)]
    pub unique: bool,
}
