//! Field values derived from the documents a generation referenced.

use crate::generator::References;
use docload_core::{CollectionName, Value};

/// How referenced documents of one collection are rendered into a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceView {
    /// Array of referenced identities.
    Ids,
    /// Identity of the first referenced document, or null.
    FirstId,
    /// Array of the referenced documents, embedded whole.
    Embed,
    /// Array of one field taken from every referenced document.
    Field { field: String },
    /// Number of referenced documents.
    Count,
}

pub fn render_references(
    references: &References,
    collection: &CollectionName,
    view: &ReferenceView,
) -> Value {
    let docs = references.get(collection).map_or(&[][..], Vec::as_slice);
    match view {
        ReferenceView::Ids => Value::Array(docs.iter().map(|d| Value::ObjectId(d.id())).collect()),
        ReferenceView::FirstId => docs.first().map_or(Value::Null, |d| Value::ObjectId(d.id())),
        ReferenceView::Embed => Value::Array(docs.iter().cloned().map(Value::from).collect()),
        ReferenceView::Field { field } => Value::Array(
            docs.iter()
                .map(|d| d.get_value(field).unwrap_or(Value::Null))
                .collect(),
        ),
        ReferenceView::Count => {
            i32::try_from(docs.len()).map_or(Value::Int64(docs.len() as i64), Value::Int32)
        }
    }
}
