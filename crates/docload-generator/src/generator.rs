//! Document generators: turn an id plus resolved references into a document.

use crate::error::GenerationError;
use crate::fields::{Field, FieldError, FieldSpec};
use docload_core::{CollectionName, Document, IdLong};
use rand::RngCore;
use std::collections::HashMap;

/// Documents resolved for each reference edge, keyed by target collection,
/// in the order they were requested.
pub type References = HashMap<CollectionName, Vec<Document>>;

pub trait DocumentGenerator: Send + Sync {
    fn generate(
        &self,
        id: IdLong,
        references: &References,
        rng: &mut dyn RngCore,
    ) -> Result<Document, GenerationError>;

    /// Collections whose referenced documents the generator reads.
    fn referenced_collections(&self) -> Vec<CollectionName> {
        Vec::new()
    }

    /// True when output does not depend on referenced documents.
    fn is_contextless(&self) -> bool {
        self.referenced_collections().is_empty()
    }
}

/// Generator built from declared fields.
pub struct FieldDocumentGenerator {
    fields: Vec<(String, Field)>,
}

impl FieldDocumentGenerator {
    pub fn new(specs: &[FieldSpec]) -> Result<Self, FieldError> {
        let mut fields: Vec<(String, Field)> = Vec::with_capacity(specs.len());
        for spec in specs {
            if fields.iter().any(|(name, _)| *name == spec.name) {
                return Err(FieldError::Invalid {
                    field: spec.name.clone(),
                    reason: "declared more than once".to_string(),
                });
            }
            fields.push((spec.name.clone(), Field::compile(spec)?));
        }
        Ok(Self { fields })
    }
}

impl DocumentGenerator for FieldDocumentGenerator {
    fn generate(
        &self,
        id: IdLong,
        references: &References,
        rng: &mut dyn RngCore,
    ) -> Result<Document, GenerationError> {
        let mut document = Document::for_id(id);
        for (name, field) in &self.fields {
            document.insert(name.clone(), field.generate(id, references, rng))?;
        }
        Ok(document)
    }

    fn referenced_collections(&self) -> Vec<CollectionName> {
        let mut collections = Vec::new();
        for (_, field) in &self.fields {
            field.referenced_collections(&mut collections);
        }
        collections
    }
}
