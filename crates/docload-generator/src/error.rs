//! Error type for document generation.

use crate::distribution::DistributionError;
use crate::fields::FieldError;
use crate::id_store::IdStoreError;
use crate::storage::StorageError;
use docload_core::{CollectionName, DocumentError, ObjectId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerationError {
    /// Invalid wiring of collections, distributions or specifications.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Id store error: {0}")]
    IdStore(#[from] IdStoreError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Distribution error: {0}")]
    Distribution(#[from] DistributionError),

    #[error("Field error: {0}")]
    Field(#[from] FieldError),

    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    #[error("Document {id} not found in collection '{collection}'")]
    NotFound {
        collection: CollectionName,
        id: ObjectId,
    },

    #[error("No generation specification registered for collection '{0}'")]
    UnknownCollection(CollectionName),

    /// A task was used out of order, such as executing it twice.
    #[error("Precondition violated: {0}")]
    Precondition(String),

    #[error("Could not obtain an existing id for collection '{collection}' after {attempts} attempts")]
    BufferExhausted {
        collection: CollectionName,
        attempts: u32,
    },

    #[error("Reference count {count} for collection '{collection}' is outside [0, {max}]")]
    ReferenceCount {
        collection: CollectionName,
        count: i64,
        max: i64,
    },

    #[error("Generation task failed to complete: {0}")]
    Join(#[from] tokio::task::JoinError),
}
