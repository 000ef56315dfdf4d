//! Storage contract used by generation and workload execution.
//!
//! The engine only needs to write a document, read one back by identity,
//! run simple queries and declare indexes. How documents are encoded on the
//! wire is up to each backend.

mod memory;
mod query;

pub use memory::InMemoryStorage;
pub use query::{IndexSpec, Query, QueryFilter};

use async_trait::async_trait;
use docload_core::{CollectionName, Document, ObjectId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Index on '{collection}' has no fields")]
    EmptyIndex { collection: CollectionName },
}

#[async_trait]
pub trait Storage: Send + Sync {
    /// Persist `document` into `collection`.
    async fn write(&self, collection: &CollectionName, document: &Document)
        -> Result<(), StorageError>;

    /// Fetch a document by identity.
    async fn read(
        &self,
        collection: &CollectionName,
        id: ObjectId,
    ) -> Result<Option<Document>, StorageError>;

    /// Run a query and return the matching documents.
    async fn execute_query(&self, query: &Query) -> Result<Vec<Document>, StorageError>;

    /// Declare an index. Backends without index support accept and ignore it.
    async fn create_index(&self, _index: &IndexSpec) -> Result<(), StorageError> {
        Ok(())
    }
}
