use super::{IndexSpec, Query, Storage, StorageError};
use async_trait::async_trait;
use docload_core::{CollectionName, Document, ObjectId};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Process-local storage keeping every document in memory.
///
/// Writing an existing identity replaces the stored document.
#[derive(Default)]
pub struct InMemoryStorage {
    collections: RwLock<HashMap<CollectionName, HashMap<ObjectId, Document>>>,
    indexes: RwLock<Vec<IndexSpec>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in `collection`.
    pub fn count(&self, collection: &CollectionName) -> usize {
        self.collections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(collection)
            .map_or(0, HashMap::len)
    }

    /// Number of documents across all collections.
    pub fn total_count(&self) -> usize {
        self.collections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(HashMap::len)
            .sum()
    }

    pub fn indexes(&self) -> Vec<IndexSpec> {
        self.indexes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn write(
        &self,
        collection: &CollectionName,
        document: &Document,
    ) -> Result<(), StorageError> {
        self.collections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(collection.clone())
            .or_default()
            .insert(document.id(), document.clone());
        Ok(())
    }

    async fn read(
        &self,
        collection: &CollectionName,
        id: ObjectId,
    ) -> Result<Option<Document>, StorageError> {
        Ok(self
            .collections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(collection)
            .and_then(|docs| docs.get(&id))
            .cloned())
    }

    async fn execute_query(&self, query: &Query) -> Result<Vec<Document>, StorageError> {
        let collections = self
            .collections
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let Some(docs) = collections.get(&query.collection) else {
            return Ok(Vec::new());
        };
        let limit = query.limit.unwrap_or(usize::MAX);
        Ok(docs
            .values()
            .filter(|doc| query.matches(doc))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn create_index(&self, index: &IndexSpec) -> Result<(), StorageError> {
        if index.fields.is_empty() {
            return Err(StorageError::EmptyIndex {
                collection: index.collection.clone(),
            });
        }
        self.indexes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(index.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docload_core::{IdLong, Value};

    fn orders() -> CollectionName {
        CollectionName::new("orders").unwrap()
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let storage = InMemoryStorage::new();
        let doc = Document::for_id(IdLong::new(5)).with_field("qty", 2i32).unwrap();
        storage.write(&orders(), &doc).await.unwrap();

        let read = storage.read(&orders(), doc.id()).await.unwrap();
        assert_eq!(read, Some(doc));
        assert_eq!(storage.count(&orders()), 1);
        assert!(storage
            .read(&orders(), IdLong::new(6).object_id())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_query_with_limit() {
        let storage = InMemoryStorage::new();
        for i in 0..10 {
            let status = if i % 2 == 0 { "open" } else { "closed" };
            let doc = Document::for_id(IdLong::new(i))
                .with_field("status", status)
                .unwrap();
            storage.write(&orders(), &doc).await.unwrap();
        }
        let open = Query::field_equals(orders(), "status", Value::from("open"));
        assert_eq!(storage.execute_query(&open).await.unwrap().len(), 5);
        assert_eq!(
            storage.execute_query(&open.with_limit(2)).await.unwrap().len(),
            2
        );
    }

    #[tokio::test]
    async fn test_create_index() {
        let storage = InMemoryStorage::new();
        let index = IndexSpec {
            collection: orders(),
            fields: vec!["status".to_string()],
            unique: false,
        };
        storage.create_index(&index).await.unwrap();
        assert_eq!(storage.indexes(), vec![index]);

        let empty = IndexSpec {
            collection: orders(),
            fields: vec![],
            unique: false,
        };
        assert!(storage.create_index(&empty).await.is_err());
    }
}
