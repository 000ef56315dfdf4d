//! Named operations run by the transaction phase.

use crate::error::PhaseError;
use async_trait::async_trait;
use docload_core::{CollectionName, IdLong, Value};
use docload_generator::{Distribution, LongDistribution, PrimaryWriteSpecification, Query, Storage};
use rand::RngCore;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::trace;

/// A unit of benchmark work addressed by name.
#[async_trait]
pub trait Operation: Send + Sync {
    fn name(&self) -> &str;

    /// Run once, returning the number of documents read or written.
    async fn execute(&self) -> Result<usize, PhaseError>;
}

/// How a [`ReadOperation`] builds its next query.
pub enum QueryTemplate {
    /// Fetch one document by a sampled id.
    ById {
        collection: CollectionName,
        ids: LongDistribution,
    },
    /// Match documents whose field equals a sampled value.
    FieldEquals {
        collection: CollectionName,
        field: String,
        values: Arc<dyn Distribution<Value>>,
        limit: Option<usize>,
    },
}

impl QueryTemplate {
    pub fn collection(&self) -> &CollectionName {
        match self {
            QueryTemplate::ById { collection, .. } => collection,
            QueryTemplate::FieldEquals { collection, .. } => collection,
        }
    }

    pub fn next_query(&self, rng: &mut dyn RngCore) -> Query {
        match self {
            QueryTemplate::ById { collection, ids } => {
                let id = IdLong::new(ids.sample(rng));
                Query::by_id(collection.clone(), id.object_id())
            }
            QueryTemplate::FieldEquals {
                collection,
                field,
                values,
                limit,
            } => {
                let query = Query::field_equals(collection.clone(), field.clone(), values.sample(rng));
                match limit {
                    Some(limit) => query.with_limit(*limit),
                    None => query,
                }
            }
        }
    }
}

/// Executes a freshly drawn query against storage.
pub struct ReadOperation {
    name: String,
    template: QueryTemplate,
    storage: Arc<dyn Storage>,
}

impl ReadOperation {
    pub fn new(name: impl Into<String>, template: QueryTemplate, storage: Arc<dyn Storage>) -> Self {
        Self {
            name: name.into(),
            template,
            storage,
        }
    }
}

#[async_trait]
impl Operation for ReadOperation {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self) -> Result<usize, PhaseError> {
        let query = {
            let mut rng = rand::thread_rng();
            self.template.next_query(&mut rng)
        };
        let documents = self.storage.execute_query(&query).await?;
        trace!(operation = %self.name, matched = documents.len(), "Query executed");
        Ok(documents.len())
    }
}

/// Writes the next root document of a primary collection.
pub struct WriteOperation {
    name: String,
    writer: Arc<PrimaryWriteSpecification>,
}

impl WriteOperation {
    pub fn new(name: impl Into<String>, writer: Arc<PrimaryWriteSpecification>) -> Self {
        Self {
            name: name.into(),
            writer,
        }
    }
}

#[async_trait]
impl Operation for WriteOperation {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self) -> Result<usize, PhaseError> {
        self.writer.write_next().await?;
        Ok(1)
    }
}

/// Lookup table from operation name to implementation.
#[derive(Default, Clone)]
pub struct OperationRegistry {
    operations: BTreeMap<String, Arc<dyn Operation>>,
}

impl OperationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, operation: Arc<dyn Operation>) -> Result<(), PhaseError> {
        let name = operation.name().to_string();
        if self.operations.contains_key(&name) {
            return Err(PhaseError::Config(format!(
                "operation '{name}' is registered twice"
            )));
        }
        self.operations.insert(name, operation);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn Operation>, PhaseError> {
        self.operations
            .get(name)
            .cloned()
            .ok_or_else(|| PhaseError::UnknownOperation(name.to_string()))
    }

    /// Resolve an ordered list of names, failing on the first unknown one.
    pub fn resolve(&self, names: &[String]) -> Result<Vec<Arc<dyn Operation>>, PhaseError> {
        names.iter().map(|name| self.get(name)).collect()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.operations.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docload_core::Document;
    use docload_generator::distribution::{Constant, UniformChoice};
    use docload_generator::InMemoryStorage;

    struct Noop(&'static str);

    #[async_trait]
    impl Operation for Noop {
        fn name(&self) -> &str {
            self.0
        }

        async fn execute(&self) -> Result<usize, PhaseError> {
            Ok(0)
        }
    }

    #[test]
    fn test_registry_lookup() {
        let mut registry = OperationRegistry::new();
        registry.register(Arc::new(Noop("a"))).unwrap();
        registry.register(Arc::new(Noop("b"))).unwrap();
        assert!(matches!(
            registry.register(Arc::new(Noop("a"))),
            Err(PhaseError::Config(_))
        ));

        assert_eq!(registry.get("b").unwrap().name(), "b");
        assert!(matches!(
            registry.get("c"),
            Err(PhaseError::UnknownOperation(name)) if name == "c"
        ));

        let names = vec!["b".to_string(), "a".to_string(), "b".to_string()];
        let resolved: Vec<_> = registry
            .resolve(&names)
            .unwrap()
            .iter()
            .map(|op| op.name().to_string())
            .collect();
        assert_eq!(resolved, names);
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_read_operation_queries() {
        let storage = Arc::new(InMemoryStorage::new());
        let users = CollectionName::new("users").unwrap();
        for (id, country) in [(1, "NZ"), (2, "NZ"), (3, "AU")] {
            let doc = Document::for_id(IdLong::new(id))
                .with_field("country", country)
                .unwrap();
            storage.write(&users, &doc).await.unwrap();
        }

        let by_id = ReadOperation::new(
            "user_by_id",
            QueryTemplate::ById {
                collection: users.clone(),
                ids: Arc::new(Constant(2i64)),
            },
            storage.clone(),
        );
        assert_eq!(tokio_test::assert_ok!(by_id.execute().await), 1);

        let by_country = ReadOperation::new(
            "users_in_nz",
            QueryTemplate::FieldEquals {
                collection: users.clone(),
                field: "country".to_string(),
                values: Arc::new(UniformChoice::new(vec![Value::from("NZ")]).unwrap()),
                limit: None,
            },
            storage,
        );
        assert_eq!(by_country.execute().await.unwrap(), 2);
        assert_eq!(by_country.name(), "users_in_nz");
    }
}
