//! Shared state for all generations of one benchmark.

use crate::error::GenerationError;
use crate::id_store::IdStore;
use crate::phase::PhaseTopic;
use crate::pool::WorkerPool;
use crate::specification::GenerationSpecification;
use crate::storage::Storage;
use docload_core::{CollectionName, Document, IdLong};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, Weak};
use std::time::Instant;
use tracing::debug;

/// Storage, id bookkeeping, pools and the specification registry.
///
/// The context is built once by benchmark assembly and shared behind an
/// `Arc`. Document distributions keep only a [`Weak`] handle, so the
/// registry can own specifications that own those distributions.
pub struct GenerationContext {
    storage: Arc<dyn Storage>,
    id_store: Arc<dyn IdStore>,
    document_pool: WorkerPool,
    refill_pool: WorkerPool,
    phases: PhaseTopic,
    specifications: RwLock<HashMap<CollectionName, Arc<GenerationSpecification>>>,
}

impl GenerationContext {
    pub fn new(storage: Arc<dyn Storage>, id_store: Arc<dyn IdStore>) -> Self {
        let size = WorkerPool::default_size();
        Self {
            storage,
            id_store,
            document_pool: WorkerPool::new("document", size),
            refill_pool: WorkerPool::new("refill", size),
            phases: PhaseTopic::new(),
            specifications: RwLock::new(HashMap::new()),
        }
    }

    /// Pool bounding concurrent storage reads and writes.
    pub fn with_document_pool(mut self, pool: WorkerPool) -> Self {
        self.document_pool = pool;
        self
    }

    /// Pool bounding background buffer refills.
    pub fn with_refill_pool(mut self, pool: WorkerPool) -> Self {
        self.refill_pool = pool;
        self
    }

    pub fn with_phase_topic(mut self, phases: PhaseTopic) -> Self {
        self.phases = phases;
        self
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    pub fn id_store(&self) -> &Arc<dyn IdStore> {
        &self.id_store
    }

    pub fn phases(&self) -> &PhaseTopic {
        &self.phases
    }

    pub fn document_pool(&self) -> &WorkerPool {
        &self.document_pool
    }

    pub fn refill_pool(&self) -> &WorkerPool {
        &self.refill_pool
    }

    /// Register the specification for its collection.
    pub fn register(
        &self,
        specification: GenerationSpecification,
    ) -> Result<Arc<GenerationSpecification>, GenerationError> {
        let mut specifications = self
            .specifications
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let collection = specification.collection().clone();
        if specifications.contains_key(&collection) {
            return Err(GenerationError::Config(format!(
                "collection '{collection}' already has a generation specification"
            )));
        }
        let specification = Arc::new(specification);
        specifications.insert(collection, Arc::clone(&specification));
        Ok(specification)
    }

    pub fn specification(
        &self,
        collection: &CollectionName,
    ) -> Result<Arc<GenerationSpecification>, GenerationError> {
        self.specifications
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(collection)
            .cloned()
            .ok_or_else(|| GenerationError::UnknownCollection(collection.clone()))
    }

    pub fn registered_collections(&self) -> Vec<CollectionName> {
        let mut collections: Vec<_> = self
            .specifications
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        collections.sort();
        collections
    }

    /// Read a persisted document by numeric id.
    pub async fn read_document(
        &self,
        collection: &CollectionName,
        id: IdLong,
    ) -> Result<Document, GenerationError> {
        let object_id = id.object_id();
        let started = Instant::now();
        let document = self
            .document_pool
            .run(self.storage.read(collection, object_id))
            .await?;
        debug!(
            collection = %collection,
            id = id.value(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "Document read"
        );
        document.ok_or_else(|| GenerationError::NotFound {
            collection: collection.clone(),
            id: object_id,
        })
    }

    /// Persist a document, then mark its id present. Ids the id store cannot
    /// hold are rejected before anything is written.
    pub async fn write_document(
        &self,
        collection: &CollectionName,
        id: IdLong,
        document: &Document,
    ) -> Result<(), GenerationError> {
        self.id_store.check(collection, id)?;
        let started = Instant::now();
        self.document_pool
            .run(self.storage.write(collection, document))
            .await?;
        self.id_store.store(collection, id)?;
        debug!(
            collection = %collection,
            id = id.value(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "Document written"
        );
        Ok(())
    }
}

/// Resolve a weak context handle held by a distribution.
pub(crate) fn upgrade(
    context: &Weak<GenerationContext>,
) -> Result<Arc<GenerationContext>, GenerationError> {
    context.upgrade().ok_or_else(|| {
        GenerationError::Precondition("generation context was dropped".to_string())
    })
}
