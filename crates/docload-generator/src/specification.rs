//! Recursive generation of a document together with everything it references.

use crate::context::GenerationContext;
use crate::error::GenerationError;
use crate::generator::{DocumentGenerator, References};
use crate::reference::ReferenceDistribution;
use docload_core::{CollectionName, Document, IdLong};
use futures::future::{try_join_all, BoxFuture};
use futures::FutureExt;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, trace};

/// What happens to a generated document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecificationMode {
    /// Write it to storage and mark its id present.
    Persist,
    /// Only return it; the document is recomputed whenever referenced.
    Compute,
}

/// Generator plus reference edges of one collection.
pub struct GenerationSpecification {
    collection: CollectionName,
    generator: Arc<dyn DocumentGenerator>,
    references: Vec<ReferenceDistribution>,
    mode: SpecificationMode,
}

impl GenerationSpecification {
    /// Specification whose documents are persisted.
    pub fn new(
        collection: CollectionName,
        generator: Arc<dyn DocumentGenerator>,
        references: Vec<ReferenceDistribution>,
    ) -> Result<Self, GenerationError> {
        for needed in generator.referenced_collections() {
            if !references.iter().any(|edge| *edge.target() == needed) {
                return Err(GenerationError::Config(format!(
                    "generator for '{collection}' reads references to '{needed}' but no edge targets it"
                )));
            }
        }
        Ok(Self {
            collection,
            generator,
            references,
            mode: SpecificationMode::Persist,
        })
    }

    /// Specification whose documents are recomputed from their id and never
    /// persisted. Every edge must be repeatable.
    pub fn computed(
        collection: CollectionName,
        generator: Arc<dyn DocumentGenerator>,
        references: Vec<ReferenceDistribution>,
    ) -> Result<Self, GenerationError> {
        if let Some(edge) = references.iter().find(|edge| !edge.is_repeatable()) {
            return Err(GenerationError::Config(format!(
                "computed collection '{collection}' has a non-repeatable reference to '{}'",
                edge.target()
            )));
        }
        let mut specification = Self::new(collection, generator, references)?;
        specification.mode = SpecificationMode::Compute;
        Ok(specification)
    }

    pub fn collection(&self) -> &CollectionName {
        &self.collection
    }

    pub fn mode(&self) -> SpecificationMode {
        self.mode
    }

    pub fn references(&self) -> &[ReferenceDistribution] {
        &self.references
    }

    pub fn is_repeatable(&self) -> bool {
        self.references.iter().all(ReferenceDistribution::is_repeatable)
    }

    /// Generate the document for `id`.
    ///
    /// All edges are sampled first, then every referenced sub-graph is
    /// resolved concurrently. The generator runs only once all of them are
    /// available. In persist mode the document is written and its id marked
    /// before the future completes.
    pub fn generate(
        self: Arc<Self>,
        context: Arc<GenerationContext>,
        id: IdLong,
        rng: StdRng,
    ) -> BoxFuture<'static, Result<Document, GenerationError>> {
        async move { self.generate_inner(&context, id, rng).await }.boxed()
    }

    async fn generate_inner(
        &self,
        context: &GenerationContext,
        id: IdLong,
        mut rng: StdRng,
    ) -> Result<Document, GenerationError> {
        let started = Instant::now();

        let mut pending = Vec::with_capacity(self.references.len());
        for edge in &self.references {
            pending.push(edge.next(&mut rng).await?);
        }
        let resolved = try_join_all(pending.into_iter().map(|mut task| async move {
            let documents = task.execute().await?;
            Ok::<_, GenerationError>((task.collection().clone(), documents))
        }))
        .await?;

        let mut references = References::new();
        for (collection, documents) in resolved {
            references.entry(collection).or_default().extend(documents);
        }

        let document = self.generator.generate(id, &references, &mut rng)?;
        if self.mode == SpecificationMode::Persist {
            context.write_document(&self.collection, id, &document).await?;
        }
        trace!(
            collection = %self.collection,
            id = id.value(),
            references = references.values().map(Vec::len).sum::<usize>(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "Document generated"
        );
        Ok(document)
    }
}

/// Root writer for a collection: generates documents under consecutive ids.
pub struct PrimaryWriteSpecification {
    specification: Arc<GenerationSpecification>,
    context: Arc<GenerationContext>,
    next_id: AtomicI64,
}

impl PrimaryWriteSpecification {
    /// Ids start at `1 + id_offset`.
    pub fn new(
        context: Arc<GenerationContext>,
        collection: &CollectionName,
        id_offset: i64,
    ) -> Result<Self, GenerationError> {
        if id_offset < 0 {
            return Err(GenerationError::Config(format!(
                "id offset {id_offset} for '{collection}' must not be negative"
            )));
        }
        let specification = context.specification(collection)?;
        if specification.mode() != SpecificationMode::Persist {
            return Err(GenerationError::Config(format!(
                "primary collection '{collection}' must be persisted, not computed"
            )));
        }
        Ok(Self {
            specification,
            context,
            next_id: AtomicI64::new(1 + id_offset),
        })
    }

    pub fn collection(&self) -> &CollectionName {
        self.specification.collection()
    }

    /// Id the next write will use.
    pub fn peek_next_id(&self) -> IdLong {
        IdLong::new(self.next_id.load(Ordering::Relaxed))
    }

    /// Generate, persist and mark the next root document.
    pub async fn write_next(&self) -> Result<Document, GenerationError> {
        let id = IdLong::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        let started = Instant::now();
        let document = Arc::clone(&self.specification)
            .generate(Arc::clone(&self.context), id, StdRng::from_entropy())
            .await?;
        debug!(
            collection = %self.collection(),
            id = id.value(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "Root document written"
        );
        Ok(document)
    }
}
