//! Fan-out of one reference edge into N concurrently produced documents.

use crate::distribution::LongDistribution;
use crate::document_distribution::DocumentDistribution;
use crate::error::GenerationError;
use crate::task::DocumentTask;
use docload_core::{CollectionName, Document};
use futures::future::try_join_all;
use rand::rngs::StdRng;
use std::sync::Arc;

/// Largest number of documents a single edge may reference.
pub const MAX_REFERENCES: i64 = i32::MAX as i64;

/// A count sampler paired with a document distribution.
#[derive(Clone)]
pub struct ReferenceDistribution {
    count: LongDistribution,
    documents: Arc<dyn DocumentDistribution>,
}

impl ReferenceDistribution {
    pub fn new(count: LongDistribution, documents: Arc<dyn DocumentDistribution>) -> Self {
        Self { count, documents }
    }

    pub fn target(&self) -> &CollectionName {
        self.documents.collection()
    }

    pub fn is_repeatable(&self) -> bool {
        self.count.is_repeatable() && self.documents.is_repeatable()
    }

    /// Sample a count and request that many document tasks.
    pub async fn next(&self, rng: &mut StdRng) -> Result<ReferencesTask, GenerationError> {
        let count = self.count.sample(rng);
        if !(0..=MAX_REFERENCES).contains(&count) {
            return Err(GenerationError::ReferenceCount {
                collection: self.target().clone(),
                count,
                max: MAX_REFERENCES,
            });
        }
        let mut tasks = Vec::new();
        for _ in 0..count {
            tasks.push(self.documents.next(rng).await?);
        }
        Ok(ReferencesTask {
            collection: self.target().clone(),
            tasks: Some(tasks),
            documents: None,
        })
    }
}

/// Single-shot join over the document tasks of one edge.
pub struct ReferencesTask {
    collection: CollectionName,
    tasks: Option<Vec<DocumentTask>>,
    documents: Option<Vec<Document>>,
}

impl ReferencesTask {
    pub fn collection(&self) -> &CollectionName {
        &self.collection
    }

    /// Number of requested documents, before execution.
    pub fn len(&self) -> usize {
        self.tasks.as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run every document task concurrently.
    ///
    /// Documents come back in request order regardless of completion order.
    /// The first failure fails the whole task; siblings already running are
    /// left to finish on their own.
    pub async fn execute(&mut self) -> Result<Vec<Document>, GenerationError> {
        let tasks = self.tasks.take().ok_or_else(|| {
            GenerationError::Precondition(format!(
                "references task for '{}' was already executed",
                self.collection
            ))
        })?;
        let handles = tasks.into_iter().map(|mut task| {
            let handle = tokio::spawn(async move { task.execute().await });
            async move { handle.await? }
        });
        let documents = try_join_all(handles).await?;
        self.documents = Some(documents.clone());
        Ok(documents)
    }

    /// Documents produced by a successful execution.
    pub fn documents(&self) -> Result<&[Document], GenerationError> {
        self.documents.as_deref().ok_or_else(|| {
            GenerationError::Precondition(format!(
                "references for '{}' requested before completion",
                self.collection
            ))
        })
    }
}
