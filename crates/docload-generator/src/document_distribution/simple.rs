use super::DocumentDistribution;
use crate::context::{upgrade, GenerationContext};
use crate::distribution::LongDistribution;
use crate::error::GenerationError;
use crate::task::{DocumentTask, TaskKind};
use async_trait::async_trait;
use docload_core::{CollectionName, IdLong};
use rand::rngs::StdRng;
use std::sync::{Arc, Weak};

/// Reads the sampled id if it exists, otherwise writes it.
pub struct SimpleDocumentDistribution {
    collection: CollectionName,
    ids: LongDistribution,
    context: Weak<GenerationContext>,
}

impl SimpleDocumentDistribution {
    pub fn new(
        collection: CollectionName,
        ids: LongDistribution,
        context: &Arc<GenerationContext>,
    ) -> Self {
        Self {
            collection,
            ids,
            context: Arc::downgrade(context),
        }
    }
}

#[async_trait]
impl DocumentDistribution for SimpleDocumentDistribution {
    fn collection(&self) -> &CollectionName {
        &self.collection
    }

    async fn next(&self, rng: &mut StdRng) -> Result<DocumentTask, GenerationError> {
        let context = upgrade(&self.context)?;
        let id = IdLong::new(self.ids.sample(rng));
        let kind = if context.id_store().exists(&self.collection, id) {
            TaskKind::Read
        } else {
            TaskKind::Write
        };
        Ok(DocumentTask::new(kind, self.collection.clone(), id, context))
    }

    fn is_repeatable(&self) -> bool {
        self.ids.is_repeatable()
    }
}
