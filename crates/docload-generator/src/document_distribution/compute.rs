use super::DocumentDistribution;
use crate::context::{upgrade, GenerationContext};
use crate::distribution::LongDistribution;
use crate::error::GenerationError;
use crate::task::{DocumentTask, TaskKind};
use async_trait::async_trait;
use docload_core::{CollectionName, IdLong};
use rand::rngs::StdRng;
use std::sync::{Arc, Weak};

/// Produces compute tasks that rebuild a document, and everything it
/// references, from its id alone.
pub struct ComputeDocumentDistribution {
    collection: CollectionName,
    ids: LongDistribution,
    context: Weak<GenerationContext>,
}

impl ComputeDocumentDistribution {
    pub fn new(
        collection: CollectionName,
        ids: LongDistribution,
        context: &Arc<GenerationContext>,
    ) -> Result<Self, GenerationError> {
        if !ids.is_repeatable() {
            return Err(GenerationError::Config(format!(
                "computed references to '{collection}' need a repeatable id distribution"
            )));
        }
        Ok(Self {
            collection,
            ids,
            context: Arc::downgrade(context),
        })
    }
}

#[async_trait]
impl DocumentDistribution for ComputeDocumentDistribution {
    fn collection(&self) -> &CollectionName {
        &self.collection
    }

    async fn next(&self, rng: &mut StdRng) -> Result<DocumentTask, GenerationError> {
        let context = upgrade(&self.context)?;
        let id = IdLong::new(self.ids.sample(rng));
        Ok(DocumentTask::new(
            TaskKind::Compute,
            self.collection.clone(),
            id,
            context,
        ))
    }

    fn is_repeatable(&self) -> bool {
        true
    }

    fn produces_persisted(&self) -> bool {
        false
    }
}
