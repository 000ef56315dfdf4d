//! Single-shot document-producing tasks.

use crate::context::GenerationContext;
use crate::error::GenerationError;
use crate::specification::SpecificationMode;
use docload_core::{CollectionName, Document, IdLong};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fmt;
use std::sync::Arc;

/// How a task obtains its document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// Read an already persisted document.
    Read,
    /// Generate the document, persist it and mark it present.
    Write,
    /// Regenerate the document from its id without persisting.
    Compute,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TaskKind::Read => "read",
            TaskKind::Write => "write",
            TaskKind::Compute => "compute",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TaskState {
    Pending,
    Running,
    Succeeded(Document),
    Failed(String),
}

/// Deferred unit of work yielding one document.
///
/// A task runs `pending -> running -> succeeded | failed` exactly once.
/// Executing it again, or asking for its document before it succeeded, is a
/// [`GenerationError::Precondition`].
pub struct DocumentTask {
    kind: TaskKind,
    collection: CollectionName,
    id: IdLong,
    context: Arc<GenerationContext>,
    state: TaskState,
}

impl DocumentTask {
    pub(crate) fn new(
        kind: TaskKind,
        collection: CollectionName,
        id: IdLong,
        context: Arc<GenerationContext>,
    ) -> Self {
        Self {
            kind,
            collection,
            id,
            context,
            state: TaskState::Pending,
        }
    }

    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    pub fn collection(&self) -> &CollectionName {
        &self.collection
    }

    pub fn id(&self) -> IdLong {
        self.id
    }

    pub fn state(&self) -> &TaskState {
        &self.state
    }

    pub async fn execute(&mut self) -> Result<Document, GenerationError> {
        if self.state != TaskState::Pending {
            return Err(GenerationError::Precondition(format!(
                "{} task for {}/{} was already executed",
                self.kind, self.collection, self.id
            )));
        }
        self.state = TaskState::Running;

        let result = self.run().await;
        self.state = match &result {
            Ok(document) => TaskState::Succeeded(document.clone()),
            Err(e) => TaskState::Failed(e.to_string()),
        };
        result
    }

    async fn run(&self) -> Result<Document, GenerationError> {
        match self.kind {
            TaskKind::Read => self.context.read_document(&self.collection, self.id).await,
            TaskKind::Write => {
                let specification = self.context.specification(&self.collection)?;
                if specification.mode() != SpecificationMode::Persist {
                    return Err(GenerationError::Config(format!(
                        "collection '{}' is computed and cannot be written",
                        self.collection
                    )));
                }
                specification
                    .generate(Arc::clone(&self.context), self.id, StdRng::from_entropy())
                    .await
            }
            TaskKind::Compute => {
                let specification = self.context.specification(&self.collection)?;
                if specification.mode() != SpecificationMode::Compute {
                    return Err(GenerationError::Config(format!(
                        "collection '{}' is persisted and cannot be recomputed",
                        self.collection
                    )));
                }
                // Seeding with the id makes the document a function of the id.
                let rng = StdRng::seed_from_u64(self.id.value() as u64);
                specification
                    .generate(Arc::clone(&self.context), self.id, rng)
                    .await
            }
        }
    }

    /// The produced document, once the task succeeded.
    pub fn document(&self) -> Result<&Document, GenerationError> {
        match &self.state {
            TaskState::Succeeded(document) => Ok(document),
            other => Err(GenerationError::Precondition(format!(
                "document of {} task for {}/{} requested in state {:?}",
                self.kind, self.collection, self.id, other
            ))),
        }
    }
}
