//! Sources of "the next document to reference" for one collection.
//!
//! - [`SimpleDocumentDistribution`] samples an id and reads it if present,
//!   otherwise generates and persists it.
//! - [`BufferedDocumentDistribution`] only hands out ids already persisted,
//!   from a queue refilled in the background.
//! - [`ComputeDocumentDistribution`] regenerates documents from their id
//!   without touching storage.

mod buffered;
mod compute;
mod simple;

pub use buffered::{BufferConfig, BufferedDocumentDistribution};
pub use compute::ComputeDocumentDistribution;
pub use simple::SimpleDocumentDistribution;

use crate::error::GenerationError;
use crate::task::DocumentTask;
use async_trait::async_trait;
use docload_core::CollectionName;
use rand::rngs::StdRng;

#[async_trait]
pub trait DocumentDistribution: Send + Sync {
    /// Collection every produced task targets.
    fn collection(&self) -> &CollectionName;

    /// Produce the task for the next document to use.
    async fn next(&self, rng: &mut StdRng) -> Result<DocumentTask, GenerationError>;

    /// Whether the sequence of produced ids depends only on the RNG.
    fn is_repeatable(&self) -> bool;

    /// Whether produced documents end up in storage.
    fn produces_persisted(&self) -> bool {
        true
    }
}
