//! Error type for benchmark phases.

use docload_generator::{GenerationError, StorageError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PhaseError {
    /// Rejected before any work was scheduled.
    #[error("Invalid phase configuration: {0}")]
    Config(String),

    #[error("Unknown operation '{0}'")]
    UnknownOperation(String),

    #[error("Operation weights sum to {sum}, expected 1")]
    WeightSum { sum: f64 },

    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Worker failed to complete: {0}")]
    Join(#[from] tokio::task::JoinError),
}
