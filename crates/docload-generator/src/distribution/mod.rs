//! Samplers for ids, reference counts and weighted choices.
//!
//! Every sampler draws from the RNG handed in by the caller. Callers pick
//! the entropy source: a fresh `StdRng` per generation normally, or one
//! seeded from a document id when a document must be recomputable.

mod choice;
mod config;
mod id;
mod numeric;

pub use choice::{Enumerated, SampleNonRepeating, UniformChoice};
pub use config::{DistributionConfig, WeightedValue};
pub use id::{OffsetId, SequentialId, UniformId};
pub use numeric::{Constant, Geometric, Shift, UniformRange, ZeroOrElse};

use rand::RngCore;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DistributionError {
    #[error("Invalid {distribution} distribution: {reason}")]
    InvalidParameter {
        distribution: &'static str,
        reason: String,
    },
}

impl DistributionError {
    pub(crate) fn invalid(distribution: &'static str, reason: impl Into<String>) -> Self {
        DistributionError::InvalidParameter {
            distribution,
            reason: reason.into(),
        }
    }
}

/// A source of independent draws of `T`.
pub trait Distribution<T>: Send + Sync {
    fn sample(&self, rng: &mut dyn RngCore) -> T;

    /// Whether draws depend only on configuration and the RNG, never on
    /// runtime state such as a shared counter. Only repeatable samplers can
    /// drive recomputation of a document from its id.
    fn is_repeatable(&self) -> bool {
        true
    }
}

/// Shared sampler over 64-bit integers, used for ids and counts.
pub type LongDistribution = Arc<dyn Distribution<i64>>;
