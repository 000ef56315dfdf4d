//! Benchmark phases for docload.
//!
//! A [`Benchmark`] creates indexes, bulk-loads root documents through the
//! generation engine, then runs a transaction phase: either a fixed
//! power-test sequence or a weighted random mix of named operations at a
//! target rate. Every phase yields a [`PhaseReport`]; per-operation failures
//! are counted there and never abort a phase.

pub mod benchmark;
pub mod error;
pub mod index;
pub mod load;
pub mod metrics;
pub mod operation;
pub mod transaction;

pub use benchmark::Benchmark;
pub use error::PhaseError;
pub use index::IndexPhase;
pub use load::{LoadPhase, LoadTarget, DEFAULT_LOAD_TIMEOUT};
pub use metrics::{BenchmarkReport, OperationRecorder, OperationStats, PhaseReport};
pub use operation::{Operation, OperationRegistry, QueryTemplate, ReadOperation, WriteOperation};
pub use transaction::{
    PowerTestPhase, ThreadRngSource, TransactionPhase, UniformSource, WeightedOperation,
    WeightedRandomPhase,
};
