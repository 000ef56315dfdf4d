//! Document-graph generation engine for docload.
//!
//! Given a specification per collection, the engine lazily materializes a
//! document together with every document it references. Referenced
//! documents are either read back (their id already exists), generated and
//! persisted on the spot, or recomputed deterministically from their id.
//!
//! # Architecture
//!
//! ```text
//! PrimaryWriteSpecification (next sequential id)
//!          │
//!          ▼
//! ┌──────────────────────────┐   sample every edge
//! │ GenerationSpecification  │──────────────────────┐
//! │  - generator             │                      ▼
//! │  - reference edges       │          ReferenceDistribution
//! │  - mode (persist/compute)│          (count + DocumentDistribution)
//! └────────────┬─────────────┘                      │
//!              │                                    ▼ N tasks, run concurrently
//!              │                             DocumentTask (read | write | compute)
//!              │                                    │ write/compute recurse
//!              │◄───────── resolved references ─────┘
//!              ▼
//!     DocumentGenerator ──► Storage::write ──► IdStore::store
//! ```
//!
//! All shared state lives in a [`GenerationContext`]: storage, the id
//! existence store, worker pools, the phase topic and the registry of
//! specifications.

pub mod context;
pub mod distribution;
pub mod document_distribution;
pub mod error;
pub mod fields;
pub mod generator;
pub mod id_store;
pub mod phase;
pub mod pool;
pub mod reference;
pub mod specification;
pub mod storage;
pub mod task;

// Re-exports for convenience
pub use context::GenerationContext;
pub use distribution::{Distribution, DistributionConfig, DistributionError, LongDistribution};
pub use document_distribution::{
    BufferConfig, BufferedDocumentDistribution, ComputeDocumentDistribution, DocumentDistribution,
    SimpleDocumentDistribution,
};
pub use error::GenerationError;
pub use fields::{FieldError, FieldGenerator, FieldSpec};
pub use generator::{DocumentGenerator, FieldDocumentGenerator, References};
pub use id_store::{IdStore, IdStoreError, IdStoreKind};
pub use phase::{BenchmarkPhase, PhaseTopic};
pub use pool::WorkerPool;
pub use reference::{ReferenceDistribution, ReferencesTask, MAX_REFERENCES};
pub use specification::{GenerationSpecification, PrimaryWriteSpecification, SpecificationMode};
pub use storage::{InMemoryStorage, IndexSpec, Query, QueryFilter, Storage, StorageError};
pub use task::{DocumentTask, TaskKind, TaskState};
