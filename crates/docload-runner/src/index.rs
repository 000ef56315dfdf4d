//! Index creation ahead of loading.

use crate::metrics::{OperationRecorder, PhaseReport, PhaseTimer};
use docload_generator::{BenchmarkPhase, IndexSpec, Storage};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

pub struct IndexPhase {
    storage: Arc<dyn Storage>,
    indexes: Vec<IndexSpec>,
}

impl IndexPhase {
    pub fn new(storage: Arc<dyn Storage>, indexes: Vec<IndexSpec>) -> Self {
        Self { storage, indexes }
    }

    /// Create every index in declaration order. A failed index is logged and
    /// counted; the remaining ones are still attempted.
    pub async fn run(&self) -> PhaseReport {
        info!(indexes = self.indexes.len(), "beginning of index phase");
        let timer = PhaseTimer::start(BenchmarkPhase::Index);
        let recorder = OperationRecorder::new();

        for index in &self.indexes {
            let started = Instant::now();
            let result = self.storage.create_index(index).await;
            let name = format!("index:{}", index.collection);
            if let Err(e) = &result {
                error!(
                    collection = %index.collection,
                    fields = ?index.fields,
                    error = %e,
                    "Failed to create index"
                );
            }
            recorder.record(&name, started.elapsed(), result.is_ok());
        }

        let report = timer.finish(self.indexes.len() as u64, &recorder, false);
        info!(
            created = report.succeeded,
            failed = report.failed,
            "end of index phase"
        );
        report
    }
}
