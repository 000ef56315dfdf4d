//! Bulk creation of root documents before the transaction phase.

use crate::error::PhaseError;
use crate::metrics::{OperationRecorder, PhaseReport, PhaseTimer};
use docload_generator::{BenchmarkPhase, PrimaryWriteSpecification};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

pub const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// A primary collection and how many root documents to create in it.
pub struct LoadTarget {
    pub writer: Arc<PrimaryWriteSpecification>,
    pub count: u64,
}

pub struct LoadPhase {
    targets: Vec<LoadTarget>,
    pool_size: usize,
    timeout: Duration,
}

impl LoadPhase {
    pub fn new(pool_size: usize) -> Result<Self, PhaseError> {
        if pool_size == 0 {
            return Err(PhaseError::Config(
                "load pool size must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            targets: Vec::new(),
            pool_size,
            timeout: DEFAULT_LOAD_TIMEOUT,
        })
    }

    pub fn with_target(mut self, writer: Arc<PrimaryWriteSpecification>, count: u64) -> Self {
        self.targets.push(LoadTarget { writer, count });
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn total(&self) -> u64 {
        self.targets.iter().map(|t| t.count).sum()
    }

    /// Generate every requested root document.
    ///
    /// Submission blocks once `pool_size` generations are in flight. After
    /// the last submission the phase waits up to the timeout for the rest
    /// to drain; anything still running then is detached and the phase
    /// reports what completed.
    pub async fn run(&self) -> PhaseReport {
        info!(
            documents = self.total(),
            pool_size = self.pool_size,
            "beginning of load phase"
        );
        let timer = PhaseTimer::start(BenchmarkPhase::Load);
        let recorder = Arc::new(OperationRecorder::new());
        let permits = Arc::new(Semaphore::new(self.pool_size));
        let mut tasks = JoinSet::new();
        let mut submitted = 0u64;

        for target in &self.targets {
            let name = format!("load:{}", target.writer.collection());
            for _ in 0..target.count {
                let Ok(permit) = Arc::clone(&permits).acquire_owned().await else {
                    break;
                };
                let writer = Arc::clone(&target.writer);
                let recorder = Arc::clone(&recorder);
                let name = name.clone();
                tasks.spawn(async move {
                    let started = Instant::now();
                    let result = writer.write_next().await;
                    if let Err(e) = &result {
                        error!(collection = %writer.collection(), error = %e, "Root generation failed");
                    }
                    recorder.record(&name, started.elapsed(), result.is_ok());
                    drop(permit);
                });
                submitted += 1;
                while let Some(joined) = tasks.try_join_next() {
                    log_join_failure(joined);
                }
            }
        }

        let drained = tokio::time::timeout(self.timeout, async {
            while let Some(joined) = tasks.join_next().await {
                log_join_failure(joined);
            }
        })
        .await;

        let timed_out = drained.is_err();
        if timed_out {
            warn!(
                timeout_secs = self.timeout.as_secs(),
                outstanding = tasks.len(),
                "Load phase did not drain before timeout, continuing with partial load"
            );
            tasks.detach_all();
        }

        let report = timer.finish(submitted, &recorder, timed_out);
        info!(
            succeeded = report.succeeded,
            failed = report.failed,
            elapsed_ms = report.duration_ms,
            "end of load phase"
        );
        report
    }
}

fn log_join_failure(joined: Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        error!(error = %e, "Load task did not complete");
    }
}
