//! Transaction phase: a fixed power-test sequence or a weighted random mix
//! run at a target rate.

use crate::error::PhaseError;
use crate::metrics::{OperationRecorder, PhaseReport, PhaseTimer};
use crate::operation::Operation;
use docload_generator::BenchmarkPhase;
use rand::Rng;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Allowed distance of the operation weights' sum from 1.
pub const WEIGHT_EPSILON: f64 = 1e-4;

/// Exclusive upper bound on the aggregate rate, in operations per millisecond.
pub const MAX_RATE_PER_MS: f64 = 1_000_000.0;

async fn run_one(operation: &Arc<dyn Operation>, recorder: &OperationRecorder) {
    let started = Instant::now();
    let result = operation.execute().await;
    if let Err(e) = &result {
        error!(operation = operation.name(), error = %e, "Operation failed");
    }
    recorder.record(operation.name(), started.elapsed(), result.is_ok());
}

/// Replays an ordered list of operations back to back.
pub struct PowerTestPhase {
    operations: Vec<Arc<dyn Operation>>,
}

impl PowerTestPhase {
    pub fn new(operations: Vec<Arc<dyn Operation>>) -> Self {
        Self { operations }
    }

    /// Sequence repeated `repeat` times, in order.
    pub fn repeated(sequence: Vec<Arc<dyn Operation>>, repeat: usize) -> Self {
        let mut operations = Vec::with_capacity(sequence.len() * repeat);
        for _ in 0..repeat {
            operations.extend(sequence.iter().cloned());
        }
        Self::new(operations)
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub async fn run(&self) -> PhaseReport {
        info!(operations = self.operations.len(), "beginning of power test");
        let timer = PhaseTimer::start(BenchmarkPhase::Transaction);
        let recorder = OperationRecorder::new();
        for operation in &self.operations {
            run_one(operation, &recorder).await;
        }
        let report = timer.finish(self.operations.len() as u64, &recorder, false);
        info!(
            succeeded = report.succeeded,
            failed = report.failed,
            elapsed_ms = report.duration_ms,
            "end of power test"
        );
        report
    }
}

/// Source of uniform draws in `[0, 1)` used to pick operations.
pub trait UniformSource: Send + Sync {
    fn sample_unit(&self) -> f64;
}

/// Draws from the thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRngSource;

impl UniformSource for ThreadRngSource {
    fn sample_unit(&self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }
}

/// An operation and its probability of being picked.
#[derive(Clone)]
pub struct WeightedOperation {
    pub weight: f64,
    pub operation: Arc<dyn Operation>,
}

/// Cumulative selection table, ascending by weight.
struct SelectionTable {
    entries: Vec<(f64, Arc<dyn Operation>)>,
}

impl SelectionTable {
    fn new(mut operations: Vec<WeightedOperation>) -> Self {
        operations.sort_by(|a, b| a.weight.total_cmp(&b.weight));
        let mut cumulative = 0.0;
        let entries = operations
            .into_iter()
            .map(|w| {
                cumulative += w.weight;
                (cumulative, w.operation)
            })
            .collect();
        Self { entries }
    }

    /// First entry whose cumulative weight exceeds `draw`; the last entry
    /// absorbs rounding at the top of the range.
    fn select(&self, draw: f64) -> &Arc<dyn Operation> {
        let position = self.entries.partition_point(|(c, _)| *c <= draw);
        let index = position.min(self.entries.len() - 1);
        &self.entries[index].1
    }
}

/// Weighted random operation mix at a target aggregate rate.
pub struct WeightedRandomPhase {
    total: u64,
    workers: usize,
    rate_per_ms: f64,
    /// Time between two operations of one worker.
    slot: Duration,
    table: Arc<SelectionTable>,
    source: Arc<dyn UniformSource>,
}

impl WeightedRandomPhase {
    pub fn new(
        total: u64,
        workers: usize,
        rate_per_ms: f64,
        operations: Vec<WeightedOperation>,
    ) -> Result<Self, PhaseError> {
        if workers == 0 {
            return Err(PhaseError::Config(
                "transaction phase needs at least one worker".to_string(),
            ));
        }
        if !(rate_per_ms > 0.0 && rate_per_ms < MAX_RATE_PER_MS) {
            return Err(PhaseError::Config(format!(
                "target rate {rate_per_ms} ops/ms must be in (0, {MAX_RATE_PER_MS})"
            )));
        }
        if operations.is_empty() {
            return Err(PhaseError::Config(
                "transaction phase needs at least one operation".to_string(),
            ));
        }
        if let Some(bad) = operations.iter().find(|w| w.weight.is_nan() || w.weight < 0.0) {
            return Err(PhaseError::Config(format!(
                "operation '{}' has invalid weight {}",
                bad.operation.name(),
                bad.weight
            )));
        }
        let sum: f64 = operations.iter().map(|w| w.weight).sum();
        if (sum - 1.0).abs() > WEIGHT_EPSILON {
            return Err(PhaseError::WeightSum { sum });
        }
        // The busiest worker's schedule must fit a Duration, not just one slot.
        let per_worker = rate_per_ms / workers as f64;
        let slot_secs = 1.0 / (per_worker * 1000.0);
        let busiest = total.div_ceil(workers as u64).max(1);
        let slot = Duration::try_from_secs_f64(slot_secs)
            .and_then(|slot| Duration::try_from_secs_f64(slot_secs * busiest as f64).map(|_| slot))
            .map_err(|e| {
                PhaseError::Config(format!(
                    "target rate {rate_per_ms} ops/ms over {workers} workers gives no usable schedule: {e}"
                ))
            })?;
        Ok(Self {
            total,
            workers,
            rate_per_ms,
            slot,
            table: Arc::new(SelectionTable::new(operations)),
            source: Arc::new(ThreadRngSource),
        })
    }

    pub fn with_source(mut self, source: Arc<dyn UniformSource>) -> Self {
        self.source = source;
        self
    }

    /// Operations assigned to `worker`; the remainder goes to the first workers.
    fn share(&self, worker: usize) -> u64 {
        let workers = self.workers as u64;
        self.total / workers + u64::from((worker as u64) < self.total % workers)
    }

    pub async fn run(&self) -> Result<PhaseReport, PhaseError> {
        info!(
            operations = self.total,
            workers = self.workers,
            rate_per_ms = self.rate_per_ms,
            "beginning of transaction phase"
        );
        let timer = PhaseTimer::start(BenchmarkPhase::Transaction);
        let recorder = Arc::new(OperationRecorder::new());
        let slot = self.slot;

        let mut handles = Vec::with_capacity(self.workers);
        for worker in 0..self.workers {
            let count = self.share(worker);
            let table = Arc::clone(&self.table);
            let source = Arc::clone(&self.source);
            let recorder = Arc::clone(&recorder);
            let jitter = slot.mul_f64(rand::thread_rng().gen_range(0.0..1.0));
            handles.push(tokio::spawn(async move {
                tokio::time::sleep(jitter).await;
                let start = tokio::time::Instant::now();
                for completed in 1..=count {
                    let operation = table.select(source.sample_unit());
                    run_one(operation, &recorder).await;
                    tokio::time::sleep_until(start + slot.mul_f64(completed as f64)).await;
                }
                debug!(worker, operations = count, "Transaction worker finished");
            }));
        }
        for handle in handles {
            handle.await?;
        }

        let report = timer.finish(self.total, &recorder, false);
        info!(
            succeeded = report.succeeded,
            failed = report.failed,
            elapsed_ms = report.duration_ms,
            throughput = report.throughput(),
            "end of transaction phase"
        );
        Ok(report)
    }
}

/// Either transaction mode.
pub enum TransactionPhase {
    PowerTest(PowerTestPhase),
    WeightedRandom(WeightedRandomPhase),
}

impl TransactionPhase {
    pub async fn run(&self) -> Result<PhaseReport, PhaseError> {
        match self {
            TransactionPhase::PowerTest(phase) => Ok(phase.run().await),
            TransactionPhase::WeightedRandom(phase) => phase.run().await,
        }
    }
}
