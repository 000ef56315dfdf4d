//! Runs the configured phases in order and collects their reports.

use crate::error::PhaseError;
use crate::index::IndexPhase;
use crate::load::LoadPhase;
use crate::metrics::BenchmarkReport;
use crate::transaction::TransactionPhase;
use chrono::Utc;
use docload_generator::{BenchmarkPhase, PhaseTopic};
use tracing::info;

pub struct Benchmark {
    name: String,
    phases: PhaseTopic,
    index: Option<IndexPhase>,
    load: Option<LoadPhase>,
    transaction: Option<TransactionPhase>,
}

impl Benchmark {
    /// `phases` must be the topic the generation context listens on, so
    /// that background buffer refills stop once the benchmark ends.
    pub fn new(name: impl Into<String>, phases: PhaseTopic) -> Self {
        Self {
            name: name.into(),
            phases,
            index: None,
            load: None,
            transaction: None,
        }
    }

    pub fn with_index_phase(mut self, phase: IndexPhase) -> Self {
        self.index = Some(phase);
        self
    }

    pub fn with_load_phase(mut self, phase: LoadPhase) -> Self {
        self.load = Some(phase);
        self
    }

    pub fn with_transaction_phase(mut self, phase: TransactionPhase) -> Self {
        self.transaction = Some(phase);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Index, load, then transaction. `End` is published even when the
    /// transaction phase fails.
    pub async fn run(&self) -> Result<BenchmarkReport, PhaseError> {
        info!(benchmark = %self.name, "Starting benchmark");
        let started_at = Utc::now();
        let mut reports = Vec::new();

        if let Some(index) = &self.index {
            self.phases.publish(BenchmarkPhase::Index);
            reports.push(index.run().await);
        }
        if let Some(load) = &self.load {
            self.phases.publish(BenchmarkPhase::Load);
            reports.push(load.run().await);
        }
        let transaction = match &self.transaction {
            Some(transaction) => {
                self.phases.publish(BenchmarkPhase::Transaction);
                Some(transaction.run().await)
            }
            None => None,
        };
        self.phases.publish(BenchmarkPhase::End);
        if let Some(report) = transaction {
            reports.push(report?);
        }

        let report = BenchmarkReport {
            name: self.name.clone(),
            started_at,
            completed_at: Utc::now(),
            phases: reports,
        };
        info!(
            benchmark = %self.name,
            duration_secs = report.duration_secs(),
            failures = report.total_failures(),
            "Benchmark completed"
        );
        Ok(report)
    }
}
