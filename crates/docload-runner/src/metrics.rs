//! Per-operation latency statistics and phase reports.

use chrono::{DateTime, Utc};
use docload_generator::BenchmarkPhase;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, Default)]
struct Latency {
    count: u64,
    failures: u64,
    total: Duration,
    min: Option<Duration>,
    max: Duration,
}

/// Thread-safe accumulator of operation outcomes, keyed by operation name.
#[derive(Debug, Default)]
pub struct OperationRecorder {
    latencies: Mutex<BTreeMap<String, Latency>>,
    succeeded: AtomicU64,
    failed: AtomicU64,
}

impl OperationRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, operation: &str, elapsed: Duration, success: bool) {
        if success {
            self.succeeded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
        let mut latencies = self
            .latencies
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let entry = latencies.entry(operation.to_string()).or_default();
        entry.count += 1;
        if !success {
            entry.failures += 1;
        }
        entry.total += elapsed;
        entry.min = Some(entry.min.map_or(elapsed, |min| min.min(elapsed)));
        entry.max = entry.max.max(elapsed);
    }

    pub fn succeeded(&self) -> u64 {
        self.succeeded.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> Vec<OperationStats> {
        let latencies = self
            .latencies
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        latencies
            .iter()
            .map(|(name, latency)| OperationStats {
                name: name.clone(),
                count: latency.count,
                failures: latency.failures,
                min_ms: latency.min.map_or(0.0, millis),
                mean_ms: if latency.count > 0 {
                    millis(latency.total) / latency.count as f64
                } else {
                    0.0
                },
                max_ms: millis(latency.max),
            })
            .collect()
    }
}

fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

/// Latency summary of one named operation.
#[derive(Debug, Clone, Serialize)]
pub struct OperationStats {
    pub name: String,
    pub count: u64,
    pub failures: u64,
    pub min_ms: f64,
    pub mean_ms: f64,
    pub max_ms: f64,
}

/// Outcome of a single benchmark phase.
#[derive(Debug, Clone, Serialize)]
pub struct PhaseReport {
    pub phase: BenchmarkPhase,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_ms: u64,
    /// Units of work handed to workers.
    pub submitted: u64,
    pub succeeded: u64,
    pub failed: u64,
    /// True when the phase stopped waiting before all work drained.
    pub timed_out: bool,
    pub operations: Vec<OperationStats>,
}

impl PhaseReport {
    /// Operations per second over the phase wall-clock time.
    pub fn throughput(&self) -> f64 {
        if self.duration_ms > 0 {
            (self.succeeded + self.failed) as f64 / (self.duration_ms as f64 / 1000.0)
        } else {
            0.0
        }
    }
}

/// Captures the start of a phase; `finish` turns it into a report.
pub struct PhaseTimer {
    phase: BenchmarkPhase,
    started_at: DateTime<Utc>,
    start: Instant,
}

impl PhaseTimer {
    pub fn start(phase: BenchmarkPhase) -> Self {
        Self {
            phase,
            started_at: Utc::now(),
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn finish(self, submitted: u64, recorder: &OperationRecorder, timed_out: bool) -> PhaseReport {
        PhaseReport {
            phase: self.phase,
            started_at: self.started_at,
            completed_at: Utc::now(),
            duration_ms: self.start.elapsed().as_millis() as u64,
            submitted,
            succeeded: recorder.succeeded(),
            failed: recorder.failed(),
            timed_out,
            operations: recorder.snapshot(),
        }
    }
}

/// Full benchmark output, written as JSON.
#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkReport {
    pub name: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub phases: Vec<PhaseReport>,
}

impl BenchmarkReport {
    pub fn duration_secs(&self) -> f64 {
        (self.completed_at - self.started_at).num_milliseconds() as f64 / 1000.0
    }

    pub fn total_failures(&self) -> u64 {
        self.phases.iter().map(|p| p.failed).sum()
    }

    pub fn phase(&self, phase: BenchmarkPhase) -> Option<&PhaseReport> {
        self.phases.iter().find(|p| p.phase == phase)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorder_statistics() {
        let recorder = OperationRecorder::new();
        recorder.record("read", Duration::from_millis(2), true);
        recorder.record("read", Duration::from_millis(4), true);
        recorder.record("read", Duration::from_millis(6), false);
        recorder.record("write", Duration::from_millis(10), true);

        assert_eq!(recorder.succeeded(), 3);
        assert_eq!(recorder.failed(), 1);

        let stats = recorder.snapshot();
        assert_eq!(stats.len(), 2);
        let read = &stats[0];
        assert_eq!(read.name, "read");
        assert_eq!(read.count, 3);
        assert_eq!(read.failures, 1);
        assert!((read.min_ms - 2.0).abs() < 1e-9);
        assert!((read.mean_ms - 4.0).abs() < 1e-9);
        assert!((read.max_ms - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_report_json() {
        let recorder = OperationRecorder::new();
        recorder.record("load:orders", Duration::from_millis(1), true);
        let timer = PhaseTimer::start(BenchmarkPhase::Load);
        let report = BenchmarkReport {
            name: "orders".to_string(),
            started_at: Utc::now(),
            completed_at: Utc::now(),
            phases: vec![timer.finish(1, &recorder, false)],
        };
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["phases"][0]["phase"], "load");
        assert_eq!(json["phases"][0]["succeeded"], 1);
        assert_eq!(json["phases"][0]["operations"][0]["name"], "load:orders");
        assert_eq!(report.total_failures(), 0);
        assert!(report.phase(BenchmarkPhase::Load).is_some());
    }
}
