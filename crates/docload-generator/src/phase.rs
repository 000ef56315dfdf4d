//! Benchmark phase notifications.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BenchmarkPhase {
    Index,
    Load,
    Transaction,
    End,
}

impl fmt::Display for BenchmarkPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BenchmarkPhase::Index => "index",
            BenchmarkPhase::Load => "load",
            BenchmarkPhase::Transaction => "transaction",
            BenchmarkPhase::End => "end",
        })
    }
}

/// Broadcasts the current phase to background work such as buffer refills.
#[derive(Clone)]
pub struct PhaseTopic {
    sender: Arc<watch::Sender<BenchmarkPhase>>,
}

impl PhaseTopic {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(BenchmarkPhase::Index);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn publish(&self, phase: BenchmarkPhase) {
        info!(phase = %phase, "Entering benchmark phase");
        self.sender.send_replace(phase);
    }

    pub fn current(&self) -> BenchmarkPhase {
        *self.sender.borrow()
    }

    pub fn has_ended(&self) -> bool {
        self.current() == BenchmarkPhase::End
    }

    pub fn subscribe(&self) -> watch::Receiver<BenchmarkPhase> {
        self.sender.subscribe()
    }
}

impl Default for PhaseTopic {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_see_transitions() {
        let topic = PhaseTopic::new();
        let mut receiver = topic.subscribe();
        assert_eq!(topic.current(), BenchmarkPhase::Index);

        topic.publish(BenchmarkPhase::Load);
        tokio_test::assert_ok!(receiver.changed().await);
        assert_eq!(*receiver.borrow(), BenchmarkPhase::Load);

        topic.publish(BenchmarkPhase::End);
        assert!(topic.has_ended());
        assert!(BenchmarkPhase::Transaction < BenchmarkPhase::End);
    }
}
