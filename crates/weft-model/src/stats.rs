use serde::{Deserialize, Serialize};

/// Snapshot of a worker pool's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolStats {
    /// Number of workers the pool was started with.
    pub workers: usize,
    /// Tasks that ran to completion.
    pub executed: u64,
    /// Tasks that panicked and were isolated by the worker loop.
    pub failed: u64,
}

impl PoolStats {
    /// Every task taken off the queue, whatever its fate.
    #[inline]
    pub fn processed(&self) -> u64 {
        self.executed + self.failed
    }
}

/// Counters owned by a non-blocking producer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverflowStats {
    pub sent: u64,
    pub dropped: u64,
}

impl OverflowStats {
    /// Total publish attempts; always `sent + dropped`.
    #[inline]
    pub fn attempts(&self) -> u64 {
        self.sent + self.dropped
    }
}
