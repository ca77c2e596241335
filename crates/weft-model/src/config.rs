use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_WORKERS: usize = 4;
const DEFAULT_DEADLINE_MS: u64 = 2_000;
const DEFAULT_ATTEMPTS: usize = 100;
const DEFAULT_PAUSE_MS: u64 = 100;
const DEFAULT_COUNT: u64 = 5;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("worker pool needs at least one worker")]
    ZeroWorkers,
    #[error("deadline must be greater than zero")]
    ZeroDeadline,
}

/// Worker pool sizing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PoolConfig {
    /// Number of concurrently running workers.
    pub workers: usize,
}

impl PoolConfig {
    pub fn new(workers: usize) -> Self {
        Self { workers }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        Ok(())
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
        }
    }
}

/// Deadline applied by a timeout gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GateConfig {
    pub deadline_ms: u64,
}

impl GateConfig {
    pub fn new(deadline_ms: u64) -> Self {
        Self { deadline_ms }
    }

    #[inline]
    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.deadline_ms == 0 {
            return Err(ConfigError::ZeroDeadline);
        }
        Ok(())
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            deadline_ms: DEFAULT_DEADLINE_MS,
        }
    }
}

/// Load-shedding feed: how many publish attempts and the pause between them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FeedConfig {
    pub attempts: usize,
    pub pause_ms: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_ATTEMPTS,
            pause_ms: DEFAULT_PAUSE_MS,
        }
    }
}

/// Size of the generated sequence fed into a pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PipelineConfig {
    pub count: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            count: DEFAULT_COUNT,
        }
    }
}

/// Top-level document accepted by the CLI `--config` flag.
///
/// Every section is optional; missing sections and fields fall back to their defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WeftConfig {
    pub pool: PoolConfig,
    pub gate: GateConfig,
    pub feed: FeedConfig,
    pub pipeline: PipelineConfig,
}
