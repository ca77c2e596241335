//! Plain data shared by the `weft` crates.
//!
//! Nothing in here coordinates anything: these are the configs handed to the primitives,
//! the tagged results they return and the events they publish.

mod config;
pub use config::{ConfigError, FeedConfig, GateConfig, PipelineConfig, PoolConfig, WeftConfig};

mod event;
pub use event::{Event, EventKind};

mod outcome;
pub use outcome::{Outcome, Publish};

mod stats;
pub use stats::{OverflowStats, PoolStats};
