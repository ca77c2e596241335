use std::path::PathBuf;

use clap::{Parser, Subcommand};
use weft_observe::LoggerFormat;

#[derive(Debug, Parser)]
#[command(name = "weft", version, about = "Run the in-process coordination patterns")]
pub struct Cli {
    /// Log at debug level instead of info.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log output: text, json or journald (linux builds with the `journald` feature).
    #[arg(long, global = true, default_value = "text")]
    pub log_format: LoggerFormat,

    /// JSON file with optional `pool`, `gate`, `feed` and `pipeline` sections.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// One writer flips a readiness flag while readers poll it.
    Ready {
        #[arg(long, default_value_t = 4)]
        readers: usize,
        #[arg(long, default_value_t = 100)]
        delay_ms: u64,
    },
    /// Push tasks through a worker pool.
    Workers {
        /// Overrides `pool.workers` from the config file.
        #[arg(long)]
        workers: Option<usize>,
        #[arg(long, default_value_t = 10)]
        tasks: usize,
        /// Make every n-th task panic (0 disables).
        #[arg(long, default_value_t = 0)]
        fail_every: usize,
    },
    /// generate(count) → ×2 → +1 → print.
    Pipeline {
        /// Overrides `pipeline.count` from the config file.
        #[arg(long)]
        count: Option<u64>,
    },
    /// Race a simulated operation against a deadline.
    Timeout {
        #[arg(long, default_value_t = 500)]
        work_ms: u64,
        /// Overrides `gate.deadlineMs` from the config file.
        #[arg(long)]
        deadline_ms: Option<u64>,
        /// Cancel the operation when the deadline wins.
        #[arg(long)]
        cancel: bool,
    },
    /// Publish into a slow consumer without waiting, counting what gets shed.
    Feed {
        /// Overrides `feed.attempts` from the config file.
        #[arg(long)]
        attempts: Option<usize>,
        /// Overrides `feed.pauseMs` from the config file.
        #[arg(long)]
        pause_ms: Option<u64>,
    },
}
