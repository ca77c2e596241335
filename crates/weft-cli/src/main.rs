mod args;
mod run;

use std::time::Duration;

use clap::Parser;
use tracing::info;
use weft_observe::{LoggerConfig, LoggerLevel, init_logger};

use crate::args::{Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 1) Logger
    let level = if cli.verbose { "debug" } else { "info" };
    let cfg = LoggerConfig {
        format: cli.log_format,
        level: LoggerLevel::new(level)?,
        ..Default::default()
    };
    init_logger(&cfg)?;
    info!(format = %cfg.format, level = cfg.level.as_str(), "logger initialized");

    // 2) Config file, then flag overrides
    let mut config = run::load_config(cli.config.as_deref())?;
    run::apply_overrides(&cli.command, &mut config);
    info!(config = ?config, "configuration loaded");

    // 3) Selected pattern
    match cli.command {
        Command::Ready { readers, delay_ms } => {
            run::ready(readers, Duration::from_millis(delay_ms)).await
        }
        Command::Workers {
            tasks, fail_every, ..
        } => run::workers(&config.pool, tasks, fail_every).await,
        Command::Pipeline { .. } => run::pipeline(&config.pipeline).await,
        Command::Timeout {
            work_ms, cancel, ..
        } => run::timeout(Duration::from_millis(work_ms), &config.gate, cancel).await,
        Command::Feed { .. } => run::feed(&config.feed).await,
    }
}
