use std::{
    fs::File,
    io::BufReader,
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use anyhow::{Context, bail};
use tracing::{info, warn};
use weft_core::{
    NonBlockingProducer, Pipeline, ReadinessFlag, Subscribe, Task, TaskQueue, TimeoutGate,
    WorkerPool, handoff,
};
use weft_model::{FeedConfig, GateConfig, PipelineConfig, PoolConfig, WeftConfig};
use weft_observe::Journal;

use crate::args::Command;

pub fn load_config(path: Option<&Path>) -> anyhow::Result<WeftConfig> {
    let Some(path) = path else {
        return Ok(WeftConfig::default());
    };
    let file = File::open(path).with_context(|| format!("open config {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parse config {}", path.display()))
}

/// Layer the flags given on the command line over `cfg`.
pub fn apply_overrides(command: &Command, cfg: &mut WeftConfig) {
    match *command {
        Command::Workers {
            workers: Some(w), ..
        } => cfg.pool.workers = w,
        Command::Pipeline { count: Some(c) } => cfg.pipeline.count = c,
        Command::Timeout {
            deadline_ms: Some(d),
            ..
        } => cfg.gate.deadline_ms = d,
        Command::Feed { attempts, pause_ms } => {
            if let Some(a) = attempts {
                cfg.feed.attempts = a;
            }
            if let Some(p) = pause_ms {
                cfg.feed.pause_ms = p;
            }
        }
        _ => {}
    }
}

pub async fn ready(readers: usize, delay: Duration) -> anyhow::Result<()> {
    let flag = ReadinessFlag::new();

    let handles: Vec<_> = (0..readers)
        .map(|id| {
            let flag = flag.clone();
            tokio::spawn(async move {
                let mut polls = 0u32;
                while !flag.is_ready() {
                    polls += 1;
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
                info!(reader = id, polls, "reader observed ready");
            })
        })
        .collect();

    tokio::time::sleep(delay).await;
    flag.set_ready();
    info!("writer set ready");

    for h in handles {
        h.await.context("reader task")?;
    }
    Ok(())
}

pub async fn workers(cfg: &PoolConfig, tasks: usize, fail_every: usize) -> anyhow::Result<()> {
    let queue = TaskQueue::new();
    let subscribers: Vec<Arc<dyn Subscribe>> = vec![Arc::new(Journal::new())];
    let pool = WorkerPool::with_subscribers(queue.clone(), cfg, subscribers)?;
    let done = Arc::new(AtomicUsize::new(0));

    for n in 1..=tasks {
        let done = Arc::clone(&done);
        let fails = fail_every != 0 && n % fail_every == 0;
        queue.enqueue(Task::new(move || {
            if fails {
                panic!("task {n} asked to fail");
            }
            std::thread::sleep(Duration::from_millis(20));
            done.fetch_add(1, Ordering::Relaxed);
            info!(n, "task ran");
        }))?;
    }

    let stats = pool.shutdown().await?;
    info!(
        workers = stats.workers,
        executed = stats.executed,
        failed = stats.failed,
        ran = done.load(Ordering::Relaxed),
        "all tasks processed"
    );
    Ok(())
}

pub async fn pipeline(cfg: &PipelineConfig) -> anyhow::Result<()> {
    let received = Pipeline::generate(cfg.count)
        .stage(|n| n * 2)
        .stage(|n| n + 1)
        .for_each(|n| info!(value = n, "received"))
        .await;
    info!(received, "pipeline drained");
    Ok(())
}

pub async fn timeout(work: Duration, cfg: &GateConfig, cancel: bool) -> anyhow::Result<()> {
    let gate = TimeoutGate::from_config(cfg)?;
    info!(work_ms = work.as_millis() as u64, deadline_ms = cfg.deadline_ms, "started");

    let outcome = if cancel {
        gate.run_cancellable(move |token| async move {
            tokio::select! {
                _ = tokio::time::sleep(work) => info!("operation finished"),
                _ = token.cancelled() => info!("operation cancelled"),
            }
        })
        .await?
    } else {
        gate.run(async move {
            tokio::time::sleep(work).await;
            info!("operation finished");
        })
        .await?
    };

    if outcome.is_completed() {
        info!("done");
    } else {
        warn!("timeout");
    }

    // Give a detached loser the chance to report before the runtime goes away.
    tokio::time::sleep(work.saturating_sub(gate.deadline())).await;
    info!("stopped");
    Ok(())
}

pub async fn feed(cfg: &FeedConfig) -> anyhow::Result<()> {
    if cfg.attempts == 0 {
        bail!("feed needs at least one attempt");
    }

    let (tx, mut rx) = handoff::channel::<usize>();
    let consumer = tokio::spawn(async move {
        let mut consumed = 0usize;
        while let Some(v) = rx.recv().await {
            // Uneven, deterministic service time.
            tokio::time::sleep(Duration::from_millis((v as u64 * 37) % 250)).await;
            consumed += 1;
        }
        consumed
    });

    let mut producer = NonBlockingProducer::new(tx)
        .with_overflow(|v| warn!(value = v, "overflow; no secondary consumer"));
    let pause = Duration::from_millis(cfg.pause_ms);
    for i in 0..cfg.attempts {
        if producer.try_publish(i).is_sent() {
            info!(value = i, "sent");
        }
        tokio::time::sleep(pause).await;
    }

    let stats = producer.finish();
    let consumed = consumer.await.context("consumer task")?;
    info!(sent = stats.sent, dropped = stats.dropped, consumed, "feed finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use clap::Parser;
    use tempfile::NamedTempFile;

    use super::*;
    use crate::args::Cli;

    fn config_file(json: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    fn resolve(file: Option<&NamedTempFile>, argv: &[&str]) -> WeftConfig {
        let cli = Cli::parse_from(argv);
        let mut cfg = load_config(file.map(NamedTempFile::path)).unwrap();
        apply_overrides(&cli.command, &mut cfg);
        cfg
    }

    #[test]
    fn no_file_means_defaults() {
        assert_eq!(load_config(None).unwrap(), WeftConfig::default());
    }

    #[test]
    fn partial_file_keeps_defaults_elsewhere() {
        let file = config_file(r#"{ "pool": { "workers": 7 }, "feed": { "pauseMs": 5 } }"#);
        let cfg = load_config(Some(file.path())).unwrap();

        assert_eq!(cfg.pool.workers, 7);
        assert_eq!(cfg.feed.pause_ms, 5);
        assert_eq!(cfg.feed.attempts, FeedConfig::default().attempts);
        assert_eq!(cfg.gate, GateConfig::default());
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(Some(dir.path().join("absent.json").as_path())).unwrap_err();
        assert!(err.to_string().starts_with("open config"));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let file = config_file(r#"{ "pool": { "workers": "many" } }"#);
        let err = load_config(Some(file.path())).unwrap_err();
        assert!(err.to_string().starts_with("parse config"));
    }

    #[test]
    fn flag_beats_file_beats_default() {
        let file = config_file(r#"{ "pool": { "workers": 7 }, "gate": { "deadlineMs": 900 } }"#);

        let cfg = resolve(Some(&file), &["weft", "workers", "--workers", "2"]);
        assert_eq!(cfg.pool.workers, 2);

        let cfg = resolve(Some(&file), &["weft", "workers"]);
        assert_eq!(cfg.pool.workers, 7);

        let cfg = resolve(None, &["weft", "workers"]);
        assert_eq!(cfg.pool.workers, PoolConfig::default().workers);

        let cfg = resolve(Some(&file), &["weft", "timeout", "--deadline-ms", "50"]);
        assert_eq!(cfg.gate.deadline_ms, 50);
    }

    #[test]
    fn feed_flags_override_independently() {
        let file = config_file(r#"{ "feed": { "attempts": 10, "pauseMs": 20 } }"#);

        let cfg = resolve(Some(&file), &["weft", "feed", "--pause-ms", "1"]);
        assert_eq!(cfg.feed, FeedConfig { attempts: 10, pause_ms: 1 });
    }

    #[test]
    fn flags_of_other_commands_leave_config_alone() {
        let file = config_file(r#"{ "pipeline": { "count": 3 } }"#);

        let cfg = resolve(Some(&file), &["weft", "pipeline"]);
        assert_eq!(cfg.pipeline.count, 3);

        let cfg = resolve(Some(&file), &["weft", "ready"]);
        assert_eq!(cfg, load_config(Some(file.path())).unwrap());
    }
}
