use std::borrow::Borrow;

use tracing::{debug, error, info, trace};
use weft_model::{Event, EventKind};

/// Read-only accessors with log-friendly fallbacks for missing fields.
pub trait View {
    fn kind(&self) -> EventKind;
    fn worker(&self) -> i64;
    fn task(&self) -> i64;
    fn as_reason(&self) -> &str;
}

impl<T> View for T
where
    T: Borrow<Event>,
{
    #[inline]
    fn kind(&self) -> EventKind {
        self.borrow().kind
    }
    #[inline]
    fn worker(&self) -> i64 {
        self.borrow().worker.map_or(-1, |w| w as i64)
    }
    #[inline]
    fn task(&self) -> i64 {
        self.borrow().task.map_or(-1, |t| t as i64)
    }
    #[inline]
    fn as_reason(&self) -> &str {
        self.borrow().reason.as_deref().unwrap_or("unknown")
    }
}

#[inline]
pub fn message_for(kind: EventKind) -> &'static str {
    match kind {
        // pool
        EventKind::PoolStarted => "worker pool starting",
        EventKind::QueueClosed => "queue closed; draining remaining tasks",
        EventKind::PoolStopped => "all workers joined",

        // worker
        EventKind::WorkerStarted => "worker waiting for tasks",
        EventKind::WorkerStopped => "worker found queue closed and empty",

        // task
        EventKind::TaskCompleted => "task completed",
        EventKind::TaskFailed => "task panicked; isolated by worker",
    }
}

#[inline]
pub fn log_event<E: View>(e: E) {
    let msg = message_for(e.kind());

    match e.kind() {
        // pool
        EventKind::PoolStarted => debug!("{msg}"),
        EventKind::QueueClosed => info!("{msg}"),
        EventKind::PoolStopped => info!("{msg}"),

        // worker
        EventKind::WorkerStarted => trace!(worker = e.worker(), "{msg}"),
        EventKind::WorkerStopped => debug!(worker = e.worker(), "{msg}"),

        // task
        EventKind::TaskCompleted => {
            trace!(worker = e.worker(), task = e.task(), "{msg}")
        }
        EventKind::TaskFailed => error!(
            worker = e.worker(),
            task = e.task(),
            reason = e.as_reason(),
            "{msg}"
        ),
    }
}
