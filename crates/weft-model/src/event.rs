use serde::{Deserialize, Serialize};

/// Lifecycle events published by a worker pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    /// The pool is about to spawn its workers.
    PoolStarted,
    /// A worker entered its dequeue loop.
    WorkerStarted,
    /// A task ran to completion.
    TaskCompleted,
    /// A task panicked; the worker isolated it and carries on.
    TaskFailed,
    /// The queue was closed; workers drain what is left and exit.
    QueueClosed,
    /// A worker observed a closed, empty queue and returned.
    WorkerStopped,
    /// Every worker has been joined.
    PoolStopped,
}

/// One observation from the pool.
///
/// Which optional fields are set depends on the kind:
/// worker events carry `worker`, task events carry `worker` and `task`,
/// `TaskFailed` carries a `reason`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub kind: EventKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Event {
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            worker: None,
            task: None,
            reason: None,
        }
    }

    pub fn with_worker(mut self, worker: usize) -> Self {
        self.worker = Some(worker);
        self
    }

    pub fn with_task(mut self, task: u64) -> Self {
        self.task = Some(task);
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_fields() {
        let ev = Event::new(EventKind::TaskFailed)
            .with_worker(2)
            .with_task(17)
            .with_reason("boom");

        assert_eq!(ev.kind, EventKind::TaskFailed);
        assert_eq!(ev.worker, Some(2));
        assert_eq!(ev.task, Some(17));
        assert_eq!(ev.reason.as_deref(), Some("boom"));
    }

    #[test]
    fn serde_skips_missing_fields() {
        let ev = Event::new(EventKind::PoolStarted);
        let json = serde_json::to_string(&ev).unwrap();
        assert_eq!(json, r#"{"kind":"poolStarted"}"#);

        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ev);
    }
}
