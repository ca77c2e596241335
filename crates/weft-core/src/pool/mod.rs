//! Fixed-size pool of workers draining one [`TaskQueue`].
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use tokio::task::{JoinError, JoinHandle};
use tracing::{Instrument, debug, error, info, info_span, instrument, trace};
use weft_model::{Event, EventKind, PoolConfig, PoolStats};

use crate::{
    bus::{Bus, Publisher, Subscribe},
    error::CoreError,
    join::failure_reason,
    queue::{Job, Task, TaskQueue},
};

#[derive(Default)]
struct Counters {
    executed: AtomicU64,
    failed: AtomicU64,
}

/// N workers, each running `dequeue -> execute` until the queue is closed and drained.
///
/// Tasks run outside the queue lock as their own tokio tasks. A panicking task is caught
/// at the worker boundary, counted, logged and published as [`EventKind::TaskFailed`];
/// the worker then carries on with the next task.
///
/// Dropping the pool without [`shutdown`](WorkerPool::shutdown) leaves the workers
/// running detached for as long as the runtime lives.
pub struct WorkerPool {
    queue: TaskQueue,
    workers: Vec<JoinHandle<()>>,
    counters: Arc<Counters>,
    bus: Bus,
}

impl WorkerPool {
    /// Start `cfg.workers` workers on `queue`. Must be called inside a tokio runtime.
    pub fn spawn(queue: TaskQueue, cfg: &PoolConfig) -> Result<Self, CoreError> {
        Self::with_subscribers(queue, cfg, Vec::new())
    }

    /// Like [`spawn`](WorkerPool::spawn), publishing lifecycle events to `subscribers`.
    #[instrument(level = "debug", skip_all, fields(workers = cfg.workers))]
    pub fn with_subscribers(
        queue: TaskQueue,
        cfg: &PoolConfig,
        subscribers: Vec<Arc<dyn Subscribe>>,
    ) -> Result<Self, CoreError> {
        cfg.validate()?;

        let bus = Bus::new(subscribers);
        bus.publish(Event::new(EventKind::PoolStarted));

        let counters = Arc::new(Counters::default());
        let workers = (0..cfg.workers)
            .map(|id| {
                let worker = Worker {
                    id,
                    queue: queue.clone(),
                    counters: Arc::clone(&counters),
                    events: bus.publisher(),
                };
                tokio::spawn(worker.run().instrument(info_span!("worker", id)))
            })
            .collect();
        info!(workers = cfg.workers, "worker pool started");

        Ok(Self {
            queue,
            workers,
            counters,
            bus,
        })
    }

    /// The queue this pool drains.
    pub fn queue(&self) -> &TaskQueue {
        &self.queue
    }

    /// Shorthand for `self.queue().enqueue(task)`.
    pub fn enqueue(&self, task: Task) -> Result<u64, CoreError> {
        self.queue.enqueue(task)
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            workers: self.workers.len(),
            executed: self.counters.executed.load(Ordering::Acquire),
            failed: self.counters.failed.load(Ordering::Acquire),
        }
    }

    /// Close the queue, let the workers drain what is left, join them and return the
    /// final counters. Subscribers have received every event once this returns.
    pub async fn shutdown(self) -> Result<PoolStats, CoreError> {
        let Self {
            queue,
            workers,
            counters,
            bus,
        } = self;

        queue.close();
        bus.publish(Event::new(EventKind::QueueClosed));

        let total = workers.len();
        let mut first_err = None;
        for (worker, handle) in workers.into_iter().enumerate() {
            if let Err(e) = handle.await {
                error!(worker, error = %e, "worker ended abnormally");
                first_err.get_or_insert(CoreError::WorkerJoin {
                    worker,
                    reason: e.to_string(),
                });
            }
        }

        let stats = PoolStats {
            workers: total,
            executed: counters.executed.load(Ordering::Acquire),
            failed: counters.failed.load(Ordering::Acquire),
        };
        bus.publish(Event::new(EventKind::PoolStopped));
        bus.flush().await;
        info!(executed = stats.executed, failed = stats.failed, "worker pool stopped");

        match first_err {
            Some(e) => Err(e),
            None => Ok(stats),
        }
    }
}

struct Worker {
    id: usize,
    queue: TaskQueue,
    counters: Arc<Counters>,
    events: Publisher,
}

impl Worker {
    async fn run(self) {
        debug!("worker started");
        self.events
            .publish(Event::new(EventKind::WorkerStarted).with_worker(self.id));

        while let Some(Job { id: task, task: work }) = self.queue.dequeue().await {
            trace!(task, kind = work.kind(), "executing");
            match execute(work).await {
                Ok(()) => {
                    self.counters.executed.fetch_add(1, Ordering::AcqRel);
                    self.events.publish(
                        Event::new(EventKind::TaskCompleted)
                            .with_worker(self.id)
                            .with_task(task),
                    );
                }
                Err(e) => {
                    let reason = failure_reason(e);
                    self.counters.failed.fetch_add(1, Ordering::AcqRel);
                    error!(task, %reason, "task failed");
                    self.events.publish(
                        Event::new(EventKind::TaskFailed)
                            .with_worker(self.id)
                            .with_task(task)
                            .with_reason(reason),
                    );
                }
            }
        }

        debug!("worker stopped");
        self.events
            .publish(Event::new(EventKind::WorkerStopped).with_worker(self.id));
    }
}

/// Run one task in its own tokio task so a panic surfaces here as a `JoinError`
/// instead of unwinding through the worker.
async fn execute(task: Task) -> Result<(), JoinError> {
    match task {
        Task::Blocking(f) => tokio::task::spawn_blocking(f).await,
        Task::Async(fut) => tokio::spawn(fut).await,
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{Mutex, atomic::AtomicUsize, mpsc},
        time::Duration,
    };

    use async_trait::async_trait;
    use tracing_test::traced_test;

    use super::*;

    fn counting(counter: &Arc<AtomicUsize>) -> Task {
        let counter = Arc::clone(counter);
        Task::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    async fn run_all(workers: usize, tasks: usize) -> (usize, PoolStats) {
        let queue = TaskQueue::new();
        let pool = WorkerPool::spawn(queue.clone(), &PoolConfig::new(workers)).unwrap();
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..tasks {
            queue.enqueue(counting(&counter)).unwrap();
        }
        let stats = pool.shutdown().await.unwrap();
        (counter.load(Ordering::SeqCst), stats)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn every_task_runs_exactly_once_single_worker() {
        let (runs, stats) = run_all(1, 200).await;
        assert_eq!(runs, 200);
        assert_eq!(stats.executed, 200);
        assert_eq!(stats.failed, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn every_task_runs_exactly_once_many_workers() {
        let (runs, stats) = run_all(8, 500).await;
        assert_eq!(runs, 500);
        assert_eq!(stats.processed(), 500);
        assert_eq!(stats.workers, 8);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn single_worker_preserves_fifo() {
        let queue = TaskQueue::new();
        let pool = WorkerPool::spawn(queue.clone(), &PoolConfig::new(1)).unwrap();
        let order = Arc::new(Mutex::new(Vec::new()));

        for name in ['A', 'B', 'C'] {
            let order = Arc::clone(&order);
            queue
                .enqueue(Task::new(move || order.lock().unwrap().push(name)))
                .unwrap();
        }
        pool.shutdown().await.unwrap();

        assert_eq!(*order.lock().unwrap(), vec!['A', 'B', 'C']);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn long_task_does_not_block_others() {
        let queue = TaskQueue::new();
        let pool = WorkerPool::spawn(queue.clone(), &PoolConfig::new(2)).unwrap();
        let (tx, rx) = mpsc::channel::<()>();
        let released = Arc::new(AtomicUsize::new(0));

        let flag = Arc::clone(&released);
        queue
            .enqueue(Task::new(move || {
                if rx.recv_timeout(Duration::from_secs(5)).is_ok() {
                    flag.fetch_add(1, Ordering::SeqCst);
                }
            }))
            .unwrap();
        queue
            .enqueue(Task::new(move || {
                let _ = tx.send(());
            }))
            .unwrap();

        pool.shutdown().await.unwrap();
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn async_tasks_are_driven() {
        let queue = TaskQueue::new();
        let pool = WorkerPool::spawn(queue.clone(), &PoolConfig::new(3)).unwrap();
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..10 {
            let counter = Arc::clone(&counter);
            queue
                .enqueue(Task::from_future(async move {
                    tokio::task::yield_now().await;
                    counter.fetch_add(1, Ordering::SeqCst);
                }))
                .unwrap();
        }
        let stats = pool.shutdown().await.unwrap();

        assert_eq!(counter.load(Ordering::SeqCst), 10);
        assert_eq!(stats.executed, 10);
    }

    #[traced_test]
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn panicking_task_is_isolated() {
        let queue = TaskQueue::new();
        let pool = WorkerPool::spawn(queue.clone(), &PoolConfig::new(1)).unwrap();
        let counter = Arc::new(AtomicUsize::new(0));

        queue.enqueue(Task::new(|| panic!("boom"))).unwrap();
        queue
            .enqueue(Task::from_future(async { panic!("async boom") }))
            .unwrap();
        queue.enqueue(counting(&counter)).unwrap();

        let stats = pool.shutdown().await.unwrap();
        assert_eq!(stats.failed, 2);
        assert_eq!(stats.executed, 1);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(logs_contain("task failed"));
    }

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<Event>>,
    }

    #[async_trait]
    impl Subscribe for Recorder {
        async fn on_event(&self, event: &Event) {
            self.events.lock().unwrap().push(event.clone());
        }
        fn name(&self) -> &'static str {
            "recorder"
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn failures_reach_subscribers() {
        let rec = Arc::new(Recorder::default());
        let queue = TaskQueue::new();
        let pool = WorkerPool::with_subscribers(
            queue.clone(),
            &PoolConfig::new(2),
            vec![rec.clone() as Arc<dyn Subscribe>],
        )
        .unwrap();

        let failing = queue.enqueue(Task::new(|| panic!("bad input"))).unwrap();
        pool.shutdown().await.unwrap();

        let events = rec.events.lock().unwrap();
        let failed: Vec<_> = events
            .iter()
            .filter(|e| e.kind == EventKind::TaskFailed)
            .collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].task, Some(failing));
        assert_eq!(failed[0].reason.as_deref(), Some("bad input"));

        let stopped = events
            .iter()
            .filter(|e| e.kind == EventKind::WorkerStopped)
            .count();
        assert_eq!(stopped, 2);
        assert_eq!(events.first().map(|e| e.kind), Some(EventKind::PoolStarted));
        assert_eq!(events.last().map(|e| e.kind), Some(EventKind::PoolStopped));
    }

    #[tokio::test]
    async fn zero_workers_rejected() {
        let err = WorkerPool::spawn(TaskQueue::new(), &PoolConfig::new(0)).err();
        assert!(matches!(err, Some(CoreError::InvalidConfig(_))));
    }
}
