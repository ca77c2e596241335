//! Monitor-backed FIFO of tasks.
//!
//! The queue pairs one mutex with one [`Notify`]. Callers only see `enqueue`/`dequeue`;
//! the wait-and-recheck loop lives in [`TaskQueue::dequeue`], so a stolen turn or an
//! early wakeup just sends the worker around the loop again.
mod task;
pub use task::{Job, Task};

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use tokio::sync::Notify;
use tracing::{debug, trace};

use crate::error::CoreError;

/// Shared handle to a task queue; clones refer to the same queue.
#[derive(Clone, Default)]
pub struct TaskQueue {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    state: Mutex<State>,
    available: Notify,
}

#[derive(Default)]
struct State {
    jobs: VecDeque<Job>,
    next_id: u64,
    closed: bool,
}

impl Inner {
    // The lock is never held while user code runs, so poisoning cannot leave `State`
    // half-updated.
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `task` at the tail and wake one waiting worker.
    ///
    /// Returns the task's sequence number, or [`CoreError::QueueClosed`] after [`close`].
    ///
    /// [`close`]: TaskQueue::close
    pub fn enqueue(&self, task: Task) -> Result<u64, CoreError> {
        let id = {
            let mut state = self.inner.lock();
            if state.closed {
                return Err(CoreError::QueueClosed);
            }
            let id = state.next_id;
            state.next_id += 1;
            trace!(task = id, kind = task.kind(), depth = state.jobs.len() + 1, "enqueued");
            state.jobs.push_back(Job { id, task });
            id
        };
        self.inner.available.notify_one();
        Ok(id)
    }

    /// Remove the head of the queue, waiting while it is empty.
    ///
    /// Returns `None` only once the queue is closed and every queued task has been taken.
    pub async fn dequeue(&self) -> Option<Job> {
        loop {
            let notified = self.inner.available.notified();
            tokio::pin!(notified);
            // Register as a waiter before looking, so an enqueue landing between the
            // check and the await still reaches us.
            notified.as_mut().enable();

            {
                let mut state = self.inner.lock();
                if let Some(job) = state.jobs.pop_front() {
                    trace!(task = job.id, depth = state.jobs.len(), "dequeued");
                    return Some(job);
                }
                if state.closed {
                    return None;
                }
            }

            notified.await;
        }
    }

    /// Refuse further tasks and wake every waiter. Already queued tasks stay dequeuable.
    pub fn close(&self) {
        {
            let mut state = self.inner.lock();
            if state.closed {
                return;
            }
            state.closed = true;
            debug!(remaining = state.jobs.len(), "task queue closed");
        }
        self.inner.available.notify_waiters();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    pub fn len(&self) -> usize {
        self.inner.lock().jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().jobs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn noop() -> Task {
        Task::new(|| {})
    }

    #[tokio::test]
    async fn fifo_order() {
        let q = TaskQueue::new();
        let a = q.enqueue(noop()).unwrap();
        let b = q.enqueue(Task::from_future(async {})).unwrap();
        let c = q.enqueue(noop()).unwrap();

        assert_eq!(q.len(), 3);
        assert_eq!(q.dequeue().await.unwrap().id, a);
        assert_eq!(q.dequeue().await.unwrap().id, b);
        assert_eq!(q.dequeue().await.unwrap().id, c);
        assert!(q.is_empty());
    }

    #[tokio::test]
    async fn waiting_dequeue_is_woken_by_enqueue() {
        let q = TaskQueue::new();
        let waiter = {
            let q = q.clone();
            tokio::spawn(async move { q.dequeue().await.map(|job| job.id) })
        };

        tokio::task::yield_now().await;
        let id = q.enqueue(noop()).unwrap();

        let got = tokio::time::timeout(Duration::from_secs(5), waiter)
            .await
            .expect("waiter never woke")
            .unwrap();
        assert_eq!(got, Some(id));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn many_waiters_each_get_one_job() {
        let q = TaskQueue::new();
        let waiters: Vec<_> = (0..8)
            .map(|_| {
                let q = q.clone();
                tokio::spawn(async move { q.dequeue().await.map(|job| job.id) })
            })
            .collect();

        for _ in 0..8 {
            q.enqueue(noop()).unwrap();
        }

        let mut ids = Vec::new();
        for w in waiters {
            let id = tokio::time::timeout(Duration::from_secs(5), w)
                .await
                .expect("lost wakeup")
                .unwrap()
                .unwrap();
            ids.push(id);
        }
        ids.sort_unstable();
        assert_eq!(ids, (0..8).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn close_drains_then_ends() {
        let q = TaskQueue::new();
        q.enqueue(noop()).unwrap();
        q.close();
        q.close();

        assert!(q.is_closed());
        assert!(matches!(q.enqueue(noop()), Err(CoreError::QueueClosed)));
        assert!(q.dequeue().await.is_some());
        assert!(q.dequeue().await.is_none());
    }

    #[tokio::test]
    async fn close_wakes_idle_waiters() {
        let q = TaskQueue::new();
        let waiter = {
            let q = q.clone();
            tokio::spawn(async move { q.dequeue().await.is_none() })
        };

        tokio::task::yield_now().await;
        q.close();

        let ended = tokio::time::timeout(Duration::from_secs(5), waiter)
            .await
            .expect("waiter stuck after close")
            .unwrap();
        assert!(ended);
    }
}
