use std::{fmt, future::Future, pin::Pin};

type BoxedFn = Box<dyn FnOnce() + Send + 'static>;
type BoxedFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Opaque zero-argument unit of work, executed exactly once by a worker.
pub enum Task {
    /// Synchronous closure; runs on the blocking thread pool so it may take its time.
    Blocking(BoxedFn),
    /// Future driven on the async runtime.
    Async(BoxedFuture),
}

impl Task {
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Task::Blocking(Box::new(f))
    }

    pub fn from_future<F>(fut: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Task::Async(Box::pin(fut))
    }

    /// Short label used in logs and events.
    pub fn kind(&self) -> &'static str {
        match self {
            Task::Blocking(_) => "blocking",
            Task::Async(_) => "async",
        }
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Task").field(&self.kind()).finish()
    }
}

/// A task as it sits in the queue, tagged with its enqueue sequence number.
#[derive(Debug)]
pub struct Job {
    pub id: u64,
    pub task: Task,
}
