//! In-process coordination primitives on top of tokio.
//!
//! - [`ReadinessFlag`]: monotonic flag behind a reader/writer lock.
//! - [`TaskQueue`] + [`WorkerPool`]: monitor-backed FIFO drained by N workers.
//! - [`handoff`]: capacity-zero rendezvous channel.
//! - [`pipeline`]: generator → stage* → consumer chains over handoff channels.
//! - [`TimeoutGate`]: bound the wait on a background operation.
//! - [`NonBlockingProducer`]: publish-or-shed onto a handoff channel.
pub mod bus;
pub use bus::{Bus, Publisher, Subscribe};

pub mod error;
pub use error::{CoreError, GateError};

pub mod gate;
pub use gate::TimeoutGate;

pub mod handoff;
pub use handoff::{HandoffReceiver, HandoffSender};

mod join;

pub mod pipeline;
pub use pipeline::Pipeline;

pub mod pool;
pub use pool::WorkerPool;

pub mod producer;
pub use producer::NonBlockingProducer;

pub mod queue;
pub use queue::{Job, Task, TaskQueue};

pub mod ready;
pub use ready::ReadinessFlag;

pub mod prelude {
    pub use crate::{
        CoreError, GateError, NonBlockingProducer, Pipeline, ReadinessFlag, Task, TaskQueue,
        TimeoutGate, WorkerPool, handoff,
    };
    pub use weft_model::{Outcome, PoolConfig, PoolStats, Publish};
}
