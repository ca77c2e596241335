use thiserror::Error;
use weft_model::ConfigError;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid config: {0}")]
    InvalidConfig(#[from] ConfigError),

    #[error("task queue is closed")]
    QueueClosed,

    #[error("worker {worker} did not shut down cleanly: {reason}")]
    WorkerJoin { worker: usize, reason: String },
}

/// Ways a timeout gate can end without producing an [`Outcome`](weft_model::Outcome).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GateError {
    #[error("operation dropped its completion signal without sending")]
    Abandoned,

    #[error("operation panicked: {0}")]
    Panicked(String),
}
