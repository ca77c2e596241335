//! Bound the time spent waiting on a background operation.
use std::{future::Future, time::Duration};

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};
use weft_model::{GateConfig, Outcome};

use crate::{
    error::{CoreError, GateError},
    join::failure_reason,
};

/// Races an operation's completion against a deadline timer.
///
/// Only the waiter is released early. With [`wait`](TimeoutGate::wait) and
/// [`run`](TimeoutGate::run) a losing operation keeps running in the background and its
/// result is discarded; [`run_cancellable`](TimeoutGate::run_cancellable) additionally
/// cancels the operation's token when the deadline wins.
#[derive(Debug, Clone, Copy)]
pub struct TimeoutGate {
    deadline: Duration,
}

impl TimeoutGate {
    pub fn new(deadline: Duration) -> Self {
        Self { deadline }
    }

    pub fn from_config(cfg: &GateConfig) -> Result<Self, CoreError> {
        cfg.validate()?;
        Ok(Self::new(cfg.deadline()))
    }

    #[inline]
    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Wait for an already running operation's single-use completion signal.
    #[instrument(level = "debug", skip_all, fields(deadline_ms = self.deadline.as_millis() as u64))]
    pub async fn wait<T>(&self, signal: oneshot::Receiver<T>) -> Result<Outcome<T>, GateError> {
        tokio::select! {
            done = signal => match done {
                Ok(value) => {
                    debug!("operation completed before deadline");
                    Ok(Outcome::Completed(value))
                }
                Err(_) => Err(GateError::Abandoned),
            },
            _ = tokio::time::sleep(self.deadline) => {
                warn!("deadline hit; operation left running");
                Ok(Outcome::TimedOut)
            }
        }
    }

    /// Start `op` in the background and wait for it, at most until the deadline.
    ///
    /// On timeout the operation is not stopped: it runs to completion detached and its
    /// output is dropped.
    pub async fn run<F>(&self, op: F) -> Result<Outcome<F::Output>, GateError>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let (done_tx, done_rx) = oneshot::channel();
        let handle = tokio::spawn(async move {
            // Nobody listens any more once the gate has timed out.
            let _ = done_tx.send(op.await);
        });

        match self.wait(done_rx).await {
            Err(GateError::Abandoned) => Err(match handle.await {
                Err(e) if e.is_panic() => GateError::Panicked(failure_reason(e)),
                _ => GateError::Abandoned,
            }),
            other => other,
        }
    }

    /// Like [`run`](TimeoutGate::run), but hands the operation a [`CancellationToken`]
    /// that is cancelled when the deadline wins, so it can stop itself.
    pub async fn run_cancellable<F, Fut>(&self, op: F) -> Result<Outcome<Fut::Output>, GateError>
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future + Send + 'static,
        Fut::Output: Send + 'static,
    {
        let token = CancellationToken::new();
        let outcome = self.run(op(token.child_token())).await?;
        if outcome.is_timed_out() {
            debug!("cancelling timed out operation");
            token.cancel();
        }
        Ok(outcome)
    }
}
