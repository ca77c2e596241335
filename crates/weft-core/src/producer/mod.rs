//! Load-shedding publisher.
use tracing::{debug, trace};
use weft_model::{OverflowStats, Publish};

use crate::handoff::{HandoffSender, TrySendError};

type OverflowHook<T> = Box<dyn FnMut(T) + Send + 'static>;

/// Publishes onto a handoff channel without ever waiting.
///
/// A value reaches the consumer only if the consumer is parked in `recv` at the instant
/// of the attempt; anything else is shed and counted. Callers must not assume delivery.
pub struct NonBlockingProducer<T> {
    tx: HandoffSender<T>,
    stats: OverflowStats,
    overflow: Option<OverflowHook<T>>,
}

impl<T> NonBlockingProducer<T> {
    pub fn new(tx: HandoffSender<T>) -> Self {
        Self {
            tx,
            stats: OverflowStats::default(),
            overflow: None,
        }
    }

    /// Receive every shed value instead of dropping it on the floor.
    ///
    /// Shed values are still counted as dropped; the hook is a side channel, not a retry.
    pub fn with_overflow<F>(mut self, hook: F) -> Self
    where
        F: FnMut(T) + Send + 'static,
    {
        self.overflow = Some(Box::new(hook));
        self
    }

    /// One immediate handoff attempt.
    pub fn try_publish(&mut self, value: T) -> Publish {
        match self.tx.try_send(value) {
            Ok(()) => {
                self.stats.sent += 1;
                trace!(sent = self.stats.sent, "published");
                Publish::Sent
            }
            Err(e) => {
                self.stats.dropped += 1;
                match &e {
                    TrySendError::NotReady(_) => {
                        trace!(dropped = self.stats.dropped, "consumer busy; value shed")
                    }
                    TrySendError::Closed(_) => {
                        debug!(dropped = self.stats.dropped, "consumer gone; value shed")
                    }
                }
                if let Some(hook) = self.overflow.as_mut() {
                    hook(e.into_inner());
                }
                Publish::Dropped
            }
        }
    }

    pub fn stats(&self) -> OverflowStats {
        self.stats
    }

    /// `true` once the consumer has gone away; every further attempt is dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Stop publishing and close the channel, returning the final counters.
    pub fn finish(self) -> OverflowStats {
        self.stats
    }
}
