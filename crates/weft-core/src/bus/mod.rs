//! Observability channel for pool events.
//!
//! Each subscriber gets its own bounded queue and delivery task. Publishing never waits:
//! when a subscriber falls behind, events addressed to it are dropped and a warning is
//! logged. Nothing here touches the task queue's lock.
use std::sync::Arc;

use async_trait::async_trait;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{Instrument, trace, warn};
use weft_model::Event;

const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Receiver of pool events.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    async fn on_event(&self, event: &Event);

    fn name(&self) -> &'static str;

    /// Events buffered for this subscriber before new ones are dropped.
    fn queue_capacity(&self) -> usize {
        DEFAULT_QUEUE_CAPACITY
    }
}

struct Lane {
    name: &'static str,
    tx: mpsc::Sender<Arc<Event>>,
}

/// Cheap handle used to publish into a [`Bus`].
#[derive(Clone)]
pub struct Publisher {
    lanes: Arc<[Lane]>,
}

impl Publisher {
    pub fn publish(&self, event: Event) {
        if self.lanes.is_empty() {
            return;
        }
        let event = Arc::new(event);
        for lane in self.lanes.iter() {
            match lane.tx.try_send(Arc::clone(&event)) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(ev)) => warn!(
                    subscriber = lane.name,
                    kind = ?ev.kind,
                    "subscriber queue full; event dropped"
                ),
                Err(mpsc::error::TrySendError::Closed(ev)) => warn!(
                    subscriber = lane.name,
                    kind = ?ev.kind,
                    "subscriber stopped; event dropped"
                ),
            }
        }
    }
}

/// Fan-out of events to a fixed set of subscribers.
pub struct Bus {
    publisher: Publisher,
    deliveries: Vec<JoinHandle<()>>,
}

impl Bus {
    /// Spawn one delivery task per subscriber. Must be called inside a tokio runtime.
    pub fn new(subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        let mut lanes = Vec::with_capacity(subscribers.len());
        let mut deliveries = Vec::with_capacity(subscribers.len());

        for sub in subscribers {
            let (tx, mut rx) = mpsc::channel::<Arc<Event>>(sub.queue_capacity().max(1));
            lanes.push(Lane {
                name: sub.name(),
                tx,
            });
            let delivery = async move {
                while let Some(event) = rx.recv().await {
                    sub.on_event(&event).await;
                }
                trace!(subscriber = sub.name(), "delivery finished");
            };
            deliveries.push(tokio::spawn(delivery.in_current_span()));
        }

        Self {
            publisher: Publisher {
                lanes: lanes.into(),
            },
            deliveries,
        }
    }

    pub fn publisher(&self) -> Publisher {
        self.publisher.clone()
    }

    pub fn publish(&self, event: Event) {
        self.publisher.publish(event);
    }

    /// Stop accepting events and wait until every queued event has been delivered.
    ///
    /// Only returns once all [`Publisher`] clones handed out by this bus are dropped.
    pub async fn flush(self) {
        drop(self.publisher);
        for delivery in self.deliveries {
            if let Err(e) = delivery.await {
                warn!(error = %e, "subscriber delivery task failed");
            }
        }
    }
}
