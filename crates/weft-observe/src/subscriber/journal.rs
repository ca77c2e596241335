use async_trait::async_trait;
use weft_core::Subscribe;
use weft_model::Event;

use crate::subscriber::view::log_event;

const QUEUE_CAPACITY: usize = 2048;

/// Subscriber that turns pool events into log records.
#[derive(Debug, Default, Clone, Copy)]
pub struct Journal;

impl Journal {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for Journal {
    async fn on_event(&self, event: &Event) {
        log_event(event);
    }

    fn name(&self) -> &'static str {
        "journal"
    }

    fn queue_capacity(&self) -> usize {
        QUEUE_CAPACITY
    }
}
