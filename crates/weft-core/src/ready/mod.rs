use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

/// Monotonic "ready" bit published by one writer and observed by many readers.
///
/// Clones share the same flag. Readers take the lock in shared mode and never block one
/// another; the setter takes it exclusively. Once set, the flag stays set.
#[derive(Clone, Debug, Default)]
pub struct ReadinessFlag {
    ready: Arc<RwLock<bool>>,
}

impl ReadinessFlag {
    /// Create an unset flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the flag ready. Repeated calls are no-ops.
    pub fn set_ready(&self) {
        // A bool write cannot be observed half-applied, so a poisoned lock is still sound.
        let mut ready = self.ready.write().unwrap_or_else(PoisonError::into_inner);
        if !*ready {
            *ready = true;
            debug!("readiness flag set");
        }
    }

    /// Current value of the flag.
    pub fn is_ready(&self) -> bool {
        *self.ready.read().unwrap_or_else(PoisonError::into_inner)
    }
}
