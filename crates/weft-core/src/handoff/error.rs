use std::{error::Error, fmt};

/// The receiver is gone; the value is handed back.
pub struct SendError<T>(pub T);

impl<T> SendError<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Debug for SendError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SendError").finish_non_exhaustive()
    }
}

impl<T> fmt::Display for SendError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("handoff receiver dropped")
    }
}

impl<T> Error for SendError<T> {}

/// Why a non-blocking handoff did not happen; the value is handed back either way.
pub enum TrySendError<T> {
    /// Nobody is parked in `recv` right now.
    NotReady(T),
    /// The receiver is gone.
    Closed(T),
}

impl<T> TrySendError<T> {
    pub fn into_inner(self) -> T {
        match self {
            TrySendError::NotReady(v) | TrySendError::Closed(v) => v,
        }
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        matches!(self, TrySendError::Closed(_))
    }
}

impl<T> fmt::Debug for TrySendError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrySendError::NotReady(_) => f.write_str("NotReady(..)"),
            TrySendError::Closed(_) => f.write_str("Closed(..)"),
        }
    }
}

impl<T> fmt::Display for TrySendError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrySendError::NotReady(_) => f.write_str("no receiver parked on the handoff"),
            TrySendError::Closed(_) => f.write_str("handoff receiver dropped"),
        }
    }
}

impl<T> Error for TrySendError<T> {}
