//! Capacity-zero rendezvous channel.
//!
//! A value only leaves the sender when the receiver is parked in [`HandoffReceiver::recv`]:
//! the receiver posts a single-use slot, the sender fills it. Nothing is ever buffered,
//! so a slow receiver stalls its sender, and a sender can ask "is anybody waiting right
//! now?" without blocking ([`HandoffSender::try_send`]).
//!
//! Neither half is `Clone`. Dropping the sender is the only way to close the channel, so
//! every hop has exactly one closer and a send after close cannot be expressed.
mod error;
pub use error::{SendError, TrySendError};

use tokio::sync::{mpsc, oneshot};

type Slot<T> = oneshot::Sender<T>;

/// Create a connected sender/receiver pair.
pub fn channel<T>() -> (HandoffSender<T>, HandoffReceiver<T>) {
    let (slots_tx, slots_rx) = mpsc::unbounded_channel();
    (
        HandoffSender { slots: slots_rx },
        HandoffReceiver {
            slots: slots_tx,
            stash: None,
        },
    )
}

/// Producing half; owns the channel's closed state.
pub struct HandoffSender<T> {
    slots: mpsc::UnboundedReceiver<Slot<T>>,
}

impl<T> HandoffSender<T> {
    /// Wait for the receiver to park, then hand `value` to it.
    ///
    /// Returns the value back if the receiver has been dropped.
    pub async fn send(&mut self, mut value: T) -> Result<(), SendError<T>> {
        loop {
            let Some(slot) = self.slots.recv().await else {
                return Err(SendError(value));
            };
            match slot.send(value) {
                Ok(()) => return Ok(()),
                // slot abandoned by a dropped receiver future
                Err(v) => value = v,
            }
        }
    }

    /// Hand `value` over only if the receiver is waiting at this instant. Never suspends.
    pub fn try_send(&mut self, mut value: T) -> Result<(), TrySendError<T>> {
        loop {
            match self.slots.try_recv() {
                Ok(slot) => match slot.send(value) {
                    Ok(()) => return Ok(()),
                    Err(v) => value = v,
                },
                Err(mpsc::error::TryRecvError::Empty) => {
                    return Err(TrySendError::NotReady(value));
                }
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    return Err(TrySendError::Closed(value));
                }
            }
        }
    }

    /// `true` once the receiver has been dropped.
    pub fn is_closed(&self) -> bool {
        self.slots.is_closed()
    }
}

/// Consuming half.
pub struct HandoffReceiver<T> {
    slots: mpsc::UnboundedSender<Slot<T>>,
    /// Value handed to a `recv` that was cancelled before it could return it.
    stash: Option<T>,
}

impl<T> HandoffReceiver<T> {
    /// Park until the sender hands over the next value.
    ///
    /// Returns `None` once the sender has been dropped; values handed over before that
    /// are always observed first. Cancel safe: dropping the future withdraws the offer,
    /// and a value that already landed is returned by the next call.
    pub async fn recv(&mut self) -> Option<T> {
        if let Some(value) = self.stash.take() {
            return Some(value);
        }
        let (slot, rx) = oneshot::channel();
        self.slots.send(slot).ok()?;

        let mut parked = Parked {
            rx,
            stash: &mut self.stash,
        };
        (&mut parked.rx).await.ok()
    }

    /// `true` once the sender has been dropped and nothing handed over is left unread.
    pub fn is_closed(&self) -> bool {
        self.stash.is_none() && self.slots.is_closed()
    }
}

/// An outstanding `recv`. Dropping it before completion closes the slot, so the sender
/// no longer sees a ready receiver.
struct Parked<'a, T> {
    rx: oneshot::Receiver<T>,
    stash: &'a mut Option<T>,
}

impl<T> Drop for Parked<'_, T> {
    fn drop(&mut self) {
        self.rx.close();
        // Filled before the close: the receiver was parked at that instant, keep it.
        if let Ok(value) = self.rx.try_recv() {
            *self.stash = Some(value);
        }
    }
}
