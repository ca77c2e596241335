//! Generator → Stage* → Consumer chains over handoff channels.
//!
//! Every hop is a [`handoff`](crate::handoff) channel: a stage can only hand a value on
//! when the next stage is ready to take it, so a slow consumer stalls the whole chain.
//! Each spawned task owns the sender of its output channel and drops it when its input
//! is exhausted, which is how closure travels downstream exactly once.
use tracing::{Instrument, debug, debug_span, trace};

use crate::handoff::{self, HandoffReceiver};

/// Emit `0..n` on a fresh channel, then close it.
pub fn generator(n: u64) -> HandoffReceiver<u64> {
    generator_from(0..n)
}

/// Emit every item of `items` in order on a fresh channel, then close it.
///
/// Stops early, without error, if the downstream receiver goes away.
pub fn generator_from<I>(items: I) -> HandoffReceiver<I::Item>
where
    I: IntoIterator,
    I::IntoIter: Send + 'static,
    I::Item: Send + 'static,
{
    let (mut tx, rx) = handoff::channel();
    let items = items.into_iter();

    tokio::spawn(
        async move {
            let mut emitted = 0usize;
            for item in items {
                if tx.send(item).await.is_err() {
                    debug!(emitted, "downstream gone; generator stopped early");
                    return;
                }
                emitted += 1;
            }
            trace!(emitted, "generator exhausted");
        }
        .instrument(debug_span!("generator")),
    );

    rx
}

/// Apply `transform` to every value of `input`, in order, on a fresh output channel.
///
/// The output closes once `input` is closed and drained.
pub fn stage<I, O, F>(mut input: HandoffReceiver<I>, mut transform: F) -> HandoffReceiver<O>
where
    I: Send + 'static,
    O: Send + 'static,
    F: FnMut(I) -> O + Send + 'static,
{
    let (mut tx, rx) = handoff::channel();

    tokio::spawn(
        async move {
            let mut forwarded = 0usize;
            while let Some(value) = input.recv().await {
                if tx.send(transform(value)).await.is_err() {
                    debug!(forwarded, "downstream gone; stage stopped early");
                    return;
                }
                forwarded += 1;
            }
            trace!(forwarded, "stage input closed");
        }
        .instrument(debug_span!("stage")),
    );

    rx
}

/// Apply `sink` to every value of `input` in arrival order until it closes.
///
/// Returns how many values were consumed.
pub async fn consume<T, F>(mut input: HandoffReceiver<T>, mut sink: F) -> usize
where
    F: FnMut(T),
{
    let mut consumed = 0;
    while let Some(value) = input.recv().await {
        sink(value);
        consumed += 1;
    }
    debug_assert!(input.is_closed());
    consumed
}

/// Builder over [`generator`], [`stage`] and [`consume`].
///
/// ```no_run
/// # async fn demo() {
/// use weft_core::pipeline::Pipeline;
///
/// let out = Pipeline::generate(5)
///     .stage(|n| n * 2)
///     .stage(|n| n + 1)
///     .collect()
///     .await;
/// assert_eq!(out, vec![1, 3, 5, 7, 9]);
/// # }
/// ```
pub struct Pipeline<T> {
    tail: HandoffReceiver<T>,
    stages: usize,
}

impl Pipeline<u64> {
    pub fn generate(n: u64) -> Self {
        Self::from_receiver(generator(n))
    }
}

impl<T: Send + 'static> Pipeline<T> {
    #[allow(clippy::should_implement_trait)]
    pub fn from_iter<I>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: Send + 'static,
    {
        Self::from_receiver(generator_from(items))
    }

    /// Continue from an existing channel.
    pub fn from_receiver(rx: HandoffReceiver<T>) -> Self {
        Self {
            tail: rx,
            stages: 0,
        }
    }

    /// Append a stage; its output type may differ from its input.
    pub fn stage<O, F>(self, transform: F) -> Pipeline<O>
    where
        O: Send + 'static,
        F: FnMut(T) -> O + Send + 'static,
    {
        Pipeline {
            tail: stage(self.tail, transform),
            stages: self.stages + 1,
        }
    }

    /// Number of stages between the generator and the consumer.
    pub fn len(&self) -> usize {
        self.stages
    }

    pub fn is_empty(&self) -> bool {
        self.stages == 0
    }

    /// Terminal consumer: run `sink` on every value, return the count.
    pub async fn for_each<F>(self, sink: F) -> usize
    where
        F: FnMut(T),
    {
        consume(self.tail, sink).await
    }

    pub async fn collect(self) -> Vec<T> {
        let mut out = Vec::new();
        consume(self.tail, |v| out.push(v)).await;
        out
    }

    /// Hand the last channel to the caller instead of consuming it here.
    pub fn into_receiver(self) -> HandoffReceiver<T> {
        self.tail
    }
}
