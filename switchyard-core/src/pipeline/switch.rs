//! Switch-Latest Flattening
//!
//! [`SwitchLatest`] flattens a stream of producers into a stream of values,
//! keeping only the most recent producer subscribed.
//!
//! # Polling Order
//!
//! Each poll drains the outer stream first. A producer that arrives in the
//! same turn as a pending value of the current producer therefore wins: the
//! old producer is dropped before its value is looked at, and nothing it
//! emits afterwards is ever observed.
//!
//! # Termination
//!
//! - Inner completion clears the active slot; the output keeps waiting.
//! - Outer completion ends the output and drops the active producer.
//! - An error from either side is yielded once, then the stream is finished.

use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::stream::{FusedStream, Stream, StreamExt};

use crate::error::EngineError;
use crate::source::Producer;

/// Stream adapter that subscribes only to the latest producer.
pub struct SwitchLatest<S, T> {
    outer: Option<S>,
    active: Option<Producer<T>>,
    switches: u64,
}

impl<S, T> SwitchLatest<S, T>
where
    S: Stream<Item = Result<Producer<T>, EngineError>> + Unpin,
{
    /// Flatten `outer`, starting with no active producer.
    pub fn new(outer: S) -> Self {
        Self {
            outer: Some(outer),
            active: None,
            switches: 0,
        }
    }

    /// Whether a producer is currently subscribed.
    pub fn has_active(&self) -> bool {
        self.active.is_some()
    }

    fn terminate(&mut self) {
        self.outer = None;
        self.active = None;
    }
}

impl<S, T> Stream for SwitchLatest<S, T>
where
    S: Stream<Item = Result<Producer<T>, EngineError>> + Unpin,
{
    type Item = Result<T, EngineError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            let Some(outer) = this.outer.as_mut() else {
                return Poll::Ready(None);
            };
            match outer.poll_next_unpin(cx) {
                Poll::Ready(Some(Ok(producer))) => {
                    this.switches += 1;
                    if this.active.replace(producer).is_some() {
                        tracing::trace!(switches = this.switches, "superseded active producer");
                    }
                }
                Poll::Ready(Some(Err(err))) => {
                    this.terminate();
                    return Poll::Ready(Some(Err(err)));
                }
                Poll::Ready(None) => {
                    tracing::debug!("producer stream completed");
                    this.terminate();
                    return Poll::Ready(None);
                }
                Poll::Pending => break,
            }
        }

        let Some(active) = this.active.as_mut() else {
            return Poll::Pending;
        };
        match active.poll_next_unpin(cx) {
            Poll::Ready(Some(Ok(value))) => Poll::Ready(Some(Ok(value))),
            Poll::Ready(Some(Err(err))) => {
                this.terminate();
                Poll::Ready(Some(Err(EngineError::Producer(err))))
            }
            Poll::Ready(None) => {
                // The outer stream returned Pending above, so its waker is
                // registered and the next producer will wake us.
                this.active = None;
                Poll::Pending
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<S, T> fmt::Debug for SwitchLatest<S, T>
where
    S: Stream<Item = Result<Producer<T>, EngineError>> + Unpin,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SwitchLatest")
            .field("active", &self.has_active())
            .field("switches", &self.switches)
            .field("terminated", &self.outer.is_none())
            .finish()
    }
}

impl<S, T> FusedStream for SwitchLatest<S, T>
where
    S: Stream<Item = Result<Producer<T>, EngineError>> + Unpin,
{
    fn is_terminated(&self) -> bool {
        self.outer.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProducerError;
    use futures_util::stream;
    use futures_util::FutureExt;
    use tokio::sync::mpsc;

    type Outer = mpsc::UnboundedSender<Result<Producer<i32>, EngineError>>;

    fn outer_channel() -> (
        Outer,
        impl Stream<Item = Result<Producer<i32>, EngineError>> + Unpin,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let stream = stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        });
        (tx, Box::pin(stream))
    }

    fn producer(values: Vec<i32>) -> Producer<i32> {
        stream::iter(values.into_iter().map(Ok)).boxed()
    }

    fn channel_producer() -> (mpsc::UnboundedSender<i32>, Producer<i32>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let stream = stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|v| (Ok::<_, ProducerError>(v), rx))
        });
        (tx, stream.boxed())
    }

    #[test]
    fn forwards_values_of_active_producer() {
        let (tx, outer) = outer_channel();
        let mut switch = SwitchLatest::new(outer);

        tx.send(Ok(producer(vec![1, 2]))).unwrap();
        assert_eq!(switch.next().now_or_never(), Some(Some(Ok(1))));
        assert_eq!(switch.next().now_or_never(), Some(Some(Ok(2))));

        // Inner completion does not complete the output.
        assert_eq!(switch.next().now_or_never(), None);
        assert!(!switch.has_active());
        assert!(!switch.is_terminated());
    }

    #[test]
    fn new_producer_supersedes_old_one() {
        let (tx, outer) = outer_channel();
        let mut switch = SwitchLatest::new(outer);

        let (old_tx, old) = channel_producer();
        tx.send(Ok(old)).unwrap();
        old_tx.send(1).unwrap();
        assert_eq!(switch.next().now_or_never(), Some(Some(Ok(1))));

        // Old producer has a value queued when the new one arrives.
        old_tx.send(2).unwrap();
        tx.send(Ok(producer(vec![10]))).unwrap();
        assert_eq!(switch.next().now_or_never(), Some(Some(Ok(10))));

        // The old receiver was dropped with the old producer.
        assert!(old_tx.send(3).is_err());
        assert_eq!(switch.next().now_or_never(), None);
    }

    #[test]
    fn producer_error_terminates() {
        let (tx, outer) = outer_channel();
        let mut switch = SwitchLatest::new(outer);

        let failing = stream::iter(vec![Ok(1), Err(ProducerError::new("boom")), Ok(2)]).boxed();
        tx.send(Ok(failing)).unwrap();

        assert_eq!(switch.next().now_or_never(), Some(Some(Ok(1))));
        assert_eq!(
            switch.next().now_or_never(),
            Some(Some(Err(EngineError::Producer(ProducerError::new("boom")))))
        );
        assert!(switch.is_terminated());
        assert_eq!(switch.next().now_or_never(), Some(None));
    }

    #[test]
    fn outer_error_terminates() {
        let (tx, outer) = outer_channel();
        let mut switch = SwitchLatest::new(outer);

        tx.send(Err(EngineError::Normalization { shape: "u8" })).unwrap();
        tx.send(Ok(producer(vec![1]))).unwrap();

        assert_eq!(
            switch.next().now_or_never(),
            Some(Some(Err(EngineError::Normalization { shape: "u8" })))
        );
        assert_eq!(switch.next().now_or_never(), Some(None));
    }

    #[test]
    fn outer_completion_drops_active_producer() {
        let (tx, outer) = outer_channel();
        let mut switch = SwitchLatest::new(outer);

        let (inner_tx, inner) = channel_producer();
        tx.send(Ok(inner)).unwrap();
        assert_eq!(switch.next().now_or_never(), None);
        assert!(switch.has_active());
        assert!(format!("{switch:?}").contains("active: true"));

        drop(tx);
        assert_eq!(switch.next().now_or_never(), Some(None));
        assert!(inner_tx.send(1).is_err());
    }
}
