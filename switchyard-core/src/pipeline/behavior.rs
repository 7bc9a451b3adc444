//! Configurable Behavior Stage
//!
//! A transform from the stream of producers to a stream of producers, applied
//! just before switch-latest flattening. It is the one place batching policies
//! live; the rest of the pipeline does not know they exist.
//!
//! A behavior may delay or skip producers, but it must never duplicate one or
//! drop the producer representing the latest requested source, and at most
//! one producer may be current at its output at any time.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use futures_util::stream::{BoxStream, Stream, StreamExt};
use tokio::runtime::Handle;
use tokio::time::{sleep, Sleep};

use crate::config::CoalescingConfig;
use crate::error::{EngineError, ProducerError};
use crate::source::Producer;

/// The stream a behavior stage transforms.
pub type ProducerStream<T> = BoxStream<'static, Result<Producer<T>, EngineError>>;

/// A pluggable transform over the stream of producers.
pub trait Behavior<T>: Send + Sync {
    fn apply(&self, producers: ProducerStream<T>) -> ProducerStream<T>;
}

impl<T, F> Behavior<T> for F
where
    F: Fn(ProducerStream<T>) -> ProducerStream<T> + Send + Sync,
{
    fn apply(&self, producers: ProducerStream<T>) -> ProducerStream<T> {
        self(producers)
    }
}

/// Passes producers through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl<T> Behavior<T> for Identity {
    fn apply(&self, producers: ProducerStream<T>) -> ProducerStream<T> {
        producers
    }
}

/// Coalesces bursts of values within each producer.
///
/// When the config is not `optimized` this is the identity. Coalescing needs
/// tokio timers; a producer that arrives outside a runtime is passed through
/// uncoalesced.
#[derive(Debug, Clone, Copy, Default)]
pub struct Coalescing {
    config: CoalescingConfig,
}

impl Coalescing {
    /// Create the stage for `config`.
    pub fn new(config: CoalescingConfig) -> Self {
        Self { config }
    }
}

impl<T> Behavior<T> for Coalescing
where
    T: Clone + PartialEq + Send + 'static,
{
    fn apply(&self, producers: ProducerStream<T>) -> ProducerStream<T> {
        if !self.config.optimized {
            return producers;
        }
        let window = self.config.window();
        producers
            .map(move |producer| {
                producer.map(|inner| {
                    if Handle::try_current().is_err() {
                        tracing::trace!("no tokio runtime, producer passed through uncoalesced");
                        return inner;
                    }
                    Coalesce::new(inner, window).boxed() as Producer<T>
                })
            })
            .boxed()
    }
}

/// Pick the behavior a coalescing config asks for.
pub fn behavior_for<T>(config: CoalescingConfig) -> Box<dyn Behavior<T>>
where
    T: Clone + PartialEq + Send + 'static,
{
    if config.optimized {
        Box::new(Coalescing::new(config))
    } else {
        Box::new(Identity)
    }
}

/// Emits only the latest value of each burst.
///
/// The first value of a burst opens a window; when it closes the latest value
/// seen is emitted. Completion of the inner producer flushes the pending
/// value. A value equal to the last one emitted is dropped, so coalescing
/// cannot reintroduce a consecutive duplicate.
pub struct Coalesce<T> {
    inner: Option<Producer<T>>,
    window: Duration,
    delay: Option<Pin<Box<Sleep>>>,
    pending: Option<T>,
    last: Option<T>,
}

impl<T> Coalesce<T>
where
    T: Clone + PartialEq,
{
    pub fn new(inner: Producer<T>, window: Duration) -> Self {
        Self {
            inner: Some(inner),
            window,
            delay: None,
            pending: None,
            last: None,
        }
    }

    fn flush(&mut self) -> Option<T> {
        self.delay = None;
        let value = self.pending.take()?;
        if self.last.as_ref() == Some(&value) {
            return None;
        }
        self.last = Some(value.clone());
        Some(value)
    }
}

// Values are only ever moved in and out, never pinned.
impl<T> Unpin for Coalesce<T> {}

impl<T> Stream for Coalesce<T>
where
    T: Clone + PartialEq,
{
    type Item = Result<T, ProducerError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        while let Some(inner) = this.inner.as_mut() {
            match inner.poll_next_unpin(cx) {
                Poll::Ready(Some(Ok(value))) => {
                    this.pending = Some(value);
                    if this.delay.is_none() {
                        this.delay = Some(Box::pin(sleep(this.window)));
                    }
                }
                Poll::Ready(Some(Err(err))) => {
                    this.inner = None;
                    this.pending = None;
                    this.delay = None;
                    return Poll::Ready(Some(Err(err)));
                }
                Poll::Ready(None) => {
                    this.inner = None;
                }
                Poll::Pending => break,
            }
        }

        if this.inner.is_none() {
            return Poll::Ready(this.flush().map(Ok));
        }

        if let Some(delay) = this.delay.as_mut() {
            if delay.as_mut().poll(cx).is_ready() {
                if let Some(value) = this.flush() {
                    return Poll::Ready(Some(Ok(value)));
                }
            }
        }
        Poll::Pending
    }
}
