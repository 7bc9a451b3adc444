//! Engine
//!
//! The public face of the crate: callers push sources with [`Engine::next`]
//! and activate the pipeline with [`Engine::subscribe`] (or drive it
//! themselves through [`Engine::output`]).
//!
//! # How It Works
//!
//! 1. `next` enqueues the source on the intake bus. Before the pipeline is
//!    wired, and after it is torn down, sources are dropped.
//!
//! 2. On first subscription the pipeline is assembled:
//!    a. consecutive duplicate sources are filtered out
//!    b. each remaining source is normalized into a producer
//!    c. the reset sink and render trigger fire
//!    d. the producer is wrapped with inner distinctness and the view context tap
//!    e. the behavior stage runs over the stream of producers
//!    f. switch-latest keeps only the newest producer
//!    g. the render trigger fires after every forwarded value
//!
//! 3. Tearing down the output closes the intake bus and drops the active
//!    producer.
//!
//! # Ordering
//!
//! The whole pipeline is a single stream polled by a single task, so events
//! are processed one at a time. Within one poll, newly accepted sources are
//! handled before pending values of the current producer.

use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_util::future;
use futures_util::stream::{BoxStream, FusedStream, Stream, StreamExt};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::config::CoalescingConfig;
use crate::error::EngineError;
pub use crate::id::SubscriptionId;
use crate::pipeline::{
    behavior_for, Behavior, DistinctUntilChanged, Identity, Intake, SwitchLatest, Teardown,
};
use crate::render::{Collaborators, ViewContextSink};
use crate::source::{DefaultNormalizer, Normalize, Producer, Source};

/// Multiplexes a changing source into one output sequence.
///
/// # Type Parameters
///
/// - `T`: The emitted value type. `PartialEq` drives both distinctness
///   filters; `Clone` lets a value reach the view context and the output.
///
/// # Example
///
/// ```rust,ignore
/// let engine = Engine::new(Collaborators::new(render, reset, view_context));
/// let subscription = engine.subscribe()?;
///
/// engine.next(Source::value(1));
/// engine.next(Observable::of(vec![2, 3]));
///
/// subscription.unsubscribe();
/// ```
pub struct Engine<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    intake: Arc<Intake<T>>,
    collaborators: Collaborators<T>,
    normalizer: Arc<dyn Normalize<T>>,
    behavior: Arc<dyn Behavior<T>>,
}

impl<T> Engine<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Create an engine with the default normalizer and identity behavior.
    pub fn new(collaborators: Collaborators<T>) -> Self {
        Self {
            intake: Arc::new(Intake::new()),
            collaborators,
            normalizer: Arc::new(DefaultNormalizer),
            behavior: Arc::new(Identity),
        }
    }

    /// Replace the behavior stage.
    pub fn with_behavior<B>(mut self, behavior: B) -> Self
    where
        B: Behavior<T> + 'static,
    {
        self.behavior = Arc::new(behavior);
        self
    }

    /// Select the behavior stage from a coalescing config.
    pub fn with_coalescing(mut self, config: CoalescingConfig) -> Self {
        self.behavior = Arc::from(behavior_for::<T>(config));
        self
    }

    /// Replace the normalizer.
    pub fn with_normalizer<N>(mut self, normalizer: N) -> Self
    where
        N: Normalize<T> + 'static,
    {
        self.normalizer = Arc::new(normalizer);
        self
    }

    /// Hand the engine a new source. Never blocks.
    pub fn next(&self, source: impl Into<Source<T>>) {
        self.intake.push(source.into());
    }

    /// Wire the pipeline and return its output for the caller to drive.
    ///
    /// Fails with [`EngineError::AlreadySubscribed`] if the pipeline is
    /// already wired, or [`EngineError::Closed`] after teardown.
    pub fn output(&self) -> Result<Output<T>, EngineError> {
        let bus = self.intake.wire()?;
        tracing::debug!("wiring engine pipeline");

        let Collaborators {
            render,
            reset,
            view_context,
        } = self.collaborators.clone();
        let normalizer = Arc::clone(&self.normalizer);

        let mut outer = DistinctUntilChanged::with(|a: &Source<T>, b: &Source<T>| a.same_as(b));
        let reset_render = render.clone();

        let producers = bus
            .filter(move |source| {
                let admitted = outer.admit(source);
                if !admitted {
                    tracing::trace!(kind = source.kind(), "same source again, ignored");
                }
                future::ready(admitted)
            })
            .map(move |source| -> Result<Producer<T>, EngineError> {
                tracing::trace!(kind = source.kind(), "accepting source");
                let producer = normalizer.normalize(source)?;
                reset.signal();
                reset_render.fire();
                Ok(distinct_values(producer, view_context.clone()))
            })
            .boxed();

        let values = SwitchLatest::new(self.behavior.apply(producers))
            .inspect(move |item| {
                if item.is_ok() {
                    render.fire();
                }
            })
            .boxed();

        Ok(Output {
            values,
            intake: Arc::clone(&self.intake) as Arc<dyn Teardown>,
            finished: false,
        })
    }

    /// Wire the pipeline and drive it on the current tokio runtime.
    ///
    /// Fails with [`EngineError::NoRuntime`] outside a tokio runtime, in
    /// which case the engine is left unwired and can still be subscribed.
    pub fn subscribe(&self) -> Result<Subscription, EngineError> {
        let handle = Handle::try_current().map_err(|_| EngineError::NoRuntime)?;
        let mut output = self.output()?;
        let id = SubscriptionId::fresh();
        tracing::debug!(?id, "subscribed");

        let task = handle.spawn(async move {
            while let Some(item) = output.next().await {
                if let Err(err) = item {
                    tracing::debug!(?id, %err, "engine output terminated");
                    return Err(err);
                }
            }
            Ok(())
        });

        Ok(Subscription {
            id,
            intake: Arc::clone(&self.intake) as Arc<dyn Teardown>,
            task,
        })
    }

    /// Whether the engine has been torn down.
    pub fn is_closed(&self) -> bool {
        self.intake.is_closed()
    }
}

impl<T> Drop for Engine<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    fn drop(&mut self) {
        self.intake.close();
    }
}

impl<T> fmt::Debug for Engine<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Suppress consecutive equal values of one producer and report the rest to
/// the view context.
fn distinct_values<T>(producer: Producer<T>, view_context: ViewContextSink<T>) -> Producer<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    let mut inner = DistinctUntilChanged::new();
    producer
        .filter(move |item| {
            future::ready(match item {
                Ok(value) => inner.admit(value),
                Err(_) => true,
            })
        })
        .inspect(move |item| {
            if let Ok(value) = item {
                view_context.update(value);
            }
        })
        .boxed()
}

/// The engine's output sequence.
///
/// Yields every forwarded value. A fatal error is yielded once, after which
/// the stream is finished. Dropping the output tears the engine down.
pub struct Output<T> {
    values: BoxStream<'static, Result<T, EngineError>>,
    intake: Arc<dyn Teardown>,
    finished: bool,
}

impl<T> Stream for Output<T> {
    type Item = Result<T, EngineError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.finished {
            return Poll::Ready(None);
        }
        let item = futures_util::ready!(this.values.poll_next_unpin(cx));
        if !matches!(item, Some(Ok(_))) {
            this.finished = true;
            this.intake.close();
        }
        Poll::Ready(item)
    }
}

impl<T> FusedStream for Output<T> {
    fn is_terminated(&self) -> bool {
        self.finished
    }
}

impl<T> Drop for Output<T> {
    fn drop(&mut self) {
        self.intake.close();
    }
}

/// Handle to a running engine subscription.
///
/// Dropping the handle detaches it; the engine keeps running until it is
/// unsubscribed, fails, or the engine is dropped.
pub struct Subscription {
    id: SubscriptionId,
    intake: Arc<dyn Teardown>,
    task: JoinHandle<Result<(), EngineError>>,
}

impl Subscription {
    /// The id this subscription logs under.
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Whether the driving task has finished.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Tear down: drop the active producer and close the intake bus.
    pub fn unsubscribe(&self) {
        tracing::debug!(id = ?self.id, "unsubscribed");
        self.intake.close();
        self.task.abort();
    }

    /// Wait for the subscription to end.
    ///
    /// Returns the fatal error that terminated the output, if any. An
    /// unsubscribed engine ends with `Ok(())`.
    pub async fn closed(self) -> Result<(), EngineError> {
        match self.task.await {
            Ok(result) => result,
            Err(err) if err.is_cancelled() => Ok(()),
            Err(err) => std::panic::resume_unwind(err.into_panic()),
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("finished", &self.is_finished())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{RenderTrigger, ResetSink};
    use futures_util::FutureExt;
    use parking_lot::Mutex;

    fn counting() -> (Arc<Mutex<Vec<&'static str>>>, Collaborators<i32>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let (render_log, reset_log, view_log) = (log.clone(), log.clone(), log.clone());
        let collaborators = Collaborators::new(
            RenderTrigger::new(move || render_log.lock().push("render")),
            ResetSink::new(move || reset_log.lock().push("reset")),
            ViewContextSink::new(move |_: &i32| view_log.lock().push("view")),
        );
        (log, collaborators)
    }

    #[test]
    fn output_can_only_be_wired_once() {
        let engine = Engine::new(Collaborators::<i32>::default());
        let _output = engine.output().unwrap();
        assert!(matches!(engine.output(), Err(EngineError::AlreadySubscribed)));
    }

    #[test]
    fn reset_and_render_precede_value() {
        let (log, collaborators) = counting();
        let engine = Engine::new(collaborators);
        let mut output = engine.output().unwrap();

        engine.next(Source::value(1));
        assert_eq!(output.next().now_or_never(), Some(Some(Ok(1))));
        assert_eq!(*log.lock(), vec!["reset", "render", "view", "render"]);
    }

    #[test]
    fn dropping_output_closes_engine() {
        let engine = Engine::new(Collaborators::<i32>::default());
        let output = engine.output().unwrap();
        drop(output);

        assert!(engine.is_closed());
        assert!(matches!(engine.output(), Err(EngineError::Closed)));
    }

    #[test]
    fn dropping_engine_completes_output() {
        let engine = Engine::new(Collaborators::<i32>::default());
        let mut output = engine.output().unwrap();
        engine.next(Source::value(3));
        assert_eq!(output.next().now_or_never(), Some(Some(Ok(3))));

        drop(engine);
        assert_eq!(output.next().now_or_never(), Some(None));
        assert!(output.is_terminated());
    }

    #[tokio::test]
    async fn unsubscribe_ends_subscription_cleanly() {
        let engine = Engine::new(Collaborators::<i32>::default());
        let subscription = engine.subscribe().unwrap();
        engine.next(Source::value(1));

        subscription.unsubscribe();
        assert!(engine.is_closed());
        assert_eq!(subscription.closed().await, Ok(()));
    }

    #[test]
    fn subscribe_outside_runtime_leaves_engine_usable() {
        let engine = Engine::new(Collaborators::<i32>::default());
        assert!(matches!(engine.subscribe(), Err(EngineError::NoRuntime)));
        assert!(!engine.is_closed());

        let mut output = engine.output().unwrap();
        engine.next(Source::value(5));
        assert_eq!(output.next().now_or_never(), Some(Some(Ok(5))));
    }

    #[tokio::test]
    async fn subscriptions_get_distinct_ids() {
        let first = Engine::new(Collaborators::<i32>::default());
        let second = Engine::new(Collaborators::<i32>::default());
        let a = first.subscribe().unwrap();
        let b = second.subscribe().unwrap();

        assert_ne!(a.id(), b.id());
        assert!(format!("{a:?}").contains(&format!("{:?}", a.id())));
        a.unsubscribe();
        b.unsubscribe();
    }
}
