//! Source Descriptors
//!
//! A `Source` is whatever the caller hands to `Engine::next`. It is a closed
//! set of shapes: nothing, a plain value, a promise, an observable, or an
//! opaque foreign value that only a custom normalizer may know how to read.
//!
//! # Identity
//!
//! The outer distinctness filter compares sources "by reference":
//!
//! - `Absent` is always the same as `Absent`.
//! - `Value`s compare with `PartialEq`, the way primitives compare by value.
//! - `Promise`, `Observable` and `Opaque` compare by [`SourceId`]; clones of a
//!   handle are the same source, two separately built handles never are.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures_util::future::{self, BoxFuture, FutureExt, Shared};
use futures_util::stream::{self, BoxStream, Stream, StreamExt};
use parking_lot::Mutex;

use crate::id::SourceId;
use crate::error::ProducerError;

type Settled<T> = Result<T, ProducerError>;
type Factory<T> = dyn Fn() -> BoxStream<'static, Settled<T>> + Send + Sync;

/// A value that resolves once, possibly in the future.
///
/// The underlying future is shared: every subscription observes the same
/// settled result, and the future runs at most once.
pub struct Promise<T: Clone> {
    id: SourceId,
    settled: Shared<BoxFuture<'static, Settled<T>>>,
}

impl<T> Promise<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Wrap a future as a promise.
    pub fn new<F>(future: F) -> Self
    where
        F: Future<Output = Settled<T>> + Send + 'static,
    {
        Self {
            id: SourceId::fresh(),
            settled: future.boxed().shared(),
        }
    }

    /// A promise that is already resolved with `value`.
    pub fn resolved(value: T) -> Self {
        Self::new(future::ready(Ok(value)))
    }

    /// A promise that is already rejected with `error`.
    pub fn rejected(error: ProducerError) -> Self {
        Self::new(future::ready(Err(error)))
    }

    /// The promise's identity.
    pub fn id(&self) -> SourceId {
        self.id
    }

    /// A stream that yields the settled result once.
    pub(crate) fn subscribe(&self) -> BoxStream<'static, Settled<T>> {
        stream::once(self.settled.clone()).boxed()
    }
}

impl<T: Clone> Clone for Promise<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            settled: self.settled.clone(),
        }
    }
}

impl<T: Clone> fmt::Debug for Promise<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Promise").field("id", &self.id).finish()
    }
}

/// A cold sequence of values.
///
/// Each subscription calls the factory again and gets a fresh stream.
pub struct Observable<T> {
    id: SourceId,
    factory: Arc<Factory<T>>,
}

impl<T> Observable<T>
where
    T: Send + 'static,
{
    /// Create an observable from a stream factory.
    pub fn new<F, S>(factory: F) -> Self
    where
        F: Fn() -> S + Send + Sync + 'static,
        S: Stream<Item = Settled<T>> + Send + 'static,
    {
        Self {
            id: SourceId::fresh(),
            factory: Arc::new(move || factory().boxed()),
        }
    }

    /// Wrap a single (hot) stream.
    ///
    /// Only the first subscription receives the stream's items; later
    /// subscriptions see an empty sequence.
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Settled<T>> + Send + 'static,
    {
        let slot = Mutex::new(Some(stream.boxed()));
        Self {
            id: SourceId::fresh(),
            factory: Arc::new(move || match slot.lock().take() {
                Some(stream) => stream,
                None => stream::empty().boxed(),
            }),
        }
    }

    /// An observable emitting each item of `values`, then completing.
    pub fn of<I>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Clone + Sync,
    {
        let values: Vec<T> = values.into_iter().collect();
        Self::new(move || stream::iter(values.clone().into_iter().map(Ok)))
    }

    /// The observable's identity.
    pub fn id(&self) -> SourceId {
        self.id
    }

    /// Start a new subscription.
    pub(crate) fn subscribe(&self) -> BoxStream<'static, Settled<T>> {
        (self.factory)()
    }
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            factory: Arc::clone(&self.factory),
        }
    }
}

impl<T> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable").field("id", &self.id).finish()
    }
}

/// A foreign value of a shape the default normalizer does not understand.
#[derive(Clone)]
pub struct Opaque {
    id: SourceId,
    shape: &'static str,
    value: Arc<dyn Any + Send + Sync>,
}

impl Opaque {
    /// Wrap a value of any shape.
    pub fn new<V>(value: V) -> Self
    where
        V: Any + Send + Sync,
    {
        Self {
            id: SourceId::fresh(),
            shape: std::any::type_name::<V>(),
            value: Arc::new(value),
        }
    }

    /// The opaque value's identity.
    pub fn id(&self) -> SourceId {
        self.id
    }

    /// Type name of the wrapped value.
    pub fn shape(&self) -> &'static str {
        self.shape
    }

    /// Borrow the wrapped value if it is a `V`.
    pub fn downcast_ref<V: Any>(&self) -> Option<&V> {
        self.value.downcast_ref::<V>()
    }
}

impl fmt::Debug for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Opaque")
            .field("id", &self.id)
            .field("shape", &self.shape)
            .finish()
    }
}

/// Anything the engine can be asked to render.
#[derive(Debug)]
pub enum Source<T: Clone> {
    /// No source at all.
    Absent,
    /// A plain value.
    Value(T),
    /// A value that resolves later.
    Promise(Promise<T>),
    /// A sequence of values.
    Observable(Observable<T>),
    /// A value of some other shape.
    Opaque(Opaque),
}

impl<T: Clone> Source<T> {
    /// The absent source.
    pub fn absent() -> Self {
        Source::Absent
    }

    /// A plain value source.
    pub fn value(value: T) -> Self {
        Source::Value(value)
    }

    /// Wrap a value of an unsupported shape.
    pub fn opaque<V>(value: V) -> Self
    where
        V: Any + Send + Sync,
    {
        Source::Opaque(Opaque::new(value))
    }

    /// Short name of the variant, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Source::Absent => "absent",
            Source::Value(_) => "value",
            Source::Promise(_) => "promise",
            Source::Observable(_) => "observable",
            Source::Opaque(_) => "opaque",
        }
    }
}

impl<T: Clone + PartialEq> Source<T> {
    /// Whether `other` is the same source reference as `self`.
    pub fn same_as(&self, other: &Self) -> bool {
        match (self, other) {
            (Source::Absent, Source::Absent) => true,
            (Source::Value(a), Source::Value(b)) => a == b,
            (Source::Promise(a), Source::Promise(b)) => a.id == b.id,
            (Source::Observable(a), Source::Observable(b)) => a.id == b.id,
            (Source::Opaque(a), Source::Opaque(b)) => a.id == b.id,
            _ => false,
        }
    }
}

impl<T: Clone> Clone for Source<T> {
    fn clone(&self) -> Self {
        match self {
            Source::Absent => Source::Absent,
            Source::Value(value) => Source::Value(value.clone()),
            Source::Promise(promise) => Source::Promise(promise.clone()),
            Source::Observable(observable) => Source::Observable(observable.clone()),
            Source::Opaque(opaque) => Source::Opaque(opaque.clone()),
        }
    }
}

impl<T: Clone> From<Promise<T>> for Source<T> {
    fn from(promise: Promise<T>) -> Self {
        Source::Promise(promise)
    }
}

impl<T: Clone> From<Observable<T>> for Source<T> {
    fn from(observable: Observable<T>) -> Self {
        Source::Observable(observable)
    }
}

impl<T: Clone> From<Opaque> for Source<T> {
    fn from(opaque: Opaque) -> Self {
        Source::Opaque(opaque)
    }
}

impl<T: Clone> From<Option<T>> for Source<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Source::Value(value),
            None => Source::Absent,
        }
    }
}
