//! Normalization
//!
//! Turns a [`Source`] into a [`Producer`], the one shape the rest of the
//! pipeline understands.

use futures_util::future;
use futures_util::stream::{self, BoxStream, StreamExt};

use super::descriptor::Source;
use crate::error::{EngineError, ProducerError};

/// The canonical asynchronous sequence behind every source.
pub type Producer<T> = BoxStream<'static, Result<T, ProducerError>>;

/// Converts sources into producers.
pub trait Normalize<T: Clone>: Send + Sync {
    /// Normalize `source`, or fail if its shape is not supported.
    fn normalize(&self, source: Source<T>) -> Result<Producer<T>, EngineError>;
}

impl<T, F> Normalize<T> for F
where
    T: Clone,
    F: Fn(Source<T>) -> Result<Producer<T>, EngineError> + Send + Sync,
{
    fn normalize(&self, source: Source<T>) -> Result<Producer<T>, EngineError> {
        self(source)
    }
}

/// Normalizer for the built-in source shapes.
///
/// - `Absent` becomes an empty producer.
/// - `Value` emits once and completes.
/// - `Promise` emits its resolution once, or fails with its rejection.
/// - `Observable` is subscribed and passed through.
/// - `Opaque` is rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultNormalizer;

impl<T> Normalize<T> for DefaultNormalizer
where
    T: Clone + Send + Sync + 'static,
{
    fn normalize(&self, source: Source<T>) -> Result<Producer<T>, EngineError> {
        match source {
            Source::Absent => Ok(stream::empty().boxed()),
            Source::Value(value) => Ok(stream::once(future::ready(Ok(value))).boxed()),
            Source::Promise(promise) => Ok(promise.subscribe()),
            Source::Observable(observable) => Ok(observable.subscribe()),
            Source::Opaque(opaque) => Err(EngineError::Normalization {
                shape: opaque.shape(),
            }),
        }
    }
}
