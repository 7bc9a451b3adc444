//! Error Types
//!
//! Every failure the engine can observe is fatal to the output it belongs to.
//! There is no retry and no isolation between sources: once an error has been
//! yielded the output stream is finished and a fresh engine is needed.

use thiserror::Error;

/// Failure raised by a producer (a rejected promise or an erroring observable).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ProducerError {
    message: String,
}

impl ProducerError {
    /// Create a producer error carrying the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The message the producer failed with.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors surfaced by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The normalizer was handed a source shape it cannot turn into a producer.
    #[error("unsupported source shape `{shape}`")]
    Normalization {
        /// Type name of the rejected value.
        shape: &'static str,
    },

    /// The active producer failed.
    #[error("active producer failed: {0}")]
    Producer(#[from] ProducerError),

    /// The pipeline has already been wired to a subscriber.
    #[error("engine output is already subscribed")]
    AlreadySubscribed,

    /// The engine has been torn down.
    #[error("engine has been torn down")]
    Closed,

    /// `subscribe` was called outside a tokio runtime.
    #[error("no tokio runtime to drive the subscription")]
    NoRuntime,
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid coalescing config: {0}")]
    Json(#[from] serde_json::Error),
}
