//! Switchyard Core
//!
//! This crate provides a source-multiplexing engine for reactive render
//! pipelines. A caller keeps handing the engine a new "renderable source"
//! (a plain value, a promise, an observable, or nothing) and the engine
//! produces one output sequence of values, while:
//!
//! - keeping only the most recently supplied source live (switch-latest)
//! - ignoring a source handed in twice in a row
//! - suppressing consecutive duplicate values of a producer
//! - signalling a reset before each new source's values
//! - triggering a render after each accepted source and each forwarded value
//! - running a pluggable behavior stage (e.g. coalescing) over the producers
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `source`: source descriptors and the normalizer producing canonical producers
//! - `pipeline`: distinctness, behavior stage, switch-latest flattening, intake bus
//! - `render`: the injected render/reset/view-context collaborators
//! - `engine`: the public `next`/`subscribe` API gluing it all together
//!
//! # Example
//!
//! ```rust,ignore
//! use switchyard_core::{Collaborators, Engine, Observable, Promise, Source};
//!
//! let engine = Engine::new(Collaborators::default());
//! let subscription = engine.subscribe()?;
//!
//! engine.next(Source::value(1));
//! engine.next(Promise::resolved(2));
//! engine.next(Observable::of(vec![3, 3, 4]));   // forwards 3, 4
//!
//! subscription.unsubscribe();
//! ```

pub mod config;
pub mod engine;
pub mod error;
mod id;
pub mod pipeline;
pub mod render;
pub mod source;

pub use config::CoalescingConfig;
pub use engine::{Engine, Output, Subscription, SubscriptionId};
pub use error::{ConfigError, EngineError, ProducerError};
pub use pipeline::{Behavior, Coalescing, Identity};
pub use render::{setup_work, Collaborators, RenderStrategy, RenderTrigger, ResetSink, ViewContextSink, WorkConfig};
pub use source::{DefaultNormalizer, Normalize, Observable, Opaque, Producer, Promise, Source};
