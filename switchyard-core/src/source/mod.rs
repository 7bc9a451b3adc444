//! Sources
//!
//! Everything a caller can hand to the engine, and the normalizer that turns
//! it into a canonical producer.
//!
//! The accepted shapes are an explicit tagged union rather than "anything":
//! the engine knows statically which shapes exist, and the only way to reach
//! a normalization failure is the `Opaque` escape hatch.

mod descriptor;
mod normalize;

pub use descriptor::{Observable, Opaque, Promise, Source};
pub use crate::id::SourceId;
pub use normalize::{DefaultNormalizer, Normalize, Producer};
