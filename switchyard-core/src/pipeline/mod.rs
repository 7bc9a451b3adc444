//! Pipeline Stages
//!
//! The building blocks the engine wires together on first subscription:
//!
//! ```text
//! intake bus ─▶ outer distinct ─▶ normalize ─▶ reset + render
//!            ─▶ inner distinct + view context (per producer)
//!            ─▶ behavior ─▶ switch-latest ─▶ render ─▶ output
//! ```
//!
//! Each stage is usable on its own. The distinctness filters and the
//! switch-latest slot are deliberately small state machines rather than
//! general stream operators.

mod behavior;
mod bus;
mod distinct;
mod switch;

pub use behavior::{behavior_for, Behavior, Coalesce, Coalescing, Identity, ProducerStream};
pub use distinct::DistinctUntilChanged;
pub use switch::SwitchLatest;

pub(crate) use bus::{Intake, Teardown};
