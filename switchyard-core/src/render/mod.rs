//! Render Coordination
//!
//! The engine never paints anything itself. It calls three injected
//! collaborators:
//!
//! - the **render trigger**, once after every accepted source and once after
//!   every forwarded value;
//! - the **reset sink**, once per accepted source, before any of its values;
//! - the **view context sink**, once per value that survives inner
//!   distinctness.
//!
//! [`setup_work`] builds a render trigger from a plain render function and a
//! scheduling strategy.

mod collaborators;
mod work;

pub use collaborators::{Collaborators, RenderTrigger, ResetSink, ViewContextSink};
pub use work::{setup_work, RenderStrategy, WorkConfig};
