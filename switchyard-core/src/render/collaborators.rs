//! Callbacks the engine drives.
//!
//! Each collaborator is a cheaply cloned handle around a boxed closure, in the
//! same spirit as a subscriber's notify callback: the engine only ever calls
//! it, and never cares what happens on the other side.

use std::fmt;
use std::sync::Arc;

/// Requests a repaint.
///
/// May be synchronous or deferred; the engine calls it often and in quick
/// succession, so it must tolerate that.
#[derive(Clone)]
pub struct RenderTrigger {
    render: Arc<dyn Fn() + Send + Sync>,
}

impl RenderTrigger {
    /// Wrap a render callback.
    pub fn new<F>(render: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            render: Arc::new(render),
        }
    }

    /// A trigger that does nothing.
    pub fn noop() -> Self {
        Self::new(|| {})
    }

    /// Request a render.
    pub fn fire(&self) {
        (self.render)();
    }
}

impl fmt::Debug for RenderTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RenderTrigger")
    }
}

/// Signals that a new source is starting.
#[derive(Clone)]
pub struct ResetSink {
    reset: Arc<dyn Fn() + Send + Sync>,
}

impl ResetSink {
    pub fn new<F>(reset: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            reset: Arc::new(reset),
        }
    }

    pub fn noop() -> Self {
        Self::new(|| {})
    }

    /// Tell the view a new source has taken over.
    pub fn signal(&self) {
        (self.reset)();
    }
}

impl fmt::Debug for ResetSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ResetSink")
    }
}

/// Receives every value that passes inner distinctness.
pub struct ViewContextSink<T> {
    update: Arc<dyn Fn(&T) + Send + Sync>,
}

impl<T> ViewContextSink<T> {
    pub fn new<F>(update: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        Self {
            update: Arc::new(update),
        }
    }

    pub fn noop() -> Self {
        Self::new(|_| {})
    }

    pub fn update(&self, value: &T) {
        (self.update)(value);
    }
}

impl<T> Clone for ViewContextSink<T> {
    fn clone(&self) -> Self {
        Self {
            update: Arc::clone(&self.update),
        }
    }
}

impl<T> fmt::Debug for ViewContextSink<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ViewContextSink")
    }
}

/// Everything the engine calls out to.
#[derive(Debug, Clone)]
pub struct Collaborators<T> {
    pub render: RenderTrigger,
    pub reset: ResetSink,
    pub view_context: ViewContextSink<T>,
}

impl<T> Collaborators<T> {
    pub fn new(render: RenderTrigger, reset: ResetSink, view_context: ViewContextSink<T>) -> Self {
        Self {
            render,
            reset,
            view_context,
        }
    }
}

impl<T> Default for Collaborators<T> {
    fn default() -> Self {
        Self::new(RenderTrigger::noop(), ResetSink::noop(), ViewContextSink::noop())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI32, Ordering};

    #[test]
    fn clones_share_the_callback() {
        let count = Arc::new(AtomicI32::new(0));
        let count_clone = count.clone();

        let render = RenderTrigger::new(move || {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });
        let copy = render.clone();

        render.fire();
        copy.fire();
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn view_context_sees_values() {
        let seen = Arc::new(AtomicI32::new(0));
        let seen_clone = seen.clone();

        let sink = ViewContextSink::new(move |v: &i32| {
            seen_clone.store(*v, Ordering::SeqCst);
        });
        sink.update(&9);
        assert_eq!(seen.load(Ordering::SeqCst), 9);
    }
}
