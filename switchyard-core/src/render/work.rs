//! Render Work
//!
//! Binds a render function to the view context it paints and to a scheduling
//! strategy, producing the [`RenderTrigger`] the engine calls.
//!
//! # Strategies
//!
//! - `Immediate` renders synchronously on every trigger.
//! - `Deferred` coalesces triggers: while a render is pending further
//!   triggers are absorbed, and the pending render runs on the tokio runtime
//!   after the current task yields. Outside a runtime it degrades to
//!   `Immediate`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::runtime::Handle;

use super::collaborators::RenderTrigger;

/// How render requests are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderStrategy {
    #[default]
    Immediate,
    Deferred,
}

/// A render function together with what it renders.
pub struct WorkConfig<C> {
    pub context: Arc<C>,
    pub strategy: RenderStrategy,
    pub render: Arc<dyn Fn(&C) + Send + Sync>,
}

impl<C> WorkConfig<C>
where
    C: Send + Sync + 'static,
{
    pub fn new<F>(context: Arc<C>, render: F) -> Self
    where
        F: Fn(&C) + Send + Sync + 'static,
    {
        Self {
            context,
            strategy: RenderStrategy::default(),
            render: Arc::new(render),
        }
    }

    pub fn with_strategy(mut self, strategy: RenderStrategy) -> Self {
        self.strategy = strategy;
        self
    }
}

/// Build the render trigger for a piece of view work.
pub fn setup_work<C>(cfg: WorkConfig<C>) -> RenderTrigger
where
    C: Send + Sync + 'static,
{
    let WorkConfig {
        context,
        strategy,
        render,
    } = cfg;

    match strategy {
        RenderStrategy::Immediate => RenderTrigger::new(move || render(&*context)),
        RenderStrategy::Deferred => {
            let pending = Arc::new(AtomicBool::new(false));
            RenderTrigger::new(move || {
                if pending.swap(true, Ordering::AcqRel) {
                    return;
                }
                let Ok(handle) = Handle::try_current() else {
                    tracing::trace!("no runtime for deferred render, rendering now");
                    pending.store(false, Ordering::Release);
                    render(&*context);
                    return;
                };
                let pending = Arc::clone(&pending);
                let render = Arc::clone(&render);
                let context = Arc::clone(&context);
                handle.spawn(async move {
                    tokio::task::yield_now().await;
                    pending.store(false, Ordering::Release);
                    render(&*context);
                });
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    struct View {
        paints: AtomicUsize,
    }

    fn view() -> Arc<View> {
        Arc::new(View {
            paints: AtomicUsize::new(0),
        })
    }

    fn paint(view: &View) {
        view.paints.fetch_add(1, Ordering::SeqCst);
    }

    #[test]
    fn immediate_renders_every_time() {
        let view = view();
        let trigger = setup_work(WorkConfig::new(view.clone(), paint));

        trigger.fire();
        trigger.fire();
        assert_eq!(view.paints.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn deferred_without_runtime_renders_now() {
        let view = view();
        let trigger = setup_work(
            WorkConfig::new(view.clone(), paint).with_strategy(RenderStrategy::Deferred),
        );

        trigger.fire();
        trigger.fire();
        assert_eq!(view.paints.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn deferred_coalesces_bursts() {
        let view = view();
        let trigger = setup_work(
            WorkConfig::new(view.clone(), paint).with_strategy(RenderStrategy::Deferred),
        );

        trigger.fire();
        trigger.fire();
        trigger.fire();
        assert_eq!(view.paints.load(Ordering::SeqCst), 0);

        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(view.paints.load(Ordering::SeqCst), 1);

        trigger.fire();
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(view.paints.load(Ordering::SeqCst), 2);
    }
}
