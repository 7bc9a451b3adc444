//! Intake Bus
//!
//! The bus carries sources from `Engine::next` into the pipeline. It has a
//! three-state lifecycle:
//!
//! ```text
//!   Idle ──wire()──▶ Wired ──close()──▶ Closed
//!     └──────────────close()──────────────▲
//! ```
//!
//! Sources pushed while idle or closed are dropped; there is no replay for
//! late subscribers. Closing drops the sender, which completes the receiving
//! side and with it the whole pipeline.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::stream::Stream;
use parking_lot::Mutex;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::error::EngineError;
use crate::source::Source;

enum BusState<T: Clone> {
    Idle,
    Wired(UnboundedSender<Source<T>>),
    Closed,
}

/// Something that can be torn down from a subscription handle.
pub(crate) trait Teardown: Send + Sync {
    fn close(&self);
}

/// Shared sending side of the bus.
pub(crate) struct Intake<T: Clone> {
    state: Mutex<BusState<T>>,
}

impl<T> Intake<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(BusState::Idle),
        }
    }

    /// Enqueue a source. Never blocks.
    pub(crate) fn push(&self, source: Source<T>) {
        let state = self.state.lock();
        match &*state {
            BusState::Wired(sender) => {
                let kind = source.kind();
                if sender.send(source).is_err() {
                    tracing::trace!(kind, "intake receiver gone, source dropped");
                }
            }
            BusState::Idle => {
                tracing::trace!(kind = source.kind(), "source dropped before subscription");
            }
            BusState::Closed => {
                tracing::trace!(kind = source.kind(), "source dropped after teardown");
            }
        }
    }

    /// Create the receiving side. Only succeeds once.
    pub(crate) fn wire(&self) -> Result<IntakeBus<T>, EngineError> {
        let mut state = self.state.lock();
        match &*state {
            BusState::Idle => {
                let (sender, receiver) = mpsc::unbounded_channel();
                *state = BusState::Wired(sender);
                Ok(IntakeBus { receiver })
            }
            BusState::Wired(_) => Err(EngineError::AlreadySubscribed),
            BusState::Closed => Err(EngineError::Closed),
        }
    }

    pub(crate) fn is_closed(&self) -> bool {
        matches!(&*self.state.lock(), BusState::Closed)
    }
}

impl<T> Teardown for Intake<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn close(&self) {
        let mut state = self.state.lock();
        if !matches!(&*state, BusState::Closed) {
            tracing::debug!("intake bus closed");
        }
        *state = BusState::Closed;
    }
}

/// Receiving side of the bus, as a stream of sources.
pub(crate) struct IntakeBus<T: Clone> {
    receiver: UnboundedReceiver<Source<T>>,
}

impl<T: Clone> Stream for IntakeBus<T> {
    type Item = Source<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().receiver.poll_recv(cx)
    }
}
