//! Handle identity.
//!
//! Source handles and subscriptions are told apart by the handle they were
//! created as, never by what they carry. Both kinds of id are drawn from one
//! process-wide sequence, so an id is never handed out twice.

use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_HANDLE: AtomicU64 = AtomicU64::new(0);

fn next_handle() -> u64 {
    NEXT_HANDLE.fetch_add(1, Ordering::Relaxed)
}

/// Identity of a promise, observable or opaque source.
///
/// Stamped once when the handle is created and carried by every clone, so
/// two sources are "the same reference" exactly when their ids match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceId(u64);

impl SourceId {
    pub(crate) fn fresh() -> Self {
        Self(next_handle())
    }
}

/// Identity of one engine subscription, used to correlate log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub(crate) fn fresh() -> Self {
        Self(next_handle())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_never_share_an_id() {
        let a = SourceId::fresh();
        let b = SourceId::fresh();
        assert_ne!(a, b);
        assert_ne!(SubscriptionId::fresh(), SubscriptionId::fresh());
    }

    #[test]
    fn source_and_subscription_draw_from_one_sequence() {
        let source = SourceId::fresh();
        let subscription = SubscriptionId::fresh();
        assert!(subscription.0 > source.0);
    }
}
