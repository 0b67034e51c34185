use tokio::sync::broadcast;

use crate::store::StoreName;

/// Fired after every successful persist and after a reconciliation heal, one
/// notification per collection, so readers can refresh their views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreEvent {
    pub store: StoreName,
}

/// Typed change-notification channel. Senders never block; slow subscribers
/// drop old notifications (broadcast lag), which is acceptable because events
/// carry no payload and readers re-read the collection anyway.
#[derive(Debug, Clone)]
pub struct StoreEvents {
    tx: broadcast::Sender<StoreEvent>,
}

const CHANNEL_CAPACITY: usize = 64;

impl StoreEvents {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(CHANNEL_CAPACITY);
        StoreEvents { tx }
    }

    pub fn emit(&self, store: StoreName) {
        // No subscribers is not an error.
        let _ = self.tx.send(StoreEvent { store });
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.tx.subscribe()
    }
}

impl Default for StoreEvents {
    fn default() -> Self {
        Self::new()
    }
}
