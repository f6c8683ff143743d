//! # Event Bus
//!
//! Ledger change notifications for everything outside the account worker.
//! The worker is the only writer of an account; collaborators (UIs, recorders,
//! the paper broker) subscribe here instead of reading live state.

use crate::models::LedgerChange;
use tokio::sync::broadcast;
use trading::Point;

#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// One mutation of an account's ledger.
    Ledger { account: String, change: LedgerChange },

    /// A point has been fully applied to the account.
    Tick { account: String, point: Point },

    /// The attached feed is exhausted. No more ticks will be applied.
    EndOfStream { account: String },
}

/// A wrapper around a tokio broadcast channel.
///
/// Slow subscribers skip old events (`RecvError::Lagged`) rather than
/// blocking the worker.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EngineEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    pub fn publish(&self, event: EngineEvent) {
        // No subscribers is fine.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.sender.subscribe()
    }
}
