//! Event broadcast for external observers.
//!
//! An indexer or dashboard subscribes once and reconstructs state from
//! the stream instead of polling. The bus guarantees nothing about
//! delivery to lagging subscribers; the authority guarantees exactly one
//! event per successful mutation is offered to the channel.

use chrono::Utc;
use tokio::sync::broadcast;
use uuid::Uuid;

use credo_types::{Account, CredoEvent, EventEnvelope, EventSeverity};

/// Broadcast bus for [`EventEnvelope`]s.
pub struct EventBus {
    tx: broadcast::Sender<EventEnvelope>,
}

impl EventBus {
    /// Create a bus whose channel buffers up to `capacity` events.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all events emitted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.tx.subscribe()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Wrap and send an event. Having no subscribers is fine.
    pub fn emit(&self, actor: &Account, severity: EventSeverity, event: CredoEvent) {
        let envelope = EventEnvelope {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            severity,
            actor: actor.clone(),
            event,
        };
        let _ = self.tx.send(envelope);
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}
