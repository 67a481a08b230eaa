//! In-process domain event bus.

use scribe_core::events::ScribeEvent;
use tokio::sync::broadcast;
use tracing::trace;

/// Default buffer for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// Fan-out sender for [`ScribeEvent`]s.
///
/// Emission never fails: with no subscribers the event is simply dropped.
/// Slow subscribers observe `Lagged` on their receiver, they do not block
/// emitters.
pub struct EventEmitter {
    tx: broadcast::Sender<ScribeEvent>,
}

impl EventEmitter {
    /// Create an emitter with the default buffer size.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create an emitter with a specific buffer size.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Emit an event to all current subscribers.
    pub fn emit(&self, event: ScribeEvent) {
        trace!(event_type = event.event_type(), session_id = event.session_id(), "emit");
        let _ = self.tx.send(event);
    }

    /// Subscribe to all events emitted after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ScribeEvent> {
        self.tx.subscribe()
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::new()
    }
}
