use tokio::sync::broadcast;
use tracing::trace;

use crate::dto::sse::ServerEvent;

/// Fan-out of admin events to every open SSE connection.
///
/// Slow subscribers lag and skip events rather than holding back the others.
pub struct SseHub {
    sender: broadcast::Sender<ServerEvent>,
}

impl SseHub {
    /// Hub buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        Self {
            sender: broadcast::Sender::new(capacity.max(1)),
        }
    }

    /// Receiver for events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.sender.subscribe()
    }

    /// Publish to current subscribers. An event nobody listens to is dropped.
    pub fn broadcast(&self, event: ServerEvent) {
        match self.sender.send(event) {
            Ok(receivers) => trace!(receivers, "admin event published"),
            Err(broadcast::error::SendError(event)) => {
                trace!(event = ?event.event, "admin event dropped; no subscribers")
            }
        }
    }
}
