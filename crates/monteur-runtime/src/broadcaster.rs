//! Status fan-out to UI listeners.
//!
//! Each surface (webview bridge, CLI printer) subscribes and receives every
//! event published after it subscribed.

use monteur_core::{StatusEmitter, StatusEvent};
use tokio::sync::broadcast;
use tracing::debug;

/// Broadcast channel capacity for status events
const CHANNEL_CAPACITY: usize = 64;

/// Broadcaster for supervisor status events
#[derive(Debug, Clone)]
pub struct StatusBroadcaster {
    sender: broadcast::Sender<StatusEvent>,
}

impl StatusBroadcaster {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Subscribe to status events
    pub fn subscribe(&self) -> broadcast::Receiver<StatusEvent> {
        self.sender.subscribe()
    }

    /// Get number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for StatusBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusEmitter for StatusBroadcaster {
    fn publish(&self, event: StatusEvent) {
        debug!(phase = %event.phase, ok = event.ok, listeners = self.subscriber_count(), "Publishing status");
        // Err only means nobody is listening
        let _ = self.sender.send(event);
    }
}
