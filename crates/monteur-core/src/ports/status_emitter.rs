//! Status emitter trait for delivering supervisor outcomes to UI surfaces.
//!
//! Implementations handle transport details (broadcast channels, webview
//! events, stdout lines).

use crate::events::StatusEvent;

/// Trait for publishing supervisor status events.
///
/// # Implementations
///
/// - `StatusBroadcaster` in `monteur-runtime` - tokio broadcast fan-out
pub trait StatusEmitter: Send + Sync {
    /// Publish a status event to every current listener.
    ///
    /// Publishing with no listeners is a no-op. This method must not block.
    fn publish(&self, event: StatusEvent);
}
