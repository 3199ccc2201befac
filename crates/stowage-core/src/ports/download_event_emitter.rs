//! Download event emitter port.
//!
//! This port abstracts download event emission, allowing the coordinator to
//! publish events without coupling to how subscribers receive them.

use tokio::sync::broadcast;
use tracing::debug;

use crate::download::DownloadEvent;

/// Broadcast channel capacity for download events
const CHANNEL_CAPACITY: usize = 64;

/// Port for emitting download events.
///
/// # Example
///
/// ```ignore
/// // In the coordinator
/// fn publish(&self, task: &DownloadTask) {
///     self.emitter.emit(DownloadEvent::progress(task));
/// }
/// ```
pub trait DownloadEventEmitterPort: Send + Sync {
    /// Emit a download event.
    ///
    /// This method should not block.
    fn emit(&self, event: DownloadEvent);

    /// Clone this emitter into a boxed trait object.
    fn clone_box(&self) -> Box<dyn DownloadEventEmitterPort>;
}

/// A no-op download event emitter for tests and headless contexts.
#[derive(Debug, Clone, Default)]
pub struct NoopDownloadEmitter;

impl NoopDownloadEmitter {
    /// Create a new no-op download emitter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl DownloadEventEmitterPort for NoopDownloadEmitter {
    fn emit(&self, _event: DownloadEvent) {
        // Intentionally do nothing
    }

    fn clone_box(&self) -> Box<dyn DownloadEventEmitterPort> {
        Box::new(self.clone())
    }
}

/// Notification bus backed by a `tokio::sync::broadcast` channel.
///
/// Cloning shares the channel. Events emitted while nobody is subscribed are
/// dropped; slow subscribers see `RecvError::Lagged`.
#[derive(Debug, Clone)]
pub struct BroadcastDownloadEmitter {
    sender: broadcast::Sender<DownloadEvent>,
}

impl BroadcastDownloadEmitter {
    /// Create a new bus with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(CHANNEL_CAPACITY)
    }

    /// Create a new bus with an explicit capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribe to download events.
    pub fn subscribe(&self) -> broadcast::Receiver<DownloadEvent> {
        self.sender.subscribe()
    }

    /// Get number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for BroadcastDownloadEmitter {
    fn default() -> Self {
        Self::new()
    }
}

impl DownloadEventEmitterPort for BroadcastDownloadEmitter {
    fn emit(&self, event: DownloadEvent) {
        if self.sender.receiver_count() > 0 {
            debug!(?event, "Broadcasting download event");
            let _ = self.sender.send(event);
        }
    }

    fn clone_box(&self) -> Box<dyn DownloadEventEmitterPort> {
        Box::new(self.clone())
    }
}
