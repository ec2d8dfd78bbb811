//! Completion signals for collaborators outside the pipeline.
//!
//! Dashboards and read caches elsewhere in the application key off store
//! data; when an audit lands they need to refetch. The pipeline publishes a
//! data-changed event per completed audit and stays ignorant of who listens.

use tokio::sync::broadcast;

/// A data-changed signal emitted by the pipeline.
#[derive(Debug, Clone)]
pub enum AuditEvent {
    /// An audit reached `completed` and its results were persisted.
    Completed { store_id: i64, store_domain: String },
}

/// Broadcast bus for [`AuditEvent`]s. Cloning shares the underlying channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<AuditEvent>,
}

impl EventBus {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publishes an event. Lack of subscribers is not an error; the
    /// pipeline does not care whether anyone is listening.
    pub fn publish(&self, event: AuditEvent) {
        let _ = self.tx.send(event);
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<AuditEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}
