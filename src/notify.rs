use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 256;

/// What a snapshot swap did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeKind {
    TechniciansReplaced,
    TechnicianAdded { id: String },
    TechnicianUpdated { id: String },
    TechnicianRemoved { id: String },
    JobsReplaced,
    JobAdded { id: String },
    JobMoved { id: String },
    JobDuplicated { source_id: String, id: String },
    JobUpdated { id: String },
    JobsBulkUpdated { count: usize },
    JobsDeleted { ids: Vec<String> },
    SelectionChanged,
    ContextChanged,
    SyncStarted,
    SyncFailed,
    Hydrated,
    Restored,
    TornDown,
}

impl ChangeKind {
    /// Short label for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            ChangeKind::TechniciansReplaced => "set_technicians",
            ChangeKind::TechnicianAdded { .. } => "add_technician",
            ChangeKind::TechnicianUpdated { .. } => "update_technician",
            ChangeKind::TechnicianRemoved { .. } => "remove_technician",
            ChangeKind::JobsReplaced => "set_jobs",
            ChangeKind::JobAdded { .. } => "add_job",
            ChangeKind::JobMoved { .. } => "move_job",
            ChangeKind::JobDuplicated { .. } => "duplicate_job",
            ChangeKind::JobUpdated { .. } => "update_job",
            ChangeKind::JobsBulkUpdated { .. } => "bulk_update_jobs",
            ChangeKind::JobsDeleted { .. } => "delete_jobs",
            ChangeKind::SelectionChanged => "select",
            ChangeKind::ContextChanged => "context",
            ChangeKind::SyncStarted => "sync_started",
            ChangeKind::SyncFailed => "sync_failed",
            ChangeKind::Hydrated => "hydrate",
            ChangeKind::Restored => "restore",
            ChangeKind::TornDown => "teardown",
        }
    }
}

/// Published after every snapshot swap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreChange {
    pub version: u64,
    pub kind: ChangeKind,
}

/// Broadcast hub for store changes of one engine.
pub struct NotifyHub {
    sender: broadcast::Sender<StoreChange>,
}

impl Default for NotifyHub {
    fn default() -> Self {
        Self::new()
    }
}

impl NotifyHub {
    pub fn new() -> Self {
        Self {
            sender: broadcast::channel(CHANNEL_CAPACITY).0,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.sender.subscribe()
    }

    /// Send a notification. No-op if nobody is listening.
    pub fn send(&self, change: StoreChange) {
        let _ = self.sender.send(change);
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribe_and_receive() {
        let hub = NotifyHub::new();
        let mut rx = hub.subscribe();

        let change = StoreChange {
            version: 3,
            kind: ChangeKind::JobMoved { id: "j1".into() },
        };
        hub.send(change.clone());

        let received = rx.recv().await.unwrap();
        assert_eq!(received, change);
        assert_eq!(received.kind.label(), "move_job");
    }

    #[test]
    fn send_without_subscribers_is_noop() {
        let hub = NotifyHub::new();
        assert_eq!(hub.subscriber_count(), 0);
        hub.send(StoreChange {
            version: 1,
            kind: ChangeKind::Hydrated,
        });
    }
}
