//! Broadcast-based table change notifier.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Default broadcast channel capacity.
const DEFAULT_CAPACITY: usize = 64;

/// Table touched by a committed write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableChange {
    Tasks,
    Folders,
}

impl TableChange {
    pub fn table_name(self) -> &'static str {
        match self {
            Self::Tasks => "tasks",
            Self::Folders => "folders",
        }
    }
}

/// Fan-out of `TableChange` events to every live query.
///
/// Cloning shares the same channel, so stores opened on separate threads
/// over one database file can notify each other's observers. `notify` never
/// blocks; slow receivers lag instead.
#[derive(Debug, Clone)]
pub struct ChangeNotifier {
    tx: broadcast::Sender<TableChange>,
    sent: Arc<AtomicU64>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            tx,
            sent: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Publishes one change. Returns the number of receivers reached.
    pub fn notify(&self, change: TableChange) -> usize {
        self.sent.fetch_add(1, Ordering::Relaxed);
        let reached = self.tx.send(change).unwrap_or(0);
        log::debug!(
            "event=table_change module=live status=ok table={} receivers={}",
            change.table_name(),
            reached
        );
        reached
    }

    /// Receiver for every change published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<TableChange> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Total notifications published through any clone.
    pub fn sent_count(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Tables written inside one enclosing transaction, flushed after commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TouchedTables {
    pub tasks: bool,
    pub folders: bool,
}

impl TouchedTables {
    pub fn with(self, change: TableChange) -> Self {
        match change {
            TableChange::Tasks => Self {
                tasks: true,
                ..self
            },
            TableChange::Folders => Self {
                folders: true,
                ..self
            },
        }
    }

    /// Sends one notification per touched table.
    pub fn flush(self, notifier: &ChangeNotifier) {
        if self.folders {
            notifier.notify(TableChange::Folders);
        }
        if self.tasks {
            notifier.notify(TableChange::Tasks);
        }
    }
}
