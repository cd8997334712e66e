//! Live list queries that replay on source-table change.

use crate::live::notifier::TableChange;
use crate::repo::RepoResult;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};

/// A list query bound to one source table.
///
/// The first poll always delivers the current rows. Afterwards a new result
/// set is delivered once per batch of changes to `table`; changes to other
/// tables are skipped. A failed re-run keeps the query stale, so the next
/// call retries. Dropping the value stops observing.
pub struct LiveQuery<T, F>
where
    F: FnMut() -> RepoResult<Vec<T>>,
{
    table: TableChange,
    rx: broadcast::Receiver<TableChange>,
    run: F,
    /// Set until a result set reflecting every seen change was delivered.
    stale: bool,
    closed: bool,
}

impl<T, F> LiveQuery<T, F>
where
    F: FnMut() -> RepoResult<Vec<T>>,
{
    pub(crate) fn new(table: TableChange, rx: broadcast::Receiver<TableChange>, run: F) -> Self {
        Self {
            table,
            rx,
            run,
            stale: true,
            closed: false,
        }
    }

    /// Source table this query observes.
    pub fn table(&self) -> TableChange {
        self.table
    }

    /// Non-blocking check.
    ///
    /// Returns `Some(rows)` on the first call and whenever the source table
    /// changed since the previous successful delivery, `None` otherwise.
    pub fn poll(&mut self) -> RepoResult<Option<Vec<T>>> {
        self.drain_pending();
        if self.stale {
            return self.deliver().map(Some);
        }
        Ok(None)
    }

    /// Blocks the current thread until the next delivery is due.
    ///
    /// Returns `None` once every notifier clone is gone. Must not be called
    /// from inside an async runtime.
    pub fn wait(&mut self) -> RepoResult<Option<Vec<T>>> {
        self.drain_pending();
        while !self.stale && !self.closed {
            match self.rx.blocking_recv() {
                Ok(change) => self.stale |= change == self.table,
                Err(RecvError::Lagged(skipped)) => {
                    log::debug!(
                        "event=live_query_lagged module=live status=ok table={} skipped={}",
                        self.table.table_name(),
                        skipped
                    );
                    self.stale = true;
                }
                Err(RecvError::Closed) => self.closed = true,
            }
        }
        if self.stale {
            self.drain_pending();
            return self.deliver().map(Some);
        }
        Ok(None)
    }

    fn deliver(&mut self) -> RepoResult<Vec<T>> {
        let rows = (self.run)()?;
        self.stale = false;
        Ok(rows)
    }

    /// Consumes every queued notification, marking the query stale when any
    /// concerned `table`.
    fn drain_pending(&mut self) {
        loop {
            match self.rx.try_recv() {
                Ok(change) => self.stale |= change == self.table,
                // Missed notifications may have touched our table.
                Err(TryRecvError::Lagged(_)) => self.stale = true,
                Err(TryRecvError::Empty) => return,
                Err(TryRecvError::Closed) => {
                    self.closed = true;
                    return;
                }
            }
        }
    }
}
