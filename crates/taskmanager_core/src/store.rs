//! Single data-access component over the task/folder database.
//!
//! # Responsibility
//! - Own one bootstrapped connection plus the change notifier.
//! - Hand out repositories, multi-write batches and live queries.
//!
//! # Invariants
//! - Every write is atomic; observers hear about it only after commit.
//! - A failed batch rolls back every write it made and notifies nobody.

use crate::db::{open_db, open_db_in_memory};
use crate::live::notifier::{ChangeNotifier, TableChange, TouchedTables};
use crate::live::query::LiveQuery;
use crate::model::folder::{Folder, FolderId};
use crate::model::task::Task;
use crate::repo::folder_repo::{FolderRepository, SqliteFolderRepository};
use crate::repo::task_repo::{SqliteTaskRepository, TaskRepository};
use crate::repo::{ensure_connection_ready, RepoError, RepoResult, WriteScope};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::cell::Cell;
use std::path::Path;

/// Task and folder store backed by one SQLite connection.
///
/// `Send` but not `Sync`: open one store per thread on the same file and
/// share a cloned `ChangeNotifier` between them.
pub struct TaskStore {
    conn: Connection,
    notifier: ChangeNotifier,
}

impl TaskStore {
    /// Opens (and migrates) a database file with a private notifier.
    pub fn open(path: impl AsRef<Path>) -> RepoResult<Self> {
        Self::open_with_notifier(path, ChangeNotifier::new())
    }

    /// Opens a database file publishing changes through `notifier`.
    pub fn open_with_notifier(
        path: impl AsRef<Path>,
        notifier: ChangeNotifier,
    ) -> RepoResult<Self> {
        let conn = open_db(path)?;
        Self::from_connection(conn, notifier)
    }

    pub fn open_in_memory() -> RepoResult<Self> {
        let conn = open_db_in_memory()?;
        Self::from_connection(conn, ChangeNotifier::new())
    }

    /// Wraps a connection already bootstrapped by `db::open_db*`.
    pub fn from_connection(conn: Connection, notifier: ChangeNotifier) -> RepoResult<Self> {
        ensure_connection_ready(&conn)?;
        Ok(Self { conn, notifier })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn notifier(&self) -> &ChangeNotifier {
        &self.notifier
    }

    /// Task repository whose writes commit individually and notify.
    pub fn tasks(&self) -> SqliteTaskRepository<'_> {
        SqliteTaskRepository::attach(&self.conn, WriteScope::Standalone(Some(&self.notifier)))
    }

    /// Folder repository whose writes commit individually and notify.
    pub fn folders(&self) -> SqliteFolderRepository<'_> {
        SqliteFolderRepository::attach(&self.conn, WriteScope::Standalone(Some(&self.notifier)))
    }

    /// Runs several writes in one immediate transaction.
    ///
    /// Commits when `work` returns `Ok`, rolls back otherwise. Touched tables
    /// are notified once each, after commit.
    pub fn write_batch<T, E>(&self, work: impl FnOnce(&WriteBatch<'_>) -> Result<T, E>) -> Result<T, E>
    where
        E: From<RepoError>,
    {
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)
            .map_err(RepoError::from)?;
        let touched = Cell::new(TouchedTables::default());
        let value = {
            let batch = WriteBatch {
                conn: &tx,
                touched: &touched,
            };
            work(&batch)?
        };
        tx.commit().map_err(RepoError::from)?;
        touched.get().flush(&self.notifier);
        Ok(value)
    }

    /// All tasks in display order, re-delivered on every `tasks` change.
    pub fn watch_tasks(
        &self,
    ) -> LiveQuery<Task, impl FnMut() -> RepoResult<Vec<Task>> + '_> {
        LiveQuery::new(TableChange::Tasks, self.notifier.subscribe(), move || {
            self.tasks().list_all()
        })
    }

    /// One folder's tasks in display order, re-delivered on `tasks` change.
    pub fn watch_tasks_in_folder(
        &self,
        folder_id: FolderId,
    ) -> LiveQuery<Task, impl FnMut() -> RepoResult<Vec<Task>> + '_> {
        LiveQuery::new(TableChange::Tasks, self.notifier.subscribe(), move || {
            self.tasks().list_by_folder(folder_id)
        })
    }

    /// All folders, re-delivered on every `folders` change.
    pub fn watch_folders(
        &self,
    ) -> LiveQuery<Folder, impl FnMut() -> RepoResult<Vec<Folder>> + '_> {
        LiveQuery::new(TableChange::Folders, self.notifier.subscribe(), move || {
            self.folders().list_all()
        })
    }
}

/// Repositories bound to the transaction of `TaskStore::write_batch`.
pub struct WriteBatch<'a> {
    conn: &'a Connection,
    touched: &'a Cell<TouchedTables>,
}

impl<'a> WriteBatch<'a> {
    pub fn tasks(&self) -> SqliteTaskRepository<'a> {
        SqliteTaskRepository::attach(self.conn, WriteScope::Enclosing(self.touched))
    }

    pub fn folders(&self) -> SqliteFolderRepository<'a> {
        SqliteFolderRepository::attach(self.conn, WriteScope::Enclosing(self.touched))
    }
}
