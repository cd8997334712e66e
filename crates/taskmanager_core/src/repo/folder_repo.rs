//! Folder repository contract and SQLite implementation.
//!
//! # Invariants
//! - `list_all` returns natural storage order (rowid); callers must not rely
//!   on any other ordering.
//! - Deleting a folder does not touch its tasks.

use crate::live::notifier::{ChangeNotifier, TableChange};
use crate::model::folder::{Folder, FolderId};
use crate::repo::{ensure_connection_ready, RepoError, RepoResult, WriteScope};
use log::{debug, info};
use rusqlite::{params, Connection, OptionalExtension, Row};

const FOLDER_SELECT_SQL: &str = "SELECT id, name, color FROM folders";

/// Repository interface for folder persistence.
pub trait FolderRepository {
    /// Inserts or replaces by id. Returns the row id.
    fn insert(&self, folder: &Folder) -> RepoResult<FolderId>;
    /// Rewrites name and color of the row keyed by `folder.id`.
    /// `NotFound` when no such row exists.
    fn update(&self, folder: &Folder) -> RepoResult<()>;
    /// Removes the row keyed by `folder.id`; its tasks stay. Returns whether
    /// a row was removed.
    fn delete(&self, folder: &Folder) -> RepoResult<bool>;
    /// Removes every folder, leaving tasks untouched. Returns the count.
    fn delete_all(&self) -> RepoResult<usize>;
    /// Every folder in storage (rowid) order.
    fn list_all(&self) -> RepoResult<Vec<Folder>>;
    /// `None` when no row has this id.
    fn get_by_id(&self, id: FolderId) -> RepoResult<Option<Folder>>;
}

/// SQLite-backed folder repository.
pub struct SqliteFolderRepository<'conn> {
    conn: &'conn Connection,
    scope: WriteScope<'conn>,
}

impl<'conn> SqliteFolderRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self::attach(conn, WriteScope::Standalone(None)))
    }

    pub fn try_with_notifier(
        conn: &'conn Connection,
        notifier: &'conn ChangeNotifier,
    ) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self::attach(conn, WriteScope::Standalone(Some(notifier))))
    }

    pub(crate) fn attach(conn: &'conn Connection, scope: WriteScope<'conn>) -> Self {
        Self { conn, scope }
    }
}

impl FolderRepository for SqliteFolderRepository<'_> {
    fn insert(&self, folder: &Folder) -> RepoResult<FolderId> {
        folder.validate()?;

        let id = self.scope.run(self.conn, TableChange::Folders, |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO folders (id, name, color) VALUES (?1, ?2, ?3);",
                params![
                    (folder.id != 0).then_some(folder.id),
                    folder.name.as_str(),
                    folder.color,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })?;

        info!("event=folder_insert module=repo status=ok id={id}");
        Ok(id)
    }

    fn update(&self, folder: &Folder) -> RepoResult<()> {
        folder.validate()?;

        self.scope.run(self.conn, TableChange::Folders, |conn| {
            let changed = conn.execute(
                "UPDATE folders SET name = ?2, color = ?3 WHERE id = ?1;",
                params![folder.id, folder.name.as_str(), folder.color],
            )?;
            if changed == 0 {
                return Err(RepoError::NotFound {
                    table: "folders",
                    id: folder.id,
                });
            }
            Ok(())
        })?;

        debug!("event=folder_update module=repo status=ok id={}", folder.id);
        Ok(())
    }

    fn delete(&self, folder: &Folder) -> RepoResult<bool> {
        let removed = self.scope.run(self.conn, TableChange::Folders, |conn| {
            Ok(conn.execute("DELETE FROM folders WHERE id = ?1;", [folder.id])? > 0)
        })?;

        debug!(
            "event=folder_delete module=repo status=ok id={} removed={removed}",
            folder.id
        );
        Ok(removed)
    }

    fn delete_all(&self) -> RepoResult<usize> {
        let removed = self.scope.run(self.conn, TableChange::Folders, |conn| {
            Ok(conn.execute("DELETE FROM folders;", [])?)
        })?;

        info!("event=folder_nuke module=repo status=ok removed={removed}");
        Ok(removed)
    }

    fn list_all(&self) -> RepoResult<Vec<Folder>> {
        let mut stmt = self.conn.prepare_cached(FOLDER_SELECT_SQL)?;
        let mut rows = stmt.query([])?;
        let mut folders = Vec::new();
        while let Some(row) = rows.next()? {
            folders.push(parse_folder_row(row)?);
        }
        Ok(folders)
    }

    fn get_by_id(&self, id: FolderId) -> RepoResult<Option<Folder>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!("{FOLDER_SELECT_SQL} WHERE id = ?1;"))?;
        let row = stmt
            .query_row([id], |row| Ok(parse_folder_row(row)))
            .optional()?;
        row.transpose()
    }
}

fn parse_folder_row(row: &Row<'_>) -> RepoResult<Folder> {
    Ok(Folder {
        id: row.get("id")?,
        name: row.get("name")?,
        color: row.get("color")?,
    })
}
