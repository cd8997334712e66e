//! Task repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD and ordered listings over the `tasks` table.
//! - Own the column codecs for task enumerations and timestamps.
//!
//! # Invariants
//! - Listings follow `Task::display_order` (open first, priority rank
//!   descending, due date ascending with NULL first, id ascending).
//! - `insert` is an upsert keyed by id; id `0` assigns a fresh id.
//! - Rows with NULL `warningUnit`/`createdAt` are rejected, never defaulted.

use crate::live::notifier::{ChangeNotifier, TableChange};
use crate::model::folder::FolderId;
use crate::model::task::{AlarmLevel, Priority, RepeatUnit, Task, TaskId, TaskType};
use crate::model::time::{format_timestamp, parse_timestamp};
use crate::repo::{
    bool_to_int, ensure_connection_ready, int_to_bool, RepoError, RepoResult, WriteScope,
};
use chrono::NaiveDateTime;
use log::{debug, info};
use rusqlite::{params, Connection, OptionalExtension, Row};

const TASK_SELECT_SQL: &str = "SELECT
    id,
    folderId,
    label,
    type,
    dueDate,
    alarmLevel,
    priority,
    isDone,
    repeatInterval,
    repeatUnit,
    warningInterval,
    warningUnit,
    warningRepeatInterval,
    warningRepeatUnit,
    createdAt
FROM tasks";

const TASK_ORDER_SQL: &str = "ORDER BY
    isDone ASC,
    CASE priority WHEN 'HIGH' THEN 2 WHEN 'MEDIUM' THEN 1 ELSE 0 END DESC,
    dueDate ASC,
    id ASC";

/// Repository interface for task persistence.
pub trait TaskRepository {
    /// Inserts or replaces by id. Returns the row id.
    fn insert(&self, task: &Task) -> RepoResult<TaskId>;
    /// Replaces every column of the row keyed by `task.id`.
    fn update(&self, task: &Task) -> RepoResult<()>;
    /// Removes the row keyed by `task.id`. Returns whether a row was removed.
    fn delete(&self, task: &Task) -> RepoResult<bool>;
    /// Removes every task. Returns the number of removed rows.
    fn delete_all(&self) -> RepoResult<usize>;
    /// Every task in display order.
    fn list_all(&self) -> RepoResult<Vec<Task>>;
    /// Tasks of one folder in display order; empty for an unknown folder.
    fn list_by_folder(&self, folder_id: FolderId) -> RepoResult<Vec<Task>>;
    /// `None` when no row has this id.
    fn get_by_id(&self, id: TaskId) -> RepoResult<Option<Task>>;
}

/// SQLite-backed task repository.
pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
    scope: WriteScope<'conn>,
}

impl<'conn> SqliteTaskRepository<'conn> {
    /// Creates a repository over a migrated connection, without observers.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self::attach(conn, WriteScope::Standalone(None)))
    }

    /// Creates a repository whose commits are published to `notifier`.
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

    fn query_tasks(&self, sql: &str, folder_id: Option<FolderId>) -> RepoResult<Vec<Task>> {
        let mut stmt = self.conn.prepare_cached(sql)?;
        let mut rows = match folder_id {
            Some(folder_id) => stmt.query([folder_id])?,
            None => stmt.query([])?,
        };

        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }
        Ok(tasks)
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn insert(&self, task: &Task) -> RepoResult<TaskId> {
        task.validate()?;

        let id = self.scope.run(self.conn, TableChange::Tasks, |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO tasks (
                    id,
                    folderId,
                    label,
                    type,
                    dueDate,
                    alarmLevel,
                    priority,
                    isDone,
                    repeatInterval,
                    repeatUnit,
                    warningInterval,
                    warningUnit,
                    warningRepeatInterval,
                    warningRepeatUnit,
                    createdAt
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15);",
                params![
                    // NULL lets SQLite assign the next AUTOINCREMENT id.
                    (task.id != 0).then_some(task.id),
                    task.folder_id,
                    task.label.as_str(),
                    task.kind.as_str(),
                    task.due_date.map(format_timestamp),
                    task.alarm_level.as_str(),
                    task.priority.as_str(),
                    bool_to_int(task.is_done),
                    task.repeat_interval,
                    task.repeat_unit.map(RepeatUnit::as_str),
                    task.warning_interval,
                    task.warning_unit.as_str(),
                    task.warning_repeat_interval,
                    task.warning_repeat_unit.map(RepeatUnit::as_str),
                    format_timestamp(task.created_at),
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })?;

        info!("event=task_insert module=repo status=ok id={id} folder_id={}", task.folder_id);
        Ok(id)
    }

    fn update(&self, task: &Task) -> RepoResult<()> {
        task.validate()?;

        self.scope.run(self.conn, TableChange::Tasks, |conn| {
            let changed = conn.execute(
                "UPDATE tasks
                 SET
                    folderId = ?2,
                    label = ?3,
                    type = ?4,
                    dueDate = ?5,
                    alarmLevel = ?6,
                    priority = ?7,
                    isDone = ?8,
                    repeatInterval = ?9,
                    repeatUnit = ?10,
                    warningInterval = ?11,
                    warningUnit = ?12,
                    warningRepeatInterval = ?13,
                    warningRepeatUnit = ?14,
                    createdAt = ?15
                 WHERE id = ?1;",
                params![
                    task.id,
                    task.folder_id,
                    task.label.as_str(),
                    task.kind.as_str(),
                    task.due_date.map(format_timestamp),
                    task.alarm_level.as_str(),
                    task.priority.as_str(),
                    bool_to_int(task.is_done),
                    task.repeat_interval,
                    task.repeat_unit.map(RepeatUnit::as_str),
                    task.warning_interval,
                    task.warning_unit.as_str(),
                    task.warning_repeat_interval,
                    task.warning_repeat_unit.map(RepeatUnit::as_str),
                    format_timestamp(task.created_at),
                ],
            )?;
            if changed == 0 {
                return Err(RepoError::NotFound {
                    table: "tasks",
                    id: task.id,
                });
            }
            Ok(())
        })?;

        debug!("event=task_update module=repo status=ok id={}", task.id);
        Ok(())
    }

    fn delete(&self, task: &Task) -> RepoResult<bool> {
        let removed = self.scope.run(self.conn, TableChange::Tasks, |conn| {
            Ok(conn.execute("DELETE FROM tasks WHERE id = ?1;", [task.id])? > 0)
        })?;

        debug!(
            "event=task_delete module=repo status=ok id={} removed={removed}",
            task.id
        );
        Ok(removed)
    }

    fn delete_all(&self) -> RepoResult<usize> {
        let removed = self.scope.run(self.conn, TableChange::Tasks, |conn| {
            Ok(conn.execute("DELETE FROM tasks;", [])?)
        })?;

        info!("event=task_nuke module=repo status=ok removed={removed}");
        Ok(removed)
    }

    fn list_all(&self) -> RepoResult<Vec<Task>> {
        self.query_tasks(&format!("{TASK_SELECT_SQL} {TASK_ORDER_SQL};"), None)
    }

    fn list_by_folder(&self, folder_id: FolderId) -> RepoResult<Vec<Task>> {
        self.query_tasks(
            &format!("{TASK_SELECT_SQL} WHERE folderId = ?1 {TASK_ORDER_SQL};"),
            Some(folder_id),
        )
    }

    fn get_by_id(&self, id: TaskId) -> RepoResult<Option<Task>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!("{TASK_SELECT_SQL} WHERE id = ?1;"))?;
        let row = stmt
            .query_row([id], |row| Ok(parse_task_row(row)))
            .optional()?;
        row.transpose()
    }
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    Ok(Task {
        id: row.get("id")?,
        folder_id: row.get("folderId")?,
        label: row.get("label")?,
        kind: required_enum(row, "type", TaskType::parse)?,
        due_date: optional_timestamp(row, "dueDate")?,
        alarm_level: required_enum(row, "alarmLevel", AlarmLevel::parse)?,
        priority: required_enum(row, "priority", Priority::parse)?,
        is_done: int_to_bool(row.get("isDone")?, "tasks.isDone")?,
        repeat_interval: row.get("repeatInterval")?,
        repeat_unit: optional_enum(row, "repeatUnit", RepeatUnit::parse)?,
        warning_interval: row.get("warningInterval")?,
        warning_unit: required_enum(row, "warningUnit", RepeatUnit::parse)?,
        warning_repeat_interval: row.get("warningRepeatInterval")?,
        warning_repeat_unit: optional_enum(row, "warningRepeatUnit", RepeatUnit::parse)?,
        created_at: required_timestamp(row, "createdAt")?,
    })
}

fn required_text(row: &Row<'_>, column: &'static str) -> RepoResult<String> {
    row.get::<_, Option<String>>(column)?.ok_or_else(|| {
        RepoError::InvalidData(format!("required column tasks.{column} is NULL"))
    })
}

fn required_enum<E>(
    row: &Row<'_>,
    column: &'static str,
    parse: fn(&str) -> Option<E>,
) -> RepoResult<E> {
    let text = required_text(row, column)?;
    decode_enum(&text, column, parse)
}

fn optional_enum<E>(
    row: &Row<'_>,
    column: &'static str,
    parse: fn(&str) -> Option<E>,
) -> RepoResult<Option<E>> {
    row.get::<_, Option<String>>(column)?
        .map(|text| decode_enum(&text, column, parse))
        .transpose()
}

fn decode_enum<E>(text: &str, column: &'static str, parse: fn(&str) -> Option<E>) -> RepoResult<E> {
    parse(text)
        .ok_or_else(|| RepoError::InvalidData(format!("invalid value `{text}` in tasks.{column}")))
}

fn required_timestamp(row: &Row<'_>, column: &'static str) -> RepoResult<NaiveDateTime> {
    let text = required_text(row, column)?;
    decode_timestamp(&text, column)
}

fn optional_timestamp(row: &Row<'_>, column: &'static str) -> RepoResult<Option<NaiveDateTime>> {
    row.get::<_, Option<String>>(column)?
        .map(|text| decode_timestamp(&text, column))
        .transpose()
}

fn decode_timestamp(text: &str, column: &'static str) -> RepoResult<NaiveDateTime> {
    parse_timestamp(text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid timestamp `{text}` in tasks.{column}"))
    })
}
