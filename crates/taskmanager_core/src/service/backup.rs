//! JSON backup export and restore.
//!
//! # Responsibility
//! - Snapshot every folder and task into a portable JSON document.
//! - Replace the store contents from such a document with fresh ids.
//!
//! # Invariants
//! - Restore is all-or-nothing: wipe and re-insert share one transaction.
//! - Task folder references are remapped from backup ids to new ids.

use crate::model::folder::{Folder, FolderId};
use crate::model::task::{
    AlarmLevel, Priority, RepeatUnit, Task, TaskType, DEFAULT_WARNING_INTERVAL,
};
use crate::model::time::optional_text;
use crate::repo::folder_repo::FolderRepository;
use crate::repo::task_repo::TaskRepository;
use crate::repo::RepoError;
use crate::store::TaskStore;
use chrono::NaiveDateTime;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

/// Default file name used by callers that do not pick their own.
pub const BACKUP_FILE_NAME: &str = "TaskManager_Backup.json";

pub type BackupResult<T> = Result<T, BackupError>;

#[derive(Debug)]
pub enum BackupError {
    Repo(RepoError),
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl Display for BackupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "backup file error: {err}"),
            Self::Json(err) => write!(f, "malformed backup: {err}"),
        }
    }
}

impl Error for BackupError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::Json(err) => Some(err),
        }
    }
}

impl From<RepoError> for BackupError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<std::io::Error> for BackupError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for BackupError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Whole-store snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Backup {
    pub folders: Vec<BackupFolder>,
    pub tasks: Vec<BackupTask>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupFolder {
    pub id: FolderId,
    pub name: String,
    #[serde(default)]
    pub color: Option<i32>,
}

/// Task entry without its id and creation time; both are reassigned on
/// restore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupTask {
    pub label: String,
    pub folder_id: FolderId,
    #[serde(rename = "type")]
    pub kind: TaskType,
    /// Older exports drop the key when unset and may omit seconds.
    #[serde(default, with = "optional_text")]
    pub due_date: Option<NaiveDateTime>,
    pub alarm_level: AlarmLevel,
    pub priority: Priority,
    pub is_done: bool,
    #[serde(default)]
    pub repeat_interval: Option<i32>,
    #[serde(default)]
    pub repeat_unit: Option<RepeatUnit>,
    #[serde(default = "default_warning_interval")]
    pub warning_interval: i32,
    /// Older backups may carry `null`; restored as `MINUTES`.
    #[serde(default)]
    pub warning_unit: Option<RepeatUnit>,
    #[serde(default)]
    pub warning_repeat_interval: Option<i32>,
    #[serde(default)]
    pub warning_repeat_unit: Option<RepeatUnit>,
}

fn default_warning_interval() -> i32 {
    DEFAULT_WARNING_INTERVAL
}

impl From<&Folder> for BackupFolder {
    fn from(folder: &Folder) -> Self {
        Self {
            id: folder.id,
            name: folder.name.clone(),
            color: folder.color,
        }
    }
}

impl From<&Task> for BackupTask {
    fn from(task: &Task) -> Self {
        Self {
            label: task.label.clone(),
            folder_id: task.folder_id,
            kind: task.kind,
            due_date: task.due_date,
            alarm_level: task.alarm_level,
            priority: task.priority,
            is_done: task.is_done,
            repeat_interval: task.repeat_interval,
            repeat_unit: task.repeat_unit,
            warning_interval: task.warning_interval,
            warning_unit: Some(task.warning_unit),
            warning_repeat_interval: task.warning_repeat_interval,
            warning_repeat_unit: task.warning_repeat_unit,
        }
    }
}

impl BackupTask {
    fn into_task(self, folder_id: FolderId, created_at: NaiveDateTime) -> Task {
        Task {
            id: 0,
            folder_id,
            label: self.label,
            kind: self.kind,
            due_date: self.due_date,
            alarm_level: self.alarm_level,
            priority: self.priority,
            is_done: self.is_done,
            repeat_interval: self.repeat_interval,
            repeat_unit: self.repeat_unit,
            warning_interval: self.warning_interval,
            warning_unit: self.warning_unit.unwrap_or_default(),
            warning_repeat_interval: self.warning_repeat_interval,
            warning_repeat_unit: self.warning_repeat_unit,
            created_at,
        }
    }
}

/// Row counts written by `restore_backup`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestoreSummary {
    pub folders: usize,
    pub tasks: usize,
}

/// Reads every folder and task into a snapshot.
pub fn export_backup(store: &TaskStore) -> BackupResult<Backup> {
    let folders = store.folders().list_all()?;
    let tasks = store.tasks().list_all()?;
    Ok(Backup {
        folders: folders.iter().map(BackupFolder::from).collect(),
        tasks: tasks.iter().map(BackupTask::from).collect(),
    })
}

/// Replaces the store contents with `backup`.
///
/// Folders get fresh ids; tasks follow their folder through the id map, and
/// a task whose folder is missing from the backup lands in folder `0`.
pub fn restore_backup(
    store: &TaskStore,
    backup: Backup,
    now: NaiveDateTime,
) -> BackupResult<RestoreSummary> {
    let summary = store.write_batch(|batch| -> BackupResult<RestoreSummary> {
        let tasks = batch.tasks();
        let folders = batch.folders();
        tasks.delete_all()?;
        folders.delete_all()?;

        let mut folder_ids: HashMap<FolderId, FolderId> = HashMap::new();
        for entry in &backup.folders {
            let new_id = folders.insert(&Folder {
                id: 0,
                name: entry.name.clone(),
                color: entry.color,
            })?;
            folder_ids.insert(entry.id, new_id);
        }

        let mut unmapped = 0usize;
        for entry in backup.tasks.iter().cloned() {
            let folder_id = match folder_ids.get(&entry.folder_id) {
                Some(id) => *id,
                None => {
                    unmapped += 1;
                    0
                }
            };
            tasks.insert(&entry.into_task(folder_id, now))?;
        }
        if unmapped > 0 {
            warn!("event=backup_restore module=service status=partial unmapped_tasks={unmapped}");
        }

        Ok(RestoreSummary {
            folders: backup.folders.len(),
            tasks: backup.tasks.len(),
        })
    })?;

    info!(
        "event=backup_restore module=service status=ok folders={} tasks={}",
        summary.folders, summary.tasks
    );
    Ok(summary)
}

/// Exports the store and writes pretty JSON to `path`.
pub fn write_backup_file(store: &TaskStore, path: impl AsRef<Path>) -> BackupResult<Backup> {
    let backup = export_backup(store)?;
    let json = serde_json::to_string_pretty(&backup)?;
    std::fs::write(path.as_ref(), json)?;
    info!(
        "event=backup_export module=service status=ok folders={} tasks={}",
        backup.folders.len(),
        backup.tasks.len()
    );
    Ok(backup)
}

/// Loads a backup document. A missing file yields `Ok(None)`.
pub fn read_backup_file(path: impl AsRef<Path>) -> BackupResult<Option<Backup>> {
    let content = match std::fs::read_to_string(path.as_ref()) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    Ok(Some(serde_json::from_str(&content)?))
}
