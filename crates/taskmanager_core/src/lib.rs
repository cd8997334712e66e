//! Persistence core for the TaskManager to-do application.
//! This crate is the single source of truth for task/folder invariants.

pub mod db;
pub mod live;
pub mod logging;
pub mod model;
pub mod parse;
pub mod repo;
pub mod service;
pub mod store;

pub use live::notifier::{ChangeNotifier, TableChange};
pub use live::query::LiveQuery;
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::folder::{Folder, FolderId};
pub use model::task::{
    AlarmLevel, Priority, RepeatUnit, Task, TaskId, TaskType, ValidationError,
};
pub use parse::quick_add::{parse_quick_add, ParsedInput};
pub use repo::folder_repo::{FolderRepository, SqliteFolderRepository};
pub use repo::task_repo::{SqliteTaskRepository, TaskRepository};
pub use repo::{RepoError, RepoResult};
pub use service::backup::{
    export_backup, read_backup_file, restore_backup, write_backup_file, Backup, BackupError,
    RestoreSummary,
};
pub use service::task_service::{ServiceError, TaskService, ToggleOutcome, ViewType};
pub use store::{TaskStore, WriteBatch};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
