//! Command-line surface.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use taskmanager_core::{Priority, ViewType};

#[derive(Parser)]
#[command(name = "taskmanager")]
#[command(version)]
#[command(about = "Tasks and folders stored in a local SQLite file")]
pub struct Cli {
    /// Database file
    #[arg(long, env = "TASKMANAGER_DB", default_value = "taskmanager.db", global = true)]
    pub db: PathBuf,
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "TASKMANAGER_LOG_LEVEL", global = true)]
    pub log_level: Option<String>,
    /// Directory for rolling log files; logging stays off when unset
    #[arg(long, env = "TASKMANAGER_LOG_DIR", global = true)]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage folders
    Folder {
        #[command(subcommand)]
        action: FolderAction,
    },
    /// Manage tasks
    Task {
        #[command(subcommand)]
        action: TaskAction,
    },
    /// Export or restore a JSON backup
    Backup {
        #[command(subcommand)]
        action: BackupAction,
    },
    /// Delete every task and folder
    Nuke,
}

#[derive(Subcommand)]
pub enum FolderAction {
    /// Create a folder
    Add {
        name: String,
        /// ARGB color as a signed 32-bit integer
        #[arg(long, allow_hyphen_values = true)]
        color: Option<i32>,
    },
    /// List folders
    List,
    /// Rename a folder
    Rename { id: i64, name: String },
    /// Delete a folder (its tasks are kept)
    Rm { id: i64 },
}

#[derive(Subcommand)]
pub enum TaskAction {
    /// Add a task with explicit fields
    Add {
        folder_id: i64,
        label: String,
        #[arg(long, value_enum, default_value_t = PriorityArg::Medium)]
        priority: PriorityArg,
        /// Due date, e.g. 2024-05-01T09:30
        #[arg(long)]
        due: Option<String>,
    },
    /// Add a task from French free text, e.g. "Dentiste, jeudi 14h30"
    Quick {
        folder_id: i64,
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// List tasks
    List {
        /// Restrict to one folder (0 means every folder)
        #[arg(long)]
        folder: Option<i64>,
        #[arg(long, value_enum, default_value_t = ViewArg::All)]
        view: ViewArg,
    },
    /// Toggle completion
    Done { id: i64 },
    /// Delete tasks
    Rm {
        #[arg(required = true, num_args = 1..)]
        ids: Vec<i64>,
    },
    /// Set a new due date
    Postpone { id: i64, due: String },
    /// Move tasks to another folder
    Move {
        #[arg(long)]
        to: i64,
        #[arg(required = true, num_args = 1..)]
        ids: Vec<i64>,
    },
}

#[derive(Subcommand)]
pub enum BackupAction {
    /// Write every folder and task to a JSON file
    Export { path: PathBuf },
    /// Replace the store contents with a JSON backup
    Import { path: PathBuf },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PriorityArg {
    Low,
    Medium,
    High,
}

impl From<PriorityArg> for Priority {
    fn from(value: PriorityArg) -> Self {
        match value {
            PriorityArg::Low => Self::Low,
            PriorityArg::Medium => Self::Medium,
            PriorityArg::High => Self::High,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ViewArg {
    All,
    Today,
    Week,
    Later,
}

impl From<ViewArg> for ViewType {
    fn from(value: ViewArg) -> Self {
        match value {
            ViewArg::All => Self::All,
            ViewArg::Today => Self::Today,
            ViewArg::Week => Self::ThisWeek,
            ViewArg::Later => Self::Later,
        }
    }
}
