//! `taskmanager` command-line entry point.
//!
//! # Responsibility
//! - Map subcommands onto `taskmanager_core` services.
//! - Turn every error into a message on stderr and a non-zero exit code.

mod cli;

use clap::Parser;
use cli::{BackupAction, Cli, Commands, FolderAction, TaskAction};
use log::info;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use taskmanager_core::model::time::{format_timestamp, now_local, parse_timestamp};
use taskmanager_core::{
    default_log_level, init_logging, read_backup_file, restore_backup, write_backup_file, Folder,
    FolderRepository, RepoError, Task, TaskRepository, TaskService, TaskStore,
};

type CliResult<T> = Result<T, Box<dyn Error>>;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CliResult<()> {
    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        let log_dir = absolute_dir(log_dir)?;
        init_logging(level, &log_dir.to_string_lossy())?;
    }

    let store = TaskStore::open(&cli.db)?;
    info!(
        "event=cli_start module=cli status=ok version={}",
        taskmanager_core::core_version()
    );

    match cli.command {
        Commands::Folder { action } => run_folder(&store, action),
        Commands::Task { action } => run_task(&store, action),
        Commands::Backup { action } => run_backup(&store, action),
        Commands::Nuke => {
            let (tasks, folders) = store.write_batch(|batch| -> Result<_, RepoError> {
                Ok((batch.tasks().delete_all()?, batch.folders().delete_all()?))
            })?;
            println!("deleted {tasks} tasks and {folders} folders");
            Ok(())
        }
    }
}

fn run_folder(store: &TaskStore, action: FolderAction) -> CliResult<()> {
    let folders = store.folders();
    match action {
        FolderAction::Add { name, color } => {
            let id = folders.insert(&Folder {
                color,
                ..Folder::new(name)
            })?;
            println!("{id}");
        }
        FolderAction::List => {
            for folder in folders.list_all()? {
                let color = folder.color.map(|c| c.to_string()).unwrap_or_default();
                println!("{}\t{}\t{}", folder.id, folder.name, color);
            }
        }
        FolderAction::Rename { id, name } => {
            let folder = folders
                .get_by_id(id)?
                .ok_or_else(|| format!("folder not found: {id}"))?;
            folders.update(&Folder { name, ..folder })?;
        }
        FolderAction::Rm { id } => {
            let folder = folders
                .get_by_id(id)?
                .ok_or_else(|| format!("folder not found: {id}"))?;
            folders.delete(&folder)?;
        }
    }
    Ok(())
}

fn run_task(store: &TaskStore, action: TaskAction) -> CliResult<()> {
    let service = TaskService::new(store);
    let now = now_local();
    match action {
        TaskAction::Add {
            folder_id,
            label,
            priority,
            due,
        } => {
            let mut task = Task::new(folder_id, label, now);
            task.priority = priority.into();
            task.due_date = due.as_deref().map(parse_due).transpose()?;
            print_task(&service.add_task(&task)?);
        }
        TaskAction::Quick { folder_id, text } => {
            print_task(&service.quick_add(&text.join(" "), folder_id, now)?);
        }
        TaskAction::List { folder, view } => {
            for task in service.tasks_for_view(view.into(), folder, now.date())? {
                print_task(&task);
            }
        }
        TaskAction::Done { id } => {
            let outcome = service.toggle_done(id, now)?;
            print_task(&outcome.task);
            if let Some(next) = outcome.next_occurrence {
                print_task(&next);
            }
        }
        TaskAction::Rm { ids } => {
            println!("deleted {}", service.delete_many(&ids)?);
        }
        TaskAction::Postpone { id, due } => {
            print_task(&service.postpone(id, parse_due(&due)?)?);
        }
        TaskAction::Move { to, ids } => {
            println!("moved {}", service.move_to_folder(&ids, to)?);
        }
    }
    Ok(())
}

fn run_backup(store: &TaskStore, action: BackupAction) -> CliResult<()> {
    match action {
        BackupAction::Export { path } => {
            let backup = write_backup_file(store, &path)?;
            println!(
                "exported {} folders and {} tasks to {}",
                backup.folders.len(),
                backup.tasks.len(),
                path.display()
            );
        }
        BackupAction::Import { path } => {
            let backup = read_backup_file(&path)?
                .ok_or_else(|| format!("backup file not found: {}", path.display()))?;
            let summary = restore_backup(store, backup, now_local())?;
            println!(
                "restored {} folders and {} tasks",
                summary.folders, summary.tasks
            );
        }
    }
    Ok(())
}

fn parse_due(value: &str) -> CliResult<chrono::NaiveDateTime> {
    parse_timestamp(value).ok_or_else(|| {
        format!("invalid date `{value}`, expected YYYY-MM-DDTHH:MM[:SS]").into()
    })
}

fn absolute_dir(path: &Path) -> CliResult<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    Ok(std::env::current_dir()?.join(path))
}

fn print_task(task: &Task) {
    let due = task.due_date.map(format_timestamp).unwrap_or_default();
    let mark = if task.is_done { "x" } else { " " };
    println!(
        "{}\t[{}]\t{}\t{}\t{}\tfolder={}",
        task.id,
        mark,
        task.priority.as_str(),
        due,
        task.label,
        task.folder_id
    );
}
