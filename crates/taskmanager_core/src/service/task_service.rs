//! Task lifecycle use-cases.
//!
//! # Responsibility
//! - Quick-add, completion toggling with recurrence, postponing, bulk
//!   moves and deletes.
//! - Date-bucketed task views.
//!
//! # Invariants
//! - Multi-row operations run in one `write_batch`; they either fully apply
//!   or leave the store unchanged.
//! - Completing a repetitive task creates at most one follow-up occurrence.

use crate::model::folder::{Folder, FolderId};
use crate::model::task::{Task, TaskId};
use crate::parse::quick_add::parse_quick_add;
use crate::repo::folder_repo::FolderRepository;
use crate::repo::task_repo::TaskRepository;
use crate::repo::{RepoError, RepoResult};
use crate::store::TaskStore;
use chrono::{Days, NaiveDate, NaiveDateTime};
use log::info;
use std::cmp::Ordering;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors from task use-case operations.
#[derive(Debug)]
pub enum ServiceError {
    Repo(RepoError),
    /// Referenced task id does not exist.
    TaskNotFound(TaskId),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::TaskNotFound(id) => write!(f, "task not found: {id}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::TaskNotFound(_) => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Date bucket used by the task list tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewType {
    All,
    /// Due today.
    Today,
    /// Due after today and within the next seven days.
    ThisWeek,
    /// Undated, or due more than seven days from today.
    Later,
}

/// Outcome of `TaskService::toggle_done`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleOutcome {
    pub task: Task,
    /// Follow-up occurrence inserted for a completed repetitive task.
    pub next_occurrence: Option<Task>,
}

/// Use-case service over one `TaskStore`.
pub struct TaskService<'s> {
    store: &'s TaskStore,
}

impl<'s> TaskService<'s> {
    pub fn new(store: &'s TaskStore) -> Self {
        Self { store }
    }

    /// Inserts `task` as a new row regardless of its current id.
    pub fn add_task(&self, task: &Task) -> ServiceResult<Task> {
        let task = Task {
            id: 0,
            ..task.clone()
        };
        let id = self.store.tasks().insert(&task)?;
        Ok(Task { id, ..task })
    }

    /// Parses free text into label + due date and inserts a default task.
    pub fn quick_add(
        &self,
        input: &str,
        folder_id: FolderId,
        now: NaiveDateTime,
    ) -> ServiceResult<Task> {
        let parsed = parse_quick_add(input, now);
        let mut task = Task::new(folder_id, parsed.label, now);
        task.due_date = parsed.due;
        self.add_task(&task)
    }

    pub fn add_folder(&self, name: &str) -> ServiceResult<Folder> {
        let folder = Folder::new(name);
        let id = self.store.folders().insert(&folder)?;
        Ok(Folder { id, ..folder })
    }

    /// Flips completion. Completing a repetitive task also inserts its next
    /// occurrence in the same transaction.
    pub fn toggle_done(&self, id: TaskId, now: NaiveDateTime) -> ServiceResult<ToggleOutcome> {
        let outcome = self.store.write_batch(|batch| -> ServiceResult<ToggleOutcome> {
            let tasks = batch.tasks();
            let current = tasks.get_by_id(id)?.ok_or(ServiceError::TaskNotFound(id))?;
            let toggled = Task {
                is_done: !current.is_done,
                ..current
            };
            tasks.update(&toggled)?;

            let next_occurrence = match toggled.is_done {
                true => toggled.next_occurrence(now),
                false => None,
            };
            let next_occurrence = match next_occurrence {
                Some(next) => {
                    let next_id = tasks.insert(&next)?;
                    Some(Task { id: next_id, ..next })
                }
                None => None,
            };

            Ok(ToggleOutcome {
                task: toggled,
                next_occurrence,
            })
        })?;

        info!(
            "event=task_toggle module=service status=ok id={} done={} spawned={}",
            id,
            outcome.task.is_done,
            outcome.next_occurrence.as_ref().map_or(0, |t| t.id)
        );
        Ok(outcome)
    }

    /// Moves the due date of one task.
    pub fn postpone(&self, id: TaskId, new_due: NaiveDateTime) -> ServiceResult<Task> {
        let tasks = self.store.tasks();
        let current = tasks.get_by_id(id)?.ok_or(ServiceError::TaskNotFound(id))?;
        let updated = Task {
            due_date: Some(new_due),
            ..current
        };
        tasks.update(&updated)?;
        Ok(updated)
    }

    /// Reassigns existing tasks to `folder_id`; unknown ids are skipped.
    ///
    /// Returns the number of moved tasks.
    pub fn move_to_folder(&self, ids: &[TaskId], folder_id: FolderId) -> ServiceResult<usize> {
        self.store.write_batch(|batch| -> ServiceResult<usize> {
            let tasks = batch.tasks();
            let mut moved = 0;
            for id in ids {
                if let Some(task) = tasks.get_by_id(*id)? {
                    tasks.update(&Task { folder_id, ..task })?;
                    moved += 1;
                }
            }
            Ok(moved)
        })
    }

    /// Deletes the given ids in one transaction. Returns removed row count.
    pub fn delete_many(&self, ids: &[TaskId]) -> ServiceResult<usize> {
        self.store.write_batch(|batch| -> ServiceResult<usize> {
            let tasks = batch.tasks();
            let mut removed = 0;
            for id in ids {
                if let Some(task) = tasks.get_by_id(*id)? {
                    if tasks.delete(&task)? {
                        removed += 1;
                    }
                }
            }
            Ok(removed)
        })
    }

    /// Tasks of one view bucket, optionally limited to one folder.
    ///
    /// `folder_id` of `None` or `Some(0)` means every folder.
    pub fn tasks_for_view(
        &self,
        view: ViewType,
        folder_id: Option<FolderId>,
        today: NaiveDate,
    ) -> RepoResult<Vec<Task>> {
        let tasks = match folder_id {
            Some(folder_id) if folder_id != 0 => self.store.tasks().list_by_folder(folder_id)?,
            _ => self.store.tasks().list_all()?,
        };
        Ok(filter_view(tasks, view, today))
    }
}

/// Applies a view bucket and sorts by completion then due date (undated
/// last).
pub fn filter_view(tasks: Vec<Task>, view: ViewType, today: NaiveDate) -> Vec<Task> {
    let week_end = today.checked_add_days(Days::new(8));
    let later_start = today.checked_add_days(Days::new(7));

    let mut filtered: Vec<Task> = tasks
        .into_iter()
        .filter(|task| {
            let due = task.due_date.map(|d| d.date());
            match view {
                ViewType::All => true,
                ViewType::Today => due == Some(today),
                ViewType::ThisWeek => match (due, week_end) {
                    (Some(date), Some(end)) => date > today && date < end,
                    _ => false,
                },
                ViewType::Later => match (due, later_start) {
                    (None, _) => true,
                    (Some(date), Some(start)) => date > start,
                    (Some(_), None) => false,
                },
            }
        })
        .collect();

    filtered.sort_by(view_order);
    filtered
}

fn view_order(a: &Task, b: &Task) -> Ordering {
    a.is_done.cmp(&b.is_done).then_with(|| match (a.due_date, b.due_date) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    })
}
