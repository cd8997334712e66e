use chrono::{NaiveDate, NaiveDateTime};
use taskmanager_core::{
    Priority, RepeatUnit, ServiceError, Task, TaskRepository, TaskService, TaskStore, TaskType,
    ViewType,
};

fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, 0)
        .unwrap()
}

fn repetitive(folder_id: i64, due: NaiveDateTime, interval: i32, unit: RepeatUnit) -> Task {
    let mut task = Task::new(folder_id, "water plants", at(2024, 1, 1, 0, 0));
    task.kind = TaskType::Repetitive;
    task.due_date = Some(due);
    task.repeat_interval = Some(interval);
    task.repeat_unit = Some(unit);
    task
}

#[test]
fn quick_add_parses_label_and_due_date() {
    let store = TaskStore::open_in_memory().unwrap();
    let service = TaskService::new(&store);
    let home = service.add_folder("Maison").unwrap();
    let now = at(2024, 5, 15, 10, 0);

    let task = service
        .quick_add("Dentiste, jeudi 14h30", home.id, now)
        .unwrap();

    assert!(task.id > 0);
    assert_eq!(task.label, "Dentiste");
    assert_eq!(task.due_date, Some(at(2024, 5, 16, 14, 30)));
    assert_eq!(task.priority, Priority::Medium);
    assert_eq!(task.created_at, now);
    assert_eq!(store.tasks().get_by_id(task.id).unwrap(), Some(task));
}

#[test]
fn add_task_ignores_caller_id() {
    let store = TaskStore::open_in_memory().unwrap();
    let service = TaskService::new(&store);
    let existing = service.add_task(&Task::new(1, "first", at(2024, 1, 1, 0, 0))).unwrap();

    let mut copy = existing.clone();
    copy.label = "second".to_string();
    let added = service.add_task(&copy).unwrap();

    assert_ne!(added.id, existing.id);
    assert_eq!(store.tasks().list_all().unwrap().len(), 2);
}

#[test]
fn completing_repetitive_task_spawns_one_next_occurrence() {
    let store = TaskStore::open_in_memory().unwrap();
    let service = TaskService::new(&store);
    let original = service
        .add_task(&repetitive(1, at(2024, 1, 31, 9, 0), 1, RepeatUnit::Months))
        .unwrap();
    let now = at(2024, 1, 31, 9, 5);

    let outcome = service.toggle_done(original.id, now).unwrap();

    assert!(outcome.task.is_done);
    let next = outcome.next_occurrence.unwrap();
    assert_ne!(next.id, original.id);
    assert!(!next.is_done);
    assert_eq!(next.due_date, Some(at(2024, 2, 29, 9, 0)));
    assert_eq!(next.created_at, now);
    assert_eq!(store.tasks().get_by_id(next.id).unwrap(), Some(next));
    assert_eq!(store.tasks().list_all().unwrap().len(), 2);
}

#[test]
fn reopening_does_not_spawn_and_once_tasks_never_spawn() {
    let store = TaskStore::open_in_memory().unwrap();
    let service = TaskService::new(&store);
    let now = at(2024, 1, 1, 12, 0);

    let mut done = repetitive(1, at(2024, 1, 1, 9, 0), 1, RepeatUnit::Days);
    done.is_done = true;
    let done = service.add_task(&done).unwrap();
    let reopened = service.toggle_done(done.id, now).unwrap();
    assert!(!reopened.task.is_done);
    assert!(reopened.next_occurrence.is_none());

    let once = service.add_task(&Task::new(1, "one-off", now)).unwrap();
    let outcome = service.toggle_done(once.id, now).unwrap();
    assert!(outcome.task.is_done);
    assert!(outcome.next_occurrence.is_none());

    assert_eq!(store.tasks().list_all().unwrap().len(), 2);
}

#[test]
fn toggling_unknown_task_reports_not_found() {
    let store = TaskStore::open_in_memory().unwrap();
    let service = TaskService::new(&store);
    let err = service.toggle_done(31337, at(2024, 1, 1, 0, 0)).unwrap_err();
    assert!(matches!(err, ServiceError::TaskNotFound(31337)));
}

#[test]
fn toggle_notifies_live_query_once() {
    let store = TaskStore::open_in_memory().unwrap();
    let service = TaskService::new(&store);
    let task = service
        .add_task(&repetitive(1, at(2024, 1, 1, 9, 0), 2, RepeatUnit::Weeks))
        .unwrap();
    let mut live = store.watch_tasks();
    live.poll().unwrap();
    let sent_before = store.notifier().sent_count();

    service.toggle_done(task.id, at(2024, 1, 1, 10, 0)).unwrap();

    assert_eq!(store.notifier().sent_count(), sent_before + 1);
    let rows = live.poll().unwrap().unwrap();
    assert_eq!(rows.len(), 2);
    assert!(!rows[0].is_done);
    assert_eq!(rows[0].due_date, Some(at(2024, 1, 15, 9, 0)));
}

#[test]
fn postpone_moves_due_date() {
    let store = TaskStore::open_in_memory().unwrap();
    let service = TaskService::new(&store);
    let task = service.add_task(&Task::new(1, "report", at(2024, 1, 1, 0, 0))).unwrap();

    let updated = service.postpone(task.id, at(2024, 2, 1, 9, 0)).unwrap();
    assert_eq!(updated.due_date, Some(at(2024, 2, 1, 9, 0)));
    assert_eq!(store.tasks().get_by_id(task.id).unwrap(), Some(updated));
}

#[test]
fn move_to_folder_skips_missing_ids() {
    let store = TaskStore::open_in_memory().unwrap();
    let service = TaskService::new(&store);
    let inbox = service.add_folder("Inbox").unwrap();
    let work = service.add_folder("Work").unwrap();
    let created = at(2024, 1, 1, 0, 0);
    let a = service.add_task(&Task::new(inbox.id, "a", created)).unwrap();
    let b = service.add_task(&Task::new(inbox.id, "b", created)).unwrap();

    let moved = service.move_to_folder(&[a.id, 999, b.id], work.id).unwrap();

    assert_eq!(moved, 2);
    assert!(store.tasks().list_by_folder(inbox.id).unwrap().is_empty());
    assert_eq!(store.tasks().list_by_folder(work.id).unwrap().len(), 2);
}

#[test]
fn delete_many_counts_removed_rows() {
    let store = TaskStore::open_in_memory().unwrap();
    let service = TaskService::new(&store);
    let created = at(2024, 1, 1, 0, 0);
    let a = service.add_task(&Task::new(1, "a", created)).unwrap();
    let b = service.add_task(&Task::new(1, "b", created)).unwrap();
    let keep = service.add_task(&Task::new(1, "keep", created)).unwrap();

    assert_eq!(service.delete_many(&[a.id, b.id, 404]).unwrap(), 2);
    let left = store.tasks().list_all().unwrap();
    assert_eq!(left, vec![keep]);
}

#[test]
fn tasks_for_view_applies_folder_filter() {
    let store = TaskStore::open_in_memory().unwrap();
    let service = TaskService::new(&store);
    let today = NaiveDate::from_ymd_opt(2024, 4, 10).unwrap();
    let created = at(2024, 4, 1, 0, 0);

    let mut home_today = Task::new(1, "home today", created);
    home_today.due_date = Some(at(2024, 4, 10, 18, 0));
    let mut work_today = Task::new(2, "work today", created);
    work_today.due_date = Some(at(2024, 4, 10, 9, 0));
    service.add_task(&home_today).unwrap();
    service.add_task(&work_today).unwrap();
    service.add_task(&Task::new(2, "work later", created)).unwrap();

    let all_today = service.tasks_for_view(ViewType::Today, None, today).unwrap();
    let labels: Vec<_> = all_today.iter().map(|t| t.label.as_str()).collect();
    assert_eq!(labels, ["work today", "home today"]);

    let zero_means_all = service.tasks_for_view(ViewType::Today, Some(0), today).unwrap();
    assert_eq!(zero_means_all.len(), 2);

    let work_later = service.tasks_for_view(ViewType::Later, Some(2), today).unwrap();
    assert_eq!(work_later.len(), 1);
    assert_eq!(work_later[0].label, "work later");
}
