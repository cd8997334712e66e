use chrono::{NaiveDate, NaiveDateTime};
use std::thread;
use std::time::Duration;
use taskmanager_core::{
    ChangeNotifier, Folder, FolderRepository, RepoError, Task, TaskRepository, TaskStore,
};

fn created() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

#[test]
fn first_poll_delivers_current_rows_then_waits_for_change() {
    let store = TaskStore::open_in_memory().unwrap();
    let folder_id = store.folders().insert(&Folder::new("Inbox")).unwrap();
    store
        .tasks()
        .insert(&Task::new(folder_id, "existing", created()))
        .unwrap();

    let mut live = store.watch_tasks();
    assert_eq!(live.poll().unwrap().unwrap().len(), 1);
    assert!(live.poll().unwrap().is_none());

    store
        .tasks()
        .insert(&Task::new(folder_id, "new", created()))
        .unwrap();
    assert_eq!(live.poll().unwrap().unwrap().len(), 2);
    assert!(live.poll().unwrap().is_none());
}

#[test]
fn changes_to_other_table_do_not_redeliver() {
    let store = TaskStore::open_in_memory().unwrap();
    let mut tasks_live = store.watch_tasks();
    let mut folders_live = store.watch_folders();
    tasks_live.poll().unwrap();
    folders_live.poll().unwrap();

    store.folders().insert(&Folder::new("Work")).unwrap();

    assert!(tasks_live.poll().unwrap().is_none());
    let folders = folders_live.poll().unwrap().unwrap();
    assert_eq!(folders.len(), 1);
}

#[test]
fn several_writes_collapse_into_one_delivery() {
    let store = TaskStore::open_in_memory().unwrap();
    let folder_id = store.folders().insert(&Folder::new("Inbox")).unwrap();
    let mut live = store.watch_tasks_in_folder(folder_id);
    assert!(live.poll().unwrap().unwrap().is_empty());

    for label in ["a", "b", "c"] {
        store
            .tasks()
            .insert(&Task::new(folder_id, label, created()))
            .unwrap();
    }

    assert_eq!(live.poll().unwrap().unwrap().len(), 3);
    assert!(live.poll().unwrap().is_none());
}

#[test]
fn failed_write_does_not_notify() {
    let store = TaskStore::open_in_memory().unwrap();
    let mut live = store.watch_tasks();
    live.poll().unwrap();

    let mut ghost = Task::new(1, "ghost", created());
    ghost.id = 99;
    assert!(matches!(
        store.tasks().update(&ghost).unwrap_err(),
        RepoError::NotFound { .. }
    ));
    assert!(live.poll().unwrap().is_none());
}

#[test]
fn rolled_back_batch_notifies_nobody() {
    let store = TaskStore::open_in_memory().unwrap();
    let mut live = store.watch_tasks();
    live.poll().unwrap();

    let result: Result<(), RepoError> = store.write_batch(|batch| {
        batch.tasks().insert(&Task::new(1, "half", created()))?;
        Err(RepoError::InvalidData("abort".to_string()))
    });

    assert!(result.is_err());
    assert!(store.tasks().list_all().unwrap().is_empty());
    assert!(live.poll().unwrap().is_none());
}

#[test]
fn lagged_receiver_redelivers_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lag.db");
    let store = TaskStore::open_with_notifier(&path, ChangeNotifier::with_capacity(2)).unwrap();
    let mut live = store.watch_folders();
    live.poll().unwrap();

    for name in ["a", "b", "c", "d", "e"] {
        store.folders().insert(&Folder::new(name)).unwrap();
    }

    assert_eq!(live.poll().unwrap().unwrap().len(), 5);
    assert!(live.poll().unwrap().is_none());
}

#[test]
fn shared_notifier_wakes_observer_on_another_thread() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shared.db");
    let notifier = ChangeNotifier::new();
    let reader = TaskStore::open_with_notifier(&path, notifier.clone()).unwrap();

    let mut live = reader.watch_folders();
    assert!(live.wait().unwrap().unwrap().is_empty());

    let writer_path = path.clone();
    let writer = thread::spawn(move || {
        let store = TaskStore::open_with_notifier(&writer_path, notifier).unwrap();
        thread::sleep(Duration::from_millis(20));
        store.folders().insert(&Folder::new("from thread")).unwrap();
    });

    let folders = live.wait().unwrap().unwrap();
    writer.join().unwrap();
    assert_eq!(folders.len(), 1);
    assert_eq!(folders[0].name, "from thread");
}

#[test]
fn failed_rerun_is_retried_on_next_poll() {
    let store = TaskStore::open_in_memory().unwrap();
    let mut live = store.watch_tasks();
    assert!(live.poll().unwrap().unwrap().is_empty());

    let id = store
        .tasks()
        .insert(&Task::new(1, "flaky", created()))
        .unwrap();
    store
        .connection()
        .execute("UPDATE tasks SET priority = 'URGENT' WHERE id = ?1;", [id])
        .unwrap();
    assert!(matches!(
        live.poll().unwrap_err(),
        RepoError::InvalidData(_)
    ));

    store
        .connection()
        .execute("UPDATE tasks SET priority = 'LOW' WHERE id = ?1;", [id])
        .unwrap();
    let rows = live.poll().unwrap().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].label, "flaky");
    assert!(live.poll().unwrap().is_none());
}
