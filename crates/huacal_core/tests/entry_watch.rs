use huacal_core::{Entry, EntryCriteria, EntryRepository, SqliteEntryRepository};

#[tokio::test]
async fn first_delivery_is_current_list() {
    let repo = SqliteEntryRepository::open_in_memory().unwrap();
    repo.upsert(&Entry::new(1_000, "Ana", 1, 1.0)).unwrap();

    let mut watch = repo.watch_all();
    let entries = watch.next().await.unwrap().unwrap();
    assert_eq!(entries.len(), 1);
}

#[tokio::test]
async fn upsert_and_delete_trigger_redelivery() {
    let repo = SqliteEntryRepository::open_in_memory().unwrap();
    let mut watch = repo.watch_all();
    assert!(watch.next().await.unwrap().unwrap().is_empty());

    let mut entry = Entry::new(1_000, "Ana", 2, 3.0);
    entry.id = repo.upsert(&entry).unwrap();
    assert_eq!(watch.next().await.unwrap().unwrap(), vec![entry.clone()]);

    entry.quantity = 9;
    repo.upsert(&entry).unwrap();
    assert_eq!(watch.next().await.unwrap().unwrap()[0].quantity, 9);

    repo.delete(&entry).unwrap();
    assert!(watch.next().await.unwrap().unwrap().is_empty());
}

#[tokio::test]
async fn bursts_of_writes_coalesce_into_one_delivery() {
    let repo = SqliteEntryRepository::open_in_memory().unwrap();
    let mut watch = repo.watch_all();
    watch.next().await.unwrap().unwrap();

    for i in 0..3 {
        repo.upsert(&Entry::new(i, "Ana", 1, 1.0)).unwrap();
    }

    assert_eq!(watch.next().await.unwrap().unwrap().len(), 3);
    assert!(watch.poll_changed().is_none());
}

#[tokio::test]
async fn filtered_watch_requeries_with_its_criteria() {
    let repo = SqliteEntryRepository::open_in_memory().unwrap();
    let mut watch = repo.watch_filtered(EntryCriteria {
        client_name: Some("ped".to_string()),
        ..EntryCriteria::default()
    });
    assert!(watch.next().await.unwrap().unwrap().is_empty());

    repo.upsert(&Entry::new(1_000, "Ana", 1, 1.0)).unwrap();
    repo.upsert(&Entry::new(2_000, "Pedro", 1, 1.0)).unwrap();

    let entries = watch.next().await.unwrap().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].client_name, "Pedro");
}

#[tokio::test]
async fn write_from_another_task_wakes_pending_watch() {
    let repo = SqliteEntryRepository::open_in_memory().unwrap();
    let mut watch = repo.watch_all();
    watch.next().await.unwrap().unwrap();

    let writer = repo.clone();
    let handle = tokio::spawn(async move {
        writer.upsert(&Entry::new(1_000, "Ana", 1, 1.0)).unwrap();
    });

    let entries = watch.next().await.unwrap().unwrap();
    handle.await.unwrap();
    assert_eq!(entries.len(), 1);
}

#[test]
fn poll_changed_reports_only_pending_changes() {
    let repo = SqliteEntryRepository::open_in_memory().unwrap();
    let mut watch = repo.watch_all();

    assert!(watch.poll_changed().unwrap().unwrap().is_empty());
    assert!(watch.poll_changed().is_none());

    repo.upsert(&Entry::new(1_000, "Ana", 1, 1.0)).unwrap();
    assert_eq!(watch.poll_changed().unwrap().unwrap().len(), 1);
    assert!(watch.poll_changed().is_none());
}

#[test]
fn missing_delete_does_not_notify() {
    let repo = SqliteEntryRepository::open_in_memory().unwrap();
    let mut watch = repo.watch_all();
    watch.poll_changed().unwrap().unwrap();

    let before = repo.version();
    repo.delete(&Entry::with_id(999, 0, "Nobody", 1, 1.0)).unwrap();

    assert_eq!(repo.version(), before);
    assert!(watch.poll_changed().is_none());
}

#[test]
fn dropped_watch_does_not_block_writes() {
    let repo = SqliteEntryRepository::open_in_memory().unwrap();
    let watch = repo.watch_all();
    drop(watch);

    repo.upsert(&Entry::new(1_000, "Ana", 1, 1.0)).unwrap();
    assert_eq!(repo.list_all().unwrap().len(), 1);
}

#[tokio::test]
async fn watch_keeps_store_alive_after_caller_handle_drops() {
    let repo = SqliteEntryRepository::open_in_memory().unwrap();
    repo.upsert(&Entry::new(1_000, "Ana", 1, 1.0)).unwrap();
    let writer = repo.clone();
    let mut watch = repo.watch_all();
    drop(repo);

    assert_eq!(watch.next().await.unwrap().unwrap().len(), 1);
    writer.upsert(&Entry::new(2_000, "Juan", 1, 1.0)).unwrap();
    drop(writer);

    let entries = watch.next().await.unwrap().unwrap();
    assert_eq!(entries.len(), 2);
}
