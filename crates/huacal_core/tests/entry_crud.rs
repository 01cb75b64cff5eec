use huacal_core::{Entry, EntryRepository, RepoError, SqliteEntryRepository};
use std::collections::HashSet;

#[test]
fn upsert_with_unset_id_assigns_unique_non_zero_ids() {
    let repo = SqliteEntryRepository::open_in_memory().unwrap();

    let ids = (0..20)
        .map(|i| repo.upsert(&Entry::new(i, "Juan", 1, 1.0)).unwrap())
        .collect::<Vec<_>>();

    assert!(ids.iter().all(|id| *id > 0));
    assert_eq!(ids.iter().collect::<HashSet<_>>().len(), ids.len());
}

#[test]
fn get_by_id_after_upsert_returns_equal_record() {
    let repo = SqliteEntryRepository::open_in_memory().unwrap();

    let mut entry = Entry::new(1_700_000_000_000, "Ana", 5, 10.5);
    entry.id = repo.upsert(&entry).unwrap();

    let loaded = repo.get_by_id(entry.id).unwrap().unwrap();
    assert_eq!(loaded, entry);
}

#[test]
fn upsert_with_existing_id_updates_in_place() {
    let repo = SqliteEntryRepository::open_in_memory().unwrap();

    let mut entry = Entry::new(1_000, "Pedro", 3, 2.0);
    entry.id = repo.upsert(&entry).unwrap();

    entry.client_name = "Pedro Luis".to_string();
    entry.quantity = 7;
    entry.price = 2.25;
    let id = repo.upsert(&entry).unwrap();

    assert_eq!(id, entry.id);
    assert_eq!(repo.list_all().unwrap(), vec![entry.clone()]);
    assert_eq!(repo.get_by_id(entry.id).unwrap().unwrap(), entry);
}

#[test]
fn upsert_with_unknown_id_acts_as_insert() {
    let repo = SqliteEntryRepository::open_in_memory().unwrap();

    let entry = Entry::with_id(77, 1_000, "Marta", 4, 3.0);
    assert_eq!(repo.upsert(&entry).unwrap(), 77);
    assert_eq!(repo.get_by_id(77).unwrap().unwrap(), entry);

    let next_id = repo.upsert(&Entry::new(2_000, "Luis", 1, 1.0)).unwrap();
    assert!(next_id > 77);
}

#[test]
fn upsert_rejects_negative_id() {
    let repo = SqliteEntryRepository::open_in_memory().unwrap();

    let err = repo
        .upsert(&Entry::with_id(-3, 1_000, "Marta", 4, 3.0))
        .unwrap_err();
    assert!(matches!(err, RepoError::InvalidId(-3)));
    assert!(repo.list_all().unwrap().is_empty());
}

#[test]
fn get_by_id_for_missing_id_returns_none() {
    let repo = SqliteEntryRepository::open_in_memory().unwrap();
    assert!(repo.get_by_id(12345).unwrap().is_none());
}

#[test]
fn delete_removes_row_and_missing_delete_is_noop() {
    let repo = SqliteEntryRepository::open_in_memory().unwrap();

    let mut entry = Entry::new(1_000, "Ana", 5, 10.0);
    entry.id = repo.upsert(&entry).unwrap();

    repo.delete(&entry).unwrap();
    assert!(repo.get_by_id(entry.id).unwrap().is_none());

    repo.delete(&entry).unwrap();
    repo.delete(&Entry::new(1_000, "never saved", 1, 1.0)).unwrap();
}

#[test]
fn deleted_ids_are_never_reused() {
    let repo = SqliteEntryRepository::open_in_memory().unwrap();

    let mut first = Entry::new(1_000, "Ana", 1, 1.0);
    first.id = repo.upsert(&first).unwrap();
    repo.delete(&first).unwrap();

    let second_id = repo.upsert(&Entry::new(1_000, "Ana", 1, 1.0)).unwrap();
    assert_ne!(second_id, first.id);
}

#[test]
fn list_all_orders_by_date_desc_then_id_asc() {
    let repo = SqliteEntryRepository::open_in_memory().unwrap();

    let old = repo.upsert(&Entry::new(1_000, "Old", 1, 1.0)).unwrap();
    let tie_a = repo.upsert(&Entry::new(5_000, "TieA", 1, 1.0)).unwrap();
    let newest = repo.upsert(&Entry::new(9_000, "Newest", 1, 1.0)).unwrap();
    let tie_b = repo.upsert(&Entry::new(5_000, "TieB", 1, 1.0)).unwrap();

    let ids = repo
        .list_all()
        .unwrap()
        .into_iter()
        .map(|entry| entry.id)
        .collect::<Vec<_>>();
    assert_eq!(ids, vec![newest, tie_a, tie_b, old]);
}

#[test]
fn repository_handles_share_one_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("entries.db");

    let repo = SqliteEntryRepository::open(&path).unwrap();
    let clone = repo.clone();
    let id = clone.upsert(&Entry::new(1_000, "Ana", 2, 4.0)).unwrap();
    assert!(repo.get_by_id(id).unwrap().is_some());
    drop(repo);
    drop(clone);

    let reopened = SqliteEntryRepository::open(&path).unwrap();
    assert_eq!(reopened.list_all().unwrap().len(), 1);
}
