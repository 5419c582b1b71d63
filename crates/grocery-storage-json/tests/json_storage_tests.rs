use chrono::NaiveDate;
use grocery_core::{
    BudgetPolicy, LedgerRepository, LedgerService, StoredUpdate, TransactionFeed, TransactionOutcome,
};
use grocery_domain::{Decimal, FeedMessage, Ledger};
use grocery_storage_json::{JsonFeedStore, JsonLedgerStore};
use std::fs;
use tempfile::tempdir;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn missing_ledger_file_loads_as_none() {
    let dir = tempdir().expect("tempdir");
    let store = JsonLedgerStore::new(dir.path().join("budget-log.json"));

    assert!(store.load_ledger().expect("load").is_none());
}

#[test]
fn ledger_store_round_trips_and_leaves_no_temp_file() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("budget-log.json");
    let store = JsonLedgerStore::new(path.clone());

    let mut ledger = Ledger::new(date(2025, 9, 17), Decimal::new(50000, 2));
    ledger.budget.spent_this_month = Decimal::new(1589, 2);
    ledger.processed_ids.push("abc".into());
    store.save_ledger(&ledger).expect("save ledger");

    let loaded = store.load_ledger().expect("load").expect("ledger present");
    assert_eq!(loaded, ledger);
    assert!(!dir.path().join("budget-log.json.tmp").exists());

    let raw = fs::read_to_string(&path).expect("read file");
    assert!(raw.contains("\"today_date\": \"2025-09-17\""));
    assert!(raw.contains("\"amount_spent_month\": 15.89"));
}

#[test]
fn saving_over_an_existing_ledger_keeps_bounded_backups() {
    let dir = tempdir().expect("tempdir");
    let store = JsonLedgerStore::with_retention(
        dir.path().join("budget-log.json"),
        dir.path().join("backups"),
        2,
    );
    let ledger = Ledger::new(date(2025, 9, 17), Decimal::new(50000, 2));

    store.save_ledger(&ledger).expect("first save");
    assert!(store.list_backups().expect("list").is_empty());

    for _ in 0..4 {
        store.save_ledger(&ledger).expect("save again");
    }
    let backups = store.list_backups().expect("list");
    assert!(!backups.is_empty());
    assert!(backups.len() <= 2);
}

#[test]
fn corrupt_ledger_is_reported_not_replaced() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("budget-log.json");
    fs::write(&path, "{ not json").expect("write corrupt file");
    let store = JsonLedgerStore::new(path.clone());

    assert!(store.load_ledger().is_err());
    assert_eq!(fs::read_to_string(&path).unwrap(), "{ not json");
}

#[test]
fn feed_store_reads_provider_dump() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("email-dump.json");
    let feed = JsonFeedStore::new(path.clone());
    assert!(feed.load_feed().expect("load").is_none());

    fs::write(
        &path,
        r#"[{"id": "18c1", "thread_id": "18c1", "labels": ["INBOX"],
             "subject": "You made a $15.89 transaction at GIANT-EAGLE #123",
             "date": "2025-09-17T14:05:00+00:00", "plain_body": "", "body_preview": "(empty)"}]"#,
    )
    .expect("write feed");

    let messages = feed.load_feed().expect("load").expect("feed present");
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].id, "18c1");
}

#[test]
fn update_against_files_is_idempotent_across_runs() {
    let dir = tempdir().expect("tempdir");
    let store = JsonLedgerStore::new(dir.path().join("budget-log.json"));
    let feed = JsonFeedStore::new(dir.path().join("email-dump.json"));
    feed.store_feed(&[FeedMessage::new(
        "m1",
        "You made a $15.89 transaction at GIANT-EAGLE #123",
        "2025-09-17T14:05:00Z",
    )])
    .expect("store feed");
    let policy = BudgetPolicy::new(Decimal::new(50000, 2), "GIANT-EAGLE");
    let today = date(2025, 9, 17);

    for _ in 0..2 {
        let result = LedgerService::update_stored(&store, &feed, today, &policy).expect("update");
        assert!(matches!(result, StoredUpdate::Updated(_)));
    }

    let ledger = store.load_ledger().expect("load").expect("present");
    assert_eq!(ledger.budget.spent_this_month, Decimal::new(1589, 2));
    assert_eq!(ledger.processed_ids.len(), 1);
}

#[test]
fn malformed_feed_entries_are_skipped_not_fatal() {
    let dir = tempdir().expect("tempdir");
    let store = JsonLedgerStore::new(dir.path().join("budget-log.json"));
    let path = dir.path().join("email-dump.json");
    fs::write(
        &path,
        r#"[{"id": "good", "subject": "You made a $15.89 transaction at GIANT-EAGLE #123", "date": "2025-09-17T10:00:00Z"},
            {"subject": "You made a $99.99 transaction at GIANT-EAGLE #123", "date": "2025-09-17T11:00:00Z"},
            {"id": "typed", "subject": 42, "date": "2025-09-17T12:00:00Z"},
            {"id": "salvaged", "labels": "INBOX", "subject": "You made a $4.10 transaction at GIANT-EAGLE #9", "date": "2025-09-16"},
            "not an object"]"#,
    )
    .expect("write feed");
    let feed = JsonFeedStore::new(path);
    let policy = BudgetPolicy::new(Decimal::new(50000, 2), "GIANT-EAGLE");

    let messages = feed.load_feed().expect("load").expect("feed present");
    assert_eq!(messages.len(), 5);
    assert_eq!(messages[2].id, "typed");
    assert!(messages[2].subject.is_none());

    let StoredUpdate::Updated(update) =
        LedgerService::update_stored(&store, &feed, date(2025, 9, 17), &policy).expect("update")
    else {
        panic!("feed is present");
    };

    assert_eq!(update.counted(), 2);
    assert_eq!(update.count_of(&TransactionOutcome::SkippedUnparseable), 3);
    let ledger = store.load_ledger().expect("load").expect("saved");
    assert_eq!(ledger.budget.spent_this_month, Decimal::new(1999, 2));
    assert_eq!(ledger.processed_ids, vec!["good", "salvaged"]);
}

#[test]
fn saves_in_quick_succession_keep_distinct_backups() {
    let dir = tempdir().expect("tempdir");
    let store = JsonLedgerStore::new(dir.path().join("budget-log.json"));
    let ledger = Ledger::new(date(2025, 9, 17), Decimal::new(50000, 2));

    for _ in 0..3 {
        store.save_ledger(&ledger).expect("save");
    }

    let backups = store.list_backups().expect("list");
    assert_eq!(backups.len(), 2);
    assert_ne!(backups[0], backups[1]);
}
