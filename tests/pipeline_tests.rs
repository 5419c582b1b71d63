mod common;

use common::{date, purchase, settings, BrokenInbox, FakeInbox, RecordingNotifier};
use grocery_budget::{
    errors::AppError,
    pipeline::{NotifyStatus, Pipeline},
};
use grocery_core::{
    FixedClock, InMemoryFeed, InMemoryLedgerRepository, LedgerRepository, StoredUpdate,
    TransactionFeed, TransactionOutcome,
};
use grocery_domain::{Decimal, FeedMessage, Ledger};

fn cents(value: i64) -> Decimal {
    Decimal::new(value, 2)
}

fn september_inbox() -> FakeInbox {
    FakeInbox::with(vec![
        purchase("m-today", "15.89", "2025-09-17T10:00:00-04:00"),
        purchase("m-today", "15.89", "2025-09-17T10:00:00-04:00"),
        purchase("m-monday", "20.00", "2025-09-15T18:30:00-04:00"),
        purchase("m-early", "1,030.00", "2025-09-02T09:00:00-04:00"),
        FeedMessage::new("m-other", "Your order from ACME shipped", "2025-09-16T08:00:00Z"),
    ])
}

#[test]
fn full_run_fetches_updates_and_sends_summary() {
    let inbox = september_inbox();
    let feed = InMemoryFeed::new();
    let ledgers = InMemoryLedgerRepository::new();
    let notifier = RecordingNotifier::default();
    let clock = FixedClock::new(date(2025, 9, 17));

    let pipeline = Pipeline::new(settings(), &inbox, &feed, &ledgers, &notifier, &clock);
    let report = pipeline.run().unwrap();

    assert_eq!(report.fetched, 5);
    assert_eq!(inbox.requests.borrow().as_slice(), &[date(2025, 8, 23)]);

    let StoredUpdate::Updated(update) = report.update else {
        panic!("feed was stored by the fetch stage");
    };
    assert!(update.started_new_period);
    assert_eq!(update.counted(), 3);
    assert_eq!(update.count_of(&TransactionOutcome::SkippedDuplicate), 1);
    assert_eq!(update.count_of(&TransactionOutcome::SkippedNonMatching), 1);

    let ledger = ledgers.current().unwrap();
    assert_eq!(ledger.budget.daily_limit, cents(1667));
    assert_eq!(ledger.budget.weekly_limit, cents(12500));
    assert_eq!(ledger.budget.spent_today, cents(1589));
    assert_eq!(ledger.budget.spent_this_week, cents(3589));
    assert_eq!(ledger.budget.spent_this_month, cents(106589));
    assert_eq!(ledger.budget.remaining_this_month, cents(-56589));
    assert_eq!(ledger.processed_ids, vec!["m-today", "m-monday", "m-early"]);

    let sent = notifier.sent.borrow();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, "Grocery Budget Update");
    assert!(sent[0].body.contains("You spent $15.89 today on groceries."));
    assert!(sent[0].body.contains("$-565.89 remaining for the month, $89.11 remaining for the week."));
    assert_eq!(report.notify, NotifyStatus::Sent(sent[0].clone()));
}

#[test]
fn rerunning_the_same_day_counts_nothing_twice() {
    let inbox = september_inbox();
    let feed = InMemoryFeed::new();
    let ledgers = InMemoryLedgerRepository::new();
    let notifier = RecordingNotifier::default();
    let clock = FixedClock::new(date(2025, 9, 17));
    let pipeline = Pipeline::new(settings(), &inbox, &feed, &ledgers, &notifier, &clock);

    pipeline.run().unwrap();
    let first = ledgers.current().unwrap();
    pipeline.run().unwrap();
    let second = ledgers.current().unwrap();

    assert_eq!(first, second);
    assert_eq!(ledgers.save_count(), 2);
    assert_eq!(notifier.sent.borrow().len(), 2);
}

#[test]
fn next_month_run_starts_a_fresh_ledger() {
    let inbox = FakeInbox::with(vec![purchase("oct-1", "12.34", "2025-10-01T09:00:00-04:00")]);
    let feed = InMemoryFeed::new();
    let mut september = Ledger::new(date(2025, 9, 30), cents(50000));
    september.budget.spent_this_month = cents(48000);
    september.processed_ids.push("sep-30".into());
    let ledgers = InMemoryLedgerRepository::with_ledger(september);
    let notifier = RecordingNotifier::default();
    let clock = FixedClock::new(date(2025, 10, 1));

    Pipeline::new(settings(), &inbox, &feed, &ledgers, &notifier, &clock)
        .run()
        .unwrap();

    let ledger = ledgers.current().unwrap();
    assert_eq!(ledger.month, 10);
    assert_eq!(ledger.days_remaining_in_month, 30);
    assert_eq!(ledger.budget.daily_limit, cents(1613));
    assert_eq!(ledger.budget.spent_this_month, cents(1234));
    assert_eq!(ledger.budget.remaining_this_month, cents(48766));
    assert_eq!(ledger.processed_ids, vec!["oct-1"]);
}

#[test]
fn update_without_feed_leaves_ledger_alone_and_still_notifies() {
    let inbox = FakeInbox::default();
    let feed = InMemoryFeed::new();
    let existing = Ledger::new(date(2025, 9, 10), cents(50000));
    let ledgers = InMemoryLedgerRepository::with_ledger(existing.clone());
    let notifier = RecordingNotifier::default();
    let clock = FixedClock::new(date(2025, 9, 17));
    let pipeline = Pipeline::new(settings(), &inbox, &feed, &ledgers, &notifier, &clock);

    assert!(matches!(pipeline.update().unwrap(), StoredUpdate::FeedMissing));
    assert_eq!(ledgers.save_count(), 0);
    assert_eq!(ledgers.current(), Some(existing));

    let status = pipeline.notify().unwrap();
    assert!(matches!(status, NotifyStatus::Sent(_)));
    assert!(notifier.sent.borrow()[0].body.starts_with("Today's date is 2025-09-10."));
}

#[test]
fn notify_without_ledger_sends_nothing() {
    let inbox = FakeInbox::default();
    let feed = InMemoryFeed::new();
    let ledgers = InMemoryLedgerRepository::new();
    let notifier = RecordingNotifier::default();
    let clock = FixedClock::new(date(2025, 9, 17));
    let pipeline = Pipeline::new(settings(), &inbox, &feed, &ledgers, &notifier, &clock);

    assert_eq!(pipeline.notify().unwrap(), NotifyStatus::NoLedger);
    assert!(notifier.sent.borrow().is_empty());
}

#[test]
fn empty_inbox_still_writes_a_ledger() {
    let inbox = FakeInbox::default();
    let feed = InMemoryFeed::new();
    let ledgers = InMemoryLedgerRepository::new();
    let notifier = RecordingNotifier::default();
    let clock = FixedClock::new(date(2025, 9, 17));

    let report = Pipeline::new(settings(), &inbox, &feed, &ledgers, &notifier, &clock)
        .run()
        .unwrap();

    assert_eq!(report.fetched, 0);
    assert_eq!(feed.load_feed().unwrap(), Some(Vec::new()));
    let ledger = ledgers.load_ledger().unwrap().unwrap();
    assert_eq!(ledger.budget.spent_this_month, Decimal::ZERO);
    assert_eq!(ledger.budget.remaining_this_month, cents(50000));
}

#[test]
fn fetch_failure_aborts_before_touching_the_feed() {
    let feed = InMemoryFeed::with_messages(vec![purchase("old", "1.00", "2025-09-01")]);
    let ledgers = InMemoryLedgerRepository::new();
    let notifier = RecordingNotifier::default();
    let clock = FixedClock::new(date(2025, 9, 17));
    let pipeline = Pipeline::new(settings(), &BrokenInbox, &feed, &ledgers, &notifier, &clock);

    let err = pipeline.run().unwrap_err();

    assert!(matches!(err, AppError::Mail(_)));
    assert!(err.to_string().contains("token revoked"));
    assert_eq!(feed.load_feed().unwrap().map(|m| m.len()), Some(1));
    assert_eq!(ledgers.save_count(), 0);
    assert!(notifier.sent.borrow().is_empty());
}
