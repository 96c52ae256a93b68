// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

mod common;

use std::sync::mpsc;
use std::time::Instant;

use common::{RecordingStore, date, expense, income};
use rust_decimal_macros::dec;
use tallybook::error::{TrackerError, ValidationError};
use tallybook::models::{Budget, MonthRef};
use tallybook::mutation::{BudgetAlert, GRACE_PERIOD};
use tallybook::session::{Identity, SessionProvider};
use tallybook::store::{FeedEvent, Store};
use tallybook::sync::TransactionFeed;
use tallybook::tracker::{Notice, Tracker};

fn june() -> MonthRef {
    MonthRef::new(2025, 6).unwrap()
}

fn signed_in(store: RecordingStore) -> (SessionProvider, Tracker<RecordingStore>) {
    let mut session = SessionProvider::new();
    let mut tracker = Tracker::new(store, session.listen(), june());
    session.sign_in(Identity::new("u1"));
    tracker.tick(Instant::now());
    (session, tracker)
}

#[test]
fn adds_warn_from_projected_totals() {
    let (_session, mut tracker) = signed_in(RecordingStore::new());
    let mut b = Budget::empty("u1");
    b.overall_amount = dec!(100);
    b.amounts.insert("Food".into(), dec!(50));
    tracker.save_budget(&b).unwrap();

    let first = tracker
        .add(expense("Lunch", dec!(30), "Food", date(2025, 6, 2)))
        .unwrap();
    assert!(first.alerts.is_empty());

    let second = tracker
        .add(expense("Dinner", dec!(16), "Food", date(2025, 6, 3)))
        .unwrap();
    assert_eq!(
        second.alerts,
        vec![BudgetAlert::CategoryNearLimit {
            category: "Food".into(),
            projected: dec!(46),
            budget: dec!(50),
        }]
    );

    let third = tracker
        .add(expense("Feast", dec!(60), "Food", date(2025, 6, 4)))
        .unwrap();
    assert!(matches!(third.alerts[0], BudgetAlert::OverallExceeded { .. }));
    assert!(matches!(third.alerts[1], BudgetAlert::CategoryExceeded { .. }));

    let july = tracker
        .add(expense("Later", dec!(500), "Food", date(2025, 7, 1)))
        .unwrap();
    assert!(july.alerts.is_empty());

    let alerts = tracker
        .take_notices()
        .into_iter()
        .filter(|n| matches!(n, Notice::Alert { .. }))
        .count();
    assert_eq!(alerts, 3);
    assert_eq!(tracker.visible().len(), 3);
}

#[test]
fn invalid_input_never_reaches_store() {
    let (_session, mut tracker) = signed_in(RecordingStore::new());
    let mut blank = expense("  ", dec!(5), "Food", date(2025, 6, 1));
    assert!(matches!(
        tracker.add(blank.clone()),
        Err(TrackerError::Validation(ValidationError::MissingTitle))
    ));
    blank.title = "Tea".into();
    blank.amount = dec!(0);
    assert!(matches!(
        tracker.add(blank),
        Err(TrackerError::Validation(ValidationError::NonPositiveAmount(_)))
    ));
    assert!(tracker.store().transactions_for_user("u1").unwrap().is_empty());
}

#[test]
fn update_keeps_id_and_owner() {
    let (_session, mut tracker) = signed_in(RecordingStore::new());
    let added = tracker
        .add(income("Pay", dec!(1000), date(2025, 6, 1)))
        .unwrap()
        .transaction;
    let mut fields = added.fields();
    fields.amount = dec!(1100);
    fields.description = Some("with bonus".into());
    let updated = tracker.update(&added.id, fields).unwrap();
    assert_eq!(updated.id, added.id);
    assert_eq!(updated.user_id, "u1");

    tracker.tick(Instant::now());
    let stored = tracker.store().transaction(&added.id).unwrap().unwrap();
    assert_eq!(stored, updated);
    assert_eq!(tracker.summary().totals.income, dec!(1100));
}

#[test]
fn month_and_rollover_changes_recompute_budget() {
    let (_session, mut tracker) = signed_in(RecordingStore::new());
    let mut may = Budget::empty("u1");
    may.amounts.insert("Food".into(), dec!(200));
    tracker.set_month(MonthRef::new(2025, 5).unwrap());
    tracker.save_budget(&may).unwrap();
    tracker
        .add(expense("Market", dec!(150), "Food", date(2025, 5, 20)))
        .unwrap();

    tracker.set_month(june());
    assert_eq!(tracker.budgets().unwrap().effective_for("Food"), dec!(0));

    tracker.set_rollover(true).unwrap();
    let resolved = tracker.budgets().unwrap();
    assert!(resolved.settings.enable_rollover);
    assert_eq!(resolved.rollover.get("Food"), Some(&dec!(50)));
    assert_eq!(resolved.effective_for("Food"), dec!(50));

    tracker.set_rollover(false).unwrap();
    assert!(tracker.budgets().unwrap().rollover.is_empty());
}

#[test]
fn feed_error_keeps_last_good_list() {
    let store = RecordingStore::new();
    let (feed_tx, feed_rx) = mpsc::channel();
    *store.scripted_feed.borrow_mut() = Some(feed_rx);
    let seeded = expense("Rent", dec!(900), "Housing", date(2025, 6, 1))
        .into_transaction("t1".into(), "u1".into());
    feed_tx.send(FeedEvent::Snapshot(vec![seeded.clone()])).unwrap();

    let (_session, mut tracker) = signed_in(store);
    assert!(!tracker.is_loading());
    assert_eq!(tracker.visible(), vec![seeded.clone()]);

    feed_tx.send(FeedEvent::Error("offline".into())).unwrap();
    tracker.tick(Instant::now());
    assert_eq!(tracker.visible(), vec![seeded]);
    let notices = tracker.take_notices();
    assert_eq!(
        notices,
        vec![Notice::Error {
            message: "offline".into()
        }]
    );
}

#[test]
fn local_add_outlives_snapshot_that_predates_it() {
    let store = RecordingStore::new();
    let (feed_tx, feed_rx) = mpsc::channel();
    *store.scripted_feed.borrow_mut() = Some(feed_rx);
    let rent = expense("Rent", dec!(900), "Housing", date(2025, 6, 1))
        .into_transaction("t1".into(), "u1".into());
    feed_tx.send(FeedEvent::Snapshot(vec![rent.clone()])).unwrap();
    let mut feed = TransactionFeed::subscribe(&store, "u1").unwrap();
    assert_eq!(feed.transactions().to_vec(), vec![rent.clone()]);

    let lunch = expense("Lunch", dec!(12), "Food", date(2025, 6, 2))
        .into_transaction("t2".into(), "u1".into());
    feed.insert_local(lunch.clone());
    feed_tx.send(FeedEvent::Snapshot(vec![rent.clone()])).unwrap();
    assert!(feed.pump().changed());
    assert_eq!(feed.transactions().to_vec(), vec![lunch.clone(), rent.clone()]);
    assert_eq!(feed.pending_writes(), 1);

    feed_tx
        .send(FeedEvent::Snapshot(vec![lunch.clone(), rent.clone()]))
        .unwrap();
    feed.pump();
    assert_eq!(feed.pending_writes(), 0);
    assert_eq!(feed.transactions().to_vec(), vec![lunch, rent]);
}

#[test]
fn tick_commits_due_delete_and_reports_it() {
    let (_session, mut tracker) = signed_in(RecordingStore::new());
    let a = tracker
        .add(expense("Gym", dec!(30), "Healthcare", date(2025, 6, 3)))
        .unwrap()
        .transaction;
    let b = tracker
        .add(expense("Books", dec!(12), "Education", date(2025, 6, 4)))
        .unwrap()
        .transaction;

    let t0 = Instant::now();
    tracker.request_delete(&a.id, t0).unwrap();
    assert_eq!(tracker.pending_delete().map(|t| t.id.clone()), Some(a.id.clone()));
    tracker.tick(t0 + GRACE_PERIOD);
    assert!(tracker.pending_delete().is_none());
    assert_eq!(tracker.store().delete_calls(), vec![a.id.clone()]);

    tracker.store().fail_deletes.set(true);
    tracker.request_delete(&b.id, t0).unwrap();
    tracker.tick(t0 + GRACE_PERIOD);
    let notices = tracker.take_notices();
    assert!(matches!(&notices[0], Notice::Deleted { id, .. } if *id == a.id));
    assert!(matches!(&notices[1], Notice::DeleteFailed { id, .. } if *id == b.id));
    assert!(tracker.visible().is_empty());
}

#[test]
fn signing_out_clears_everything() {
    let (mut session, mut tracker) = signed_in(RecordingStore::new());
    tracker
        .add(expense("Tram", dec!(3), "Transportation", date(2025, 6, 9)))
        .unwrap();
    session.sign_out();
    tracker.tick(Instant::now());
    assert!(tracker.identity().is_none());
    assert!(tracker.visible().is_empty());
    assert!(tracker.budgets().is_none());
    assert!(matches!(
        tracker.set_rollover(true),
        Err(TrackerError::NotSignedIn)
    ));
}
