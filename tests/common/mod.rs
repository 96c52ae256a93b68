// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::sync::mpsc::Receiver;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tallybook::db::SqliteStore;
use tallybook::error::StoreError;
use tallybook::models::{Budget, BudgetKey, Kind, Settings, Transaction, TransactionFields};
use tallybook::store::{FeedEvent, Store};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn expense(title: &str, amount: Decimal, category: &str, on: NaiveDate) -> TransactionFields {
    TransactionFields {
        kind: Kind::Expense,
        title: title.into(),
        amount,
        category: category.into(),
        date: on,
        description: None,
    }
}

pub fn income(title: &str, amount: Decimal, on: NaiveDate) -> TransactionFields {
    TransactionFields {
        kind: Kind::Income,
        title: title.into(),
        amount,
        category: "Salary".into(),
        date: on,
        description: None,
    }
}

/// SQLite store that records delete calls and can be told to refuse them.
pub struct RecordingStore {
    pub inner: SqliteStore,
    pub deletes: RefCell<Vec<String>>,
    pub fail_deletes: Cell<bool>,
    /// When set, the next subscription hands out this receiver instead.
    pub scripted_feed: RefCell<Option<Receiver<FeedEvent>>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self {
            inner: SqliteStore::open_in_memory().unwrap(),
            deletes: RefCell::new(Vec::new()),
            fail_deletes: Cell::new(false),
            scripted_feed: RefCell::new(None),
        }
    }

    pub fn delete_calls(&self) -> Vec<String> {
        self.deletes.borrow().clone()
    }
}

impl Store for RecordingStore {
    fn transactions_for_user(&self, user_id: &str) -> Result<Vec<Transaction>, StoreError> {
        self.inner.transactions_for_user(user_id)
    }

    fn transactions_between(
        &self,
        user_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Transaction>, StoreError> {
        self.inner.transactions_between(user_id, start, end)
    }

    fn transaction(&self, id: &str) -> Result<Option<Transaction>, StoreError> {
        self.inner.transaction(id)
    }

    fn create_transaction(
        &self,
        user_id: &str,
        fields: &TransactionFields,
    ) -> Result<Transaction, StoreError> {
        self.inner.create_transaction(user_id, fields)
    }

    fn update_transaction(&self, id: &str, fields: &TransactionFields) -> Result<(), StoreError> {
        self.inner.update_transaction(id, fields)
    }

    fn delete_transaction(&self, id: &str) -> Result<(), StoreError> {
        self.deletes.borrow_mut().push(id.to_string());
        if self.fail_deletes.get() {
            return Err(StoreError::Unavailable("permission denied".into()));
        }
        self.inner.delete_transaction(id)
    }

    fn claim_unowned(&self, user_id: &str) -> Result<usize, StoreError> {
        self.inner.claim_unowned(user_id)
    }

    fn budget(&self, key: &BudgetKey) -> Result<Option<Budget>, StoreError> {
        self.inner.budget(key)
    }

    fn put_budget(&self, key: &BudgetKey, budget: &Budget) -> Result<(), StoreError> {
        self.inner.put_budget(key, budget)
    }

    fn settings(&self, user_id: &str) -> Result<Option<Settings>, StoreError> {
        self.inner.settings(user_id)
    }

    fn merge_settings(&self, user_id: &str, settings: &Settings) -> Result<(), StoreError> {
        self.inner.merge_settings(user_id, settings)
    }

    fn subscribe(&self, user_id: &str) -> Result<Receiver<FeedEvent>, StoreError> {
        if let Some(rx) = self.scripted_feed.borrow_mut().take() {
            return Ok(rx);
        }
        self.inner.subscribe(user_id)
    }
}
