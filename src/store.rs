// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Document store abstraction.
//!
//! Everything the tracker reads or writes goes through [`Store`]. The
//! store owns ids, answers the three query shapes the tracker needs (all
//! transactions of a user, an inclusive date range, a single document by
//! key) and pushes full snapshots of a user's transactions to subscribers.

use std::sync::mpsc::Receiver;

use chrono::NaiveDate;

use crate::error::StoreError;
use crate::models::{Budget, BudgetKey, Settings, Transaction, TransactionFields};

/// One delivery on a transaction subscription.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    /// Every transaction owned by the user, newest date first.
    Snapshot(Vec<Transaction>),
    Error(String),
}

pub trait Store {
    /// All transactions owned by `user_id`, ordered by date descending.
    fn transactions_for_user(&self, user_id: &str) -> Result<Vec<Transaction>, StoreError>;

    /// Transactions owned by `user_id` with `start <= date <= end`, ordered by date descending.
    fn transactions_between(
        &self,
        user_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Transaction>, StoreError>;

    fn transaction(&self, id: &str) -> Result<Option<Transaction>, StoreError>;

    /// Stores a new transaction and returns it with its assigned id.
    fn create_transaction(
        &self,
        user_id: &str,
        fields: &TransactionFields,
    ) -> Result<Transaction, StoreError>;

    /// Overwrites the editable fields. Id and owner are never touched.
    fn update_transaction(&self, id: &str, fields: &TransactionFields) -> Result<(), StoreError>;

    fn delete_transaction(&self, id: &str) -> Result<(), StoreError>;

    /// Gives every transaction without an owner to `user_id`.
    fn claim_unowned(&self, user_id: &str) -> Result<usize, StoreError>;

    fn budget(&self, key: &BudgetKey) -> Result<Option<Budget>, StoreError>;

    /// Replaces the budget document for `key` wholesale.
    fn put_budget(&self, key: &BudgetKey, budget: &Budget) -> Result<(), StoreError>;

    fn settings(&self, user_id: &str) -> Result<Option<Settings>, StoreError>;

    /// Merges `settings` into the stored document, keeping fields it does not know.
    fn merge_settings(&self, user_id: &str, settings: &Settings) -> Result<(), StoreError>;

    /// Starts a live subscription. The current snapshot is delivered right
    /// away; later ones follow every write touching the user's
    /// transactions. Dropping the receiver ends the subscription.
    fn subscribe(&self, user_id: &str) -> Result<Receiver<FeedEvent>, StoreError>;
}

impl<T: Store + ?Sized> Store for &T {
    fn transactions_for_user(&self, user_id: &str) -> Result<Vec<Transaction>, StoreError> {
        (**self).transactions_for_user(user_id)
    }

    fn transactions_between(
        &self,
        user_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Transaction>, StoreError> {
        (**self).transactions_between(user_id, start, end)
    }

    fn transaction(&self, id: &str) -> Result<Option<Transaction>, StoreError> {
        (**self).transaction(id)
    }

    fn create_transaction(
        &self,
        user_id: &str,
        fields: &TransactionFields,
    ) -> Result<Transaction, StoreError> {
        (**self).create_transaction(user_id, fields)
    }

    fn update_transaction(&self, id: &str, fields: &TransactionFields) -> Result<(), StoreError> {
        (**self).update_transaction(id, fields)
    }

    fn delete_transaction(&self, id: &str) -> Result<(), StoreError> {
        (**self).delete_transaction(id)
    }

    fn claim_unowned(&self, user_id: &str) -> Result<usize, StoreError> {
        (**self).claim_unowned(user_id)
    }

    fn budget(&self, key: &BudgetKey) -> Result<Option<Budget>, StoreError> {
        (**self).budget(key)
    }

    fn put_budget(&self, key: &BudgetKey, budget: &Budget) -> Result<(), StoreError> {
        (**self).put_budget(key, budget)
    }

    fn settings(&self, user_id: &str) -> Result<Option<Settings>, StoreError> {
        (**self).settings(user_id)
    }

    fn merge_settings(&self, user_id: &str, settings: &Settings) -> Result<(), StoreError> {
        (**self).merge_settings(user_id, settings)
    }

    fn subscribe(&self, user_id: &str) -> Result<Receiver<FeedEvent>, StoreError> {
        (**self).subscribe(user_id)
    }
}
