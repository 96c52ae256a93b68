// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Application controller.
//!
//! [`Tracker`] owns the store handle, listens to identity changes, keeps the
//! live transaction feed and the resolved budget for the active month, and
//! routes writes through the [`MutationController`]. Nothing here blocks:
//! callers drive it with [`Tracker::tick`] and hand in the current instant.

use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::Instant;

use log::{debug, error, info};
use serde::Serialize;

use crate::aggregate::{self, SortOrder, Summary, ViewQuery};
use crate::budget::{self, ResolvedBudget};
use crate::error::TrackerError;
use crate::models::{Budget, MonthRef, Settings, Transaction, TransactionFields};
use crate::mutation::{AddOutcome, BudgetAlert, DeleteOutcome, MutationController};
use crate::session::Identity;
use crate::store::Store;
use crate::sync::TransactionFeed;

/// Something the user should be told about and can dismiss.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "notice", rename_all = "kebab-case")]
pub enum Notice {
    Error { message: String },
    Alert { alert: BudgetAlert },
    Deleted { id: String, title: String },
    DeleteFailed { id: String, title: String, error: String },
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Notice::Error { message } => write!(f, "Error: {}", message),
            Notice::Alert { alert } => write!(f, "Budget alert: {}", alert),
            Notice::Deleted { title, .. } => write!(f, "Deleted '{}'", title),
            Notice::DeleteFailed { title, error, .. } => {
                write!(f, "Could not delete '{}': {}", title, error)
            }
        }
    }
}

pub struct Tracker<S: Store> {
    store: S,
    session: Receiver<Option<Identity>>,
    identity_known: bool,
    identity: Option<Identity>,
    query: ViewQuery,
    feed: Option<TransactionFeed>,
    budgets: Option<ResolvedBudget>,
    mutations: MutationController,
    notices: Vec<Notice>,
}

impl<S: Store> Tracker<S> {
    pub fn new(store: S, session: Receiver<Option<Identity>>, month: MonthRef) -> Self {
        Self {
            store,
            session,
            identity_known: false,
            identity: None,
            query: ViewQuery::new(month),
            feed: None,
            budgets: None,
            mutations: MutationController::new(),
            notices: Vec::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// True until the identity is known and, when signed in, the first
    /// snapshot has arrived.
    pub fn is_loading(&self) -> bool {
        !self.identity_known || self.feed.as_ref().is_some_and(|f| f.is_loading())
    }

    pub fn month(&self) -> MonthRef {
        self.query.month
    }

    pub fn query(&self) -> &ViewQuery {
        &self.query
    }

    /// Drains identity changes and store events, then fires the delete
    /// timer if it is due.
    pub fn tick(&mut self, now: Instant) {
        loop {
            match self.session.try_recv() {
                Ok(identity) => {
                    if !self.identity_known || identity != self.identity {
                        self.reset(identity);
                    }
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }

        if let Some(feed) = self.feed.as_mut() {
            let pumped = feed.pump();
            if pumped.changed() {
                debug!("{} transactions in view", feed.transactions().len());
            }
            for message in pumped.errors {
                self.notices.push(Notice::Error { message });
            }
        }

        if let Some(outcome) = self.mutations.poll(&self.store, now) {
            self.notices.push(match outcome {
                DeleteOutcome::Committed(item) => Notice::Deleted {
                    id: item.id,
                    title: item.title,
                },
                DeleteOutcome::Failed { item, error } => Notice::DeleteFailed {
                    id: item.id,
                    title: item.title,
                    error,
                },
            });
        }
    }

    /// Identity changed: forget everything that belonged to the old one.
    fn reset(&mut self, identity: Option<Identity>) {
        if let Some(item) = self.mutations.discard_pending() {
            info!("dropping pending delete of {} on identity change", item.id);
        }
        self.feed = None;
        self.budgets = None;
        self.notices.clear();
        self.identity_known = true;
        self.identity = identity;

        let Some(uid) = self.identity.as_ref().map(|i| i.uid.clone()) else {
            return;
        };
        match TransactionFeed::subscribe(&self.store, &uid) {
            Ok(feed) => self.feed = Some(feed),
            Err(e) => {
                error!("could not subscribe to transactions of {}: {}", uid, e);
                self.notices.push(Notice::Error {
                    message: e.to_string(),
                });
            }
        }
        self.refresh_budgets();
    }

    fn refresh_budgets(&mut self) {
        let Some(uid) = self.identity.as_ref().map(|i| i.uid.clone()) else {
            self.budgets = None;
            return;
        };
        match budget::resolve(&self.store, &uid, self.query.month) {
            Ok(resolved) => self.budgets = Some(resolved),
            Err(e) => {
                error!("could not resolve budget for {}: {}", self.query.month, e);
                self.budgets = None;
                self.notices.push(Notice::Error {
                    message: e.to_string(),
                });
            }
        }
    }

    pub fn set_month(&mut self, month: MonthRef) {
        if month != self.query.month {
            self.query.month = month;
            self.refresh_budgets();
        }
    }

    pub fn set_search(&mut self, term: &str) {
        self.query.search = term.to_string();
    }

    pub fn set_sort(&mut self, order: SortOrder) {
        self.query.sort = order;
    }

    /// Every transaction currently known, unfiltered.
    pub fn transactions(&self) -> &[Transaction] {
        self.feed.as_ref().map(|f| f.transactions()).unwrap_or(&[])
    }

    /// Active month, search applied, sorted.
    pub fn visible(&self) -> Vec<Transaction> {
        self.query.apply(self.transactions())
    }

    pub fn budgets(&self) -> Option<&ResolvedBudget> {
        self.budgets.as_ref()
    }

    pub fn summary(&self) -> Summary {
        let empty = Default::default();
        let effective = self.budgets.as_ref().map(|b| &b.effective).unwrap_or(&empty);
        aggregate::summarize(&self.visible(), effective)
    }

    pub fn pending_delete(&self) -> Option<&Transaction> {
        self.mutations.pending().map(|p| &p.item)
    }

    pub fn mutations(&self) -> &MutationController {
        &self.mutations
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    fn signed_in(&self) -> Result<String, TrackerError> {
        self.identity
            .as_ref()
            .map(|i| i.uid.clone())
            .ok_or(TrackerError::NotSignedIn)
    }

    fn report<T>(&mut self, result: Result<T, TrackerError>) -> Result<T, TrackerError> {
        if let Err(e) = &result {
            if matches!(e, TrackerError::Store(_)) {
                self.notices.push(Notice::Error {
                    message: e.to_string(),
                });
            }
        }
        result
    }

    pub fn add(&mut self, fields: TransactionFields) -> Result<AddOutcome, TrackerError> {
        self.signed_in()?;
        let feed = self.feed.as_mut().ok_or(TrackerError::NotSignedIn)?;
        let result = self
            .mutations
            .add(&self.store, feed, fields, self.budgets.as_ref());
        let outcome = self.report(result)?;
        self.notices.extend(
            outcome
                .alerts
                .iter()
                .cloned()
                .map(|alert| Notice::Alert { alert }),
        );
        Ok(outcome)
    }

    pub fn update(
        &mut self,
        id: &str,
        fields: TransactionFields,
    ) -> Result<Transaction, TrackerError> {
        let feed = self.feed.as_mut().ok_or(TrackerError::NotSignedIn)?;
        let result = self.mutations.update(&self.store, feed, id, fields);
        self.report(result)
    }

    pub fn delete_now(&mut self, id: &str) -> Result<(), TrackerError> {
        let feed = self.feed.as_mut().ok_or(TrackerError::NotSignedIn)?;
        let result = self.mutations.delete_now(&self.store, feed, id);
        self.report(result)
    }

    /// Hides `id` for the grace period. The item of any earlier request
    /// still waiting is dropped from the slot and comes back with the next
    /// snapshot.
    pub fn request_delete(
        &mut self,
        id: &str,
        now: Instant,
    ) -> Result<Option<Transaction>, TrackerError> {
        let feed = self.feed.as_mut().ok_or(TrackerError::NotSignedIn)?;
        self.mutations.request_delete(feed, id, now)
    }

    pub fn undo(&mut self) -> Option<Transaction> {
        let feed = self.feed.as_mut()?;
        self.mutations.undo(feed)
    }

    pub fn save_budget(&mut self, budget: &Budget) -> Result<(), TrackerError> {
        let uid = self.signed_in()?;
        let result = budget::save_budget(&self.store, &uid, self.query.month, budget);
        self.report(result)?;
        info!("saved budget for {} ({})", uid, self.query.month);
        self.refresh_budgets();
        Ok(())
    }

    pub fn set_rollover(&mut self, enabled: bool) -> Result<(), TrackerError> {
        let uid = self.signed_in()?;
        let settings = Settings {
            user_id: uid.clone(),
            enable_rollover: enabled,
        };
        let result = budget::save_settings(&self.store, &uid, &settings).map_err(TrackerError::from);
        self.report(result)?;
        info!("rollover {} for {}", if enabled { "enabled" } else { "disabled" }, uid);
        self.refresh_budgets();
        Ok(())
    }
}
