// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Live view of one user's transactions.
//!
//! The feed keeps the last snapshot the store delivered plus an overlay of
//! local writes the store has not confirmed yet. Each new snapshot drops
//! the overlay entries it confirms and re-applies the rest, so an optimistic
//! edit is never lost to a snapshot that was taken before the write landed.

use std::sync::mpsc::{Receiver, TryRecvError};

use log::{debug, error, warn};

use crate::error::StoreError;
use crate::models::Transaction;
use crate::store::{FeedEvent, Store};

#[derive(Debug, Clone, PartialEq)]
enum Overlay {
    Added(Transaction),
    Updated(Transaction),
    Removed(String),
}

impl Overlay {
    fn id(&self) -> &str {
        match self {
            Overlay::Added(t) | Overlay::Updated(t) => &t.id,
            Overlay::Removed(id) => id,
        }
    }

    fn confirmed_by(&self, snapshot: &[Transaction]) -> bool {
        match self {
            Overlay::Added(t) => snapshot.iter().any(|s| s.id == t.id),
            Overlay::Updated(t) => snapshot.iter().all(|s| s.id != t.id || s == t),
            Overlay::Removed(id) => snapshot.iter().all(|s| &s.id != id),
        }
    }
}

/// What one [`TransactionFeed::pump`] call consumed.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Pumped {
    pub snapshots: usize,
    pub errors: Vec<String>,
}

impl Pumped {
    pub fn changed(&self) -> bool {
        self.snapshots > 0
    }
}

pub struct TransactionFeed {
    user_id: String,
    events: Option<Receiver<FeedEvent>>,
    items: Vec<Transaction>,
    overlay: Vec<Overlay>,
    loading: bool,
    last_error: Option<String>,
}

impl TransactionFeed {
    pub fn subscribe<S: Store + ?Sized>(store: &S, user_id: &str) -> Result<Self, StoreError> {
        let events = store.subscribe(user_id)?;
        let mut feed = Self {
            user_id: user_id.to_string(),
            events: Some(events),
            items: Vec::new(),
            overlay: Vec::new(),
            loading: true,
            last_error: None,
        };
        feed.pump();
        Ok(feed)
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Stops listening. The current list stays readable.
    pub fn unsubscribe(&mut self) {
        self.events = None;
    }

    pub fn is_subscribed(&self) -> bool {
        self.events.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Current list: last snapshot with unconfirmed local writes applied.
    pub fn transactions(&self) -> &[Transaction] {
        &self.items
    }

    pub fn find(&self, id: &str) -> Option<&Transaction> {
        self.items.iter().find(|t| t.id == id)
    }

    /// Drains every event the store has queued.
    pub fn pump(&mut self) -> Pumped {
        let mut out = Pumped::default();
        while let Some(events) = &self.events {
            match events.try_recv() {
                Ok(FeedEvent::Snapshot(list)) => {
                    self.apply_snapshot(list);
                    out.snapshots += 1;
                }
                Ok(FeedEvent::Error(msg)) => {
                    error!("transaction feed for {} failed: {}", self.user_id, msg);
                    self.loading = false;
                    self.last_error = Some(msg.clone());
                    out.errors.push(msg);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    warn!("transaction feed for {} closed by store", self.user_id);
                    self.events = None;
                }
            }
        }
        out
    }

    fn apply_snapshot(&mut self, snapshot: Vec<Transaction>) {
        self.loading = false;
        self.last_error = None;
        let before = self.overlay.len();
        self.overlay.retain(|o| !o.confirmed_by(&snapshot));
        if self.overlay.len() != before {
            debug!(
                "snapshot confirmed {} local writes, {} outstanding",
                before - self.overlay.len(),
                self.overlay.len()
            );
        }
        let mut items = snapshot;
        for o in &self.overlay {
            match o {
                Overlay::Added(t) => {
                    if !items.iter().any(|i| i.id == t.id) {
                        items.insert(0, t.clone());
                    }
                }
                Overlay::Updated(t) => {
                    if let Some(slot) = items.iter_mut().find(|i| i.id == t.id) {
                        *slot = t.clone();
                    }
                }
                Overlay::Removed(id) => items.retain(|i| &i.id != id),
            }
        }
        self.items = items;
    }

    /// Shows a freshly created transaction before the store echoes it back.
    pub fn insert_local(&mut self, tx: Transaction) {
        self.items.insert(0, tx.clone());
        self.overlay.push(Overlay::Added(tx));
    }

    pub fn replace_local(&mut self, tx: Transaction) {
        if let Some(slot) = self.items.iter_mut().find(|i| i.id == tx.id) {
            *slot = tx.clone();
        }
        // an add the store has not echoed yet must come back edited
        if let Some(Overlay::Added(added)) = self
            .overlay
            .iter_mut()
            .find(|o| matches!(o, Overlay::Added(t) if t.id == tx.id))
        {
            *added = tx.clone();
        }
        self.overlay
            .retain(|o| !matches!(o, Overlay::Updated(t) if t.id == tx.id));
        self.overlay.push(Overlay::Updated(tx));
    }

    /// Hides a transaction and hands it back so it can be restored.
    pub fn remove_local(&mut self, id: &str) -> Option<Transaction> {
        let pos = self.items.iter().position(|t| t.id == id)?;
        let removed = self.items.remove(pos);
        self.overlay.retain(|o| o.id() != id);
        self.overlay.push(Overlay::Removed(id.to_string()));
        Some(removed)
    }

    /// Undoes [`remove_local`](Self::remove_local): the item goes back at the head.
    pub fn restore_local(&mut self, tx: Transaction) {
        self.forget_removal(&tx.id);
        self.items.retain(|t| t.id != tx.id);
        self.items.insert(0, tx);
    }

    /// Drops a pending hide without putting the item back; the next
    /// snapshot decides whether it shows up again.
    pub fn forget_removal(&mut self, id: &str) {
        self.overlay
            .retain(|o| !matches!(o, Overlay::Removed(r) if r == id));
    }

    pub fn pending_writes(&self) -> usize {
        self.overlay.len()
    }
}
