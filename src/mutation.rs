// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Writes: add, update, delete, and delete-with-undo.
//!
//! A delete request hides the item at once and arms a single grace timer.
//! Within the window [`MutationController::undo`] puts the item back with
//! no store write; once the deadline passes [`MutationController::poll`]
//! issues the real delete. There is one slot: a second request discards
//! the first pending item without deleting it.

use std::fmt;
use std::time::{Duration, Instant};

use log::{error, info, warn};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::aggregate::{category_spend, filter_month, total_for};
use crate::budget::ResolvedBudget;
use crate::error::TrackerError;
use crate::models::{Kind, Transaction, TransactionFields};
use crate::store::Store;
use crate::sync::TransactionFeed;

pub const GRACE_PERIOD: Duration = Duration::from_secs(5);

const NEAR_LIMIT_RATIO: Decimal = Decimal::from_parts(90, 0, 0, false, 2);

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "alert", rename_all = "kebab-case")]
pub enum BudgetAlert {
    OverallExceeded {
        projected: Decimal,
        budget: Decimal,
    },
    OverallNearLimit {
        projected: Decimal,
        budget: Decimal,
    },
    CategoryExceeded {
        category: String,
        projected: Decimal,
        budget: Decimal,
    },
    CategoryNearLimit {
        category: String,
        projected: Decimal,
        budget: Decimal,
    },
}

impl fmt::Display for BudgetAlert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BudgetAlert::OverallExceeded { projected, budget } => write!(
                f,
                "You have exceeded your overall monthly budget ({:.2} of {:.2})",
                projected, budget
            ),
            BudgetAlert::OverallNearLimit { projected, budget } => write!(
                f,
                "You have used over 90% of your overall monthly budget ({:.2} of {:.2})",
                projected, budget
            ),
            BudgetAlert::CategoryExceeded {
                category,
                projected,
                budget,
            } => write!(
                f,
                "You have exceeded your budget for {} ({:.2} of {:.2})",
                category, projected, budget
            ),
            BudgetAlert::CategoryNearLimit {
                category,
                projected,
                budget,
            } => write!(
                f,
                "You have used over 90% of your budget for {} ({:.2} of {:.2})",
                category, projected, budget
            ),
        }
    }
}

enum Level {
    Exceeded,
    Near,
}

fn level(projected: Decimal, budget: Decimal) -> Option<Level> {
    if budget <= Decimal::ZERO {
        None
    } else if projected > budget {
        Some(Level::Exceeded)
    } else {
        match budget.checked_mul(NEAR_LIMIT_RATIO) {
            Some(limit) if projected >= limit => Some(Level::Near),
            Some(_) => None,
            None => Some(Level::Exceeded),
        }
    }
}

/// Alerts for adding `new` on top of `current`, the active month's
/// transactions as they were before the write. Only expenses dated inside
/// the budget's month are projected.
pub fn projected_alerts(
    current: &[Transaction],
    budgets: &ResolvedBudget,
    new: &TransactionFields,
) -> Vec<BudgetAlert> {
    let mut alerts = Vec::new();
    if new.kind != Kind::Expense || !budgets.month.contains(new.date) {
        return alerts;
    }

    let projected = total_for(current, Kind::Expense)
        .checked_add(new.amount)
        .unwrap_or(Decimal::MAX);
    let budget = budgets.overall();
    match level(projected, budget) {
        Some(Level::Exceeded) => alerts.push(BudgetAlert::OverallExceeded { projected, budget }),
        Some(Level::Near) => alerts.push(BudgetAlert::OverallNearLimit { projected, budget }),
        None => {}
    }

    let spent = category_spend(current)
        .get(&new.category)
        .copied()
        .unwrap_or(Decimal::ZERO);
    let projected = spent.checked_add(new.amount).unwrap_or(Decimal::MAX);
    let budget = budgets.effective_for(&new.category);
    let category = new.category.clone();
    match level(projected, budget) {
        Some(Level::Exceeded) => alerts.push(BudgetAlert::CategoryExceeded {
            category,
            projected,
            budget,
        }),
        Some(Level::Near) => alerts.push(BudgetAlert::CategoryNearLimit {
            category,
            projected,
            budget,
        }),
        None => {}
    }
    alerts
}

#[derive(Debug, Clone, PartialEq)]
pub struct AddOutcome {
    pub transaction: Transaction,
    pub alerts: Vec<BudgetAlert>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PendingDelete {
    pub item: Transaction,
    pub deadline: Instant,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeleteOutcome {
    Committed(Transaction),
    /// The store refused the delete. The item stays hidden locally anyway.
    Failed { item: Transaction, error: String },
}

#[derive(Debug)]
pub struct MutationController {
    grace: Duration,
    pending: Option<PendingDelete>,
}

impl Default for MutationController {
    fn default() -> Self {
        Self::new()
    }
}

impl MutationController {
    pub fn new() -> Self {
        Self {
            grace: GRACE_PERIOD,
            pending: None,
        }
    }

    pub fn grace_period(&self) -> Duration {
        self.grace
    }

    pub fn add<S: Store + ?Sized>(
        &self,
        store: &S,
        feed: &mut TransactionFeed,
        fields: TransactionFields,
        budgets: Option<&ResolvedBudget>,
    ) -> Result<AddOutcome, TrackerError> {
        fields.validate()?;
        // Projected from what is on screen now; the feed has not seen the write yet.
        let alerts = budgets
            .map(|b| projected_alerts(&filter_month(feed.transactions(), b.month), b, &fields))
            .unwrap_or_default();
        let transaction = store.create_transaction(feed.user_id(), &fields)?;
        feed.insert_local(transaction.clone());
        info!(
            "added {} {} '{}' ({})",
            transaction.kind, transaction.amount, transaction.title, transaction.id
        );
        for alert in &alerts {
            warn!("{}", alert);
        }
        Ok(AddOutcome {
            transaction,
            alerts,
        })
    }

    pub fn update<S: Store + ?Sized>(
        &self,
        store: &S,
        feed: &mut TransactionFeed,
        id: &str,
        fields: TransactionFields,
    ) -> Result<Transaction, TrackerError> {
        fields.validate()?;
        let current = match feed.find(id) {
            Some(t) => t.clone(),
            None => store
                .transaction(id)?
                .filter(|t| t.user_id == feed.user_id())
                .ok_or_else(|| TrackerError::NotFound(id.to_string()))?,
        };
        store.update_transaction(id, &fields)?;
        let updated = current.with_fields(fields);
        feed.replace_local(updated.clone());
        info!("updated transaction {}", id);
        Ok(updated)
    }

    /// Deletes right away, no undo window.
    pub fn delete_now<S: Store + ?Sized>(
        &self,
        store: &S,
        feed: &mut TransactionFeed,
        id: &str,
    ) -> Result<(), TrackerError> {
        if feed.find(id).is_none() {
            return Err(TrackerError::NotFound(id.to_string()));
        }
        store.delete_transaction(id)?;
        feed.remove_local(id);
        info!("deleted transaction {}", id);
        Ok(())
    }

    /// Hides `id` and arms the grace timer. Returns the item of a previous
    /// request that this one superseded; that item is never deleted.
    pub fn request_delete(
        &mut self,
        feed: &mut TransactionFeed,
        id: &str,
        now: Instant,
    ) -> Result<Option<Transaction>, TrackerError> {
        let item = feed
            .remove_local(id)
            .ok_or_else(|| TrackerError::NotFound(id.to_string()))?;
        let superseded = self.pending.take().map(|p| {
            feed.forget_removal(&p.item.id);
            info!("pending delete of {} dropped by a newer request", p.item.id);
            p.item
        });
        info!("transaction {} will be deleted in {:?}", id, self.grace);
        self.pending = Some(PendingDelete {
            item,
            deadline: now + self.grace,
        });
        Ok(superseded)
    }

    pub fn undo(&mut self, feed: &mut TransactionFeed) -> Option<Transaction> {
        let pending = self.pending.take()?;
        feed.restore_local(pending.item.clone());
        info!("delete of {} undone", pending.item.id);
        Some(pending.item)
    }

    /// Commits the pending delete once its deadline has passed.
    pub fn poll<S: Store + ?Sized>(&mut self, store: &S, now: Instant) -> Option<DeleteOutcome> {
        if self.pending.as_ref()?.deadline > now {
            return None;
        }
        let item = self.pending.take()?.item;
        Some(match store.delete_transaction(&item.id) {
            Ok(()) => {
                info!("deleted transaction {}", item.id);
                DeleteOutcome::Committed(item)
            }
            Err(e) => {
                error!("failed to delete transaction {}: {}", item.id, e);
                DeleteOutcome::Failed {
                    item,
                    error: e.to_string(),
                }
            }
        })
    }

    pub fn pending(&self) -> Option<&PendingDelete> {
        self.pending.as_ref()
    }

    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.pending
            .as_ref()
            .map(|p| p.deadline.saturating_duration_since(now))
    }

    /// Empties the slot without deleting anything.
    pub fn discard_pending(&mut self) -> Option<Transaction> {
        self.pending.take().map(|p| p.item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Budget, MonthRef, Settings};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;

    fn budgets(overall: Decimal, food: Decimal) -> ResolvedBudget {
        let mut stored = Budget::empty("u1");
        stored.overall_amount = overall;
        stored.amounts.insert("Food".into(), food);
        let effective: BTreeMap<_, _> = stored.amounts.clone();
        ResolvedBudget {
            month: MonthRef::new(2025, 5).unwrap(),
            stored,
            settings: Settings::default(),
            rollover: BTreeMap::new(),
            effective,
        }
    }

    fn expense(amount: Decimal, category: &str, day: u32) -> TransactionFields {
        TransactionFields {
            kind: Kind::Expense,
            title: "x".into(),
            amount,
            category: category.into(),
            date: NaiveDate::from_ymd_opt(2025, 5, day).unwrap(),
            description: None,
        }
    }

    #[test]
    fn alerts_use_projected_totals() {
        let current = vec![expense(dec!(80), "Food", 1).into_transaction("a".into(), "u1".into())];
        let b = budgets(dec!(1000), dec!(100));
        let alerts = projected_alerts(&current, &b, &expense(dec!(15), "Food", 2));
        assert_eq!(
            alerts,
            vec![BudgetAlert::CategoryNearLimit {
                category: "Food".into(),
                projected: dec!(95),
                budget: dec!(100),
            }]
        );
        let alerts = projected_alerts(&current, &b, &expense(dec!(950), "Food", 2));
        assert!(matches!(alerts[0], BudgetAlert::OverallExceeded { .. }));
        assert!(matches!(alerts[1], BudgetAlert::CategoryExceeded { .. }));
    }

    #[test]
    fn oversized_amounts_still_alert() {
        let current = vec![expense(Decimal::MAX, "Food", 1).into_transaction("a".into(), "u1".into())];
        let b = budgets(dec!(0.01), dec!(0.01));
        let alerts = projected_alerts(&current, &b, &expense(Decimal::MAX, "Food", 2));
        assert_eq!(
            alerts,
            vec![
                BudgetAlert::OverallExceeded {
                    projected: Decimal::MAX,
                    budget: dec!(0.01),
                },
                BudgetAlert::CategoryExceeded {
                    category: "Food".into(),
                    projected: Decimal::MAX,
                    budget: dec!(0.01),
                },
            ]
        );
        let roomy = budgets(Decimal::MAX, Decimal::MAX);
        assert!(projected_alerts(&[], &roomy, &expense(dec!(5), "Food", 2)).is_empty());
    }

    #[test]
    fn no_alerts_for_unset_budgets_or_income() {
        let b = budgets(dec!(0), dec!(0));
        assert!(projected_alerts(&[], &b, &expense(dec!(5000), "Food", 3)).is_empty());
        let mut income = expense(dec!(5000), "Salary", 3);
        income.kind = Kind::Income;
        assert!(projected_alerts(&[], &budgets(dec!(10), dec!(10)), &income).is_empty());
    }

    #[test]
    fn other_months_are_not_projected() {
        let b = budgets(dec!(10), dec!(10));
        let mut june = expense(dec!(50), "Food", 1);
        june.date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        assert!(projected_alerts(&[], &b, &june).is_empty());
    }
}
