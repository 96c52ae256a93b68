// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Budget resolution: the stored budget for a month, the user's settings,
//! and the rollover carried in from the previous month.

use std::collections::BTreeMap;

use log::debug;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::aggregate::category_spend;
use crate::error::{StoreError, TrackerError};
use crate::models::{Budget, BudgetKey, MonthRef, Settings, Transaction};
use crate::store::Store;

pub type Rollover = BTreeMap<String, Decimal>;

/// Everything the dashboard needs to compare spending against budgets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedBudget {
    pub month: MonthRef,
    pub stored: Budget,
    pub settings: Settings,
    pub rollover: Rollover,
    pub effective: BTreeMap<String, Decimal>,
}

impl ResolvedBudget {
    pub fn overall(&self) -> Decimal {
        self.stored.overall_amount
    }

    pub fn effective_for(&self, category: &str) -> Decimal {
        self.effective
            .get(category)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }
}

pub fn load_active_month<S: Store + ?Sized>(
    store: &S,
    user_id: &str,
    month: MonthRef,
) -> Result<Budget, StoreError> {
    Ok(store
        .budget(&BudgetKey::new(user_id, month))?
        .unwrap_or_else(|| Budget::empty(user_id)))
}

pub fn load_settings<S: Store + ?Sized>(store: &S, user_id: &str) -> Result<Settings, StoreError> {
    Ok(store.settings(user_id)?.unwrap_or_else(|| Settings {
        user_id: user_id.to_string(),
        enable_rollover: false,
    }))
}

/// Leftover budget per category: `max(0, budget - spent)` for every category
/// the previous budget names. Categories without a previous budget get no entry.
pub fn rollover_from(previous: Option<&Budget>, previous_month: &[Transaction]) -> Rollover {
    let Some(previous) = previous else {
        return Rollover::new();
    };
    let spent = category_spend(previous_month);
    previous
        .amounts
        .iter()
        .map(|(category, budget)| {
            let used = spent.get(category).copied().unwrap_or(Decimal::ZERO);
            (category.clone(), (*budget - used).max(Decimal::ZERO))
        })
        .collect()
}

pub fn compute_rollover<S: Store + ?Sized>(
    store: &S,
    user_id: &str,
    month: MonthRef,
    settings: &Settings,
) -> Result<Rollover, StoreError> {
    if !settings.enable_rollover {
        return Ok(Rollover::new());
    }
    let prev = month.previous();
    let prev_budget = store.budget(&BudgetKey::new(user_id, prev))?;
    let prev_txs = store.transactions_between(user_id, prev.first_day(), prev.last_day())?;
    let rollover = rollover_from(prev_budget.as_ref(), &prev_txs);
    debug!(
        "rollover into {} for {}: {} categories from {} transactions",
        month,
        user_id,
        rollover.len(),
        prev_txs.len()
    );
    Ok(rollover)
}

/// Stored amounts plus rollover. A category that only appears in the
/// rollover is included when its carry is positive.
pub fn effective_budget(stored: &Budget, rollover: &Rollover) -> BTreeMap<String, Decimal> {
    let mut out = stored.amounts.clone();
    for (category, carry) in rollover {
        match out.get_mut(category) {
            Some(amount) => *amount += *carry,
            None if *carry > Decimal::ZERO => {
                out.insert(category.clone(), *carry);
            }
            None => {}
        }
    }
    out
}

pub fn resolve<S: Store + ?Sized>(
    store: &S,
    user_id: &str,
    month: MonthRef,
) -> Result<ResolvedBudget, StoreError> {
    let stored = load_active_month(store, user_id, month)?;
    let settings = load_settings(store, user_id)?;
    let rollover = compute_rollover(store, user_id, month, &settings)?;
    let effective = effective_budget(&stored, &rollover);
    Ok(ResolvedBudget {
        month,
        stored,
        settings,
        rollover,
        effective,
    })
}

pub fn save_budget<S: Store + ?Sized>(
    store: &S,
    user_id: &str,
    month: MonthRef,
    budget: &Budget,
) -> Result<(), TrackerError> {
    budget.validate()?;
    store.put_budget(&BudgetKey::new(user_id, month), budget)?;
    Ok(())
}

pub fn save_settings<S: Store + ?Sized>(
    store: &S,
    user_id: &str,
    settings: &Settings,
) -> Result<(), StoreError> {
    store.merge_settings(user_id, settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn rollover_only_for_previously_budgeted_categories() {
        let mut prev = Budget::empty("u1");
        prev.amounts.insert("Food".into(), dec!(1000));
        let r = rollover_from(Some(&prev), &[]);
        assert_eq!(r.get("Food"), Some(&dec!(1000)));
        assert_eq!(r.len(), 1);
        assert!(rollover_from(None, &[]).is_empty());
    }

    #[test]
    fn effective_adds_rollover() {
        let mut stored = Budget::empty("u1");
        stored.amounts.insert("Food".into(), dec!(500));
        stored.amounts.insert("Housing".into(), dec!(900));
        let mut rollover = Rollover::new();
        rollover.insert("Food".into(), dec!(400));
        rollover.insert("Shopping".into(), dec!(25));
        rollover.insert("Gifts".into(), dec!(0));
        let eff = effective_budget(&stored, &rollover);
        assert_eq!(eff["Food"], dec!(900));
        assert_eq!(eff["Housing"], dec!(900));
        assert_eq!(eff["Shopping"], dec!(25));
        assert!(!eff.contains_key("Gifts"));
    }
}
