// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Derived numbers for the dashboard. Everything here is a pure function of
//! the slice it is handed, so callers recompute whenever inputs change.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::{Kind, MonthRef, Transaction};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    #[default]
    DateDesc,
    DateAsc,
    AmountDesc,
    AmountAsc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::DateDesc => "date-desc",
            SortOrder::DateAsc => "date-asc",
            SortOrder::AmountDesc => "amount-desc",
            SortOrder::AmountAsc => "amount-asc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "date-desc" => Ok(SortOrder::DateDesc),
            "date-asc" => Ok(SortOrder::DateAsc),
            "amount-desc" => Ok(SortOrder::AmountDesc),
            "amount-asc" => Ok(SortOrder::AmountAsc),
            other => Err(format!(
                "Unknown sort order '{}' (use date-desc|date-asc|amount-desc|amount-asc)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Totals {
    pub income: Decimal,
    pub expenses: Decimal,
    pub balance: Decimal,
}

pub fn total_for(txs: &[Transaction], kind: Kind) -> Decimal {
    txs.iter()
        .filter(|t| t.kind == kind)
        .map(|t| t.amount)
        .sum()
}

pub fn totals(txs: &[Transaction]) -> Totals {
    let income = total_for(txs, Kind::Income);
    let expenses = total_for(txs, Kind::Expense);
    Totals {
        income,
        expenses,
        balance: income - expenses,
    }
}

/// Expense total per category.
pub fn category_spend(txs: &[Transaction]) -> BTreeMap<String, Decimal> {
    let mut map = BTreeMap::new();
    for t in txs.iter().filter(|t| t.is_expense()) {
        *map.entry(t.category.clone()).or_insert(Decimal::ZERO) += t.amount;
    }
    map
}

/// `amount / budget * 100`, or `None` when there is no budget to measure
/// against or the ratio does not fit in a `Decimal`.
pub fn percent_of(amount: Decimal, budget: Decimal) -> Option<Decimal> {
    if budget <= Decimal::ZERO {
        return None;
    }
    amount
        .checked_div(budget)?
        .checked_mul(Decimal::ONE_HUNDRED)
        .map(|p| p.round_dp(2))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShare {
    pub category: String,
    pub amount: Decimal,
    /// Share of all expenses in the set.
    pub percent: Decimal,
}

pub fn category_breakdown(txs: &[Transaction]) -> Vec<CategoryShare> {
    let spend = category_spend(txs);
    let total: Decimal = spend.values().copied().sum();
    let mut items: Vec<CategoryShare> = spend
        .into_iter()
        .map(|(category, amount)| CategoryShare {
            percent: percent_of(amount, total).unwrap_or(Decimal::ZERO),
            category,
            amount,
        })
        .collect();
    items.sort_by(|a, b| b.amount.cmp(&a.amount));
    items
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetUsage {
    pub category: String,
    pub spent: Decimal,
    pub budget: Decimal,
    pub percent: Option<Decimal>,
}

/// One row per budgeted category, in category order.
pub fn budget_usage(
    spend: &BTreeMap<String, Decimal>,
    budgets: &BTreeMap<String, Decimal>,
) -> Vec<BudgetUsage> {
    budgets
        .iter()
        .map(|(category, budget)| {
            let spent = spend.get(category).copied().unwrap_or(Decimal::ZERO);
            BudgetUsage {
                category: category.clone(),
                spent,
                budget: *budget,
                percent: percent_of(spent, *budget),
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySeries {
    pub month: MonthRef,
    /// Index 0 is day 1.
    pub income: Vec<Decimal>,
    pub expenses: Vec<Decimal>,
}

/// Per-day income and expense sums for the month of the first transaction.
pub fn daily_series(txs: &[Transaction]) -> Option<DailySeries> {
    let month = MonthRef::of(txs.first()?.date);
    let days = month.days() as usize;
    let mut income = vec![Decimal::ZERO; days];
    let mut expenses = vec![Decimal::ZERO; days];
    for t in txs.iter().filter(|t| month.contains(t.date)) {
        let slot = chrono::Datelike::day(&t.date) as usize - 1;
        match t.kind {
            Kind::Income => income[slot] += t.amount,
            Kind::Expense => expenses[slot] += t.amount,
        }
    }
    Some(DailySeries {
        month,
        income,
        expenses,
    })
}

pub fn filter_month(txs: &[Transaction], month: MonthRef) -> Vec<Transaction> {
    txs.iter()
        .filter(|t| month.contains(t.date))
        .cloned()
        .collect()
}

/// Case-insensitive substring match on title or category.
pub fn matches_search(t: &Transaction, term: &str) -> bool {
    let needle = term.trim().to_lowercase();
    needle.is_empty()
        || t.title.to_lowercase().contains(&needle)
        || t.category.to_lowercase().contains(&needle)
}

pub fn search(txs: &[Transaction], term: &str) -> Vec<Transaction> {
    txs.iter()
        .filter(|t| matches_search(t, term))
        .cloned()
        .collect()
}

pub fn sort(txs: &mut [Transaction], order: SortOrder) {
    match order {
        SortOrder::DateDesc => txs.sort_by(|a, b| b.date.cmp(&a.date)),
        SortOrder::DateAsc => txs.sort_by(|a, b| a.date.cmp(&b.date)),
        SortOrder::AmountDesc => txs.sort_by(|a, b| b.amount.cmp(&a.amount)),
        SortOrder::AmountAsc => txs.sort_by(|a, b| a.amount.cmp(&b.amount)),
    }
}

/// Month filter, then search, then sort.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewQuery {
    pub month: MonthRef,
    pub search: String,
    pub sort: SortOrder,
}

impl ViewQuery {
    pub fn new(month: MonthRef) -> Self {
        Self {
            month,
            search: String::new(),
            sort: SortOrder::default(),
        }
    }

    pub fn apply(&self, txs: &[Transaction]) -> Vec<Transaction> {
        let mut out: Vec<Transaction> = txs
            .iter()
            .filter(|t| self.month.contains(t.date) && matches_search(t, &self.search))
            .cloned()
            .collect();
        sort(&mut out, self.sort);
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub totals: Totals,
    pub breakdown: Vec<CategoryShare>,
    pub usage: Vec<BudgetUsage>,
    pub series: Option<DailySeries>,
}

pub fn summarize(view: &[Transaction], budgets: &BTreeMap<String, Decimal>) -> Summary {
    Summary {
        totals: totals(view),
        breakdown: category_breakdown(view),
        usage: budget_usage(&category_spend(view), budgets),
        series: daily_series(view),
    }
}
