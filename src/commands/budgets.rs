// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::BTreeSet;

use anyhow::{Context, Result, anyhow};
use rust_decimal::Decimal;
use serde_json::json;

use super::{open_tracker, print_notices};
use crate::aggregate::{category_spend, filter_month, percent_of, total_for};
use crate::config::Config;
use crate::db::SqliteStore;
use crate::models::{Budget, Kind};
use crate::utils::{fmt_money, fmt_percent, maybe_print_json, month_or_current, parse_decimal, pretty_table};

pub fn handle(store: &SqliteStore, cfg: &Config, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set", sub)) => set(store, cfg, sub)?,
        Some(("show", sub)) => show(store, cfg, sub)?,
        _ => {}
    }
    Ok(())
}

/// Parses `NAME=AMOUNT`.
pub fn parse_category_amount(s: &str) -> Result<(String, Decimal)> {
    let (name, amount) = s
        .split_once('=')
        .ok_or_else(|| anyhow!("Expected NAME=AMOUNT, got '{}'", s))?;
    let name = name.trim();
    if name.is_empty() {
        anyhow::bail!("Missing category name in '{}'", s);
    }
    Ok((name.to_string(), parse_decimal(amount)?))
}

fn set(store: &SqliteStore, cfg: &Config, sub: &clap::ArgMatches) -> Result<()> {
    let user = cfg.require_user()?;
    let month = month_or_current(sub.get_one::<String>("month"))?;
    let mut tracker = open_tracker(store, user, month);

    let mut budget = tracker
        .budgets()
        .map(|b| b.stored.clone())
        .unwrap_or_else(|| Budget::empty(user));
    if sub.get_flag("replace") {
        budget.amounts.clear();
    }
    if let Some(entries) = sub.get_many::<String>("category") {
        for entry in entries {
            let (category, amount) = parse_category_amount(entry)?;
            budget.amounts.insert(category, amount);
        }
    }
    if let Some(overall) = sub.get_one::<String>("overall") {
        budget.overall_amount = parse_decimal(overall)?;
    }
    // zero entries carry no limit; keep the document lean
    budget.amounts.retain(|_, amount| !amount.is_zero());

    tracker
        .save_budget(&budget)
        .with_context(|| format!("Could not save budget for {}", month))?;
    print_notices(&mut tracker);
    if !maybe_print_json(cfg.json, &budget)? {
        println!(
            "Budget saved for {}: overall {}, {} categories",
            month,
            fmt_money(&budget.overall_amount),
            budget.amounts.len()
        );
    }
    Ok(())
}

fn show(store: &SqliteStore, cfg: &Config, sub: &clap::ArgMatches) -> Result<()> {
    let user = cfg.require_user()?;
    let month = month_or_current(sub.get_one::<String>("month"))?;
    let mut tracker = open_tracker(store, user, month);
    print_notices(&mut tracker);
    let resolved = tracker
        .budgets()
        .cloned()
        .with_context(|| format!("No budget available for {}", month))?;
    let in_month = filter_month(tracker.transactions(), month);
    let spend = category_spend(&in_month);
    let spent_total = total_for(&in_month, Kind::Expense);

    if maybe_print_json(
        cfg.json,
        &json!({ "budget": resolved, "spent": spend, "totalSpent": spent_total }),
    )? {
        return Ok(());
    }

    let categories: BTreeSet<&String> = resolved
        .stored
        .amounts
        .keys()
        .chain(resolved.effective.keys())
        .collect();
    let mut rows = Vec::new();
    for category in categories {
        let effective = resolved.effective_for(category);
        let spent = spend.get(category).copied().unwrap_or(Decimal::ZERO);
        rows.push(vec![
            category.clone(),
            fmt_money(&resolved.stored.amount_for(category)),
            fmt_money(&resolved.rollover.get(category).copied().unwrap_or(Decimal::ZERO)),
            fmt_money(&effective),
            fmt_money(&spent),
            fmt_percent(percent_of(spent, effective)),
        ]);
    }
    rows.push(vec![
        "Overall".to_string(),
        fmt_money(&resolved.overall()),
        "-".to_string(),
        fmt_money(&resolved.overall()),
        fmt_money(&spent_total),
        fmt_percent(percent_of(spent_total, resolved.overall())),
    ]);
    println!(
        "{} (rollover {})",
        month,
        if resolved.settings.enable_rollover {
            "on"
        } else {
            "off"
        }
    );
    println!(
        "{}",
        pretty_table(
            &["Category", "Budget", "Rollover", "Effective", "Spent", "Used"],
            rows,
        )
    );
    Ok(())
}
