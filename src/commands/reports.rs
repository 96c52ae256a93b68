// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde_json::json;

use super::transactions::print_transactions;
use super::{open_tracker, print_notices};
use crate::aggregate::{Totals, daily_series};
use crate::config::Config;
use crate::db::SqliteStore;
use crate::export::range_report;
use crate::utils::{date_range, fmt_money, fmt_percent, maybe_print_json, month_or_current, pretty_table};

pub fn handle(store: &SqliteStore, cfg: &Config, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("summary", sub)) => summary(store, cfg, sub)?,
        Some(("range", sub)) => range(store, cfg, sub)?,
        Some(("chart", sub)) => chart(store, cfg, sub)?,
        _ => {}
    }
    Ok(())
}

fn totals_table(t: &Totals) -> comfy_table::Table {
    pretty_table(
        &["Income", "Expenses", "Balance"],
        vec![vec![
            fmt_money(&t.income),
            fmt_money(&t.expenses),
            fmt_money(&t.balance),
        ]],
    )
}

fn summary(store: &SqliteStore, cfg: &Config, sub: &clap::ArgMatches) -> Result<()> {
    let user = cfg.require_user()?;
    let month = month_or_current(sub.get_one::<String>("month"))?;
    let mut tracker = open_tracker(store, user, month);
    if let Some(term) = sub.get_one::<String>("search") {
        tracker.set_search(term);
    }
    print_notices(&mut tracker);
    let summary = tracker.summary();
    if maybe_print_json(cfg.json, &json!({ "month": month, "summary": summary }))? {
        return Ok(());
    }

    println!("{}", month);
    println!("{}", totals_table(&summary.totals));
    if summary.breakdown.is_empty() {
        println!("No expenses in {}", month);
    } else {
        let rows = summary
            .breakdown
            .iter()
            .map(|c| {
                vec![
                    c.category.clone(),
                    fmt_money(&c.amount),
                    fmt_percent(Some(c.percent)),
                ]
            })
            .collect();
        println!("{}", pretty_table(&["Category", "Spent", "Share"], rows));
    }
    if !summary.usage.is_empty() {
        let rows = summary
            .usage
            .iter()
            .map(|u| {
                vec![
                    u.category.clone(),
                    fmt_money(&u.spent),
                    fmt_money(&u.budget),
                    fmt_percent(u.percent),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Category", "Spent", "Budget", "Used"], rows)
        );
    }
    Ok(())
}

fn range(store: &SqliteStore, cfg: &Config, sub: &clap::ArgMatches) -> Result<()> {
    let user = cfg.require_user()?;
    let (start, end) = date_range(sub.get_one::<String>("start"), sub.get_one::<String>("end"))?;
    let report = range_report(store, user, start, end)
        .with_context(|| format!("Could not load transactions {} to {}", start, end))?;
    if maybe_print_json(cfg.json, &report)? {
        return Ok(());
    }
    println!("{} to {}: {} transactions", start, end, report.count);
    println!("{}", totals_table(&report.totals));
    print_transactions(false, &report.transactions)
}

fn chart(store: &SqliteStore, cfg: &Config, sub: &clap::ArgMatches) -> Result<()> {
    let user = cfg.require_user()?;
    let month = month_or_current(sub.get_one::<String>("month"))?;
    let mut tracker = open_tracker(store, user, month);
    print_notices(&mut tracker);
    let Some(series) = daily_series(&tracker.visible()) else {
        println!("No transactions in {}", month);
        return Ok(());
    };
    if maybe_print_json(cfg.json, &series)? {
        return Ok(());
    }
    let rows = series
        .income
        .iter()
        .zip(&series.expenses)
        .enumerate()
        .filter(|(_, (i, e))| !i.is_zero() || !e.is_zero())
        .map(|(day, (i, e))| {
            vec![
                format!("{}-{:02}", month, day + 1),
                fmt_money(i),
                fmt_money(e),
                fmt_money(&(*i - *e)),
            ]
        })
        .collect();
    println!("{}", pretty_table(&["Day", "Income", "Expenses", "Net"], rows));
    let income: Decimal = series.income.iter().copied().sum();
    let expenses: Decimal = series.expenses.iter().copied().sum();
    println!(
        "{} days, income {}, expenses {}",
        series.month.days(),
        fmt_money(&income),
        fmt_money(&expenses)
    );
    Ok(())
}
