// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::io::BufRead;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Instant;

use anyhow::{Context, Result, anyhow};
use serde::Serialize;
use serde_json::json;

use super::{open_tracker, print_notices};
use crate::aggregate::SortOrder;
use crate::config::Config;
use crate::db::SqliteStore;
use crate::models::{Kind, MonthRef, Transaction, TransactionFields};
use crate::store::Store;
use crate::tracker::Tracker;
use crate::utils::{
    fmt_money, maybe_print_json, month_or_current, parse_date, parse_decimal, pretty_table, today,
};

pub fn handle(store: &SqliteStore, cfg: &Config, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(store, cfg, sub)?,
        Some(("edit", sub)) => edit(store, cfg, sub)?,
        Some(("rm", sub)) => remove(store, cfg, sub)?,
        Some(("list", sub)) => list(store, cfg, sub)?,
        Some(("claim", _)) => claim(store, cfg)?,
        _ => {}
    }
    Ok(())
}

/// Builds the editable fields from flags, falling back to `base` for any
/// flag that was not given.
pub fn fields_from_args(
    sub: &clap::ArgMatches,
    base: Option<&TransactionFields>,
) -> Result<TransactionFields> {
    let text = |name: &str| sub.get_one::<String>(name).map(|s| s.to_string());
    let missing = |name: &str| anyhow!("--{} is required", name);

    let kind = match text("type") {
        Some(k) => k.parse::<Kind>()?,
        None => base.map(|b| b.kind).ok_or_else(|| missing("type"))?,
    };
    let title = match text("title") {
        Some(t) => t,
        None => base.map(|b| b.title.clone()).ok_or_else(|| missing("title"))?,
    };
    let amount = match text("amount") {
        Some(a) => parse_decimal(&a)?,
        None => base.map(|b| b.amount).ok_or_else(|| missing("amount"))?,
    };
    let category = match text("category") {
        Some(c) => c,
        None => base
            .map(|b| b.category.clone())
            .ok_or_else(|| missing("category"))?,
    };
    let date = match text("date") {
        Some(d) => parse_date(&d)?,
        None => base.map(|b| b.date).unwrap_or_else(today),
    };
    let description = if sub.try_get_one::<bool>("clear-description").ok().flatten() == Some(&true) {
        None
    } else {
        text("description")
            .or_else(|| base.and_then(|b| b.description.clone()))
            .filter(|d| !d.trim().is_empty())
    };
    Ok(TransactionFields {
        kind,
        title,
        amount,
        category,
        date,
        description,
    })
}

fn add(store: &SqliteStore, cfg: &Config, sub: &clap::ArgMatches) -> Result<()> {
    let user = cfg.require_user()?;
    let fields = fields_from_args(sub, None)?;
    // budget alerts are checked against the month the transaction falls in
    let mut tracker = open_tracker(store, user, MonthRef::of(fields.date));
    let outcome = tracker.add(fields).context("Could not add transaction")?;
    let alerts: Vec<String> = outcome.alerts.iter().map(|a| a.to_string()).collect();
    if !maybe_print_json(
        cfg.json,
        &json!({ "transaction": outcome.transaction, "alerts": outcome.alerts }),
    )? {
        let t = &outcome.transaction;
        println!(
            "Recorded {} {} '{}' in {} on {} (id: {})",
            t.kind,
            fmt_money(&t.amount),
            t.title,
            t.category,
            t.date,
            t.id
        );
        for alert in alerts {
            println!("⚠ {}", alert);
        }
    }
    Ok(())
}

fn edit(store: &SqliteStore, cfg: &Config, sub: &clap::ArgMatches) -> Result<()> {
    let user = cfg.require_user()?;
    let id = sub
        .get_one::<String>("id")
        .ok_or_else(|| anyhow!("Transaction id is required"))?;
    let mut tracker = open_tracker(store, user, month_or_current(None)?);
    let current = tracker
        .transactions()
        .iter()
        .find(|t| &t.id == id)
        .map(|t| t.fields())
        .with_context(|| format!("Transaction '{}' not found", id))?;
    let fields = fields_from_args(sub, Some(&current))?;
    let updated = tracker
        .update(id, fields)
        .with_context(|| format!("Could not update '{}'", id))?;
    if !maybe_print_json(cfg.json, &updated)? {
        println!("Updated '{}' ({})", updated.title, updated.id);
    }
    Ok(())
}

fn remove(store: &SqliteStore, cfg: &Config, sub: &clap::ArgMatches) -> Result<()> {
    let user = cfg.require_user()?;
    let id = sub
        .get_one::<String>("id")
        .ok_or_else(|| anyhow!("Transaction id is required"))?;
    let mut tracker = open_tracker(store, user, month_or_current(None)?);

    if sub.get_flag("now") {
        tracker
            .delete_now(id)
            .with_context(|| format!("Could not delete '{}'", id))?;
        println!("Deleted {}", id);
        return Ok(());
    }

    tracker.request_delete(id, Instant::now())?;
    let grace = tracker.mutations().grace_period();
    println!(
        "Deleting {} in {}s. Press Enter to undo.",
        id,
        grace.as_secs()
    );

    let (keys, undo_pressed) = mpsc::channel();
    thread::spawn(move || {
        let mut line = String::new();
        if std::io::stdin().lock().read_line(&mut line).unwrap_or(0) > 0 {
            let _ = keys.send(());
        }
    });

    if let Some(item) = await_undo(&mut tracker, &undo_pressed) {
        println!("Restored '{}'", item.title);
    }
    print_notices(&mut tracker);
    Ok(())
}

/// Blocks until the pending delete is undone through `undo_pressed` or its
/// grace period runs out. Returns the restored item on undo.
pub fn await_undo<S: Store>(
    tracker: &mut Tracker<S>,
    undo_pressed: &Receiver<()>,
) -> Option<Transaction> {
    while let Some(remaining) = tracker.mutations().remaining(Instant::now()) {
        match undo_pressed.recv_timeout(remaining) {
            Ok(()) => return tracker.undo(),
            Err(RecvTimeoutError::Timeout) => tracker.tick(Instant::now()),
            Err(RecvTimeoutError::Disconnected) => {
                thread::sleep(remaining);
                tracker.tick(Instant::now());
            }
        }
    }
    None
}

#[derive(Serialize)]
pub struct TransactionRow {
    pub id: String,
    pub date: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub amount: String,
    pub category: String,
    pub description: String,
}

impl From<&Transaction> for TransactionRow {
    fn from(t: &Transaction) -> Self {
        Self {
            id: t.id.clone(),
            date: t.date.to_string(),
            kind: t.kind.to_string(),
            title: t.title.clone(),
            amount: fmt_money(&t.amount),
            category: t.category.clone(),
            description: t.description.clone().unwrap_or_default(),
        }
    }
}

pub fn print_transactions(json_flag: bool, txs: &[Transaction]) -> Result<()> {
    if !maybe_print_json(json_flag, &txs)? {
        let rows: Vec<Vec<String>> = txs
            .iter()
            .map(TransactionRow::from)
            .map(|r| {
                vec![
                    r.id,
                    r.date,
                    r.kind,
                    r.title,
                    r.amount,
                    r.category,
                    r.description,
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Date", "Type", "Title", "Amount", "Category", "Description"],
                rows,
            )
        );
    }
    Ok(())
}

pub fn query_rows(store: &SqliteStore, user: &str, sub: &clap::ArgMatches) -> Result<Vec<Transaction>> {
    let month = month_or_current(sub.get_one::<String>("month"))?;
    let mut tracker = open_tracker(store, user, month);
    if let Some(term) = sub.get_one::<String>("search") {
        tracker.set_search(term);
    }
    if let Some(order) = sub.get_one::<String>("sort") {
        tracker.set_sort(order.parse::<SortOrder>().map_err(|e| anyhow!(e))?);
    }
    print_notices(&mut tracker);
    let mut data = tracker.visible();
    if let Some(limit) = sub.get_one::<usize>("limit") {
        data.truncate(*limit);
    }
    Ok(data)
}

fn list(store: &SqliteStore, cfg: &Config, sub: &clap::ArgMatches) -> Result<()> {
    let user = cfg.require_user()?;
    let data = query_rows(store, user, sub)?;
    print_transactions(cfg.json, &data)
}

fn claim(store: &SqliteStore, cfg: &Config) -> Result<()> {
    let user = cfg.require_user()?;
    let n = store
        .claim_unowned(user)
        .context("Could not migrate transactions")?;
    if !maybe_print_json(cfg.json, &json!({ "user": user, "migrated": n }))? {
        println!("Migrated {} transactions to {}", n, user);
    }
    Ok(())
}
