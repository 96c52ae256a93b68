// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::config::Config;
use crate::db::SqliteStore;
use crate::models::Transaction;
use crate::store::Store;
use crate::utils::{maybe_print_json, pretty_table};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    pub kind: &'static str,
    pub id: String,
    pub detail: String,
}

/// Stored transactions that break the rules a new one would be held to.
pub fn find_issues(txs: &[Transaction]) -> Vec<Issue> {
    let mut issues = Vec::new();
    for t in txs {
        if t.amount < Decimal::ZERO {
            issues.push(Issue {
                kind: "negative_amount",
                id: t.id.clone(),
                detail: t.amount.to_string(),
            });
        }
        if !t.kind.allows(&t.category) {
            issues.push(Issue {
                kind: "category_not_in_kind",
                id: t.id.clone(),
                detail: format!("{} / {}", t.kind, t.category),
            });
        }
        if t.title.trim().is_empty() {
            issues.push(Issue {
                kind: "blank_title",
                id: t.id.clone(),
                detail: t.date.to_string(),
            });
        }
    }
    issues
}

pub fn handle(store: &SqliteStore, cfg: &Config) -> Result<()> {
    let user = cfg.require_user()?;
    let mut issues = find_issues(&store.transactions_for_user(user)?);

    let unowned: i64 = store.connection().query_row(
        "SELECT COUNT(*) FROM transactions WHERE user_id IS NULL OR user_id=''",
        [],
        |r| r.get(0),
    )?;
    if unowned > 0 {
        issues.push(Issue {
            kind: "unowned_transactions",
            id: String::new(),
            detail: format!("{} (run `tx claim`)", unowned),
        });
    }

    if maybe_print_json(cfg.json, &issues)? {
        return Ok(());
    }
    if issues.is_empty() {
        println!("✅ doctor: no issues found");
    } else {
        let rows = issues
            .into_iter()
            .map(|i| vec![i.kind.to_string(), i.id, i.detail])
            .collect();
        println!("{}", pretty_table(&["Issue", "Transaction", "Detail"], rows));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Kind;
    use chrono::NaiveDate;

    #[test]
    fn flags_each_broken_rule() {
        let tx = Transaction {
            id: "t1".into(),
            user_id: "u1".into(),
            kind: Kind::Income,
            title: "  ".into(),
            amount: Decimal::new(-5, 0),
            category: "Food".into(),
            date: NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
            description: None,
        };
        let kinds: Vec<_> = find_issues(&[tx]).into_iter().map(|i| i.kind).collect();
        assert_eq!(
            kinds,
            vec!["negative_amount", "category_not_in_kind", "blank_title"]
        );
    }
}
