// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Date-range reports and CSV export.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use log::info;
use serde::Serialize;

use crate::aggregate::{self, Totals};
use crate::error::ExportError;
use crate::models::Transaction;
use crate::store::Store;

pub const CSV_HEADERS: [&str; 7] = [
    "ID",
    "Date",
    "Type",
    "Title",
    "Amount",
    "Category",
    "Description",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeReport {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub count: usize,
    pub totals: Totals,
    pub transactions: Vec<Transaction>,
}

/// Every transaction of `user_id` dated `start..=end`.
pub fn range_report<S: Store + ?Sized>(
    store: &S,
    user_id: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<RangeReport, ExportError> {
    let transactions = store.transactions_between(user_id, start, end)?;
    Ok(RangeReport {
        start,
        end,
        count: transactions.len(),
        totals: aggregate::totals(&transactions),
        transactions,
    })
}

pub fn export_filename(start: NaiveDate, end: NaiveDate) -> String {
    format!("report-{}-to-{}.csv", start, end)
}

pub fn write_csv<W: Write>(out: W, txs: &[Transaction]) -> Result<(), ExportError> {
    let mut wtr = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(out);
    wtr.write_record(CSV_HEADERS)?;
    for t in txs {
        wtr.write_record([
            t.id.as_str(),
            t.date.to_string().as_str(),
            t.kind.as_str(),
            t.title.as_str(),
            t.amount.to_string().as_str(),
            t.category.as_str(),
            t.description.as_deref().unwrap_or_default(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes the report as `report-{start}-to-{end}.csv` inside `dir`.
pub fn export_to_dir(report: &RangeReport, dir: &Path) -> Result<PathBuf, ExportError> {
    let path = dir.join(export_filename(report.start, report.end));
    let file = std::fs::File::create(&path)?;
    write_csv(file, &report.transactions)?;
    info!("exported {} transactions to {}", report.count, path.display());
    Ok(path)
}
