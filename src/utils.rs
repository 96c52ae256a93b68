// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use chrono::{Duration, Local, NaiveDate};
use comfy_table::{Cell, Table, presets::UTF8_FULL};
use rust_decimal::Decimal;

use crate::models::MonthRef;

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

pub fn parse_month(s: &str) -> Result<MonthRef> {
    Ok(s.parse::<MonthRef>()?)
}

/// `--month` if given, otherwise the month containing today.
pub fn month_or_current(arg: Option<&String>) -> Result<MonthRef> {
    match arg {
        Some(s) => parse_month(s),
        None => Ok(MonthRef::of(today())),
    }
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.trim()
        .parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

/// `--start`/`--end`, each defaulting so the range is the last 30 days.
pub fn date_range(start: Option<&String>, end: Option<&String>) -> Result<(NaiveDate, NaiveDate)> {
    let end = match end {
        Some(s) => parse_date(s)?,
        None => today(),
    };
    let start = match start {
        Some(s) => parse_date(s)?,
        None => end - Duration::days(30),
    };
    if start > end {
        anyhow::bail!("Start date {} is after end date {}", start, end);
    }
    Ok((start, end))
}

pub fn fmt_money(d: &Decimal) -> String {
    format!("{:.2}", d)
}

pub fn fmt_percent(p: Option<Decimal>) -> String {
    match p {
        Some(p) => format!("{:.1}%", p),
        None => "-".to_string(),
    }
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn maybe_print_json<T: serde::Serialize>(json_flag: bool, v: &T) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_range_is_thirty_days() {
        let end = "2025-03-31".to_string();
        let (start, end) = date_range(None, Some(&end)).unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
        assert_eq!((end - start).num_days(), 30);
    }

    #[test]
    fn reversed_range_is_rejected() {
        let start = "2025-04-01".to_string();
        let end = "2025-03-01".to_string();
        assert!(date_range(Some(&start), Some(&end)).is_err());
    }

    #[test]
    fn money_has_two_places() {
        assert_eq!(fmt_money(&Decimal::new(5, 0)), "5.00");
        assert_eq!(fmt_percent(None), "-");
    }
}
