// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

mod common;

use common::{date, expense, income};
use rust_decimal_macros::dec;
use tallybook::commands::exporter;
use tallybook::config::Config;
use tallybook::db::SqliteStore;
use tallybook::export::{range_report, write_csv};
use tallybook::store::Store;
use tallybook::{cli, models::TransactionFields};
use tempfile::tempdir;

fn rent() -> TransactionFields {
    let mut f = expense(r#"Rent, "Nov""#, dec!(950), "Housing", date(2025, 11, 1));
    f.description = Some("paid\nlate".into());
    f
}

#[test]
fn csv_escapes_commas_quotes_and_newlines() {
    let store = SqliteStore::open_in_memory().unwrap();
    let tx = store.create_transaction("u1", &rent()).unwrap();
    let mut buf = Vec::new();
    write_csv(&mut buf, &[tx]).unwrap();
    let text = String::from_utf8(buf).unwrap();
    assert!(text.contains(r#""Rent, ""Nov""""#));
    assert!(text.contains("\"paid\nlate\""));

    let mut rdr = csv::Reader::from_reader(text.as_bytes());
    let row = rdr.records().next().unwrap().unwrap();
    assert_eq!(&row[3], r#"Rent, "Nov""#);
    assert_eq!(&row[4], "950");
}

#[test]
fn range_report_is_inclusive_and_owned() {
    let store = SqliteStore::open_in_memory().unwrap();
    store.create_transaction("u1", &income("Pay", dec!(2000), date(2025, 3, 1))).unwrap();
    store
        .create_transaction("u1", &expense("Fuel", dec!(60), "Transportation", date(2025, 3, 31)))
        .unwrap();
    store
        .create_transaction("u1", &expense("Early", dec!(5), "Food", date(2025, 2, 28)))
        .unwrap();
    store
        .create_transaction("u2", &expense("Not mine", dec!(5), "Food", date(2025, 3, 15)))
        .unwrap();

    let report = range_report(&store, "u1", date(2025, 3, 1), date(2025, 3, 31)).unwrap();
    assert_eq!(report.count, 2);
    assert_eq!(report.totals.balance, dec!(1940));
    assert_eq!(report.transactions[0].title, "Fuel");
}

#[test]
fn export_command_writes_named_file() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("t.sqlite");
    let store = SqliteStore::open(&db).unwrap();
    store.create_transaction("u1", &rent()).unwrap();

    let out = dir.path().to_string_lossy().to_string();
    let matches = cli::build_cli().get_matches_from([
        "tallybook",
        "--user",
        "u1",
        "--db",
        db.to_str().unwrap(),
        "export",
        "csv",
        "--start",
        "2025-10-01",
        "--end",
        "2025-11-30",
        "--out-dir",
        &out,
    ]);
    let cfg = Config::from_matches(&matches).unwrap();
    if let Some(("export", export_m)) = matches.subcommand() {
        exporter::handle(&store, &cfg, export_m).unwrap();
    } else {
        panic!("no export subcommand");
    }

    let path = dir.path().join("report-2025-10-01-to-2025-11-30.csv");
    let contents = std::fs::read_to_string(path).unwrap();
    assert!(contents.starts_with(r#""ID","Date","Type","Title","Amount","Category","Description""#));
    assert_eq!(csv::Reader::from_reader(contents.as_bytes()).records().count(), 1);
}
