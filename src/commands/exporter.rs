// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::json;

use crate::config::Config;
use crate::db::SqliteStore;
use crate::export::{export_to_dir, range_report};
use crate::utils::{date_range, maybe_print_json};

pub fn handle(store: &SqliteStore, cfg: &Config, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("csv", sub)) => export_csv(store, cfg, sub),
        _ => Ok(()),
    }
}

fn export_csv(store: &SqliteStore, cfg: &Config, sub: &clap::ArgMatches) -> Result<()> {
    let user = cfg.require_user()?;
    let (start, end) = date_range(sub.get_one::<String>("start"), sub.get_one::<String>("end"))?;
    let dir = sub
        .get_one::<String>("out-dir")
        .map(String::as_str)
        .unwrap_or(".");
    let report = range_report(store, user, start, end)
        .with_context(|| format!("Could not load transactions {} to {}", start, end))?;
    let path = export_to_dir(&report, Path::new(dir))
        .with_context(|| format!("Could not write export into {}", dir))?;
    if !maybe_print_json(
        cfg.json,
        &json!({ "path": path.display().to_string(), "count": report.count }),
    )? {
        println!("Exported {} transactions to {}", report.count, path.display());
    }
    Ok(())
}
