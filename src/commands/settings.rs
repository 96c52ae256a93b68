// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use serde_json::json;

use super::{open_tracker, print_notices};
use crate::config::Config;
use crate::db::SqliteStore;
use crate::utils::{maybe_print_json, month_or_current};

pub fn handle(store: &SqliteStore, cfg: &Config, m: &clap::ArgMatches) -> Result<()> {
    if let Some(("rollover", sub)) = m.subcommand() {
        rollover(store, cfg, sub)?;
    }
    Ok(())
}

fn rollover(store: &SqliteStore, cfg: &Config, sub: &clap::ArgMatches) -> Result<()> {
    let user = cfg.require_user()?;
    let enabled = sub.get_one::<String>("state").map(|s| s == "on").unwrap_or(false);
    let mut tracker = open_tracker(store, user, month_or_current(None)?);
    tracker
        .set_rollover(enabled)
        .context("Could not save settings")?;
    print_notices(&mut tracker);
    if !maybe_print_json(cfg.json, &json!({ "userId": user, "enableRollover": enabled }))? {
        println!(
            "Rollover {} for {}",
            if enabled { "enabled" } else { "disabled" },
            user
        );
    }
    Ok(())
}
