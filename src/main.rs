// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use log::debug;

use tallybook::{cli, commands, config::Config, db::SqliteStore};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = cli::build_cli();
    let matches = cli.get_matches();
    let cfg = Config::from_matches(&matches)?;
    debug!("using database {}", cfg.db_path.display());

    let store = SqliteStore::open_or_init(&cfg.db_path)?;

    match matches.subcommand() {
        Some(("init", _)) => {
            println!("Database initialized at {}", cfg.db_path.display());
        }
        Some(("tx", sub)) => commands::transactions::handle(&store, &cfg, sub)?,
        Some(("budget", sub)) => commands::budgets::handle(&store, &cfg, sub)?,
        Some(("settings", sub)) => commands::settings::handle(&store, &cfg, sub)?,
        Some(("report", sub)) => commands::reports::handle(&store, &cfg, sub)?,
        Some(("export", sub)) => commands::exporter::handle(&store, &cfg, sub)?,
        Some(("doctor", _)) => commands::doctor::handle(&store, &cfg)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
