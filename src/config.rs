// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::env;
use std::path::PathBuf;

use anyhow::{Result, anyhow};

use crate::db;

pub const DB_ENV: &str = "TALLYBOOK_DB";
pub const USER_ENV: &str = "TALLYBOOK_USER";

/// Runtime settings: flags first, then environment, then platform defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub db_path: PathBuf,
    pub user: Option<String>,
    pub json: bool,
}

impl Config {
    pub fn from_matches(m: &clap::ArgMatches) -> Result<Self> {
        let db_path = match m.get_one::<String>("db") {
            Some(p) => PathBuf::from(p),
            None => match env::var(DB_ENV) {
                Ok(p) if !p.trim().is_empty() => PathBuf::from(p),
                _ => db::db_path()?,
            },
        };
        let user = m
            .get_one::<String>("user")
            .cloned()
            .or_else(|| env::var(USER_ENV).ok())
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());
        Ok(Self {
            db_path,
            user,
            json: m.get_flag("json"),
        })
    }

    /// The signed-in user, required by every command that touches data.
    pub fn require_user(&self) -> Result<&str> {
        self.user
            .as_deref()
            .ok_or_else(|| anyhow!("No user given: pass --user or set {}", USER_ENV))
    }
}
