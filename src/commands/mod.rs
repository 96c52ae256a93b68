// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod budgets;
pub mod doctor;
pub mod exporter;
pub mod reports;
pub mod settings;
pub mod transactions;

use std::time::Instant;

use crate::db::SqliteStore;
use crate::models::MonthRef;
use crate::session::{Identity, SessionProvider};
use crate::tracker::Tracker;

/// A tracker signed in as `user` with its first snapshot loaded.
pub fn open_tracker<'a>(
    store: &'a SqliteStore,
    user: &str,
    month: MonthRef,
) -> Tracker<&'a SqliteStore> {
    let mut session = SessionProvider::new();
    let mut tracker = Tracker::new(store, session.listen(), month);
    session.sign_in(Identity::new(user));
    tracker.tick(Instant::now());
    tracker
}

/// Prints and clears whatever the tracker wants the user to see.
pub fn print_notices(tracker: &mut Tracker<&SqliteStore>) {
    for notice in tracker.take_notices() {
        eprintln!("{}", notice);
    }
}
