// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};

use anyhow::Context;
use chrono::NaiveDate;
use directories::ProjectDirs;
use log::{debug, warn};
use once_cell::sync::Lazy;
use rusqlite::{Connection, OptionalExtension, Row, params};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{Budget, BudgetKey, Kind, Settings, Transaction, TransactionFields};
use crate::store::{FeedEvent, Store};

static APP: Lazy<(&str, &str, &str)> =
    Lazy::new(|| ("com.alphavelocity", "Tallybook", "tallybook"));

pub fn db_path() -> anyhow::Result<PathBuf> {
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("tallybook.sqlite"))
}

const TX_COLUMNS: &str = "id, user_id, type, title, amount, category, date, description";

struct Subscriber {
    user_id: String,
    sender: Sender<FeedEvent>,
}

/// [`Store`] backed by a local SQLite file.
///
/// Transactions live in a plain table (amounts as TEXT so decimals survive
/// untouched); budgets and settings are JSON documents keyed the same way
/// the hosted collections key them.
pub struct SqliteStore {
    conn: Connection,
    subscribers: RefCell<Vec<Subscriber>>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    pub fn open_or_init(path: &Path) -> anyhow::Result<Self> {
        Self::open(path).with_context(|| format!("Open DB at {}", path.display()))
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        init_schema(&conn)?;
        Ok(Self {
            conn,
            subscribers: RefCell::new(Vec::new()),
        })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn owner_of(&self, id: &str) -> Result<Option<String>, StoreError> {
        let owner: Option<Option<String>> = self
            .conn
            .query_row(
                "SELECT user_id FROM transactions WHERE id=?1",
                params![id],
                |r| r.get(0),
            )
            .optional()?;
        Ok(owner.flatten())
    }

    fn query_transactions(
        &self,
        sql: &str,
        args: &[&dyn rusqlite::ToSql],
    ) -> Result<Vec<Transaction>, StoreError> {
        let mut stmt = self.conn.prepare_cached(sql)?;
        let rows = stmt.query_map(args, RawTransaction::from_row)?;
        let mut data = Vec::new();
        for row in rows {
            data.push(row?.parse()?);
        }
        Ok(data)
    }

    /// Pushes a fresh snapshot to everyone watching `user_id`, dropping
    /// subscribers whose receiver is gone.
    fn notify(&self, user_id: &str) {
        let mut subs = self.subscribers.borrow_mut();
        if !subs.iter().any(|s| s.user_id == user_id) {
            return;
        }
        let event = match self.transactions_for_user(user_id) {
            Ok(list) => FeedEvent::Snapshot(list),
            Err(e) => {
                warn!("snapshot for {} failed: {}", user_id, e);
                FeedEvent::Error(e.to_string())
            }
        };
        subs.retain(|s| s.user_id != user_id || s.sender.send(event.clone()).is_ok());
        debug!("notified subscribers of {}", user_id);
    }
}

fn init_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        r#"
    CREATE TABLE IF NOT EXISTS transactions(
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        id TEXT NOT NULL UNIQUE,
        user_id TEXT,
        type TEXT NOT NULL CHECK(type IN ('income','expense')),
        title TEXT NOT NULL,
        amount TEXT NOT NULL,
        category TEXT NOT NULL,
        date TEXT NOT NULL,
        description TEXT
    );
    CREATE INDEX IF NOT EXISTS idx_transactions_user_date ON transactions(user_id, date);

    -- one document per (user, year, month); body is the JSON budget document
    CREATE TABLE IF NOT EXISTS budgets(
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        body TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS user_settings(
        user_id TEXT PRIMARY KEY,
        body TEXT NOT NULL
    );
    "#,
    )?;
    Ok(())
}

struct RawTransaction {
    id: String,
    user_id: Option<String>,
    kind: String,
    title: String,
    amount: String,
    category: String,
    date: String,
    description: Option<String>,
}

impl RawTransaction {
    fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: r.get(0)?,
            user_id: r.get(1)?,
            kind: r.get(2)?,
            title: r.get(3)?,
            amount: r.get(4)?,
            category: r.get(5)?,
            date: r.get(6)?,
            description: r.get(7)?,
        })
    }

    fn parse(self) -> Result<Transaction, StoreError> {
        let kind = self
            .kind
            .parse::<Kind>()
            .map_err(|_| StoreError::Corrupt {
                field: "type",
                value: self.kind.clone(),
            })?;
        let amount = self
            .amount
            .parse::<Decimal>()
            .map_err(|_| StoreError::Corrupt {
                field: "amount",
                value: self.amount.clone(),
            })?;
        let date = NaiveDate::parse_from_str(&self.date, "%Y-%m-%d").map_err(|_| {
            StoreError::Corrupt {
                field: "date",
                value: self.date.clone(),
            }
        })?;
        Ok(Transaction {
            id: self.id,
            user_id: self.user_id.unwrap_or_default(),
            kind,
            title: self.title,
            amount,
            category: self.category,
            date,
            description: self.description,
        })
    }
}

impl Store for SqliteStore {
    fn transactions_for_user(&self, user_id: &str) -> Result<Vec<Transaction>, StoreError> {
        let sql = format!(
            "SELECT {} FROM transactions WHERE user_id=?1 ORDER BY date DESC, seq DESC",
            TX_COLUMNS
        );
        self.query_transactions(&sql, &[&user_id])
    }

    fn transactions_between(
        &self,
        user_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Transaction>, StoreError> {
        let sql = format!(
            "SELECT {} FROM transactions WHERE user_id=?1 AND date>=?2 AND date<=?3 ORDER BY date DESC, seq DESC",
            TX_COLUMNS
        );
        let (start, end) = (start.to_string(), end.to_string());
        self.query_transactions(&sql, &[&user_id, &start, &end])
    }

    fn transaction(&self, id: &str) -> Result<Option<Transaction>, StoreError> {
        let sql = format!("SELECT {} FROM transactions WHERE id=?1", TX_COLUMNS);
        Ok(self.query_transactions(&sql, &[&id])?.into_iter().next())
    }

    fn create_transaction(
        &self,
        user_id: &str,
        fields: &TransactionFields,
    ) -> Result<Transaction, StoreError> {
        let id = Uuid::new_v4().to_string();
        self.conn.execute(
            "INSERT INTO transactions(id, user_id, type, title, amount, category, date, description)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                id,
                user_id,
                fields.kind.as_str(),
                fields.title,
                fields.amount.to_string(),
                fields.category,
                fields.date.to_string(),
                fields.description
            ],
        )?;
        debug!("created transaction {} for {}", id, user_id);
        self.notify(user_id);
        Ok(fields.clone().into_transaction(id, user_id.to_string()))
    }

    fn update_transaction(&self, id: &str, fields: &TransactionFields) -> Result<(), StoreError> {
        let changed = self.conn.execute(
            "UPDATE transactions SET type=?2, title=?3, amount=?4, category=?5, date=?6, description=?7
             WHERE id=?1",
            params![
                id,
                fields.kind.as_str(),
                fields.title,
                fields.amount.to_string(),
                fields.category,
                fields.date.to_string(),
                fields.description
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::Missing(id.to_string()));
        }
        if let Some(owner) = self.owner_of(id)? {
            self.notify(&owner);
        }
        Ok(())
    }

    fn delete_transaction(&self, id: &str) -> Result<(), StoreError> {
        let owner = self.owner_of(id)?;
        self.conn
            .execute("DELETE FROM transactions WHERE id=?1", params![id])?;
        if let Some(owner) = owner {
            self.notify(&owner);
        }
        Ok(())
    }

    fn claim_unowned(&self, user_id: &str) -> Result<usize, StoreError> {
        let n = self.conn.execute(
            "UPDATE transactions SET user_id=?1 WHERE user_id IS NULL OR user_id=''",
            params![user_id],
        )?;
        if n > 0 {
            self.notify(user_id);
        }
        Ok(n)
    }

    fn budget(&self, key: &BudgetKey) -> Result<Option<Budget>, StoreError> {
        let id = key.to_string();
        let body: Option<String> = self
            .conn
            .query_row("SELECT body FROM budgets WHERE id=?1", params![id], |r| {
                r.get(0)
            })
            .optional()?;
        body.map(|b| serde_json::from_str(&b).map_err(|source| StoreError::Document { id, source }))
            .transpose()
    }

    fn put_budget(&self, key: &BudgetKey, budget: &Budget) -> Result<(), StoreError> {
        let id = key.to_string();
        let doc = Budget {
            user_id: key.user_id.clone(),
            ..budget.clone()
        };
        let body = serde_json::to_string(&doc).map_err(|source| StoreError::Document {
            id: id.clone(),
            source,
        })?;
        self.conn.execute(
            "INSERT INTO budgets(id, user_id, body) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET body=excluded.body",
            params![id, key.user_id, body],
        )?;
        Ok(())
    }

    fn settings(&self, user_id: &str) -> Result<Option<Settings>, StoreError> {
        let body: Option<String> = self
            .conn
            .query_row(
                "SELECT body FROM user_settings WHERE user_id=?1",
                params![user_id],
                |r| r.get(0),
            )
            .optional()?;
        body.map(|b| {
            serde_json::from_str(&b).map_err(|source| StoreError::Document {
                id: user_id.to_string(),
                source,
            })
        })
        .transpose()
    }

    fn merge_settings(&self, user_id: &str, settings: &Settings) -> Result<(), StoreError> {
        let doc_err = |source| StoreError::Document {
            id: user_id.to_string(),
            source,
        };
        let existing: Option<String> = self
            .conn
            .query_row(
                "SELECT body FROM user_settings WHERE user_id=?1",
                params![user_id],
                |r| r.get(0),
            )
            .optional()?;
        let mut doc = match existing {
            Some(b) => match serde_json::from_str::<serde_json::Value>(&b).map_err(doc_err)? {
                serde_json::Value::Object(map) => map,
                _ => serde_json::Map::new(),
            },
            None => serde_json::Map::new(),
        };
        let patch = Settings {
            user_id: user_id.to_string(),
            ..settings.clone()
        };
        if let serde_json::Value::Object(fields) = serde_json::to_value(&patch).map_err(doc_err)? {
            doc.extend(fields);
        }
        let body = serde_json::to_string(&doc).map_err(doc_err)?;
        self.conn.execute(
            "INSERT INTO user_settings(user_id, body) VALUES (?1, ?2)
             ON CONFLICT(user_id) DO UPDATE SET body=excluded.body",
            params![user_id, body],
        )?;
        Ok(())
    }

    fn subscribe(&self, user_id: &str) -> Result<Receiver<FeedEvent>, StoreError> {
        let (sender, receiver) = mpsc::channel();
        let first = self.transactions_for_user(user_id)?;
        // The receiver is still in hand, so this send cannot fail.
        let _ = sender.send(FeedEvent::Snapshot(first));
        self.subscribers.borrow_mut().push(Subscriber {
            user_id: user_id.to_string(),
            sender,
        });
        debug!("subscribed to transactions of {}", user_id);
        Ok(receiver)
    }
}
