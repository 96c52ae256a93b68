// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::Kind;

/// Input problems caught before anything reaches the store.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Title is required")]
    MissingTitle,
    #[error("Amount must be greater than zero (got {0})")]
    NonPositiveAmount(Decimal),
    #[error("Amount {0} has more than two decimal places")]
    SubCentAmount(Decimal),
    #[error("Unknown transaction type '{0}', expected income or expense")]
    UnknownKind(String),
    #[error("Category '{category}' is not a valid {kind} category")]
    UnknownCategory { kind: Kind, category: String },
    #[error("Budget for {} cannot be negative (got {amount})", .category.as_deref().unwrap_or("overall"))]
    NegativeBudget {
        category: Option<String>,
        amount: Decimal,
    },
    #[error("Invalid month '{0}', expected YYYY-MM")]
    InvalidMonth(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("malformed document '{id}': {source}")]
    Document {
        id: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid stored value '{value}' in {field}")]
    Corrupt { field: &'static str, value: String },
    #[error("No document to update: '{0}'")]
    Missing(String),
    #[error("{0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Not signed in")]
    NotSignedIn,
    #[error("Transaction '{0}' not found")]
    NotFound(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
