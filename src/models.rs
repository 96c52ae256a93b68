// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub const INCOME_CATEGORIES: &[&str] = &[
    "Salary",
    "Freelance",
    "Investments",
    "Gifts",
    "Savings",
    "Other Income",
];

pub const EXPENSE_CATEGORIES: &[&str] = &[
    "Housing",
    "Food",
    "Transportation",
    "Utilities",
    "Church",
    "Healthcare",
    "Entertainment",
    "Shopping",
    "Education",
    "Personal Care",
    "Debt Payments",
    "Savings",
    "Gifts",
    "Other Expenses",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Income,
    Expense,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Income => "income",
            Kind::Expense => "expense",
        }
    }

    /// The fixed category list a transaction of this kind must draw from.
    pub fn categories(&self) -> &'static [&'static str] {
        match self {
            Kind::Income => INCOME_CATEGORIES,
            Kind::Expense => EXPENSE_CATEGORIES,
        }
    }

    pub fn allows(&self, category: &str) -> bool {
        self.categories().contains(&category)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Kind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "income" => Ok(Kind::Income),
            "expense" => Ok(Kind::Expense),
            other => Err(ValidationError::UnknownKind(other.to_string())),
        }
    }
}

/// The user-editable part of a transaction. Updates overwrite all of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionFields {
    #[serde(rename = "type")]
    pub kind: Kind,
    pub title: String,
    pub amount: Decimal,
    pub category: String,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TransactionFields {
    /// Checks run before anything is submitted to the store.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::MissingTitle);
        }
        if self.amount <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveAmount(self.amount));
        }
        if self.amount.normalize().scale() > 2 {
            return Err(ValidationError::SubCentAmount(self.amount));
        }
        if !self.kind.allows(&self.category) {
            return Err(ValidationError::UnknownCategory {
                kind: self.kind,
                category: self.category.clone(),
            });
        }
        Ok(())
    }

    pub fn into_transaction(self, id: String, user_id: String) -> Transaction {
        Transaction {
            id,
            user_id,
            kind: self.kind,
            title: self.title,
            amount: self.amount,
            category: self.category,
            date: self.date,
            description: self.description,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: Kind,
    pub title: String,
    pub amount: Decimal,
    pub category: String,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Transaction {
    pub fn fields(&self) -> TransactionFields {
        TransactionFields {
            kind: self.kind,
            title: self.title.clone(),
            amount: self.amount,
            category: self.category.clone(),
            date: self.date,
            description: self.description.clone(),
        }
    }

    /// Same id, same owner, new editable fields.
    pub fn with_fields(&self, fields: TransactionFields) -> Transaction {
        fields.into_transaction(self.id.clone(), self.user_id.clone())
    }

    pub fn is_expense(&self) -> bool {
        self.kind == Kind::Expense
    }
}

/// A calendar month, `month` in 1..=12.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MonthRef {
    pub year: i32,
    pub month: u32,
}

impl MonthRef {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn previous(&self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// Zero-based month index, the form used inside budget document keys.
    pub fn index0(&self) -> u32 {
        self.month - 1
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn last_day(&self) -> NaiveDate {
        let next = self.next();
        NaiveDate::from_ymd_opt(next.year, next.month, 1)
            .and_then(|d| d.pred_opt())
            .unwrap_or(NaiveDate::MAX)
    }

    pub fn days(&self) -> u32 {
        self.last_day().day()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl fmt::Display for MonthRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthRef {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || ValidationError::InvalidMonth(s.to_string());
        let (y, m) = s.split_once('-').ok_or_else(invalid)?;
        let year: i32 = y.parse().map_err(|_| invalid())?;
        let month: u32 = m.parse().map_err(|_| invalid())?;
        MonthRef::new(year, month).ok_or_else(invalid)
    }
}

/// Identifies the single budget document for a user and month.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BudgetKey {
    pub user_id: String,
    pub month: MonthRef,
}

impl BudgetKey {
    pub fn new(user_id: &str, month: MonthRef) -> Self {
        Self {
            user_id: user_id.to_string(),
            month,
        }
    }
}

impl fmt::Display for BudgetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "budget-{}-{}-{}",
            self.user_id,
            self.month.year,
            self.month.index0()
        )
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    pub user_id: String,
    #[serde(default)]
    pub amounts: BTreeMap<String, Decimal>,
    /// Zero means no overall limit.
    #[serde(default)]
    pub overall_amount: Decimal,
}

impl Budget {
    pub fn empty(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            ..Default::default()
        }
    }

    pub fn amount_for(&self, category: &str) -> Decimal {
        self.amounts.get(category).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.overall_amount < Decimal::ZERO {
            return Err(ValidationError::NegativeBudget {
                category: None,
                amount: self.overall_amount,
            });
        }
        for (category, amount) in &self.amounts {
            if !Kind::Expense.allows(category) {
                return Err(ValidationError::UnknownCategory {
                    kind: Kind::Expense,
                    category: category.clone(),
                });
            }
            if *amount < Decimal::ZERO {
                return Err(ValidationError::NegativeBudget {
                    category: Some(category.clone()),
                    amount: *amount,
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub enable_rollover: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn january_wraps_to_previous_december() {
        let jan = MonthRef::new(2025, 1).unwrap();
        assert_eq!(jan.previous(), MonthRef::new(2024, 12).unwrap());
        assert_eq!(MonthRef::new(2024, 12).unwrap().next(), jan);
    }

    #[test]
    fn month_bounds_follow_calendar() {
        let feb = "2024-02".parse::<MonthRef>().unwrap();
        assert_eq!(feb.days(), 29);
        assert_eq!(feb.last_day(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!("2025-02".parse::<MonthRef>().unwrap().days(), 28);
        assert!("2025-13".parse::<MonthRef>().is_err());
        assert!("202501".parse::<MonthRef>().is_err());
    }

    #[test]
    fn budget_key_uses_zero_based_month() {
        let key = BudgetKey::new("u1", MonthRef::new(2025, 8).unwrap());
        assert_eq!(key.to_string(), "budget-u1-2025-7");
    }

    #[test]
    fn category_must_match_kind() {
        let fields = TransactionFields {
            kind: Kind::Income,
            title: "Dinner".into(),
            amount: Decimal::new(1500, 2),
            category: "Food".into(),
            date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            description: None,
        };
        assert!(matches!(
            fields.validate(),
            Err(ValidationError::UnknownCategory { .. })
        ));
    }

    #[test]
    fn amounts_stop_at_cents() {
        let mut fields = TransactionFields {
            kind: Kind::Expense,
            title: "Gum".into(),
            amount: Decimal::new(1, 3),
            category: "Food".into(),
            date: NaiveDate::from_ymd_opt(2025, 3, 4).unwrap(),
            description: None,
        };
        assert_eq!(
            fields.validate(),
            Err(ValidationError::SubCentAmount(Decimal::new(1, 3)))
        );
        fields.amount = Decimal::new(1500, 3);
        assert_eq!(fields.validate(), Ok(()));
        fields.amount = Decimal::new(199, 2);
        assert_eq!(fields.validate(), Ok(()));
    }

    #[test]
    fn transaction_document_shape() {
        let tx = TransactionFields {
            kind: Kind::Expense,
            title: "Bus".into(),
            amount: Decimal::new(250, 2),
            category: "Transportation".into(),
            date: NaiveDate::from_ymd_opt(2025, 3, 4).unwrap(),
            description: None,
        }
        .into_transaction("t1".into(), "u1".into());
        let v = serde_json::to_value(&tx).unwrap();
        assert_eq!(v["type"], "expense");
        assert_eq!(v["userId"], "u1");
        assert_eq!(v["date"], "2025-03-04");
        assert_eq!(v["amount"], 2.5);
        assert!(v.get("description").is_none());
    }
}
