//! This file defines the `Transaction` type, the source of truth for all
//! monetary facts in the application.

use std::{fmt::Display, str::FromStr};

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::models::{DatabaseID, UserID};

/// Whether a transaction adds to or subtracts from the user's money.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money earned.
    Income,
    /// Money spent.
    Expense,
}

impl TransactionType {
    /// The lowercase string stored in the database and sent over the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            other => Err(format!("invalid transaction type {other:?}")),
        }
    }
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: String| FromSqlError::Other(error.into()))
    }
}

/// A dated, typed, categorized monetary entry owned by a single user.
///
/// Immutable once created except via an explicit update, and deleted
/// independently of any budget.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: DatabaseID,
    /// The ID of the user that owns this transaction.
    pub user_id: UserID,
    /// Whether the transaction is income or an expense.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// The category the transaction belongs to.
    pub category: String,
    /// The amount of money earned or spent. Never negative.
    pub amount: f64,
    /// A text description of what the transaction was for.
    pub description: String,
    /// When the transaction happened, in UTC.
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
}

/// Builds a [Transaction] that has not been inserted into the database yet.
///
/// The description defaults to the empty string and the date defaults to the
/// current instant, matching what the API does when those fields are omitted.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionBuilder {
    /// The ID of the owning user.
    pub user_id: UserID,
    /// Whether the transaction is income or an expense.
    pub transaction_type: TransactionType,
    /// The category the transaction belongs to.
    pub category: String,
    /// The amount of money earned or spent.
    pub amount: f64,
    /// A text description of what the transaction was for.
    pub description: String,
    /// When the transaction happened.
    pub date: OffsetDateTime,
}

impl TransactionBuilder {
    /// Start building a transaction with the required fields.
    pub fn new(
        user_id: UserID,
        transaction_type: TransactionType,
        category: &str,
        amount: f64,
    ) -> Self {
        Self {
            user_id,
            transaction_type,
            category: category.to_owned(),
            amount,
            description: String::new(),
            date: OffsetDateTime::now_utc(),
        }
    }

    /// Set the transaction description.
    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_owned();
        self
    }

    /// Set when the transaction happened.
    ///
    /// The datetime is normalized to UTC so stored values compare
    /// consistently in SQL.
    pub fn date(mut self, date: OffsetDateTime) -> Self {
        self.date = date.to_offset(time::UtcOffset::UTC);
        self
    }
}
