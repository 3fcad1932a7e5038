//! The transaction operations: create, update, delete, list, and monthly
//! analytics.

use std::collections::BTreeMap;

use serde::Serialize;
use time::OffsetDateTime;

use crate::{
    Error,
    models::{DatabaseID, Transaction, TransactionBuilder, TransactionType, UserID},
    period::DateTimeWindow,
    stores::{SortOrder, TransactionQuery, TransactionStore, TransactionUpdate},
};

/// The page size used when a list request does not specify one.
const DEFAULT_LIMIT: u64 = 50;

/// Create a transaction, defaulting the description to the empty string and
/// the date to now.
///
/// # Errors
/// Returns [Error::Validation] if the category is empty or the amount is
/// negative.
pub fn create_transaction(
    store: &mut impl TransactionStore,
    user_id: UserID,
    transaction_type: TransactionType,
    category: String,
    amount: f64,
    description: Option<String>,
    date: Option<OffsetDateTime>,
) -> Result<Transaction, Error> {
    if category.trim().is_empty() {
        return Err(Error::Validation("category must not be empty".to_owned()));
    }

    if amount < 0.0 {
        return Err(Error::Validation("amount must not be negative".to_owned()));
    }

    let mut builder = TransactionBuilder::new(user_id, transaction_type, &category, amount);
    if let Some(description) = description {
        builder = builder.description(&description);
    }
    if let Some(date) = date {
        builder = builder.date(date);
    }

    store.create(builder)
}

/// Apply the set fields of `update` to a transaction owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::TransactionNotFound] if `id` does not refer to a transaction
///   owned by `user_id`,
/// - [Error::Validation] if the update sets a negative amount or an empty
///   category.
pub fn update_transaction(
    store: &mut impl TransactionStore,
    user_id: UserID,
    id: DatabaseID,
    update: TransactionUpdate,
) -> Result<Transaction, Error> {
    if let Some(amount) = update.amount
        && amount < 0.0
    {
        return Err(Error::Validation("amount must not be negative".to_owned()));
    }

    if let Some(category) = &update.category
        && category.trim().is_empty()
    {
        return Err(Error::Validation("category must not be empty".to_owned()));
    }

    store.update(user_id, id, update)
}

/// Delete a transaction owned by `user_id`.
///
/// # Errors
/// Returns [Error::TransactionNotFound] if `id` does not refer to a
/// transaction owned by `user_id`.
pub fn delete_transaction(
    store: &mut impl TransactionStore,
    user_id: UserID,
    id: DatabaseID,
) -> Result<(), Error> {
    store.delete(user_id, id)
}

/// The filters and pagination accepted by [list_transactions].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionListRequest {
    /// Include only transactions of this type.
    pub transaction_type: Option<TransactionType>,
    /// Include only transactions with this category.
    pub category: Option<String>,
    /// Include only transactions within this calendar month. Both parts
    /// must be set for the filter to apply.
    pub month: Option<u8>,
    /// The year of the calendar month filter.
    pub year: Option<i32>,
    /// The page size, defaulting to 50.
    pub limit: Option<u64>,
    /// The number of matching transactions to skip over.
    pub skip: Option<u64>,
}

/// One page of transactions plus the total matching the filter.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionPage {
    /// The transactions in this page, ordered by date descending.
    pub entries: Vec<Transaction>,
    /// The number of matching transactions ignoring pagination.
    pub total: usize,
}

/// List transactions newest first, filtered and paginated per `request`.
///
/// The month filter only applies when both `month` and `year` are given,
/// matching the query-string behaviour of the API.
///
/// # Errors
/// This function will return a:
/// - [Error::Validation] if the month filter names an invalid month,
/// - [Error::SqlError] if a lookup fails.
pub fn list_transactions(
    store: &impl TransactionStore,
    user_id: UserID,
    request: TransactionListRequest,
) -> Result<TransactionPage, Error> {
    let mut query = TransactionQuery::new(user_id);
    query.transaction_type = request.transaction_type;
    query.category = request.category;
    query.sort_date = Some(SortOrder::Descending);
    query.limit = Some(request.limit.unwrap_or(DEFAULT_LIMIT));
    query.skip = request.skip.unwrap_or(0);

    if let (Some(month), Some(year)) = (request.month, request.year) {
        query.date_range = Some(DateTimeWindow::calendar_month(month, year)?);
    }

    let entries = store.get_query(query.clone())?;
    let total = store.count(&query)?;

    Ok(TransactionPage { entries, total })
}

/// A month's income, expense, and per-category totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analytics {
    /// The summed income for the month.
    pub income: f64,
    /// The summed expenses for the month.
    pub expenses: f64,
    /// Income minus expenses. Negative when the month overspent.
    pub savings: f64,
    /// Expense totals keyed by category.
    pub category_breakdown: BTreeMap<String, f64>,
    /// The number of transactions in the month, both types.
    pub transaction_count: usize,
}

/// Compute the analytics for a calendar month, defaulting to the current
/// month.
///
/// # Errors
/// This function will return a:
/// - [Error::Validation] if `(month, year)` does not name a valid calendar
///   month,
/// - [Error::SqlError] if the lookup fails.
pub fn get_analytics(
    store: &impl TransactionStore,
    user_id: UserID,
    month: Option<u8>,
    year: Option<i32>,
) -> Result<Analytics, Error> {
    let today = OffsetDateTime::now_utc().date();
    let month = month.unwrap_or_else(|| u8::from(today.month()));
    let year = year.unwrap_or_else(|| today.year());

    let mut query = TransactionQuery::new(user_id);
    query.date_range = Some(DateTimeWindow::calendar_month(month, year)?);

    let transactions = store.get_query(query)?;

    let mut income = 0.0;
    let mut expenses = 0.0;
    let mut category_breakdown: BTreeMap<String, f64> = BTreeMap::new();

    for transaction in &transactions {
        match transaction.transaction_type {
            TransactionType::Income => income += transaction.amount,
            TransactionType::Expense => {
                expenses += transaction.amount;
                *category_breakdown
                    .entry(transaction.category.clone())
                    .or_insert(0.0) += transaction.amount;
            }
        }
    }

    Ok(Analytics {
        income,
        expenses,
        savings: income - expenses,
        category_breakdown,
        transaction_count: transactions.len(),
    })
}
