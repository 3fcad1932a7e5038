//! Computes the total expense amount attributable to a budget's category
//! within a datetime window.

use crate::{
    Error,
    models::{TransactionType, UserID},
    period::DateTimeWindow,
    stores::{TransactionQuery, TransactionStore},
};

/// Sum the expense transactions for `category` dated within `window`.
///
/// An empty match set sums to zero; the result is never negative since
/// transaction amounts are non-negative.
///
/// # Errors
/// Returns an [Error::SqlError] if the transaction lookup fails.
pub fn compute_spent(
    transaction_store: &impl TransactionStore,
    user_id: UserID,
    category: &str,
    window: &DateTimeWindow,
) -> Result<f64, Error> {
    let mut query = TransactionQuery::new(user_id);
    query.transaction_type = Some(TransactionType::Expense);
    query.category = Some(category.to_owned());
    query.date_range = Some(window.clone());

    let transactions = transaction_store.get_query(query)?;

    Ok(transactions
        .iter()
        .map(|transaction| transaction.amount)
        .sum())
}
