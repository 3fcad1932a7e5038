//! Defines the transaction store trait.

use time::OffsetDateTime;

use crate::{
    Error,
    models::{DatabaseID, Transaction, TransactionBuilder, TransactionType, UserID},
    period::DateTimeWindow,
};

/// Handles the creation and retrieval of transactions.
///
/// Every operation is scoped to the owning user; a lookup for a row owned by
/// another user behaves exactly like a lookup for a missing row.
pub trait TransactionStore {
    /// Create a new transaction in the store.
    fn create(&mut self, builder: TransactionBuilder) -> Result<Transaction, Error>;

    /// Retrieve a transaction owned by `user_id` from the store.
    fn get(&self, user_id: UserID, id: DatabaseID) -> Result<Transaction, Error>;

    /// Apply the set fields of `update` to a transaction owned by `user_id`.
    fn update(
        &mut self,
        user_id: UserID,
        id: DatabaseID,
        update: TransactionUpdate,
    ) -> Result<Transaction, Error>;

    /// Remove a transaction owned by `user_id` from the store.
    fn delete(&mut self, user_id: UserID, id: DatabaseID) -> Result<(), Error>;

    /// Retrieve transactions from the store in the way defined by `query`.
    fn get_query(&self, query: TransactionQuery) -> Result<Vec<Transaction>, Error>;

    /// The number of transactions matching `query`, ignoring its `limit`
    /// and `skip`.
    fn count(&self, query: &TransactionQuery) -> Result<usize, Error>;
}

/// The order to sort transactions in a [TransactionQuery].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Sort in order of increasing value.
    Ascending,
    /// Sort in order of decreasing value.
    Descending,
}

/// Defines how transactions should be fetched from
/// [TransactionStore::get_query].
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionQuery {
    /// Include only transactions owned by this user.
    pub user_id: UserID,
    /// Include only transactions of this type.
    pub transaction_type: Option<TransactionType>,
    /// Include only transactions with this category.
    pub category: Option<String>,
    /// Include only transactions whose category is in this set. Used for the
    /// single batched fetch during history derivation.
    pub categories: Option<Vec<String>>,
    /// Include only transactions dated within `date_range` (inclusive).
    pub date_range: Option<DateTimeWindow>,
    /// Selects up to the first N transactions after `skip`.
    pub limit: Option<u64>,
    /// The number of matching transactions to skip over.
    pub skip: u64,
    /// Orders transactions by date. `None` returns transactions in the order
    /// they are stored.
    pub sort_date: Option<SortOrder>,
}

impl TransactionQuery {
    /// A query matching every transaction owned by `user_id`.
    pub fn new(user_id: UserID) -> Self {
        Self {
            user_id,
            transaction_type: None,
            category: None,
            categories: None,
            date_range: None,
            limit: None,
            skip: 0,
            sort_date: None,
        }
    }
}

/// The set of fields that may be changed on an existing transaction. Unset
/// fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionUpdate {
    /// Change the transaction type.
    pub transaction_type: Option<TransactionType>,
    /// Change the category.
    pub category: Option<String>,
    /// Change the amount.
    pub amount: Option<f64>,
    /// Change the description.
    pub description: Option<String>,
    /// Change when the transaction happened.
    pub date: Option<OffsetDateTime>,
}
