//! Defines the budget history store trait.

use crate::{
    Error,
    models::{BudgetHistory, DatabaseID, NewBudgetHistory, UserID},
    period::PeriodFilter,
};

/// Handles the creation and retrieval of archived budget snapshots.
pub trait BudgetHistoryStore {
    /// Delete the live budget `budget_id` and insert `record` as a single
    /// transactional unit.
    ///
    /// Either both writes happen or neither does; there is never an orphaned
    /// snapshot alongside a live budget.
    ///
    /// # Errors
    /// Returns [Error::BudgetNotFound] if the budget does not exist or is
    /// not owned by the record's user; no snapshot row is written.
    fn archive(
        &mut self,
        record: NewBudgetHistory,
        budget_id: DatabaseID,
    ) -> Result<BudgetHistory, Error>;

    /// Retrieve history rows matching `query`, ordered by
    /// (year ascending, month ascending) and paginated by the query's
    /// `limit` and `skip`.
    fn get_query(&self, query: HistoryQuery) -> Result<Vec<BudgetHistory>, Error>;

    /// The number of history rows matching `query`, ignoring its `limit`
    /// and `skip`.
    fn count(&self, query: &HistoryQuery) -> Result<usize, Error>;
}

/// Defines which history rows should be fetched from
/// [BudgetHistoryStore::get_query].
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryQuery {
    /// Include only rows owned by this user.
    pub user_id: UserID,
    /// Include only rows in this period.
    pub period: Option<PeriodFilter>,
    /// Include only rows for this category.
    pub category: Option<String>,
    /// Selects up to the first N rows after `skip`.
    pub limit: u64,
    /// The number of matching rows to skip over.
    pub skip: u64,
}

impl HistoryQuery {
    /// The page size used when a request does not specify one.
    pub const DEFAULT_LIMIT: u64 = 50;

    /// A query matching every history row owned by `user_id`, with the
    /// default page size.
    pub fn new(user_id: UserID) -> Self {
        Self {
            user_id,
            period: None,
            category: None,
            limit: Self::DEFAULT_LIMIT,
            skip: 0,
        }
    }
}
