//! Defines the budget store trait.

use crate::{
    Error,
    models::{Budget, DatabaseID, NewBudget, UserID},
    period::PeriodFilter,
};

/// Handles the creation, retrieval and mutation of budgets.
///
/// Implementations enforce the uniqueness of `(user, category, month, year)`
/// and signal a violation as [Error::DuplicateBudget].
pub trait BudgetStore {
    /// Create a new budget in the store.
    ///
    /// # Errors
    /// Returns [Error::DuplicateBudget] if a budget already exists for the
    /// same `(user, category, month, year)`.
    fn create(&mut self, budget: NewBudget) -> Result<Budget, Error>;

    /// Retrieve a budget owned by `user_id`.
    ///
    /// # Errors
    /// Returns [Error::BudgetNotFound] if no such budget exists or it is
    /// owned by another user.
    fn get(&self, user_id: UserID, id: DatabaseID) -> Result<Budget, Error>;

    /// Persist the `amount` and `spent` fields of `budget`.
    ///
    /// # Errors
    /// Returns [Error::BudgetNotFound] if the budget no longer exists.
    fn update(&mut self, budget: &Budget) -> Result<(), Error>;

    /// Remove a budget owned by `user_id` from the store.
    ///
    /// # Errors
    /// Returns [Error::BudgetNotFound] if no such budget exists or it is
    /// owned by another user.
    fn delete(&mut self, user_id: UserID, id: DatabaseID) -> Result<(), Error>;

    /// Retrieve budgets matching `query`, always ordered by
    /// (year ascending, month ascending).
    fn get_query(&self, query: BudgetQuery) -> Result<Vec<Budget>, Error>;
}

/// Defines which budgets should be fetched from [BudgetStore::get_query].
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetQuery {
    /// Include only budgets owned by this user.
    pub user_id: UserID,
    /// Include only budgets in this period.
    pub period: Option<PeriodFilter>,
    /// Include only budgets for this category.
    pub category: Option<String>,
}

impl BudgetQuery {
    /// A query matching every budget owned by `user_id`.
    pub fn new(user_id: UserID) -> Self {
        Self {
            user_id,
            period: None,
            category: None,
        }
    }
}
