//! This file defines the `Budget` type, a per-category monthly spending
//! ceiling.

use serde::Serialize;

use crate::models::{DatabaseID, UserID};

/// A monthly spending ceiling for one category.
///
/// At most one budget exists per `(user, category, month, year)`; the store
/// layer enforces this with a unique constraint.
///
/// `spent` is a cached derived value: it is recomputed from the transaction
/// store at creation and on every update, so it may be briefly stale between
/// a transaction mutation and the next budget write. That window is accepted
/// behaviour, not a bug.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    /// The ID of the budget.
    pub id: DatabaseID,
    /// The ID of the user that owns this budget.
    pub user_id: UserID,
    /// The category this budget applies to.
    pub category: String,
    /// The budgeted ceiling. Always greater than zero.
    pub amount: f64,
    /// The calendar month this budget covers, 1-12.
    pub month: u8,
    /// The calendar year this budget covers.
    pub year: i32,
    /// The total of matching expense transactions for the budget's month.
    pub spent: f64,
}

/// A budget that has not been inserted into the database yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBudget {
    /// The ID of the owning user.
    pub user_id: UserID,
    /// The category this budget applies to.
    pub category: String,
    /// The budgeted ceiling.
    pub amount: f64,
    /// The calendar month this budget covers, 1-12.
    pub month: u8,
    /// The calendar year this budget covers.
    pub year: i32,
    /// The seeded spent total, computed before insertion.
    pub spent: f64,
}
