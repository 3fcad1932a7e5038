//! This module defines the domain data types.

pub use budget::{Budget, NewBudget};
pub use history::{BudgetHistory, BudgetStatus, HistoryView, NewBudgetHistory, utilization_percentage};
pub use transaction::{Transaction, TransactionBuilder, TransactionType};
pub use user::{NewUser, User, UserID};

mod budget;
mod history;
mod transaction;
mod user;

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseID = i64;
