//! Contains traits and implementations for objects that store the domain
//! [models](crate::models).

mod budget;
mod history;
mod transaction;
mod user;

pub mod sqlite;

pub use budget::{BudgetQuery, BudgetStore};
pub use history::{BudgetHistoryStore, HistoryQuery};
pub use transaction::{SortOrder, TransactionQuery, TransactionStore, TransactionUpdate};
pub use user::UserStore;
