//! Budget management: the spent aggregator, the entity operations, and
//! their HTTP endpoints.

mod aggregator;
mod core;
pub mod endpoints;

pub use aggregator::compute_spent;
pub use core::{create_budget, delete_budget, list_budgets, update_budget};
