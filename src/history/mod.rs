//! Budget archival and history: the one-way archive operation, the history
//! query with its fallback derivation, and their HTTP endpoints.

mod core;
mod derive;
pub mod endpoints;

pub use core::{HistoryPage, HistoryRequest, archive_budget, get_history};
pub use derive::derive_history;
