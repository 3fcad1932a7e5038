//! Transaction management: the CRUD operations, monthly analytics, and
//! their HTTP endpoints.

mod core;
pub mod endpoints;

pub use core::{
    Analytics, TransactionListRequest, TransactionPage, create_transaction, delete_transaction,
    get_analytics, list_transactions, update_transaction,
};
