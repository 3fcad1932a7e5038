//! The API endpoint URIs.

/// The route for registering a new user.
pub const REGISTER: &str = "/api/auth/register";
/// The route for signing in a user.
pub const LOGIN: &str = "/api/auth/login";
/// The route to list and create transactions.
pub const TRANSACTIONS: &str = "/api/transactions";
/// The route for the monthly analytics summary.
pub const TRANSACTION_ANALYTICS: &str = "/api/transactions/analytics";
/// The route to get, update, or delete a single transaction.
pub const TRANSACTION: &str = "/api/transactions/{transaction_id}";
/// The route to list and create budgets.
pub const BUDGETS: &str = "/api/budgets";
/// The route to query the budget history.
pub const BUDGET_HISTORY: &str = "/api/budgets/history";
/// The route to get, update, or delete a single budget.
pub const BUDGET: &str = "/api/budgets/{budget_id}";
/// The route to archive a budget into history.
pub const BUDGET_ARCHIVE: &str = "/api/budgets/{budget_id}/archive";
