//! The HTTP endpoints for managing transactions.

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    auth::Claims,
    models::{DatabaseID, TransactionType},
    response,
    stores::{TransactionStore, TransactionUpdate},
    transaction::{
        TransactionListRequest, create_transaction, delete_transaction, get_analytics,
        list_transactions, update_transaction,
    },
};

/// The request body for creating a transaction.
///
/// The required fields are optional at the wire level so that a missing
/// field produces the API's own validation message rather than a
/// deserialization rejection.
#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
    /// Whether the transaction is income or an expense.
    #[serde(rename = "type")]
    pub transaction_type: Option<TransactionType>,
    /// The category the transaction belongs to.
    pub category: Option<String>,
    /// The amount of money earned or spent.
    pub amount: Option<f64>,
    /// A text description, defaulting to empty.
    pub description: Option<String>,
    /// When the transaction happened, defaulting to now.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub date: Option<OffsetDateTime>,
}

/// The request body for updating a transaction. Unset fields keep their
/// current value.
#[derive(Debug, Deserialize)]
pub struct UpdateTransactionRequest {
    /// Change the transaction type.
    #[serde(rename = "type")]
    pub transaction_type: Option<TransactionType>,
    /// Change the category.
    pub category: Option<String>,
    /// Change the amount.
    pub amount: Option<f64>,
    /// Change the description.
    pub description: Option<String>,
    /// Change when the transaction happened.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub date: Option<OffsetDateTime>,
}

/// The query parameters accepted by the transaction list endpoint.
#[derive(Debug, Deserialize)]
pub struct ListTransactionsParams {
    /// Include only transactions of this type.
    #[serde(rename = "type")]
    pub transaction_type: Option<TransactionType>,
    /// Include only transactions with this category.
    pub category: Option<String>,
    /// Include only transactions within this calendar month.
    pub month: Option<u8>,
    /// The year of the calendar month filter.
    pub year: Option<i32>,
    /// The page size, defaulting to 50.
    pub limit: Option<u64>,
    /// The number of matching transactions to skip over.
    pub skip: Option<u64>,
}

/// The query parameters accepted by the analytics endpoint.
#[derive(Debug, Deserialize)]
pub struct AnalyticsParams {
    /// The calendar month, defaulting to the current month.
    pub month: Option<u8>,
    /// The four digit year, defaulting to the current year.
    pub year: Option<i32>,
}

/// Handler for creating a transaction.
pub async fn create(
    State(mut state): State<AppState>,
    claims: Claims,
    Json(request): Json<CreateTransactionRequest>,
) -> Result<impl IntoResponse, Error> {
    let (Some(transaction_type), Some(category), Some(amount)) =
        (request.transaction_type, request.category, request.amount)
    else {
        return Err(Error::Validation(
            "Please provide type, category, and amount".to_owned(),
        ));
    };

    let transaction = create_transaction(
        state.transaction_store_mut(),
        claims.user_id(),
        transaction_type,
        category,
        amount,
        request.description,
        request.date,
    )?;

    Ok(response::created(transaction))
}

/// Handler for listing transactions, newest first.
pub async fn get_all(
    State(state): State<AppState>,
    claims: Claims,
    Query(params): Query<ListTransactionsParams>,
) -> Result<impl IntoResponse, Error> {
    let page = list_transactions(
        state.transaction_store(),
        claims.user_id(),
        TransactionListRequest {
            transaction_type: params.transaction_type,
            category: params.category,
            month: params.month,
            year: params.year,
            limit: params.limit,
            skip: params.skip,
        },
    )?;

    Ok(response::list(Some(page.total), page.entries))
}

/// Handler for retrieving a single transaction.
pub async fn get(
    State(state): State<AppState>,
    claims: Claims,
    Path(transaction_id): Path<DatabaseID>,
) -> Result<impl IntoResponse, Error> {
    let transaction = state
        .transaction_store()
        .get(claims.user_id(), transaction_id)?;

    Ok(response::record(transaction))
}

/// Handler for updating a transaction.
pub async fn update(
    State(mut state): State<AppState>,
    claims: Claims,
    Path(transaction_id): Path<DatabaseID>,
    Json(request): Json<UpdateTransactionRequest>,
) -> Result<impl IntoResponse, Error> {
    let transaction = update_transaction(
        state.transaction_store_mut(),
        claims.user_id(),
        transaction_id,
        TransactionUpdate {
            transaction_type: request.transaction_type,
            category: request.category,
            amount: request.amount,
            description: request.description,
            date: request.date,
        },
    )?;

    Ok(response::record(transaction))
}

/// Handler for deleting a transaction.
pub async fn delete(
    State(mut state): State<AppState>,
    claims: Claims,
    Path(transaction_id): Path<DatabaseID>,
) -> Result<impl IntoResponse, Error> {
    delete_transaction(state.transaction_store_mut(), claims.user_id(), transaction_id)?;

    Ok(response::message("Transaction deleted successfully"))
}

/// Handler for the monthly analytics summary.
pub async fn analytics(
    State(state): State<AppState>,
    claims: Claims,
    Query(params): Query<AnalyticsParams>,
) -> Result<impl IntoResponse, Error> {
    let analytics = get_analytics(
        state.transaction_store(),
        claims.user_id(),
        params.month,
        params.year,
    )?;

    Ok(response::record(analytics))
}
