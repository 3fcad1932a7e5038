//! The HTTP endpoints for managing budgets.

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
    budget::{create_budget, delete_budget, list_budgets, update_budget},
    models::DatabaseID,
    period::{PeriodFilter, PeriodParams},
    response,
    stores::BudgetStore,
};

/// The request body for creating a budget.
///
/// Every field is optional at the wire level so that a missing field
/// produces the API's own validation message rather than a deserialization
/// rejection.
#[derive(Debug, Deserialize)]
pub struct CreateBudgetRequest {
    /// The category the budget applies to.
    pub category: Option<String>,
    /// The budgeted ceiling.
    pub amount: Option<f64>,
    /// The calendar month, 1-12.
    pub month: Option<i64>,
    /// The four digit year.
    pub year: Option<i32>,
}

/// The request body for updating a budget. Only the amount can change.
#[derive(Debug, Deserialize)]
pub struct UpdateBudgetRequest {
    /// The new budgeted ceiling.
    pub amount: Option<f64>,
}

/// Handler for creating a budget.
pub async fn create(
    State(mut state): State<AppState>,
    claims: Claims,
    Json(request): Json<CreateBudgetRequest>,
) -> Result<impl IntoResponse, Error> {
    let (Some(category), Some(amount), Some(month), Some(year)) =
        (request.category, request.amount, request.month, request.year)
    else {
        return Err(Error::Validation(
            "Please provide category, amount, month, and year".to_owned(),
        ));
    };

    // Out-of-range months fall through to the calendar validation.
    let month = u8::try_from(month).unwrap_or(0);

    let transaction_store = state.transaction_store().clone();
    let budget = create_budget(
        state.budget_store_mut(),
        &transaction_store,
        claims.user_id(),
        category,
        amount,
        month,
        year,
    )?;

    Ok(response::created(budget))
}

/// Handler for listing budgets.
///
/// Without a period filter the current calendar month is used, so the
/// default view is "this month's budgets".
pub async fn get_all(
    State(state): State<AppState>,
    claims: Claims,
    Query(params): Query<PeriodParams>,
) -> Result<impl IntoResponse, Error> {
    let filter = params.filter()?.unwrap_or_else(|| {
        let today = OffsetDateTime::now_utc().date();

        PeriodFilter::Month {
            month: u8::from(today.month()),
            year: today.year(),
        }
    });

    let budgets = list_budgets(state.budget_store(), claims.user_id(), Some(filter))?;

    Ok(response::list(None, budgets))
}

/// Handler for retrieving a single budget.
pub async fn get(
    State(state): State<AppState>,
    claims: Claims,
    Path(budget_id): Path<DatabaseID>,
) -> Result<impl IntoResponse, Error> {
    let budget = state.budget_store().get(claims.user_id(), budget_id)?;

    Ok(response::record(budget))
}

/// Handler for updating a budget's amount.
pub async fn update(
    State(mut state): State<AppState>,
    claims: Claims,
    Path(budget_id): Path<DatabaseID>,
    Json(request): Json<UpdateBudgetRequest>,
) -> Result<impl IntoResponse, Error> {
    let transaction_store = state.transaction_store().clone();
    let budget = update_budget(
        state.budget_store_mut(),
        &transaction_store,
        claims.user_id(),
        budget_id,
        request.amount,
    )?;

    Ok(response::record(budget))
}

/// Handler for deleting a budget.
pub async fn delete(
    State(mut state): State<AppState>,
    claims: Claims,
    Path(budget_id): Path<DatabaseID>,
) -> Result<impl IntoResponse, Error> {
    delete_budget(state.budget_store_mut(), claims.user_id(), budget_id)?;

    Ok(response::message("Budget deleted successfully"))
}
