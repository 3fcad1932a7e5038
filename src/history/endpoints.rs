//! The HTTP endpoints for archiving budgets and querying history.

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use time::Date;

use crate::{
    AppState, Error,
    auth::Claims,
    history::{HistoryRequest, archive_budget, get_history},
    models::DatabaseID,
    period::PeriodParams,
    response,
    stores::HistoryQuery,
};

/// The query parameters accepted by the history endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryParams {
    /// The calendar month, 1-12.
    pub month: Option<u8>,
    /// The four digit year.
    pub year: Option<i32>,
    /// The first date of a range filter.
    pub start_date: Option<Date>,
    /// The last date of a range filter.
    pub end_date: Option<Date>,
    /// Include only records for this category.
    pub category: Option<String>,
    /// The page size, defaulting to 50.
    pub limit: Option<u64>,
    /// The number of matching records to skip over.
    pub skip: Option<u64>,
}

/// Handler for archiving a budget into history.
pub async fn archive(
    State(mut state): State<AppState>,
    claims: Claims,
    Path(budget_id): Path<DatabaseID>,
) -> Result<impl IntoResponse, Error> {
    let budget_store = state.budget_store().clone();
    archive_budget(
        &budget_store,
        state.history_store_mut(),
        claims.user_id(),
        budget_id,
    )?;

    Ok(response::message("Budget archived successfully"))
}

/// Handler for querying the budget history.
pub async fn get_all(
    State(state): State<AppState>,
    claims: Claims,
    Query(params): Query<HistoryParams>,
) -> Result<impl IntoResponse, Error> {
    let filter = PeriodParams {
        month: params.month,
        year: params.year,
        start_date: params.start_date,
        end_date: params.end_date,
    }
    .filter()?;

    let page = get_history(
        state.history_store(),
        state.budget_store(),
        state.transaction_store(),
        claims.user_id(),
        HistoryRequest {
            filter,
            category: params.category,
            limit: params.limit.unwrap_or(HistoryQuery::DEFAULT_LIMIT),
            skip: params.skip.unwrap_or(0),
        },
    )?;

    Ok(response::list(Some(page.total), page.entries))
}
