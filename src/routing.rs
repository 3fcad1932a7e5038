//! Application router configuration.

use axum::{
    Json, Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};

use crate::{
    AppState, auth, budget, endpoints, history, logging::logging_middleware, response::ErrorBody,
    transaction,
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(endpoints::REGISTER, post(auth::register))
        .route(endpoints::LOGIN, post(auth::sign_in))
        .route(
            endpoints::TRANSACTIONS,
            get(transaction::endpoints::get_all).post(transaction::endpoints::create),
        )
        .route(
            endpoints::TRANSACTION_ANALYTICS,
            get(transaction::endpoints::analytics),
        )
        .route(
            endpoints::TRANSACTION,
            get(transaction::endpoints::get)
                .put(transaction::endpoints::update)
                .delete(transaction::endpoints::delete),
        )
        .route(
            endpoints::BUDGETS,
            get(budget::endpoints::get_all).post(budget::endpoints::create),
        )
        .route(endpoints::BUDGET_HISTORY, get(history::endpoints::get_all))
        .route(
            endpoints::BUDGET,
            get(budget::endpoints::get)
                .put(budget::endpoints::update)
                .delete(budget::endpoints::delete),
        )
        .route(endpoints::BUDGET_ARCHIVE, post(history::endpoints::archive))
        .fallback(get_404_not_found)
        .layer(middleware::from_fn(logging_middleware))
        .with_state(state)
}

async fn get_404_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody::new("Route not found")),
    )
        .into_response()
}
