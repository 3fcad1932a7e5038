//! Defines the app level error type and its translation into JSON API
//! responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::response::ErrorBody;

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A required field was missing or malformed.
    ///
    /// The message is client-correctable and safe to show verbatim.
    #[error("{0}")]
    Validation(String),

    /// A budget already exists for the same (user, category, month, year).
    ///
    /// Distinguished from generic validation so clients can present
    /// "already exists" messaging.
    #[error("a budget already exists for this category and month")]
    DuplicateBudget,

    /// The email address is already registered.
    #[error("the email is already in use")]
    DuplicateEmail,

    /// The requested budget does not exist or is owned by another user.
    ///
    /// Ownership and existence failures are deliberately the same error so
    /// that the existence of other users' data is never leaked.
    #[error("the budget could not be found")]
    BudgetNotFound,

    /// The requested transaction does not exist or is owned by another user.
    #[error("the transaction could not be found")]
    TransactionNotFound,

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// Could not acquire the database lock.
    #[error("could not acquire the database lock")]
    DatabaseLock,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.contains("budget.") =>
            {
                Error::DuplicateBudget
            }
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.contains("email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Error::Validation(message) => (StatusCode::BAD_REQUEST, message.clone()),
            Error::DuplicateBudget => (
                StatusCode::BAD_REQUEST,
                "Budget already exists for this category and month".to_owned(),
            ),
            Error::DuplicateEmail => (
                StatusCode::BAD_REQUEST,
                "Email is already registered".to_owned(),
            ),
            Error::BudgetNotFound => (StatusCode::NOT_FOUND, "Budget not found".to_owned()),
            Error::TransactionNotFound => {
                (StatusCode::NOT_FOUND, "Transaction not found".to_owned())
            }
            Error::NotFound => (
                StatusCode::NOT_FOUND,
                "The requested resource could not be found".to_owned(),
            ),
            // Storage and infrastructure failures are logged server-side and
            // surfaced without internal detail.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_owned(),
                )
            }
        };

        (status, Json(ErrorBody::new(message))).into_response()
    }
}
