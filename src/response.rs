//! The JSON response envelope shared by every API endpoint.
//!
//! Every response carries a `success` flag; successful responses carry a
//! `data` payload and, for lists, `count` and `total`; failures carry a
//! `message` string.

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;

/// A successful response wrapping a single record.
#[derive(Debug, Serialize)]
pub struct RecordBody<T> {
    /// Always true.
    pub success: bool,
    /// The record payload.
    pub data: T,
}

/// A successful response wrapping a list of records.
#[derive(Debug, Serialize)]
pub struct ListBody<T> {
    /// Always true.
    pub success: bool,
    /// The number of records in `data`.
    pub count: usize,
    /// The number of records matching the filter ignoring pagination.
    /// Omitted for endpoints that do not paginate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
    /// The record payloads.
    pub data: Vec<T>,
}

/// A successful response carrying only a confirmation message.
#[derive(Debug, Serialize)]
pub struct MessageBody {
    /// Always true.
    pub success: bool,
    /// A human readable confirmation.
    pub message: String,
}

/// A failure response carrying a client-facing message.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Always false.
    pub success: bool,
    /// A human readable description of what went wrong.
    pub message: String,
}

impl ErrorBody {
    /// Wrap a client-facing error message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Respond 200 with a single record.
pub fn record<T: Serialize>(data: T) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(RecordBody {
            success: true,
            data,
        }),
    )
}

/// Respond 201 with the newly created record.
pub fn created<T: Serialize>(data: T) -> impl IntoResponse {
    (
        StatusCode::CREATED,
        Json(RecordBody {
            success: true,
            data,
        }),
    )
}

/// Respond 200 with a list of records and its counts.
pub fn list<T: Serialize>(total: Option<usize>, data: Vec<T>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(ListBody {
            success: true,
            count: data.len(),
            total,
            data,
        }),
    )
}

/// Respond 200 with a confirmation message.
pub fn message(message: impl Into<String>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(MessageBody {
            success: true,
            message: message.into(),
        }),
    )
}
