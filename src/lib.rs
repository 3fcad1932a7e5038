//! FinTrack is a personal finance tracker: users record income and expense
//! transactions, define per-category monthly budgets, and view derived
//! analytics.
//!
//! This library provides a JSON REST API. Its core is the budget
//! utilization and history engine: computing a budget's spent total from
//! raw transactions, archiving budgets into immutable history snapshots,
//! and reconstructing historical utilization on demand when no archive
//! exists.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod app_state;
pub mod auth;
pub mod budget;
pub mod db;
pub mod endpoints;
mod error;
pub mod history;
mod logging;
pub mod models;
pub mod period;
pub mod response;
mod routing;
pub mod stores;
pub mod transaction;

pub use app_state::AppState;
pub use error::Error;
pub use logging::logging_middleware;
pub use routing::build_router;

/// An async task that waits for either the ctrl+c or terminate signal,
/// whichever comes first, and then signals the server to shut down
/// gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}
