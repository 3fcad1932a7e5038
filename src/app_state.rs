//! Defines the state shared between route handlers: the SQLite stores and
//! the JWT signing keys.

use std::sync::{Arc, Mutex};

use jsonwebtoken::{DecodingKey, EncodingKey};
use rusqlite::Connection;

use crate::{
    Error,
    db::initialize,
    stores::sqlite::{
        SQLiteBudgetHistoryStore, SQLiteBudgetStore, SQLiteTransactionStore, SQLiteUserStore,
    },
};

/// The state shared between all route handlers.
///
/// The stores share a single SQLite connection behind a mutex, so cloning
/// the state (as axum does per request) is cheap.
#[derive(Clone)]
pub struct AppState {
    budget_store: SQLiteBudgetStore,
    history_store: SQLiteBudgetHistoryStore,
    transaction_store: SQLiteTransactionStore,
    user_store: SQLiteUserStore,
    encoding_key: Arc<EncodingKey>,
    decoding_key: Arc<DecodingKey>,
}

impl AppState {
    /// Create the application state from a SQLite connection and the JWT
    /// signing secret, creating the database tables if needed.
    ///
    /// # Errors
    /// Returns an [Error::SqlError] if the tables could not be created.
    pub fn new(connection: Connection, jwt_secret: String) -> Result<Self, Error> {
        initialize(&connection)?;

        let connection = Arc::new(Mutex::new(connection));

        Ok(Self {
            budget_store: SQLiteBudgetStore::new(connection.clone()),
            history_store: SQLiteBudgetHistoryStore::new(connection.clone()),
            transaction_store: SQLiteTransactionStore::new(connection.clone()),
            user_store: SQLiteUserStore::new(connection),
            encoding_key: Arc::new(EncodingKey::from_secret(jwt_secret.as_bytes())),
            decoding_key: Arc::new(DecodingKey::from_secret(jwt_secret.as_bytes())),
        })
    }

    /// The store for live budgets.
    pub fn budget_store(&self) -> &SQLiteBudgetStore {
        &self.budget_store
    }

    /// The store for live budgets, for operations that write.
    pub fn budget_store_mut(&mut self) -> &mut SQLiteBudgetStore {
        &mut self.budget_store
    }

    /// The store for archived budget snapshots.
    pub fn history_store(&self) -> &SQLiteBudgetHistoryStore {
        &self.history_store
    }

    /// The store for archived budget snapshots, for operations that write.
    pub fn history_store_mut(&mut self) -> &mut SQLiteBudgetHistoryStore {
        &mut self.history_store
    }

    /// The store for transactions.
    pub fn transaction_store(&self) -> &SQLiteTransactionStore {
        &self.transaction_store
    }

    /// The store for transactions, for operations that write.
    pub fn transaction_store_mut(&mut self) -> &mut SQLiteTransactionStore {
        &mut self.transaction_store
    }

    /// The store for user accounts.
    pub fn user_store(&self) -> &SQLiteUserStore {
        &self.user_store
    }

    /// The store for user accounts, for operations that write.
    pub fn user_store_mut(&mut self) -> &mut SQLiteUserStore {
        &mut self.user_store
    }

    /// The key used to sign tokens.
    pub fn encoding_key(&self) -> &EncodingKey {
        &self.encoding_key
    }

    /// The key used to validate tokens.
    pub fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }
}
