//! Implements a SQLite backed user store.

use std::sync::{Arc, Mutex};

use rusqlite::{Connection, Row, params};

use crate::{
    Error,
    db::{CreateTable, MapRow},
    models::{NewUser, User, UserID},
    stores::UserStore,
};

/// Stores user accounts in a SQLite database.
#[derive(Debug, Clone)]
pub struct SQLiteUserStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteUserStore {
    /// Create a new store for the SQLite `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

const COLUMNS: &str = "id, email, password_hash";

impl UserStore for SQLiteUserStore {
    /// Create a new user in the database.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::DuplicateEmail] if `email` is already registered,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn create(&mut self, user: NewUser) -> Result<User, Error> {
        self.connection
            .lock()
            .map_err(|_| Error::DatabaseLock)?
            .prepare(&format!(
                "INSERT INTO user (email, password_hash) VALUES (?1, ?2) RETURNING {COLUMNS}"
            ))?
            .query_row(params![user.email, user.password_hash], Self::map_row)
            .map_err(|error| match error {
                // Code 2067 occurs when a UNIQUE constraint failed.
                rusqlite::Error::SqliteFailure(sql_error, Some(_))
                    if sql_error.extended_code == 2067 =>
                {
                    Error::DuplicateEmail
                }
                error => error.into(),
            })
    }

    /// Get the user registered with `email`.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NotFound] if no user has that email,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn get_by_email(&self, email: &str) -> Result<User, Error> {
        self.connection
            .lock()
            .map_err(|_| Error::DatabaseLock)?
            .prepare(&format!("SELECT {COLUMNS} FROM user WHERE email = ?1"))?
            .query_row(params![email], Self::map_row)
            .map_err(Error::from)
    }

    /// Get the user with `id`.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NotFound] if no user has that ID,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn get(&self, id: UserID) -> Result<User, Error> {
        self.connection
            .lock()
            .map_err(|_| Error::DatabaseLock)?
            .prepare(&format!("SELECT {COLUMNS} FROM user WHERE id = ?1"))?
            .query_row(params![id.as_i64()], Self::map_row)
            .map_err(Error::from)
    }
}

impl CreateTable for SQLiteUserStore {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS user (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    email TEXT UNIQUE NOT NULL,
                    password_hash TEXT NOT NULL
                    )",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for SQLiteUserStore {
    type ReturnType = User;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error> {
        Ok(User {
            id: UserID::new(row.get(offset)?),
            email: row.get(offset + 1)?,
            password_hash: row.get(offset + 2)?,
        })
    }
}
