/*! This module defines and implements traits for interacting with the application's database. */

use rusqlite::{Connection, Error, Row};

use crate::stores::sqlite::{
    SQLiteBudgetHistoryStore, SQLiteBudgetStore, SQLiteTransactionStore, SQLiteUserStore,
};

/// A trait for adding an object schema to a database.
pub trait CreateTable {
    /// Create a table for the model.
    ///
    /// # Errors
    /// Returns an error if there is an SQL error.
    fn create_table(connection: &Connection) -> Result<(), Error>;
}

/// A trait for mapping a `rusqlite::Row` from a SQLite database to a concrete rust type.
pub trait MapRow {
    /// The type to map the row to.
    type ReturnType;

    /// Convert a row into a concrete type, assuming the row's columns start
    /// at the first column.
    ///
    /// # Errors
    /// Returns an error if the row does not contain the expected column
    /// names and types.
    fn map_row(row: &Row) -> Result<Self::ReturnType, Error> {
        Self::map_row_with_offset(row, 0)
    }

    /// Convert a row into a concrete type, with the row's columns starting
    /// at `offset`.
    ///
    /// # Errors
    /// Returns an error if the row does not contain the expected column
    /// names and types.
    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, Error>;
}

/// Create the tables for all domain models.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;

    SQLiteUserStore::create_table(connection)?;
    SQLiteTransactionStore::create_table(connection)?;
    SQLiteBudgetStore::create_table(connection)?;
    SQLiteBudgetHistoryStore::create_table(connection)?;

    Ok(())
}

#[cfg(test)]
mod initialize_tests {
    use rusqlite::Connection;

    use super::initialize;

    #[test]
    fn initialize_creates_all_tables() {
        let connection =
            Connection::open_in_memory().expect("Could not initialise in-memory SQLite database");

        assert_eq!(Ok(()), initialize(&connection));

        let count: i64 = connection
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master
                 WHERE type = 'table'
                 AND name IN ('user', 'transaction', 'budget', 'budget_history')",
                [],
                |row| row.get(0),
            )
            .unwrap();

        assert_eq!(count, 4);
    }
}
