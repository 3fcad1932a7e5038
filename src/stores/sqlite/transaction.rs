//! Implements a SQLite backed transaction store.

use std::sync::{Arc, Mutex};

use rusqlite::{Connection, Row, params, params_from_iter, types::Value};

use crate::{
    Error,
    db::{CreateTable, MapRow},
    models::{DatabaseID, Transaction, TransactionBuilder, UserID},
    stores::{
        TransactionStore,
        sqlite::{datetime_from_sql, datetime_to_sql},
        transaction::{SortOrder, TransactionQuery, TransactionUpdate},
    },
};

/// Stores transactions in a SQLite database.
///
/// Note that because a transaction depends on the [User](crate::models::User)
/// model, the user table must be set up in the database.
#[derive(Debug, Clone)]
pub struct SQLiteTransactionStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteTransactionStore {
    /// Create a new store for the SQLite `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }

    fn build_where(query: &TransactionQuery) -> (Vec<String>, Vec<Value>) {
        let mut where_clause_parts = vec![];
        let mut query_parameters = vec![];

        where_clause_parts.push(format!("user_id = ?{}", query_parameters.len() + 1));
        query_parameters.push(Value::Integer(query.user_id.as_i64()));

        if let Some(transaction_type) = query.transaction_type {
            where_clause_parts.push(format!("type = ?{}", query_parameters.len() + 1));
            query_parameters.push(Value::Text(transaction_type.as_str().to_owned()));
        }

        if let Some(category) = &query.category {
            where_clause_parts.push(format!("category = ?{}", query_parameters.len() + 1));
            query_parameters.push(Value::Text(category.clone()));
        }

        if let Some(categories) = &query.categories {
            if categories.is_empty() {
                // An empty category set matches nothing.
                where_clause_parts.push("0 = 1".to_owned());
            } else {
                let placeholders = categories
                    .iter()
                    .enumerate()
                    .map(|(index, _)| format!("?{}", query_parameters.len() + index + 1))
                    .collect::<Vec<_>>()
                    .join(", ");
                where_clause_parts.push(format!("category IN ({placeholders})"));
                query_parameters.extend(categories.iter().cloned().map(Value::Text));
            }
        }

        if let Some(date_range) = &query.date_range {
            where_clause_parts.push(format!(
                "date BETWEEN ?{} AND ?{}",
                query_parameters.len() + 1,
                query_parameters.len() + 2,
            ));
            query_parameters.push(Value::Text(datetime_to_sql(date_range.start)));
            query_parameters.push(Value::Text(datetime_to_sql(date_range.end)));
        }

        (where_clause_parts, query_parameters)
    }
}

const COLUMNS: &str = "id, user_id, type, category, amount, description, date";

impl TransactionStore for SQLiteTransactionStore {
    /// Create a new transaction in the database.
    ///
    /// # Errors
    /// Returns an [Error::SqlError] if there is an unexpected SQL error.
    fn create(&mut self, builder: TransactionBuilder) -> Result<Transaction, Error> {
        let connection = self.connection.lock().map_err(|_| Error::DatabaseLock)?;

        let transaction = connection
            .prepare(&format!(
                "INSERT INTO \"transaction\" (user_id, type, category, amount, description, date)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 RETURNING {COLUMNS}"
            ))?
            .query_row(
                params![
                    builder.user_id.as_i64(),
                    builder.transaction_type,
                    builder.category,
                    builder.amount,
                    builder.description,
                    datetime_to_sql(builder.date),
                ],
                Self::map_row,
            )?;

        Ok(transaction)
    }

    /// Retrieve a transaction in the database by its `id`, scoped to the
    /// owning user.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::TransactionNotFound] if `id` does not refer to a transaction
    ///   owned by `user_id`,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn get(&self, user_id: UserID, id: DatabaseID) -> Result<Transaction, Error> {
        self.connection
            .lock()
            .map_err(|_| Error::DatabaseLock)?
            .prepare(&format!(
                "SELECT {COLUMNS} FROM \"transaction\" WHERE id = ?1 AND user_id = ?2"
            ))?
            .query_row(params![id, user_id.as_i64()], Self::map_row)
            .map_err(|error| match error {
                rusqlite::Error::QueryReturnedNoRows => Error::TransactionNotFound,
                error => error.into(),
            })
    }

    /// Apply the set fields of `update` to a transaction owned by `user_id`.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::TransactionNotFound] if `id` does not refer to a transaction
    ///   owned by `user_id`,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn update(
        &mut self,
        user_id: UserID,
        id: DatabaseID,
        update: TransactionUpdate,
    ) -> Result<Transaction, Error> {
        let mut transaction = self.get(user_id, id)?;

        if let Some(transaction_type) = update.transaction_type {
            transaction.transaction_type = transaction_type;
        }
        if let Some(category) = update.category {
            transaction.category = category;
        }
        if let Some(amount) = update.amount {
            transaction.amount = amount;
        }
        if let Some(description) = update.description {
            transaction.description = description;
        }
        if let Some(date) = update.date {
            transaction.date = date.to_offset(time::UtcOffset::UTC);
        }

        let rows_affected = self
            .connection
            .lock()
            .map_err(|_| Error::DatabaseLock)?
            .execute(
                "UPDATE \"transaction\"
                 SET type = ?1, category = ?2, amount = ?3, description = ?4, date = ?5
                 WHERE id = ?6 AND user_id = ?7",
                params![
                    transaction.transaction_type,
                    transaction.category,
                    transaction.amount,
                    transaction.description,
                    datetime_to_sql(transaction.date),
                    id,
                    user_id.as_i64(),
                ],
            )?;

        if rows_affected == 0 {
            return Err(Error::TransactionNotFound);
        }

        Ok(transaction)
    }

    /// Remove a transaction owned by `user_id` from the database.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::TransactionNotFound] if `id` does not refer to a transaction
    ///   owned by `user_id`,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn delete(&mut self, user_id: UserID, id: DatabaseID) -> Result<(), Error> {
        let rows_affected = self
            .connection
            .lock()
            .map_err(|_| Error::DatabaseLock)?
            .execute(
                "DELETE FROM \"transaction\" WHERE id = ?1 AND user_id = ?2",
                params![id, user_id.as_i64()],
            )?;

        if rows_affected == 0 {
            return Err(Error::TransactionNotFound);
        }

        Ok(())
    }

    /// Query for transactions in the database.
    ///
    /// # Errors
    /// This function will return an [Error::SqlError] if there is a SQL error.
    fn get_query(&self, query: TransactionQuery) -> Result<Vec<Transaction>, Error> {
        let (where_clause_parts, query_parameters) = Self::build_where(&query);

        let mut query_string_parts = vec![
            format!("SELECT {COLUMNS} FROM \"transaction\""),
            String::from("WHERE ") + &where_clause_parts.join(" AND "),
        ];

        match query.sort_date {
            Some(SortOrder::Ascending) => query_string_parts.push("ORDER BY date ASC".to_owned()),
            Some(SortOrder::Descending) => query_string_parts.push("ORDER BY date DESC".to_owned()),
            None => {}
        }

        if let Some(limit) = query.limit {
            query_string_parts.push(format!("LIMIT {limit} OFFSET {}", query.skip));
        } else if query.skip > 0 {
            query_string_parts.push(format!("LIMIT -1 OFFSET {}", query.skip));
        }

        let query_string = query_string_parts.join(" ");
        let params = params_from_iter(query_parameters.iter());

        self.connection
            .lock()
            .map_err(|_| Error::DatabaseLock)?
            .prepare(&query_string)?
            .query_map(params, Self::map_row)?
            .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
            .collect()
    }

    /// Get the number of transactions matching `query`, ignoring pagination.
    ///
    /// # Errors
    /// This function will return an [Error::SqlError] if there is a SQL error.
    fn count(&self, query: &TransactionQuery) -> Result<usize, Error> {
        let (where_clause_parts, query_parameters) = Self::build_where(query);

        let query_string = format!(
            "SELECT COUNT(id) FROM \"transaction\" WHERE {}",
            where_clause_parts.join(" AND ")
        );

        let count: i64 = self
            .connection
            .lock()
            .map_err(|_| Error::DatabaseLock)?
            .query_row(
                &query_string,
                params_from_iter(query_parameters.iter()),
                |row| row.get(0),
            )?;

        Ok(usize::try_from(count).unwrap_or(0))
    }
}

impl CreateTable for SQLiteTransactionStore {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS \"transaction\" (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id INTEGER NOT NULL,
                    type TEXT NOT NULL,
                    category TEXT NOT NULL,
                    amount REAL NOT NULL,
                    description TEXT NOT NULL,
                    date TEXT NOT NULL,
                    FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                    )",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for SQLiteTransactionStore {
    type ReturnType = Transaction;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error> {
        let date_text: String = row.get(offset + 6)?;

        Ok(Transaction {
            id: row.get(offset)?,
            user_id: UserID::new(row.get(offset + 1)?),
            transaction_type: row.get(offset + 2)?,
            category: row.get(offset + 3)?,
            amount: row.get(offset + 4)?,
            description: row.get(offset + 5)?,
            date: datetime_from_sql(offset + 6, &date_text)?,
        })
    }
}
