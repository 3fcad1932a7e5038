//! Implements a SQLite backed budget store.

use std::sync::{Arc, Mutex};

use rusqlite::{Connection, Row, params, params_from_iter, types::Value};

use crate::{
    Error,
    db::{CreateTable, MapRow},
    models::{Budget, DatabaseID, NewBudget, UserID},
    stores::{
        BudgetStore,
        budget::BudgetQuery,
        sqlite::push_period_clauses,
    },
};

/// Stores budgets in a SQLite database.
///
/// The table carries a unique index over `(user_id, category, month, year)`;
/// the store surfaces violations as [Error::DuplicateBudget].
#[derive(Debug, Clone)]
pub struct SQLiteBudgetStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteBudgetStore {
    /// Create a new store for the SQLite `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

const COLUMNS: &str = "id, user_id, category, amount, month, year, spent";

impl BudgetStore for SQLiteBudgetStore {
    /// Create a new budget in the database.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::DuplicateBudget] if a budget already exists for the same
    ///   `(user, category, month, year)`,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn create(&mut self, budget: NewBudget) -> Result<Budget, Error> {
        let connection = self.connection.lock().map_err(|_| Error::DatabaseLock)?;

        let budget = connection
            .prepare(&format!(
                "INSERT INTO budget (user_id, category, amount, month, year, spent)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 RETURNING {COLUMNS}"
            ))?
            .query_row(
                params![
                    budget.user_id.as_i64(),
                    budget.category,
                    budget.amount,
                    budget.month,
                    budget.year,
                    budget.spent,
                ],
                Self::map_row,
            )
            .map_err(|error| match error {
                // Code 2067 occurs when a UNIQUE constraint failed, here the
                // index over (user_id, category, month, year).
                rusqlite::Error::SqliteFailure(sql_error, Some(_))
                    if sql_error.extended_code == 2067 =>
                {
                    Error::DuplicateBudget
                }
                error => error.into(),
            })?;

        Ok(budget)
    }

    /// Retrieve a budget in the database by its `id`, scoped to the owning
    /// user.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::BudgetNotFound] if `id` does not refer to a budget owned by
    ///   `user_id`,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn get(&self, user_id: UserID, id: DatabaseID) -> Result<Budget, Error> {
        self.connection
            .lock()
            .map_err(|_| Error::DatabaseLock)?
            .prepare(&format!(
                "SELECT {COLUMNS} FROM budget WHERE id = ?1 AND user_id = ?2"
            ))?
            .query_row(params![id, user_id.as_i64()], Self::map_row)
            .map_err(|error| match error {
                rusqlite::Error::QueryReturnedNoRows => Error::BudgetNotFound,
                error => error.into(),
            })
    }

    /// Persist the `amount` and `spent` fields of `budget`.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::BudgetNotFound] if the budget no longer exists,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn update(&mut self, budget: &Budget) -> Result<(), Error> {
        let rows_affected = self
            .connection
            .lock()
            .map_err(|_| Error::DatabaseLock)?
            .execute(
                "UPDATE budget SET amount = ?1, spent = ?2 WHERE id = ?3 AND user_id = ?4",
                params![
                    budget.amount,
                    budget.spent,
                    budget.id,
                    budget.user_id.as_i64()
                ],
            )?;

        if rows_affected == 0 {
            return Err(Error::BudgetNotFound);
        }

        Ok(())
    }

    /// Remove a budget owned by `user_id` from the database.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::BudgetNotFound] if `id` does not refer to a budget owned by
    ///   `user_id`,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn delete(&mut self, user_id: UserID, id: DatabaseID) -> Result<(), Error> {
        let rows_affected = self
            .connection
            .lock()
            .map_err(|_| Error::DatabaseLock)?
            .execute(
                "DELETE FROM budget WHERE id = ?1 AND user_id = ?2",
                params![id, user_id.as_i64()],
            )?;

        if rows_affected == 0 {
            return Err(Error::BudgetNotFound);
        }

        Ok(())
    }

    /// Query for budgets in the database, ordered by (year, month)
    /// ascending.
    ///
    /// # Errors
    /// This function will return an [Error::SqlError] if there is a SQL
    /// error.
    fn get_query(&self, query: BudgetQuery) -> Result<Vec<Budget>, Error> {
        let mut where_clause_parts = vec![];
        let mut query_parameters = vec![];

        where_clause_parts.push(format!("user_id = ?{}", query_parameters.len() + 1));
        query_parameters.push(Value::Integer(query.user_id.as_i64()));

        if let Some(period) = &query.period {
            push_period_clauses(period, &mut where_clause_parts, &mut query_parameters);
        }

        if let Some(category) = &query.category {
            where_clause_parts.push(format!("category = ?{}", query_parameters.len() + 1));
            query_parameters.push(Value::Text(category.clone()));
        }

        let query_string = format!(
            "SELECT {COLUMNS} FROM budget WHERE {} ORDER BY year ASC, month ASC",
            where_clause_parts.join(" AND ")
        );

        self.connection
            .lock()
            .map_err(|_| Error::DatabaseLock)?
            .prepare(&query_string)?
            .query_map(params_from_iter(query_parameters.iter()), Self::map_row)?
            .map(|maybe_budget| maybe_budget.map_err(Error::from))
            .collect()
    }
}

impl CreateTable for SQLiteBudgetStore {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS budget (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id INTEGER NOT NULL,
                    category TEXT NOT NULL,
                    amount REAL NOT NULL,
                    month INTEGER NOT NULL,
                    year INTEGER NOT NULL,
                    spent REAL NOT NULL,
                    UNIQUE(user_id, category, month, year),
                    FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                    )",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for SQLiteBudgetStore {
    type ReturnType = Budget;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error> {
        Ok(Budget {
            id: row.get(offset)?,
            user_id: UserID::new(row.get(offset + 1)?),
            category: row.get(offset + 2)?,
            amount: row.get(offset + 3)?,
            month: row.get(offset + 4)?,
            year: row.get(offset + 5)?,
            spent: row.get(offset + 6)?,
        })
    }
}

#[cfg(test)]
mod sqlite_budget_store_tests {
    use std::sync::{Arc, Mutex};

    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        db::initialize,
        models::{NewBudget, NewUser, UserID},
        period::PeriodFilter,
        stores::{
            BudgetQuery, BudgetStore, UserStore,
            sqlite::{SQLiteBudgetStore, SQLiteUserStore},
        },
    };

    fn get_store() -> (SQLiteBudgetStore, UserID) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let connection = Arc::new(Mutex::new(connection));

        let user = SQLiteUserStore::new(connection.clone())
            .create(NewUser {
                email: "test@test.com".to_owned(),
                password_hash: "hash".to_owned(),
            })
            .unwrap();

        (SQLiteBudgetStore::new(connection), user.id)
    }

    fn new_budget(user_id: UserID, category: &str, month: u8, year: i32) -> NewBudget {
        NewBudget {
            user_id,
            category: category.to_owned(),
            amount: 100.0,
            month,
            year,
            spent: 0.0,
        }
    }

    #[test]
    fn create_enforces_uniqueness_per_user_category_month_year() {
        let (mut store, user_id) = get_store();
        store
            .create(new_budget(user_id, "Food", 1, 2024))
            .unwrap();

        let duplicate = store.create(new_budget(user_id, "Food", 1, 2024));

        assert_eq!(duplicate, Err(Error::DuplicateBudget));

        // A different month, category or user is fine.
        assert!(store.create(new_budget(user_id, "Food", 2, 2024)).is_ok());
        assert!(store.create(new_budget(user_id, "Rent", 1, 2024)).is_ok());
    }

    #[test]
    fn get_scopes_to_owner() {
        let (mut store, user_id) = get_store();
        let budget = store.create(new_budget(user_id, "Food", 1, 2024)).unwrap();

        assert_eq!(store.get(user_id, budget.id), Ok(budget.clone()));
        assert_eq!(
            store.get(UserID::new(999), budget.id),
            Err(Error::BudgetNotFound)
        );
    }

    #[test]
    fn update_persists_amount_and_spent() {
        let (mut store, user_id) = get_store();
        let mut budget = store.create(new_budget(user_id, "Food", 1, 2024)).unwrap();

        budget.amount = 250.0;
        budget.spent = 80.0;
        store.update(&budget).unwrap();

        assert_eq!(store.get(user_id, budget.id), Ok(budget));
    }

    #[test]
    fn delete_fails_for_wrong_user() {
        let (mut store, user_id) = get_store();
        let budget = store.create(new_budget(user_id, "Food", 1, 2024)).unwrap();

        assert_eq!(
            store.delete(UserID::new(999), budget.id),
            Err(Error::BudgetNotFound)
        );
        assert_eq!(store.delete(user_id, budget.id), Ok(()));
    }

    #[test]
    fn get_query_filters_by_exact_month() {
        let (mut store, user_id) = get_store();
        let wanted = store.create(new_budget(user_id, "Food", 1, 2024)).unwrap();
        store.create(new_budget(user_id, "Food", 2, 2024)).unwrap();
        store.create(new_budget(user_id, "Food", 1, 2023)).unwrap();

        let mut query = BudgetQuery::new(user_id);
        query.period = Some(PeriodFilter::Month {
            month: 1,
            year: 2024,
        });

        assert_eq!(store.get_query(query), Ok(vec![wanted]));
    }

    #[test]
    fn get_query_range_within_one_year() {
        let (mut store, user_id) = get_store();
        let march = store.create(new_budget(user_id, "Food", 3, 2024)).unwrap();
        let may = store.create(new_budget(user_id, "Food", 5, 2024)).unwrap();
        store.create(new_budget(user_id, "Food", 6, 2024)).unwrap();
        store.create(new_budget(user_id, "Food", 3, 2023)).unwrap();

        let mut query = BudgetQuery::new(user_id);
        query.period = Some(PeriodFilter::Range {
            start: date!(2024 - 03 - 15),
            end: date!(2024 - 05 - 10),
        });

        assert_eq!(store.get_query(query), Ok(vec![march, may]));
    }

    #[test]
    fn get_query_range_spanning_years_uses_disjunction() {
        let (mut store, user_id) = get_store();
        // Should match: (2023, >= 11) or (2024, <= 2).
        let november = store.create(new_budget(user_id, "Food", 11, 2023)).unwrap();
        let december = store.create(new_budget(user_id, "Food", 12, 2023)).unwrap();
        let february = store.create(new_budget(user_id, "Food", 2, 2024)).unwrap();
        // Should not match.
        store.create(new_budget(user_id, "Food", 10, 2023)).unwrap();
        store.create(new_budget(user_id, "Food", 3, 2024)).unwrap();

        let mut query = BudgetQuery::new(user_id);
        query.period = Some(PeriodFilter::Range {
            start: date!(2023 - 11 - 15),
            end: date!(2024 - 02 - 10),
        });

        // Ordered by (year, month) ascending.
        assert_eq!(
            store.get_query(query),
            Ok(vec![november, december, february])
        );
    }

    #[test]
    fn get_query_filters_by_category() {
        let (mut store, user_id) = get_store();
        let food = store.create(new_budget(user_id, "Food", 1, 2024)).unwrap();
        store.create(new_budget(user_id, "Rent", 1, 2024)).unwrap();

        let mut query = BudgetQuery::new(user_id);
        query.category = Some("Food".to_owned());

        assert_eq!(store.get_query(query), Ok(vec![food]));
    }
}
