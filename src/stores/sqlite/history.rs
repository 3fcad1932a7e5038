//! Implements a SQLite backed budget history store.

use std::sync::{Arc, Mutex};

use rusqlite::{Connection, Row, params, params_from_iter, types::Value};

use crate::{
    Error,
    db::{CreateTable, MapRow},
    models::{BudgetHistory, DatabaseID, NewBudgetHistory, UserID},
    stores::{
        BudgetHistoryStore,
        history::HistoryQuery,
        sqlite::push_period_clauses,
    },
};

/// Stores archived budget snapshots in a SQLite database.
#[derive(Debug, Clone)]
pub struct SQLiteBudgetHistoryStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteBudgetHistoryStore {
    /// Create a new store for the SQLite `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }

    fn build_where(query: &HistoryQuery) -> (Vec<String>, Vec<Value>) {
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

        (where_clause_parts, query_parameters)
    }
}

const COLUMNS: &str =
    "id, user_id, category, budgeted_amount, spent_amount, month, year, status, utilization_percentage";

impl BudgetHistoryStore for SQLiteBudgetHistoryStore {
    /// Delete the live budget `budget_id` and insert `record` as one SQL
    /// transaction.
    ///
    /// The ownership-scoped delete runs first so that an unowned or missing
    /// budget is rejected before any snapshot row is written.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::BudgetNotFound] if `budget_id` does not refer to a budget
    ///   owned by the record's user,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn archive(
        &mut self,
        record: NewBudgetHistory,
        budget_id: DatabaseID,
    ) -> Result<BudgetHistory, Error> {
        let connection = self.connection.lock().map_err(|_| Error::DatabaseLock)?;
        let transaction = connection.unchecked_transaction()?;

        let rows_affected = transaction.execute(
            "DELETE FROM budget WHERE id = ?1 AND user_id = ?2",
            params![budget_id, record.user_id.as_i64()],
        )?;

        if rows_affected == 0 {
            // Dropping the transaction without committing rolls back the
            // delete.
            return Err(Error::BudgetNotFound);
        }

        let snapshot = {
            let mut statement = transaction.prepare(&format!(
                "INSERT INTO budget_history
                     (user_id, category, budgeted_amount, spent_amount, month, year, status, utilization_percentage)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 RETURNING {COLUMNS}"
            ))?;

            statement.query_row(
                params![
                    record.user_id.as_i64(),
                    record.category,
                    record.budgeted_amount,
                    record.spent_amount,
                    record.month,
                    record.year,
                    record.status,
                    record.utilization_percentage,
                ],
                Self::map_row,
            )?
        };

        transaction.commit()?;

        Ok(snapshot)
    }

    /// Query for history rows, ordered by (year, month) ascending.
    ///
    /// # Errors
    /// This function will return an [Error::SqlError] if there is a SQL
    /// error.
    fn get_query(&self, query: HistoryQuery) -> Result<Vec<BudgetHistory>, Error> {
        let (where_clause_parts, query_parameters) = Self::build_where(&query);

        let query_string = format!(
            "SELECT {COLUMNS} FROM budget_history WHERE {} \
             ORDER BY year ASC, month ASC LIMIT {} OFFSET {}",
            where_clause_parts.join(" AND "),
            query.limit,
            query.skip,
        );

        self.connection
            .lock()
            .map_err(|_| Error::DatabaseLock)?
            .prepare(&query_string)?
            .query_map(params_from_iter(query_parameters.iter()), Self::map_row)?
            .map(|maybe_record| maybe_record.map_err(Error::from))
            .collect()
    }

    /// The number of history rows matching `query`, ignoring pagination.
    ///
    /// # Errors
    /// This function will return an [Error::SqlError] if there is a SQL
    /// error.
    fn count(&self, query: &HistoryQuery) -> Result<usize, Error> {
        let (where_clause_parts, query_parameters) = Self::build_where(query);

        let query_string = format!(
            "SELECT COUNT(id) FROM budget_history WHERE {}",
            where_clause_parts.join(" AND ")
        );

        let count: i64 = self
            .connection
            .lock()
            .map_err(|_| Error::DatabaseLock)?
            .prepare(&query_string)?
            .query_row(params_from_iter(query_parameters.iter()), |row| {
                row.get(0)
            })?;

        Ok(usize::try_from(count).unwrap_or(0))
    }
}

impl CreateTable for SQLiteBudgetHistoryStore {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS budget_history (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id INTEGER NOT NULL,
                    category TEXT NOT NULL,
                    budgeted_amount REAL NOT NULL,
                    spent_amount REAL NOT NULL,
                    month INTEGER NOT NULL,
                    year INTEGER NOT NULL,
                    status TEXT NOT NULL,
                    utilization_percentage REAL NOT NULL,
                    FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                    )",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for SQLiteBudgetHistoryStore {
    type ReturnType = BudgetHistory;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error> {
        Ok(BudgetHistory {
            id: row.get(offset)?,
            user_id: UserID::new(row.get(offset + 1)?),
            category: row.get(offset + 2)?,
            budgeted_amount: row.get(offset + 3)?,
            spent_amount: row.get(offset + 4)?,
            month: row.get(offset + 5)?,
            year: row.get(offset + 6)?,
            status: row.get(offset + 7)?,
            utilization_percentage: row.get(offset + 8)?,
        })
    }
}

#[cfg(test)]
mod sqlite_history_store_tests {
    use std::sync::{Arc, Mutex};

    use rusqlite::Connection;

    use crate::{
        Error,
        db::initialize,
        models::{BudgetStatus, NewBudget, NewBudgetHistory, NewUser, UserID},
        period::PeriodFilter,
        stores::{
            BudgetHistoryStore, BudgetStore, HistoryQuery, UserStore,
            sqlite::{SQLiteBudgetHistoryStore, SQLiteBudgetStore, SQLiteUserStore},
        },
    };

    fn get_stores() -> (SQLiteBudgetHistoryStore, SQLiteBudgetStore, UserID) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let connection = Arc::new(Mutex::new(connection));

        let user = SQLiteUserStore::new(connection.clone())
            .create(NewUser {
                email: "test@test.com".to_owned(),
                password_hash: "hash".to_owned(),
            })
            .unwrap();

        (
            SQLiteBudgetHistoryStore::new(connection.clone()),
            SQLiteBudgetStore::new(connection),
            user.id,
        )
    }

    fn new_record(user_id: UserID, category: &str, month: u8, year: i32) -> NewBudgetHistory {
        NewBudgetHistory {
            user_id,
            category: category.to_owned(),
            budgeted_amount: 100.0,
            spent_amount: 95.0,
            month,
            year,
            status: BudgetStatus::Met,
            utilization_percentage: 95.0,
        }
    }

    #[test]
    fn archive_inserts_snapshot_and_deletes_budget() {
        let (mut history_store, mut budget_store, user_id) = get_stores();
        let budget = budget_store
            .create(NewBudget {
                user_id,
                category: "Food".to_owned(),
                amount: 100.0,
                month: 1,
                year: 2024,
                spent: 95.0,
            })
            .unwrap();

        let snapshot = history_store
            .archive(new_record(user_id, "Food", 1, 2024), budget.id)
            .unwrap();

        assert_eq!(snapshot.category, "Food");
        assert_eq!(snapshot.status, BudgetStatus::Met);
        assert_eq!(
            budget_store.get(user_id, budget.id),
            Err(Error::BudgetNotFound)
        );
    }

    #[test]
    fn archive_rolls_back_when_budget_is_missing() {
        let (mut history_store, budget_store, user_id) = get_stores();

        let result = history_store.archive(new_record(user_id, "Food", 1, 2024), 42);

        assert_eq!(result, Err(Error::BudgetNotFound));
        // No snapshot row survives a failed archive.
        assert_eq!(
            history_store.get_query(HistoryQuery::new(user_id)),
            Ok(vec![])
        );
        drop(budget_store);
    }

    #[test]
    fn archive_rolls_back_for_another_users_budget() {
        let (mut history_store, mut budget_store, user_id) = get_stores();
        let budget = budget_store
            .create(NewBudget {
                user_id,
                category: "Food".to_owned(),
                amount: 100.0,
                month: 1,
                year: 2024,
                spent: 0.0,
            })
            .unwrap();

        let result =
            history_store.archive(new_record(UserID::new(999), "Food", 1, 2024), budget.id);

        // The ownership check must fail cleanly even though user 999 does
        // not exist, and the budget must be untouched.
        assert_eq!(result, Err(Error::BudgetNotFound));
        assert!(budget_store.get(user_id, budget.id).is_ok());
        assert_eq!(
            history_store.get_query(HistoryQuery::new(UserID::new(999))),
            Ok(vec![])
        );
    }

    #[test]
    fn get_query_orders_by_year_then_month() {
        let (mut history_store, mut budget_store, user_id) = get_stores();
        for (category, month, year) in [("A", 12, 2023), ("B", 2, 2024), ("C", 1, 2024)] {
            let budget = budget_store
                .create(NewBudget {
                    user_id,
                    category: category.to_owned(),
                    amount: 100.0,
                    month,
                    year,
                    spent: 0.0,
                })
                .unwrap();
            history_store
                .archive(new_record(user_id, category, month, year), budget.id)
                .unwrap();
        }

        let records = history_store.get_query(HistoryQuery::new(user_id)).unwrap();

        let order: Vec<(i32, u8)> = records
            .iter()
            .map(|record| (record.year, record.month))
            .collect();
        assert_eq!(order, vec![(2023, 12), (2024, 1), (2024, 2)]);
    }

    #[test]
    fn get_query_paginates_and_count_does_not() {
        let (mut history_store, mut budget_store, user_id) = get_stores();
        for month in 1..=5 {
            let budget = budget_store
                .create(NewBudget {
                    user_id,
                    category: "Food".to_owned(),
                    amount: 100.0,
                    month,
                    year: 2024,
                    spent: 0.0,
                })
                .unwrap();
            history_store
                .archive(new_record(user_id, "Food", month, 2024), budget.id)
                .unwrap();
        }

        let mut query = HistoryQuery::new(user_id);
        query.limit = 2;
        query.skip = 2;

        let page = history_store.get_query(query.clone()).unwrap();
        let months: Vec<u8> = page.iter().map(|record| record.month).collect();
        assert_eq!(months, vec![3, 4]);

        assert_eq!(history_store.count(&query), Ok(5));
    }

    #[test]
    fn get_query_filters_by_period_and_category() {
        let (mut history_store, mut budget_store, user_id) = get_stores();
        for (category, month) in [("Food", 1), ("Rent", 1), ("Food", 2)] {
            let budget = budget_store
                .create(NewBudget {
                    user_id,
                    category: category.to_owned(),
                    amount: 100.0,
                    month,
                    year: 2024,
                    spent: 0.0,
                })
                .unwrap();
            history_store
                .archive(new_record(user_id, category, month, 2024), budget.id)
                .unwrap();
        }

        let mut query = HistoryQuery::new(user_id);
        query.period = Some(PeriodFilter::Month {
            month: 1,
            year: 2024,
        });
        query.category = Some("Food".to_owned());

        let records = history_store.get_query(query).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].category, "Food");
        assert_eq!(records[0].month, 1);
    }
}
