//! The budget entity operations: create, update, delete, and list.

use crate::{
    Error,
    budget::compute_spent,
    models::{Budget, DatabaseID, NewBudget, UserID},
    period::{DateTimeWindow, PeriodFilter},
    stores::{BudgetQuery, BudgetStore, TransactionStore},
};

/// Create a budget, seeding its `spent` total from the expense transactions
/// already recorded for its category and calendar month.
///
/// # Errors
/// This function will return a:
/// - [Error::Validation] if the category is empty, the amount is not
///   positive, or `(month, year)` does not name a valid calendar month,
/// - [Error::DuplicateBudget] if a budget already exists for the same
///   `(user, category, month, year)`.
pub fn create_budget(
    budget_store: &mut impl BudgetStore,
    transaction_store: &impl TransactionStore,
    user_id: UserID,
    category: String,
    amount: f64,
    month: u8,
    year: i32,
) -> Result<Budget, Error> {
    validate_amount(amount)?;
    validate_year(year)?;

    if category.trim().is_empty() {
        return Err(Error::Validation("category must not be empty".to_owned()));
    }

    let window = DateTimeWindow::calendar_month(month, year)?;
    let spent = compute_spent(transaction_store, user_id, &category, &window)?;

    budget_store.create(NewBudget {
        user_id,
        category,
        amount,
        month,
        year,
        spent,
    })
}

/// Update a budget's amount and refresh its `spent` total.
///
/// The spent total is recomputed over the budget's own calendar month even
/// when the amount is unchanged, so an update is also how a stale cache gets
/// refreshed.
///
/// # Errors
/// This function will return a:
/// - [Error::BudgetNotFound] if `id` does not refer to a budget owned by
///   `user_id`,
/// - [Error::Validation] if `new_amount` is given and not positive.
pub fn update_budget(
    budget_store: &mut impl BudgetStore,
    transaction_store: &impl TransactionStore,
    user_id: UserID,
    id: DatabaseID,
    new_amount: Option<f64>,
) -> Result<Budget, Error> {
    let mut budget = budget_store.get(user_id, id)?;

    let window = DateTimeWindow::calendar_month(budget.month, budget.year)?;
    budget.spent = compute_spent(transaction_store, user_id, &budget.category, &window)?;

    if let Some(amount) = new_amount {
        validate_amount(amount)?;
        budget.amount = amount;
    }

    budget_store.update(&budget)?;

    Ok(budget)
}

/// Delete a budget owned by `user_id`.
///
/// # Errors
/// Returns [Error::BudgetNotFound] if `id` does not refer to a budget owned
/// by `user_id`.
pub fn delete_budget(
    budget_store: &mut impl BudgetStore,
    user_id: UserID,
    id: DatabaseID,
) -> Result<(), Error> {
    budget_store.delete(user_id, id)
}

/// List the budgets matching `filter`, ordered by (year, month) ascending.
///
/// # Errors
/// Returns an [Error::SqlError] if the lookup fails.
pub fn list_budgets(
    budget_store: &impl BudgetStore,
    user_id: UserID,
    filter: Option<PeriodFilter>,
) -> Result<Vec<Budget>, Error> {
    let mut query = BudgetQuery::new(user_id);
    query.period = filter;

    budget_store.get_query(query)
}

fn validate_amount(amount: f64) -> Result<(), Error> {
    if amount > 0.0 {
        Ok(())
    } else {
        Err(Error::Validation("amount must be greater than zero".to_owned()))
    }
}

fn validate_year(year: i32) -> Result<(), Error> {
    if (1000..=9999).contains(&year) {
        Ok(())
    } else {
        Err(Error::Validation("year must be a four digit year".to_owned()))
    }
}

#[cfg(test)]
mod budget_operation_tests {
    use std::sync::{Arc, Mutex};

    use rusqlite::Connection;
    use time::macros::datetime;

    use crate::{
        Error,
        db::initialize,
        models::{NewUser, TransactionBuilder, TransactionType, UserID},
        period::PeriodFilter,
        stores::{
            TransactionStore, UserStore,
            sqlite::{SQLiteBudgetStore, SQLiteTransactionStore, SQLiteUserStore},
        },
    };

    use super::{create_budget, delete_budget, list_budgets, update_budget};

    fn get_stores() -> (SQLiteBudgetStore, SQLiteTransactionStore, UserID) {
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
            SQLiteBudgetStore::new(connection.clone()),
            SQLiteTransactionStore::new(connection),
            user.id,
        )
    }

    #[test]
    fn create_seeds_spent_from_existing_transactions() {
        let (mut budgets, mut transactions, user_id) = get_stores();
        transactions
            .create(
                TransactionBuilder::new(user_id, TransactionType::Expense, "Food", 50.0)
                    .date(datetime!(2024-01-10 09:00 UTC)),
            )
            .unwrap();
        transactions
            .create(
                TransactionBuilder::new(user_id, TransactionType::Expense, "Food", 30.0)
                    .date(datetime!(2024-01-20 18:30 UTC)),
            )
            .unwrap();

        let budget = create_budget(
            &mut budgets,
            &transactions,
            user_id,
            "Food".to_owned(),
            200.0,
            1,
            2024,
        )
        .unwrap();

        assert_eq!(budget.spent, 80.0);
        assert_eq!(budget.amount, 200.0);
    }

    #[test]
    fn create_rejects_invalid_fields() {
        let (mut budgets, transactions, user_id) = get_stores();

        let cases: [(&str, f64, u8, i32); 4] = [
            ("", 100.0, 1, 2024),
            ("Food", 0.0, 1, 2024),
            ("Food", 100.0, 13, 2024),
            ("Food", 100.0, 1, 24),
        ];

        for (category, amount, month, year) in cases {
            let result = create_budget(
                &mut budgets,
                &transactions,
                user_id,
                category.to_owned(),
                amount,
                month,
                year,
            );

            assert!(
                matches!(result, Err(Error::Validation(_))),
                "expected a validation error for {category:?}/{amount}/{month}/{year}"
            );
        }
    }

    #[test]
    fn create_rejects_duplicates_distinctly_from_validation() {
        let (mut budgets, transactions, user_id) = get_stores();
        create_budget(
            &mut budgets,
            &transactions,
            user_id,
            "Food".to_owned(),
            200.0,
            1,
            2024,
        )
        .unwrap();

        let result = create_budget(
            &mut budgets,
            &transactions,
            user_id,
            "Food".to_owned(),
            300.0,
            1,
            2024,
        );

        assert_eq!(result, Err(Error::DuplicateBudget));
    }

    #[test]
    fn update_refreshes_spent_even_without_a_new_amount() {
        let (mut budgets, mut transactions, user_id) = get_stores();
        let budget = create_budget(
            &mut budgets,
            &transactions,
            user_id,
            "Food".to_owned(),
            200.0,
            1,
            2024,
        )
        .unwrap();
        // A transaction recorded after the budget was created leaves the
        // cached spent stale until the next update.
        transactions
            .create(
                TransactionBuilder::new(user_id, TransactionType::Expense, "Food", 45.0)
                    .date(datetime!(2024-01-25 12:00 UTC)),
            )
            .unwrap();

        let updated = update_budget(&mut budgets, &transactions, user_id, budget.id, None).unwrap();

        assert_eq!(updated.spent, 45.0);
        assert_eq!(updated.amount, 200.0);
    }

    #[test]
    fn update_applies_a_new_amount() {
        let (mut budgets, transactions, user_id) = get_stores();
        let budget = create_budget(
            &mut budgets,
            &transactions,
            user_id,
            "Food".to_owned(),
            200.0,
            1,
            2024,
        )
        .unwrap();

        let updated =
            update_budget(&mut budgets, &transactions, user_id, budget.id, Some(350.0)).unwrap();

        assert_eq!(updated.amount, 350.0);
        assert_eq!(
            update_budget(&mut budgets, &transactions, user_id, budget.id, Some(-1.0)),
            Err(Error::Validation(
                "amount must be greater than zero".to_owned()
            ))
        );
    }

    #[test]
    fn update_fails_for_another_users_budget() {
        let (mut budgets, transactions, user_id) = get_stores();
        let budget = create_budget(
            &mut budgets,
            &transactions,
            user_id,
            "Food".to_owned(),
            200.0,
            1,
            2024,
        )
        .unwrap();

        assert_eq!(
            update_budget(
                &mut budgets,
                &transactions,
                UserID::new(999),
                budget.id,
                None
            ),
            Err(Error::BudgetNotFound)
        );
    }

    #[test]
    fn delete_removes_the_budget() {
        let (mut budgets, transactions, user_id) = get_stores();
        let budget = create_budget(
            &mut budgets,
            &transactions,
            user_id,
            "Food".to_owned(),
            200.0,
            1,
            2024,
        )
        .unwrap();

        delete_budget(&mut budgets, user_id, budget.id).unwrap();

        assert_eq!(
            delete_budget(&mut budgets, user_id, budget.id),
            Err(Error::BudgetNotFound)
        );
    }

    #[test]
    fn list_filters_by_period() {
        let (mut budgets, transactions, user_id) = get_stores();
        for (month, year) in [(1, 2024), (2, 2024), (12, 2023)] {
            create_budget(
                &mut budgets,
                &transactions,
                user_id,
                "Food".to_owned(),
                200.0,
                month,
                year,
            )
            .unwrap();
        }

        let listed = list_budgets(
            &budgets,
            user_id,
            Some(PeriodFilter::Month {
                month: 1,
                year: 2024,
            }),
        )
        .unwrap();

        assert_eq!(listed.len(), 1);
        assert_eq!((listed[0].month, listed[0].year), (1, 2024));

        let all = list_budgets(&budgets, user_id, None).unwrap();
        let order: Vec<(i32, u8)> = all.iter().map(|budget| (budget.year, budget.month)).collect();
        assert_eq!(order, vec![(2023, 12), (2024, 1), (2024, 2)]);
    }
}
