//! The archive operation and the history query with fallback derivation.

use std::collections::BTreeSet;

use crate::{
    Error,
    history::derive_history,
    models::{
        BudgetHistory, BudgetStatus, DatabaseID, HistoryView, NewBudgetHistory, TransactionType,
        UserID, utilization_percentage,
    },
    period::PeriodFilter,
    stores::{
        BudgetHistoryStore, BudgetQuery, BudgetStore, HistoryQuery, TransactionQuery,
        TransactionStore,
    },
};

/// Archive a live budget: snapshot its cached spent and utilization into an
/// immutable history row and delete the live budget, as one transition.
///
/// The snapshot values are computed once here and never re-derived later.
///
/// # Errors
/// Returns [Error::BudgetNotFound] if `id` does not refer to a budget owned
/// by `user_id`.
pub fn archive_budget(
    budget_store: &impl BudgetStore,
    history_store: &mut impl BudgetHistoryStore,
    user_id: UserID,
    id: DatabaseID,
) -> Result<BudgetHistory, Error> {
    let budget = budget_store.get(user_id, id)?;

    let utilization = utilization_percentage(budget.spent, budget.amount);

    history_store.archive(
        NewBudgetHistory {
            user_id,
            category: budget.category,
            budgeted_amount: budget.amount,
            spent_amount: budget.spent,
            month: budget.month,
            year: budget.year,
            status: BudgetStatus::from_utilization(utilization),
            utilization_percentage: utilization,
        },
        budget.id,
    )
}

/// The filters and pagination accepted by [get_history].
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRequest {
    /// Include only records in this period.
    pub filter: Option<PeriodFilter>,
    /// Include only records for this category.
    pub category: Option<String>,
    /// The page size.
    pub limit: u64,
    /// The number of matching records to skip over.
    pub skip: u64,
}

impl HistoryRequest {
    /// A request for every record, with the default page size.
    pub fn new() -> Self {
        Self {
            filter: None,
            category: None,
            limit: HistoryQuery::DEFAULT_LIMIT,
            skip: 0,
        }
    }
}

impl Default for HistoryRequest {
    fn default() -> Self {
        Self::new()
    }
}

/// One page of history records plus the counts reported to the client.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryPage {
    /// The records in this page.
    pub entries: Vec<HistoryView>,
    /// The total number of matching records ignoring pagination. Falls back
    /// to the derived count when no archive rows match at all.
    pub total: usize,
}

/// Query the budget history, falling back to derivation from live budgets
/// when the archive has nothing for the requested period.
///
/// The fallback triggers only when the persisted page comes back empty AND a
/// period filter was supplied: live budgets matching the same filter are
/// fetched, their categories' expense transactions are fetched in a single
/// batched query over the period window, and a derived record is synthesized
/// per budget over its effective sub-period.
///
/// The reported total keeps the persisted count when it is non-zero (a page
/// past the end still reports how many archive rows match), and otherwise
/// falls back to the derived count.
///
/// # Errors
/// This function will return a:
/// - [Error::Validation] if the period filter names an invalid month,
/// - [Error::SqlError] if a lookup fails.
pub fn get_history(
    history_store: &impl BudgetHistoryStore,
    budget_store: &impl BudgetStore,
    transaction_store: &impl TransactionStore,
    user_id: UserID,
    request: HistoryRequest,
) -> Result<HistoryPage, Error> {
    let query = HistoryQuery {
        user_id,
        period: request.filter.clone(),
        category: request.category.clone(),
        limit: request.limit,
        skip: request.skip,
    };

    let persisted = history_store.get_query(query.clone())?;
    let total = history_store.count(&query)?;

    let entries: Vec<HistoryView> = if persisted.is_empty() {
        match request.filter {
            Some(filter) => derive_for_period(
                budget_store,
                transaction_store,
                user_id,
                filter,
                request.category,
            )?,
            None => vec![],
        }
    } else {
        persisted.into_iter().map(HistoryView::from).collect()
    };

    let total = if total > 0 { total } else { entries.len() };

    Ok(HistoryPage { entries, total })
}

fn derive_for_period(
    budget_store: &impl BudgetStore,
    transaction_store: &impl TransactionStore,
    user_id: UserID,
    filter: PeriodFilter,
    category: Option<String>,
) -> Result<Vec<HistoryView>, Error> {
    let window = filter.window()?;

    let mut budget_query = BudgetQuery::new(user_id);
    budget_query.period = Some(filter);
    budget_query.category = category;

    let budgets = budget_store.get_query(budget_query)?;

    if budgets.is_empty() {
        return Ok(vec![]);
    }

    // One batched fetch over the deduplicated category set, not one query
    // per budget.
    let categories: BTreeSet<String> = budgets
        .iter()
        .map(|budget| budget.category.clone())
        .collect();

    let mut transaction_query = TransactionQuery::new(user_id);
    transaction_query.transaction_type = Some(TransactionType::Expense);
    transaction_query.categories = Some(categories.into_iter().collect());
    transaction_query.date_range = Some(window.clone());

    let transactions = transaction_store.get_query(transaction_query)?;

    Ok(derive_history(&budgets, &transactions, &window))
}


#[cfg(test)]
mod get_history_tests {
    use std::sync::{Arc, Mutex};

    use rusqlite::Connection;
    use time::macros::{date, datetime};

    use crate::{
        db::initialize,
        models::{NewBudget, NewUser, TransactionBuilder, TransactionType, UserID},
        period::PeriodFilter,
        stores::{
            BudgetStore, TransactionStore, UserStore,
            sqlite::{
                SQLiteBudgetHistoryStore, SQLiteBudgetStore, SQLiteTransactionStore,
                SQLiteUserStore,
            },
        },
    };

    use super::{HistoryRequest, archive_budget, get_history};

    struct Fixture {
        budgets: SQLiteBudgetStore,
        history: SQLiteBudgetHistoryStore,
        transactions: SQLiteTransactionStore,
        user_id: UserID,
    }

    fn get_fixture() -> Fixture {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let connection = Arc::new(Mutex::new(connection));

        let user = SQLiteUserStore::new(connection.clone())
            .create(NewUser {
                email: "test@test.com".to_owned(),
                password_hash: "hash".to_owned(),
            })
            .unwrap();

        Fixture {
            budgets: SQLiteBudgetStore::new(connection.clone()),
            history: SQLiteBudgetHistoryStore::new(connection.clone()),
            transactions: SQLiteTransactionStore::new(connection),
            user_id: user.id,
        }
    }

    fn create_budget(fixture: &mut Fixture, category: &str, amount: f64, month: u8, year: i32) {
        fixture
            .budgets
            .create(NewBudget {
                user_id: fixture.user_id,
                category: category.to_owned(),
                amount,
                month,
                year,
                spent: 0.0,
            })
            .unwrap();
    }

    fn month_request(month: u8, year: i32) -> HistoryRequest {
        HistoryRequest {
            filter: Some(PeriodFilter::Month { month, year }),
            ..HistoryRequest::new()
        }
    }

    #[test]
    fn persisted_rows_win_over_derivation() {
        let mut fixture = get_fixture();
        create_budget(&mut fixture, "Food", 100.0, 1, 2024);
        let budget_id = fixture.budgets.get_query(
            crate::stores::BudgetQuery::new(fixture.user_id),
        )
        .unwrap()[0]
            .id;
        archive_budget(
            &fixture.budgets,
            &mut fixture.history,
            fixture.user_id,
            budget_id,
        )
        .unwrap();
        // A live budget for the same period must not be derived on top.
        create_budget(&mut fixture, "Rent", 500.0, 1, 2024);

        let page = get_history(
            &fixture.history,
            &fixture.budgets,
            &fixture.transactions,
            fixture.user_id,
            month_request(1, 2024),
        )
        .unwrap();

        assert_eq!(page.entries.len(), 1);
        assert_eq!(page.total, 1);
        assert!(!page.entries[0].derived);
        assert_eq!(page.entries[0].category, "Food");
    }

    #[test]
    fn fallback_derives_from_live_budgets_and_transactions() {
        let mut fixture = get_fixture();
        create_budget(&mut fixture, "Food", 200.0, 1, 2024);
        for amount in [50.0, 30.0] {
            fixture
                .transactions
                .create(
                    TransactionBuilder::new(
                        fixture.user_id,
                        TransactionType::Expense,
                        "Food",
                        amount,
                    )
                    .date(datetime!(2024-01-15 12:00 UTC)),
                )
                .unwrap();
        }

        let page = get_history(
            &fixture.history,
            &fixture.budgets,
            &fixture.transactions,
            fixture.user_id,
            month_request(1, 2024),
        )
        .unwrap();

        assert_eq!(page.entries.len(), 1);
        assert_eq!(page.total, 1);
        let view = &page.entries[0];
        assert!(view.derived);
        assert_eq!(view.id, "Food-2024-1");
        assert_eq!(view.spent_amount, 80.0);
        assert_eq!(view.utilization_percentage, 40.0);
    }

    #[test]
    fn fallback_requires_a_period_filter() {
        let mut fixture = get_fixture();
        create_budget(&mut fixture, "Food", 200.0, 1, 2024);

        let page = get_history(
            &fixture.history,
            &fixture.budgets,
            &fixture.transactions,
            fixture.user_id,
            HistoryRequest::new(),
        )
        .unwrap();

        assert!(page.entries.is_empty());
        assert_eq!(page.total, 0);
    }

    #[test]
    fn fallback_respects_the_category_filter() {
        let mut fixture = get_fixture();
        create_budget(&mut fixture, "Food", 200.0, 1, 2024);
        create_budget(&mut fixture, "Rent", 900.0, 1, 2024);

        let request = HistoryRequest {
            category: Some("Rent".to_owned()),
            ..month_request(1, 2024)
        };
        let page = get_history(
            &fixture.history,
            &fixture.budgets,
            &fixture.transactions,
            fixture.user_id,
            request,
        )
        .unwrap();

        assert_eq!(page.entries.len(), 1);
        assert_eq!(page.entries[0].category, "Rent");
    }

    #[test]
    fn fallback_with_a_range_intersects_each_budgets_month() {
        let mut fixture = get_fixture();
        create_budget(&mut fixture, "Food", 100.0, 1, 2024);
        // Only the expense inside both the window and January counts.
        for (amount, date) in [
            (40.0, datetime!(2024-01-25 09:00 UTC)),
            (60.0, datetime!(2024-01-05 09:00 UTC)),
            (70.0, datetime!(2024-02-05 09:00 UTC)),
        ] {
            fixture
                .transactions
                .create(
                    TransactionBuilder::new(
                        fixture.user_id,
                        TransactionType::Expense,
                        "Food",
                        amount,
                    )
                    .date(date),
                )
                .unwrap();
        }

        let request = HistoryRequest {
            filter: Some(PeriodFilter::Range {
                start: date!(2024 - 01 - 20),
                end: date!(2024 - 02 - 10),
            }),
            ..HistoryRequest::new()
        };
        let page = get_history(
            &fixture.history,
            &fixture.budgets,
            &fixture.transactions,
            fixture.user_id,
            request,
        )
        .unwrap();

        assert_eq!(page.entries.len(), 1);
        assert_eq!(page.entries[0].spent_amount, 40.0);
    }

    #[test]
    fn empty_archive_and_no_budgets_produce_an_empty_page() {
        let fixture = get_fixture();

        let page = get_history(
            &fixture.history,
            &fixture.budgets,
            &fixture.transactions,
            fixture.user_id,
            month_request(1, 2024),
        )
        .unwrap();

        assert!(page.entries.is_empty());
        assert_eq!(page.total, 0);
    }

    #[test]
    fn page_past_the_end_keeps_the_persisted_total() {
        let mut fixture = get_fixture();
        create_budget(&mut fixture, "Food", 100.0, 1, 2024);
        let budget_id = fixture.budgets.get_query(
            crate::stores::BudgetQuery::new(fixture.user_id),
        )
        .unwrap()[0]
            .id;
        archive_budget(
            &fixture.budgets,
            &mut fixture.history,
            fixture.user_id,
            budget_id,
        )
        .unwrap();

        let request = HistoryRequest {
            skip: 10,
            ..month_request(1, 2024)
        };
        let page = get_history(
            &fixture.history,
            &fixture.budgets,
            &fixture.transactions,
            fixture.user_id,
            request,
        )
        .unwrap();

        // The page is empty and nothing is left to derive, but the total
        // still reflects the one matching archive row.
        assert!(page.entries.is_empty());
        assert_eq!(page.total, 1);
    }
}
