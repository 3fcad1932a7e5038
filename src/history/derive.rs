//! Synthesizes history-shaped records from live budgets when no archive
//! matches a query.

use crate::{
    models::{Budget, HistoryView, Transaction, TransactionType},
    period::DateTimeWindow,
};

/// Derive a history-shaped record for each budget from the transactions
/// inside the queried `window`.
///
/// Each budget's spent figure is summed over its *effective* sub-period: the
/// intersection of the budget's own calendar month with `window`. A budget
/// whose month does not overlap the window at all derives with a spent of
/// zero. Empty inputs simply produce an empty result.
///
/// The results are sorted by (year, month) ascending.
pub fn derive_history(
    budgets: &[Budget],
    transactions: &[Transaction],
    window: &DateTimeWindow,
) -> Vec<HistoryView> {
    let mut views: Vec<HistoryView> = budgets
        .iter()
        .filter_map(|budget| {
            let month_window = match DateTimeWindow::calendar_month(budget.month, budget.year) {
                Ok(month_window) => month_window,
                Err(error) => {
                    tracing::warn!(
                        "Skipping budget {} with invalid period {}-{}: {error}",
                        budget.id,
                        budget.year,
                        budget.month
                    );
                    return None;
                }
            };

            let spent = match month_window.intersect(window) {
                Some(effective) => transactions
                    .iter()
                    .filter(|transaction| {
                        transaction.transaction_type == TransactionType::Expense
                            && transaction.category == budget.category
                            && effective.contains(transaction.date)
                    })
                    .map(|transaction| transaction.amount)
                    .sum(),
                None => 0.0,
            };

            Some(HistoryView::derived_from(budget, spent))
        })
        .collect();

    views.sort_by_key(|view| (view.year, view.month));

    views
}
