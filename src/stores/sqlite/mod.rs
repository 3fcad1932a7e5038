//! SQLite backed implementations of the store traits.

mod budget;
mod history;
mod transaction;
mod user;

pub use budget::SQLiteBudgetStore;
pub use history::SQLiteBudgetHistoryStore;
pub use transaction::SQLiteTransactionStore;
pub use user::SQLiteUserStore;

use rusqlite::types::Value;
use time::{
    OffsetDateTime, PrimitiveDateTime, UtcOffset, format_description::BorrowedFormatItem,
    macros::format_description,
};

use crate::period::PeriodFilter;

/// The fixed-width UTC datetime encoding used for the transaction `date`
/// column.
///
/// The width is fixed (always three subsecond digits, no offset suffix) so
/// that lexicographic comparison in SQL `BETWEEN` clauses matches
/// chronological order.
const SQL_DATETIME_FORMAT: &[BorrowedFormatItem<'_>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]");

/// Encode a datetime for storage or comparison in SQL.
///
/// The value is converted to UTC first; sub-millisecond precision is
/// truncated.
pub(crate) fn datetime_to_sql(datetime: OffsetDateTime) -> String {
    let utc = datetime.to_offset(UtcOffset::UTC);

    PrimitiveDateTime::new(utc.date(), utc.time())
        .format(SQL_DATETIME_FORMAT)
        // The format description contains no components that can fail for a
        // valid datetime.
        .unwrap_or_else(|_| utc.to_string())
}

/// Decode a datetime stored by [datetime_to_sql].
pub(crate) fn datetime_from_sql(
    column_index: usize,
    text: &str,
) -> Result<OffsetDateTime, rusqlite::Error> {
    PrimitiveDateTime::parse(text, SQL_DATETIME_FORMAT)
        .map(PrimitiveDateTime::assume_utc)
        .map_err(|error| {
            rusqlite::Error::FromSqlConversionFailure(
                column_index,
                rusqlite::types::Type::Text,
                Box::new(error),
            )
        })
}

/// Append the WHERE clause parts for a [PeriodFilter] over budget-shaped
/// rows (those with `month` and `year` columns).
///
/// A month filter is an exact match. A range within a single calendar year
/// filters by year equality and a month interval; a range spanning years
/// uses the three-way disjunction over (year, month) pairs.
pub(crate) fn push_period_clauses(
    filter: &PeriodFilter,
    where_clause_parts: &mut Vec<String>,
    query_parameters: &mut Vec<Value>,
) {
    match filter {
        PeriodFilter::Month { month, year } => {
            where_clause_parts.push(format!(
                "month = ?{} AND year = ?{}",
                query_parameters.len() + 1,
                query_parameters.len() + 2,
            ));
            query_parameters.push(Value::Integer(i64::from(*month)));
            query_parameters.push(Value::Integer(i64::from(*year)));
        }
        PeriodFilter::Range { start, end } if start.year() == end.year() => {
            where_clause_parts.push(format!(
                "year = ?{} AND month >= ?{} AND month <= ?{}",
                query_parameters.len() + 1,
                query_parameters.len() + 2,
                query_parameters.len() + 3,
            ));
            query_parameters.push(Value::Integer(i64::from(start.year())));
            query_parameters.push(Value::Integer(i64::from(u8::from(start.month()))));
            query_parameters.push(Value::Integer(i64::from(u8::from(end.month()))));
        }
        PeriodFilter::Range { start, end } => {
            where_clause_parts.push(format!(
                "((year = ?{} AND month >= ?{}) \
                 OR (year > ?{} AND year < ?{}) \
                 OR (year = ?{} AND month <= ?{}))",
                query_parameters.len() + 1,
                query_parameters.len() + 2,
                query_parameters.len() + 3,
                query_parameters.len() + 4,
                query_parameters.len() + 5,
                query_parameters.len() + 6,
            ));
            query_parameters.push(Value::Integer(i64::from(start.year())));
            query_parameters.push(Value::Integer(i64::from(u8::from(start.month()))));
            query_parameters.push(Value::Integer(i64::from(start.year())));
            query_parameters.push(Value::Integer(i64::from(end.year())));
            query_parameters.push(Value::Integer(i64::from(end.year())));
            query_parameters.push(Value::Integer(i64::from(u8::from(end.month()))));
        }
    }
}

#[cfg(test)]
mod datetime_encoding_tests {
    use time::macros::datetime;

    use super::{datetime_from_sql, datetime_to_sql};

    #[test]
    fn encoding_is_fixed_width_utc() {
        let encoded = datetime_to_sql(datetime!(2024-03-05 09:07:01.5 UTC));

        assert_eq!(encoded, "2024-03-05 09:07:01.500");
    }

    #[test]
    fn encoding_converts_offsets_to_utc() {
        let encoded = datetime_to_sql(datetime!(2024-03-05 09:00 +02:00));

        assert_eq!(encoded, "2024-03-05 07:00:00.000");
    }

    #[test]
    fn round_trips() {
        let datetime = datetime!(2023-11-15 23:59:59.999 UTC);

        let decoded = datetime_from_sql(0, &datetime_to_sql(datetime)).unwrap();

        assert_eq!(decoded, datetime);
    }

    #[test]
    fn whole_seconds_sort_before_end_of_day() {
        // Lexicographic comparison must match chronological order, including
        // for values without sub-second precision.
        let whole = datetime_to_sql(datetime!(2024-01-31 23:59:59 UTC));
        let end_of_day = datetime_to_sql(datetime!(2024-01-31 23:59:59.999 UTC));

        assert!(whole < end_of_day);
    }
}
