//! Calendar periods and inclusive datetime windows used for budget
//! aggregation and history derivation.

use serde::Deserialize;
use time::{Date, Month, OffsetDateTime, PrimitiveDateTime, Time, macros::time};

use crate::Error;

/// The last representable instant of a calendar day, to millisecond precision.
const END_OF_DAY: Time = time!(23:59:59.999);

/// An inclusive datetime interval `[start, end]`.
///
/// All windows are in UTC so that stored datetime strings compare
/// consistently in SQL.
#[derive(Debug, Clone, PartialEq)]
pub struct DateTimeWindow {
    /// The first instant included in the window.
    pub start: OffsetDateTime,
    /// The last instant included in the window.
    pub end: OffsetDateTime,
}

impl DateTimeWindow {
    /// Create a window from two calendar dates.
    ///
    /// The window starts at midnight on `start` and ends at 23:59:59.999 on
    /// `end`, so the end date is included in full.
    pub fn from_dates(start: Date, end: Date) -> Self {
        Self {
            start: PrimitiveDateTime::new(start, Time::MIDNIGHT).assume_utc(),
            end: PrimitiveDateTime::new(end, END_OF_DAY).assume_utc(),
        }
    }

    /// Create the window covering the whole calendar month `(month, year)`.
    ///
    /// # Errors
    /// Returns [Error::Validation] if `(month, year)` does not name a valid
    /// calendar month.
    pub fn calendar_month(month: u8, year: i32) -> Result<Self, Error> {
        let month = Month::try_from(month)
            .map_err(|_| Error::Validation("month must be between 1 and 12".to_owned()))?;
        let first = Date::from_calendar_date(year, month, 1)
            .map_err(|error| Error::Validation(error.to_string()))?;
        let last = Date::from_calendar_date(year, month, month.length(year))
            .map_err(|error| Error::Validation(error.to_string()))?;

        Ok(Self::from_dates(first, last))
    }

    /// The intersection of two windows, or `None` when they do not overlap.
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);

        (start <= end).then_some(Self { start, end })
    }

    /// Whether `datetime` falls inside the window (both ends inclusive).
    pub fn contains(&self, datetime: OffsetDateTime) -> bool {
        self.start <= datetime && datetime <= self.end
    }
}

/// Selects budgets or history rows by period.
///
/// Either an exact calendar month or an arbitrary date range. Range filters
/// are translated into a `(year, month)` disjunction for budget-shaped rows,
/// and into a [DateTimeWindow] when transactions need to be fetched.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub enum PeriodFilter {
    /// An exact `(month, year)` match.
    Month {
        /// The calendar month, 1-12.
        month: u8,
        /// The four digit year.
        year: i32,
    },
    /// All months that overlap the date range `[start, end]` (inclusive).
    Range {
        /// The first date in the range.
        start: Date,
        /// The last date in the range.
        end: Date,
    },
}

impl PeriodFilter {
    /// The datetime window to use when looking up transactions for this
    /// filter.
    ///
    /// A range filter is used verbatim (end normalized to end-of-day); a
    /// month filter expands to that calendar month's bounds.
    ///
    /// # Errors
    /// Returns [Error::Validation] if a month filter does not name a valid
    /// calendar month.
    pub fn window(&self) -> Result<DateTimeWindow, Error> {
        match self {
            PeriodFilter::Month { month, year } => DateTimeWindow::calendar_month(*month, *year),
            PeriodFilter::Range { start, end } => Ok(DateTimeWindow::from_dates(*start, *end)),
        }
    }
}

/// The period selection query parameters shared by the budget and history
/// list endpoints: either a `month`+`year` pair or a `startDate`+`endDate`
/// range.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodParams {
    /// The calendar month, 1-12.
    pub month: Option<u8>,
    /// The four digit year.
    pub year: Option<i32>,
    /// The first date of a range filter.
    pub start_date: Option<Date>,
    /// The last date of a range filter.
    pub end_date: Option<Date>,
}

impl PeriodParams {
    /// Resolve the parameters into a [PeriodFilter], or `None` when no
    /// period was requested.
    ///
    /// # Errors
    /// Returns [Error::Validation] if only half of a pair was supplied or
    /// the range is inverted.
    pub fn filter(&self) -> Result<Option<PeriodFilter>, Error> {
        match (self.start_date, self.end_date, self.month, self.year) {
            (Some(start), Some(end), _, _) => {
                if start > end {
                    Err(Error::Validation(
                        "startDate must not be after endDate".to_owned(),
                    ))
                } else {
                    Ok(Some(PeriodFilter::Range { start, end }))
                }
            }
            (Some(_), None, _, _) | (None, Some(_), _, _) => Err(Error::Validation(
                "startDate and endDate must be provided together".to_owned(),
            )),
            (None, None, Some(month), Some(year)) => {
                Ok(Some(PeriodFilter::Month { month, year }))
            }
            (None, None, None, None) => Ok(None),
            _ => Err(Error::Validation(
                "month and year must be provided together".to_owned(),
            )),
        }
    }
}

#[cfg(test)]
mod date_time_window_tests {
    use time::macros::{date, datetime};

    use super::DateTimeWindow;

    #[test]
    fn calendar_month_covers_first_to_last_instant() {
        let window = DateTimeWindow::calendar_month(2, 2024).unwrap();

        assert_eq!(window.start, datetime!(2024-02-01 00:00 UTC));
        assert_eq!(window.end, datetime!(2024-02-29 23:59:59.999 UTC));
    }

    #[test]
    fn calendar_month_rejects_invalid_month() {
        assert!(DateTimeWindow::calendar_month(0, 2024).is_err());
        assert!(DateTimeWindow::calendar_month(13, 2024).is_err());
    }

    #[test]
    fn from_dates_includes_whole_end_day() {
        let window = DateTimeWindow::from_dates(date!(2024 - 01 - 10), date!(2024 - 01 - 20));

        assert!(window.contains(datetime!(2024-01-20 23:59:59.999 UTC)));
        assert!(!window.contains(datetime!(2024-01-21 00:00 UTC)));
        assert!(window.contains(datetime!(2024-01-10 00:00 UTC)));
        assert!(!window.contains(datetime!(2024-01-09 23:59:59.999 UTC)));
    }

    #[test]
    fn intersect_clamps_to_overlap() {
        let month = DateTimeWindow::calendar_month(1, 2024).unwrap();
        let range = DateTimeWindow::from_dates(date!(2024 - 01 - 20), date!(2024 - 02 - 10));

        let effective = month.intersect(&range).unwrap();

        assert_eq!(effective.start, datetime!(2024-01-20 00:00 UTC));
        assert_eq!(effective.end, datetime!(2024-01-31 23:59:59.999 UTC));
    }

    #[test]
    fn intersect_returns_none_when_disjoint() {
        let january = DateTimeWindow::calendar_month(1, 2024).unwrap();
        let march = DateTimeWindow::calendar_month(3, 2024).unwrap();

        assert_eq!(january.intersect(&march), None);
    }
}
