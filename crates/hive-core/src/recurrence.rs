//! Recurring report dates.
//!
//! Advancing is always an explicit operator action; nothing here runs on a
//! timer.

use chrono::{Months, NaiveDate};

pub use hive_db::models::{RecurrenceConfig, RecurringInterval};

use crate::error::ValidationError;

/// Move `current` forward by one interval (1, 3, or 6 calendar months).
///
/// The day of month is kept where it exists in the target month and clamped
/// to the month's last day otherwise, so Jan 31 + 1 month is Feb 28 (or 29).
pub fn advance_due_date(
    current: NaiveDate,
    interval: RecurringInterval,
) -> Result<NaiveDate, ValidationError> {
    current
        .checked_add_months(Months::new(interval.months()))
        .ok_or(ValidationError::DateOutOfRange(current))
}

/// Build a recurrence config from a "recurring" flag and an optional
/// interval, as entered on a form or command line.
///
/// An interval without the flag is ignored; the flag without an interval is
/// rejected.
pub fn recurrence_from_flags(
    recurring: bool,
    interval: Option<RecurringInterval>,
) -> Result<RecurrenceConfig, ValidationError> {
    match (recurring, interval) {
        (true, Some(interval)) => Ok(RecurrenceConfig::Enabled(interval)),
        (true, None) => Err(ValidationError::IntervalRequired),
        (false, _) => Ok(RecurrenceConfig::Disabled),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn monthly_clamps_to_short_february() {
        assert_eq!(
            advance_due_date(d("2025-01-31"), RecurringInterval::Monthly).unwrap(),
            d("2025-02-28")
        );
    }

    #[test]
    fn monthly_clamps_to_leap_day() {
        assert_eq!(
            advance_due_date(d("2024-01-31"), RecurringInterval::Monthly).unwrap(),
            d("2024-02-29")
        );
    }

    #[test]
    fn quarterly_and_semi_annual_keep_day() {
        assert_eq!(
            advance_due_date(d("2025-06-15"), RecurringInterval::Quarterly).unwrap(),
            d("2025-09-15")
        );
        assert_eq!(
            advance_due_date(d("2025-06-15"), RecurringInterval::SemiAnnually).unwrap(),
            d("2025-12-15")
        );
    }

    #[test]
    fn crosses_year_boundary() {
        assert_eq!(
            advance_due_date(d("2025-11-30"), RecurringInterval::Quarterly).unwrap(),
            d("2026-02-28")
        );
        assert_eq!(
            advance_due_date(d("2025-08-31"), RecurringInterval::SemiAnnually).unwrap(),
            d("2026-02-28")
        );
    }

    #[test]
    fn clamping_does_not_stick() {
        // Feb 28 stays on the 28th next month; the original 31st is not
        // remembered.
        let feb = advance_due_date(d("2025-01-31"), RecurringInterval::Monthly).unwrap();
        assert_eq!(
            advance_due_date(feb, RecurringInterval::Monthly).unwrap(),
            d("2025-03-28")
        );
    }

    #[test]
    fn out_of_range_is_an_error() {
        assert_eq!(
            advance_due_date(NaiveDate::MAX, RecurringInterval::Monthly),
            Err(ValidationError::DateOutOfRange(NaiveDate::MAX))
        );
    }

    #[test]
    fn flags_to_config() {
        assert_eq!(
            recurrence_from_flags(true, Some(RecurringInterval::Quarterly)),
            Ok(RecurrenceConfig::Enabled(RecurringInterval::Quarterly))
        );
        assert_eq!(
            recurrence_from_flags(true, None),
            Err(ValidationError::IntervalRequired)
        );
        assert_eq!(
            recurrence_from_flags(false, Some(RecurringInterval::Monthly)),
            Ok(RecurrenceConfig::Disabled)
        );
    }
}
