//! Due-date status classification.
//!
//! Everything works on [`NaiveDate`], so comparisons are at day resolution
//! and time of day never shifts a result. Callers pass `today` explicitly;
//! [`today`] reads it from the local clock.

use chrono::{Local, NaiveDate, TimeDelta};
use serde::Serialize;

use hive_db::models::{Client, ShootStatus};

use crate::error::ValidationError;

/// Date format used for storage, CSV, and the command line.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Days ahead of today that still count as "due this week".
pub const DUE_WEEK_DAYS: i64 = 7;

/// Content due within this many days with no booked shoot triggers a warning.
pub const SHOOT_WARNING_DAYS: i64 = 14;

/// Today's date on the local clock.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(s: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .map_err(|_| ValidationError::InvalidDate(s.to_owned()))
}

/// Parse an optional date where an empty string means "not set".
pub fn parse_optional_date(s: &str) -> Result<Option<NaiveDate>, ValidationError> {
    if s.trim().is_empty() {
        Ok(None)
    } else {
        parse_date(s).map(Some)
    }
}

/// Strictly before today. Today itself is never overdue.
pub fn is_overdue(due: NaiveDate, today: NaiveDate) -> bool {
    due < today
}

pub fn is_due_today(due: NaiveDate, today: NaiveDate) -> bool {
    due == today
}

/// Within `[today, today + 7 days]`, both ends inclusive.
pub fn is_due_this_week(due: NaiveDate, today: NaiveDate) -> bool {
    due >= today && due <= today + TimeDelta::days(DUE_WEEK_DAYS)
}

/// Signed whole days from `today` to `due`; negative when overdue.
pub fn days_until_due(due: NaiveDate, today: NaiveDate) -> i64 {
    (due - today).num_days()
}

/// "Due Today", "Due Tomorrow", "Due in N days", or "N days overdue".
pub fn format_due_status(due: NaiveDate, today: NaiveDate) -> String {
    match days_until_due(due, today) {
        0 => "Due Today".to_owned(),
        1 => "Due Tomorrow".to_owned(),
        n if n < 0 => format!("{} days overdue", n.unsigned_abs()),
        n => format!("Due in {n} days"),
    }
}

/// The shoot is not booked and content is due within two weeks (or already
/// past due).
pub fn needs_shoot_warning(
    shoot_status: ShootStatus,
    content_due_date: Option<NaiveDate>,
    today: NaiveDate,
) -> bool {
    match (shoot_status, content_due_date) {
        (ShootStatus::NotBooked, Some(content_due)) => {
            content_due <= today + TimeDelta::days(SHOOT_WARNING_DAYS)
        }
        _ => false,
    }
}

/// Coarse bucket for a due date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DueStatus {
    Overdue,
    DueToday,
    DueThisWeek,
    Upcoming,
}

pub fn classify_due(due: NaiveDate, today: NaiveDate) -> DueStatus {
    if is_overdue(due, today) {
        DueStatus::Overdue
    } else if is_due_today(due, today) {
        DueStatus::DueToday
    } else if is_due_this_week(due, today) {
        DueStatus::DueThisWeek
    } else {
        DueStatus::Upcoming
    }
}

/// Derived, display-ready status of one client's report due date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientStatus {
    pub due: DueStatus,
    pub label: String,
    pub days_until_due: i64,
    pub shoot_warning: bool,
}

pub fn client_status(client: &Client, today: NaiveDate) -> ClientStatus {
    ClientStatus {
        due: classify_due(client.due_date, today),
        label: format_due_status(client.due_date, today),
        days_until_due: days_until_due(client.due_date, today),
        shoot_warning: needs_shoot_warning(client.shoot_status, client.content_due_date, today),
    }
}
