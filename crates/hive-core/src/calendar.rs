//! Month calendar of client dates.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, TimeDelta};
use serde::Serialize;
use uuid::Uuid;

use hive_db::models::Client;

use crate::month::Month;

/// Which client date an event marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Report,
    Content,
    Renewal,
    Shoot,
}

impl EventKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Report => "Report due",
            Self::Content => "Content due",
            Self::Renewal => "Contract renewal",
            Self::Shoot => "Shoot",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarEvent {
    pub client_id: Uuid,
    pub client_name: String,
    pub kind: EventKind,
    pub date: NaiveDate,
}

/// Dates shown for `month`: whole weeks, Sunday through Saturday, covering
/// the first through the last of the month.
pub fn month_grid(month: Month) -> Vec<NaiveDate> {
    let first = month.first_day();
    let last = month.last_day();
    let start = first - TimeDelta::days(i64::from(first.weekday().num_days_from_sunday()));
    let end = last + TimeDelta::days(i64::from(6 - last.weekday().num_days_from_sunday()));

    start.iter_days().take_while(|d| *d <= end).collect()
}

/// The kind of event `client` has on `date`. When several dates coincide the
/// report date wins, then content, renewal, and shoot.
fn event_kind(client: &Client, date: NaiveDate) -> Option<EventKind> {
    if client.due_date == date {
        Some(EventKind::Report)
    } else if client.content_due_date == Some(date) {
        Some(EventKind::Content)
    } else if client.contract_renewal_date == Some(date) {
        Some(EventKind::Renewal)
    } else if client.shoot_date == Some(date) {
        Some(EventKind::Shoot)
    } else {
        None
    }
}

/// At most one event per client on `date`, in input order.
pub fn events_on(clients: &[Client], date: NaiveDate) -> Vec<CalendarEvent> {
    clients
        .iter()
        .filter_map(|client| {
            event_kind(client, date).map(|kind| CalendarEvent {
                client_id: client.id,
                client_name: client.client_name.clone(),
                kind,
                date,
            })
        })
        .collect()
}

/// Events for every date in [`month_grid`], including days that spill into
/// the neighbouring months.
pub fn month_events(clients: &[Client], month: Month) -> BTreeMap<NaiveDate, Vec<CalendarEvent>> {
    month_grid(month)
        .into_iter()
        .map(|date| (date, events_on(clients, date)))
        .collect()
}
