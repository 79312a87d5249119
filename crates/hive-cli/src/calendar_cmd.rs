//! `hive calendar`: month grid of client dates.

use std::fmt::Write as _;

use anyhow::Result;
use chrono::Datelike;

use hive_core::calendar::month_events;
use hive_core::{HiveStore, Month, dates};
use hive_db::models::Client;

const WEEKDAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

pub async fn run_calendar(store: &dyn HiveStore, month: Option<Month>) -> Result<()> {
    let month = month.unwrap_or_else(|| Month::of(dates::today()));
    let clients = store.list_clients().await?;
    print!("{}", render_calendar(&clients, month));
    Ok(())
}

/// A Sunday-first grid with `*` on days that have events, followed by the
/// events that fall inside `month`.
fn render_calendar(clients: &[Client], month: Month) -> String {
    let events = month_events(clients, month);
    let mut out = String::new();

    let _ = writeln!(out, "Calendar {month}");
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", WEEKDAYS.join(" "));

    let days: Vec<_> = events.iter().collect();
    for week in days.chunks(7) {
        let mut line = String::new();
        for (date, day_events) in week {
            if month.contains(**date) {
                let mark = if day_events.is_empty() { ' ' } else { '*' };
                let _ = write!(line, "{:>3}{mark}", date.day());
            } else {
                line.push_str("    ");
            }
        }
        let _ = writeln!(out, "{}", line.trim_end());
    }

    let in_month: Vec<_> = events
        .iter()
        .filter(|(date, _)| month.contains(**date))
        .flat_map(|(_, day_events)| day_events.iter())
        .collect();

    let _ = writeln!(out);
    if in_month.is_empty() {
        let _ = writeln!(out, "No client dates this month.");
        return out;
    }

    let kind_w = in_month
        .iter()
        .map(|e| e.kind.label().len())
        .max()
        .unwrap_or(4);
    for event in in_month {
        let _ = writeln!(
            out,
            "{}  {:<kind_w$}  {}",
            event.date,
            event.kind.label(),
            event.client_name
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use hive_db::models::{RecurrenceConfig, ShootStatus};
    use uuid::Uuid;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn client(name: &str, due: NaiveDate) -> Client {
        let now = Utc::now();
        Client {
            id: Uuid::new_v4(),
            client_name: name.into(),
            due_date: due,
            content_due_date: None,
            contract_renewal_date: None,
            shoot_date: None,
            posts_per_month: None,
            ads_per_month: None,
            package: None,
            monthly_reporting_canva_link: None,
            recurrence: RecurrenceConfig::Disabled,
            last_recurring_update: None,
            shoot_status: ShootStatus::NotBooked,
            shoot_notes: None,
            notes: None,
            reminders: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn renders_grid_and_event_list() {
        let mut acme = client("Acme", d(2025, 6, 3));
        acme.shoot_date = Some(d(2025, 6, 20));
        let gym = client("Gym", d(2025, 7, 1));

        let text = render_calendar(&[acme, gym], "2025-06".parse().unwrap());
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Calendar 2025-06");
        assert_eq!(lines[2], "Sun Mon Tue Wed Thu Fri Sat");
        // June 2025 starts on a Sunday; the 3rd is a Tuesday.
        assert_eq!(lines[3], "  1   2   3*  4   5   6   7");
        assert!(text.contains("2025-06-03  Report due  Acme"));
        assert!(text.contains("2025-06-20  Shoot       Acme"));
        // Gym's date is in the trailing week but outside June.
        assert!(!text.contains("Gym"));
    }

    #[test]
    fn empty_month_says_so() {
        let text = render_calendar(&[], "2025-02".parse().unwrap());
        assert!(text.ends_with("No client dates this month.\n"));
    }
}
