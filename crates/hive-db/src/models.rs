use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// How often a recurring client's report cycle advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum RecurringInterval {
    Monthly,
    Quarterly,
    SemiAnnually,
}

impl RecurringInterval {
    /// Number of calendar months one cycle spans.
    pub fn months(self) -> u32 {
        match self {
            Self::Monthly => 1,
            Self::Quarterly => 3,
            Self::SemiAnnually => 6,
        }
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Monthly => "Monthly",
            Self::Quarterly => "Every 3 Months",
            Self::SemiAnnually => "Every 6 Months",
        }
    }
}

impl fmt::Display for RecurringInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::SemiAnnually => "semi-annually",
        };
        f.write_str(s)
    }
}

impl FromStr for RecurringInterval {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "monthly" => Ok(Self::Monthly),
            "quarterly" => Ok(Self::Quarterly),
            "semi-annually" => Ok(Self::SemiAnnually),
            other => Err(ParseEnumError::new("recurring interval", other)),
        }
    }
}

// ---------------------------------------------------------------------------

/// Booking state of a client's content shoot.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ShootStatus {
    #[default]
    NotBooked,
    Booked,
    Completed,
}

impl ShootStatus {
    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Self::NotBooked => "Not Booked",
            Self::Booked => "Booked",
            Self::Completed => "Completed",
        }
    }
}

impl fmt::Display for ShootStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotBooked => "not_booked",
            Self::Booked => "booked",
            Self::Completed => "completed",
        };
        f.write_str(s)
    }
}

impl FromStr for ShootStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_booked" => Ok(Self::NotBooked),
            "booked" => Ok(Self::Booked),
            "completed" => Ok(Self::Completed),
            other => Err(ParseEnumError::new("shoot status", other)),
        }
    }
}

// ---------------------------------------------------------------------------

/// Role a user holds on a client's team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TeamRole {
    Manager,
    Editor,
    Scripting,
}

impl fmt::Display for TeamRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Manager => "manager",
            Self::Editor => "editor",
            Self::Scripting => "scripting",
        };
        f.write_str(s)
    }
}

impl FromStr for TeamRole {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manager" => Ok(Self::Manager),
            "editor" => Ok(Self::Editor),
            "scripting" => Ok(Self::Scripting),
            other => Err(ParseEnumError::new("team role", other)),
        }
    }
}

// ---------------------------------------------------------------------------

/// Error returned when parsing an invalid enum string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: {:?}", self.kind, self.value)
    }
}

impl std::error::Error for ParseEnumError {}

// ---------------------------------------------------------------------------
// Recurrence
// ---------------------------------------------------------------------------

/// Whether a client's report cycle recurs, and on what interval.
///
/// Stored as the `is_recurring` / `recurring_interval` column pair, which the
/// `clients_recurrence_consistent` CHECK keeps in agreement. Serializes as the
/// interval string, or `null` when disabled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "Option<RecurringInterval>",
    into = "Option<RecurringInterval>"
)]
pub enum RecurrenceConfig {
    #[default]
    Disabled,
    Enabled(RecurringInterval),
}

impl RecurrenceConfig {
    /// Rebuild the config from its two storage columns.
    ///
    /// Fails when the columns disagree (flag set without an interval, or an
    /// interval without the flag).
    pub fn from_columns(
        is_recurring: bool,
        interval: Option<RecurringInterval>,
    ) -> Result<Self, RecurrenceColumnsError> {
        match (is_recurring, interval) {
            (true, Some(interval)) => Ok(Self::Enabled(interval)),
            (false, None) => Ok(Self::Disabled),
            (is_recurring, interval) => Err(RecurrenceColumnsError {
                is_recurring,
                interval,
            }),
        }
    }

    /// Split into `(is_recurring, recurring_interval)` column values.
    pub fn columns(self) -> (bool, Option<RecurringInterval>) {
        match self {
            Self::Disabled => (false, None),
            Self::Enabled(interval) => (true, Some(interval)),
        }
    }

    pub fn interval(self) -> Option<RecurringInterval> {
        self.columns().1
    }

    pub fn is_recurring(self) -> bool {
        matches!(self, Self::Enabled(_))
    }
}

impl From<Option<RecurringInterval>> for RecurrenceConfig {
    fn from(interval: Option<RecurringInterval>) -> Self {
        match interval {
            Some(interval) => Self::Enabled(interval),
            None => Self::Disabled,
        }
    }
}

impl From<RecurrenceConfig> for Option<RecurringInterval> {
    fn from(config: RecurrenceConfig) -> Self {
        config.interval()
    }
}

/// The stored `is_recurring` flag and `recurring_interval` disagree.
#[derive(Debug, Clone)]
pub struct RecurrenceColumnsError {
    pub is_recurring: bool,
    pub interval: Option<RecurringInterval>,
}

impl fmt::Display for RecurrenceColumnsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "inconsistent recurrence columns: is_recurring={} recurring_interval={:?}",
            self.is_recurring, self.interval
        )
    }
}

impl std::error::Error for RecurrenceColumnsError {}

// ---------------------------------------------------------------------------
// Row structs
// ---------------------------------------------------------------------------

/// A client -- the root record everything else hangs off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: Uuid,
    pub client_name: String,
    /// Report due date.
    pub due_date: NaiveDate,
    pub content_due_date: Option<NaiveDate>,
    pub contract_renewal_date: Option<NaiveDate>,
    pub shoot_date: Option<NaiveDate>,
    pub posts_per_month: Option<i32>,
    pub ads_per_month: Option<i32>,
    pub package: Option<String>,
    pub monthly_reporting_canva_link: Option<String>,
    pub recurrence: RecurrenceConfig,
    pub last_recurring_update: Option<DateTime<Utc>>,
    pub shoot_status: ShootStatus,
    pub shoot_notes: Option<String>,
    pub notes: Option<String>,
    pub reminders: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for Client {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let is_recurring: bool = row.try_get("is_recurring")?;
        let interval: Option<RecurringInterval> = row.try_get("recurring_interval")?;
        let recurrence = RecurrenceConfig::from_columns(is_recurring, interval).map_err(|e| {
            sqlx::Error::ColumnDecode {
                index: "recurring_interval".to_owned(),
                source: Box::new(e),
            }
        })?;

        Ok(Self {
            id: row.try_get("id")?,
            client_name: row.try_get("client_name")?,
            due_date: row.try_get("due_date")?,
            content_due_date: row.try_get("content_due_date")?,
            contract_renewal_date: row.try_get("contract_renewal_date")?,
            shoot_date: row.try_get("shoot_date")?,
            posts_per_month: row.try_get("posts_per_month")?,
            ads_per_month: row.try_get("ads_per_month")?,
            package: row.try_get("package")?,
            monthly_reporting_canva_link: row.try_get("monthly_reporting_canva_link")?,
            recurrence,
            last_recurring_update: row.try_get("last_recurring_update")?,
            shoot_status: row.try_get("shoot_status")?,
            shoot_notes: row.try_get("shoot_notes")?,
            notes: row.try_get("notes")?,
            reminders: row.try_get("reminders")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// A team member who can be assigned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub avatar_url: Option<String>,
    /// Advisory role tag; nothing enforces it.
    pub role: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Join row linking a user to a client under a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ClientTeamAssignment {
    pub id: Uuid,
    pub client_id: Uuid,
    pub user_id: Uuid,
    pub role: TeamRole,
    pub created_at: DateTime<Utc>,
}

/// A team assignment joined with its user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignedUser {
    pub role: TeamRole,
    pub user: User,
}

impl<'r> FromRow<'r, PgRow> for AssignedUser {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            role: row.try_get("role")?,
            user: User {
                id: row.try_get("user_id")?,
                name: row.try_get("name")?,
                email: row.try_get("email")?,
                avatar_url: row.try_get("avatar_url")?,
                role: row.try_get("user_role")?,
                created_at: row.try_get("user_created_at")?,
            },
        })
    }
}

/// Planned posts and ads for one client in one month (`YYYY-MM`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct MonthlyContentPlan {
    pub id: Uuid,
    pub client_id: Uuid,
    pub month: String,
    pub posts_planned: i32,
    pub ads_planned: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
