//! Search, filter, and sort over the client list.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use hive_db::models::{ShootStatus, TeamRole};

use crate::client::ClientWithTeam;
use crate::dates::{is_due_this_week, is_due_today, is_overdue};

/// Which clients to show by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatusFilter {
    #[default]
    All,
    Overdue,
    Today,
    Week,
    ContractRenewal,
    ShootNotBooked,
    ShootBooked,
}

impl StatusFilter {
    pub fn matches(self, entry: &ClientWithTeam, today: NaiveDate) -> bool {
        let client = &entry.client;
        match self {
            Self::All => true,
            Self::Overdue => is_overdue(client.due_date, today),
            Self::Today => is_due_today(client.due_date, today),
            Self::Week => is_due_this_week(client.due_date, today),
            Self::ContractRenewal => client.contract_renewal_date.is_some(),
            Self::ShootNotBooked => client.shoot_status == ShootStatus::NotBooked,
            Self::ShootBooked => client.shoot_status == ShootStatus::Booked,
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::All => "all",
            Self::Overdue => "overdue",
            Self::Today => "today",
            Self::Week => "week",
            Self::ContractRenewal => "contract-renewal",
            Self::ShootNotBooked => "shoot-not-booked",
            Self::ShootBooked => "shoot-booked",
        };
        f.write_str(s)
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "overdue" => Ok(Self::Overdue),
            "today" => Ok(Self::Today),
            "week" => Ok(Self::Week),
            "contract-renewal" => Ok(Self::ContractRenewal),
            "shoot-not-booked" => Ok(Self::ShootNotBooked),
            "shoot-booked" => Ok(Self::ShootBooked),
            other => Err(format!("invalid status filter: {other:?}")),
        }
    }
}

/// Client list ordering. Every order is stable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    #[default]
    DueDate,
    Name,
    Package,
    /// Soonest renewal first; clients without one go last.
    ContractRenewal,
}

impl SortOrder {
    fn compare(self, a: &ClientWithTeam, b: &ClientWithTeam) -> Ordering {
        let (a, b) = (&a.client, &b.client);
        match self {
            Self::DueDate => a.due_date.cmp(&b.due_date),
            Self::Name => a
                .client_name
                .to_lowercase()
                .cmp(&b.client_name.to_lowercase()),
            Self::Package => a
                .package
                .as_deref()
                .unwrap_or("")
                .cmp(b.package.as_deref().unwrap_or("")),
            Self::ContractRenewal => match (a.contract_renewal_date, b.contract_renewal_date) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::DueDate => "due-date",
            Self::Name => "name",
            Self::Package => "package",
            Self::ContractRenewal => "contract-renewal",
        };
        f.write_str(s)
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "due-date" => Ok(Self::DueDate),
            "name" => Ok(Self::Name),
            "package" => Ok(Self::Package),
            "contract-renewal" => Ok(Self::ContractRenewal),
            other => Err(format!("invalid sort order: {other:?}")),
        }
    }
}

/// Criteria for narrowing and ordering the client list. All criteria must
/// match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientQuery {
    /// Case-insensitive substring of the name, notes, or package.
    pub search: Option<String>,
    pub status: StatusFilter,
    /// Keep clients this user is on, in any role.
    pub assignee: Option<Uuid>,
    /// Keep clients with at least one member in this role.
    pub role: Option<TeamRole>,
    pub sort: SortOrder,
}

impl ClientQuery {
    pub fn matches(&self, entry: &ClientWithTeam, today: NaiveDate) -> bool {
        if let Some(needle) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let needle = needle.to_lowercase();
            let client = &entry.client;
            let hit = [
                Some(client.client_name.as_str()),
                client.notes.as_deref(),
                client.package.as_deref(),
            ]
            .into_iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }

        if !self.status.matches(entry, today) {
            return false;
        }
        if let Some(user_id) = self.assignee {
            if !entry.team.includes(user_id) {
                return false;
            }
        }
        if let Some(role) = self.role {
            if !entry.team.has_role(role) {
                return false;
            }
        }
        true
    }

    /// Filter then sort.
    pub fn apply(&self, clients: Vec<ClientWithTeam>, today: NaiveDate) -> Vec<ClientWithTeam> {
        let mut out: Vec<ClientWithTeam> = clients
            .into_iter()
            .filter(|c| self.matches(c, today))
            .collect();
        out.sort_by(|a, b| self.sort.compare(a, b));
        out
    }
}
