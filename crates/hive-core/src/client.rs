//! Client service: validated create, update, delete, and report-date
//! advancement.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use hive_db::models::{Client, User};
use hive_db::queries::clients::{ClientChanges, NewClient};

use crate::error::{HiveError, HiveResult, ValidationError};
use crate::month::Month;
use crate::recurrence::advance_due_date;
use crate::rollover::check_plan_counts;
use crate::store::HiveStore;
use crate::team::{Team, TeamSelection};

/// Every writable client field, as entered for a new client.
pub type ClientDraft = NewClient;

/// A partial client update.
pub type ClientPatch = ClientChanges;

/// A client together with its team.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientWithTeam {
    #[serde(flatten)]
    pub client: Client,
    #[serde(flatten)]
    pub team: Team,
}

/// Plan counts entered alongside a new client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitialPlan {
    pub month: Month,
    pub posts_planned: i32,
    pub ads_planned: i32,
}

fn check_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        Err(ValidationError::BlankClientName)
    } else {
        Ok(())
    }
}

fn check_count(field: &'static str, value: Option<i32>) -> Result<(), ValidationError> {
    match value {
        Some(value) if value < 0 => Err(ValidationError::NegativeCount { field, value }),
        _ => Ok(()),
    }
}

pub fn validate_draft(draft: &ClientDraft) -> Result<(), ValidationError> {
    check_name(&draft.client_name)?;
    check_count("posts_per_month", draft.posts_per_month)?;
    check_count("ads_per_month", draft.ads_per_month)?;
    Ok(())
}

pub fn validate_changes(changes: &ClientPatch) -> Result<(), ValidationError> {
    if let Some(name) = &changes.client_name {
        check_name(name)?;
    }
    check_count("posts_per_month", changes.posts_per_month.flatten())?;
    check_count("ads_per_month", changes.ads_per_month.flatten())?;
    Ok(())
}

pub async fn create_client(store: &dyn HiveStore, draft: &ClientDraft) -> HiveResult<Client> {
    validate_draft(draft)?;
    let client = store.insert_client(draft).await?;
    tracing::info!(client_id = %client.id, name = %client.client_name, "created client");
    Ok(client)
}

pub async fn get_client(store: &dyn HiveStore, id: Uuid) -> HiveResult<Client> {
    store
        .get_client(id)
        .await?
        .ok_or(HiveError::ClientNotFound(id))
}

pub async fn update_client(
    store: &dyn HiveStore,
    id: Uuid,
    changes: &ClientPatch,
) -> HiveResult<Client> {
    validate_changes(changes)?;
    store
        .update_client(id, changes)
        .await?
        .ok_or(HiveError::ClientNotFound(id))
}

/// Delete a client along with its team and plans.
pub async fn delete_client(store: &dyn HiveStore, id: Uuid) -> HiveResult<()> {
    if !store.delete_client(id).await? {
        return Err(HiveError::ClientNotFound(id));
    }
    tracing::info!(client_id = %id, "deleted client");
    Ok(())
}

/// Create a client, then its team (manager optional) and first plan.
///
/// All input is validated before the first write. The three writes are not
/// one transaction: a failure after the client insert leaves the client in
/// place and is returned as the error.
pub async fn create_client_with_team_and_plan(
    store: &dyn HiveStore,
    draft: &ClientDraft,
    team: &TeamSelection,
    plan: Option<&InitialPlan>,
) -> HiveResult<ClientWithTeam> {
    validate_draft(draft)?;
    if let Some(plan) = plan {
        check_plan_counts(plan.posts_planned, plan.ads_planned)?;
    }

    let client = store.insert_client(draft).await?;
    tracing::info!(client_id = %client.id, name = %client.client_name, "created client");

    if !team.is_empty() {
        store.add_team_members(client.id, &team.members()).await?;
    }
    if let Some(plan) = plan {
        store
            .upsert_plan(client.id, plan.month, plan.posts_planned, plan.ads_planned)
            .await?;
    }

    let team = Team::from_assignments(store.list_team(client.id).await?);
    Ok(ClientWithTeam { client, team })
}

/// Every client, soonest due first, each with its team.
pub async fn list_clients_with_team(store: &dyn HiveStore) -> HiveResult<Vec<ClientWithTeam>> {
    let clients = store.list_clients().await?;
    let mut out = Vec::with_capacity(clients.len());
    for client in clients {
        let team = Team::from_assignments(store.list_team(client.id).await?);
        out.push(ClientWithTeam { client, team });
    }
    Ok(out)
}

/// Distinct users assigned to any client, ordered by name.
pub fn all_assignees(clients: &[ClientWithTeam]) -> Vec<User> {
    let mut seen: HashMap<Uuid, User> = HashMap::new();
    for entry in clients {
        for (user, _) in entry.team.members() {
            seen.entry(user.id).or_insert_with(|| user.clone());
        }
    }
    let mut users: Vec<User> = seen.into_values().collect();
    users.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
    users
}

/// Move a recurring client's report due date forward one interval, stamping
/// `last_recurring_update` with `now`.
pub async fn advance_client_due_date(
    store: &dyn HiveStore,
    id: Uuid,
    now: DateTime<Utc>,
) -> HiveResult<Client> {
    let client = get_client(store, id).await?;
    let interval = client
        .recurrence
        .interval()
        .ok_or(HiveError::NotRecurring(id))?;

    let next = advance_due_date(client.due_date, interval)?;
    let changes = ClientChanges {
        due_date: Some(next),
        last_recurring_update: Some(now),
        ..Default::default()
    };
    let updated = store
        .update_client(id, &changes)
        .await?
        .ok_or(HiveError::ClientNotFound(id))?;

    tracing::info!(
        client_id = %id,
        from = %client.due_date,
        to = %updated.due_date,
        interval = %interval,
        "advanced report due date"
    );
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn draft(name: &str) -> ClientDraft {
        ClientDraft::new(name, NaiveDate::from_ymd_opt(2025, 6, 1).unwrap())
    }

    #[test]
    fn draft_validation() {
        assert!(validate_draft(&draft("Acme")).is_ok());
        assert_eq!(
            validate_draft(&draft("   ")),
            Err(ValidationError::BlankClientName)
        );

        let mut negative = draft("Acme");
        negative.ads_per_month = Some(-3);
        assert_eq!(
            validate_draft(&negative),
            Err(ValidationError::NegativeCount {
                field: "ads_per_month",
                value: -3
            })
        );
    }

    #[test]
    fn changes_validation() {
        assert!(validate_changes(&ClientPatch::default()).is_ok());

        let blank = ClientPatch {
            client_name: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(validate_changes(&blank), Err(ValidationError::BlankClientName));

        let cleared = ClientPatch {
            posts_per_month: Some(None),
            ..Default::default()
        };
        assert!(validate_changes(&cleared).is_ok());

        let negative = ClientPatch {
            posts_per_month: Some(Some(-1)),
            ..Default::default()
        };
        assert!(validate_changes(&negative).is_err());
    }
}
