//! Client team assignment.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use hive_db::models::{AssignedUser, TeamRole, User};

use crate::error::{HiveError, HiveResult, ValidationError};
use crate::store::HiveStore;

/// The users chosen for each role on a client's team.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamSelection {
    #[serde(default)]
    pub manager_id: Option<Uuid>,
    #[serde(default)]
    pub editor_ids: Vec<Uuid>,
    #[serde(default)]
    pub scripting_ids: Vec<Uuid>,
}

impl TeamSelection {
    pub fn is_empty(&self) -> bool {
        self.manager_id.is_none() && self.editor_ids.is_empty() && self.scripting_ids.is_empty()
    }

    /// Flatten into `(user, role)` pairs, manager first. Repeated ids within
    /// a role collapse to their first occurrence.
    pub fn members(&self) -> Vec<(Uuid, TeamRole)> {
        let mut members = Vec::new();
        if let Some(manager) = self.manager_id {
            members.push((manager, TeamRole::Manager));
        }
        for (ids, role) in [
            (&self.editor_ids, TeamRole::Editor),
            (&self.scripting_ids, TeamRole::Scripting),
        ] {
            for &id in ids {
                if !members.contains(&(id, role)) {
                    members.push((id, role));
                }
            }
        }
        members
    }
}

/// A client's team grouped by role. Users within a role are ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub manager: Option<User>,
    pub editors: Vec<User>,
    pub scripting: Vec<User>,
}

impl Team {
    pub fn from_assignments(assignments: impl IntoIterator<Item = AssignedUser>) -> Self {
        let mut team = Self::default();
        for AssignedUser { role, user } in assignments {
            match role {
                // At most one manager is stored; keep the first if not.
                TeamRole::Manager => {
                    team.manager.get_or_insert(user);
                }
                TeamRole::Editor => team.editors.push(user),
                TeamRole::Scripting => team.scripting.push(user),
            }
        }
        team.editors.sort_by(|a, b| a.name.cmp(&b.name));
        team.scripting.sort_by(|a, b| a.name.cmp(&b.name));
        team
    }

    /// Every member with their role, manager first.
    pub fn members(&self) -> impl Iterator<Item = (&User, TeamRole)> {
        self.manager
            .iter()
            .map(|u| (u, TeamRole::Manager))
            .chain(self.editors.iter().map(|u| (u, TeamRole::Editor)))
            .chain(self.scripting.iter().map(|u| (u, TeamRole::Scripting)))
    }

    pub fn has_role(&self, role: TeamRole) -> bool {
        match role {
            TeamRole::Manager => self.manager.is_some(),
            TeamRole::Editor => !self.editors.is_empty(),
            TeamRole::Scripting => !self.scripting.is_empty(),
        }
    }

    /// Whether `user_id` holds any role on the team.
    pub fn includes(&self, user_id: Uuid) -> bool {
        self.members().any(|(u, _)| u.id == user_id)
    }

    pub fn is_empty(&self) -> bool {
        self.members().next().is_none()
    }
}

pub async fn fetch_team(store: &dyn HiveStore, client_id: Uuid) -> HiveResult<Team> {
    let assignments = store.list_team(client_id).await?;
    Ok(Team::from_assignments(assignments))
}

/// Replace a client's whole team with `selection`.
///
/// A manager is required. The replacement is atomic: on any failure the
/// previous team stays in place.
pub async fn set_team(
    store: &dyn HiveStore,
    client_id: Uuid,
    selection: &TeamSelection,
) -> HiveResult<Team> {
    if selection.manager_id.is_none() {
        return Err(ValidationError::ManagerRequired.into());
    }

    if store.get_client(client_id).await?.is_none() {
        return Err(HiveError::ClientNotFound(client_id));
    }

    let members = selection.members();
    store.replace_team(client_id, &members).await?;
    tracing::info!(client_id = %client_id, members = members.len(), "replaced client team");

    fetch_team(store, client_id).await
}
