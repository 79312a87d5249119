//! In-process [`HiveStore`] for tests and dry runs.
//!
//! Enforces the same row constraints the PostgreSQL schema does (non-blank
//! names, non-negative counts, unique emails, one manager per client, unique
//! (client, month) plans, cascading deletes) so services behave identically
//! against either store.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Result, bail};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use hive_db::models::{AssignedUser, Client, ClientTeamAssignment, MonthlyContentPlan, TeamRole, User};
use hive_db::queries::clients::{ClientChanges, NewClient};
use hive_db::queries::users::NewUser;

use super::HiveStore;
use crate::month::Month;

#[derive(Debug, Default)]
struct Inner {
    clients: HashMap<Uuid, Client>,
    users: HashMap<Uuid, User>,
    assignments: Vec<ClientTeamAssignment>,
    plans: Vec<MonthlyContentPlan>,
    writes: usize,
    fail_after: Option<usize>,
}

impl Inner {
    /// Gate every mutating call; fails once the injected write budget is spent.
    fn begin_write(&mut self, what: &str) -> Result<()> {
        if let Some(limit) = self.fail_after {
            if self.writes >= limit {
                bail!("failed to {what}: injected store failure");
            }
        }
        Ok(())
    }

    fn commit_write(&mut self) {
        self.writes += 1;
    }

    fn check_client(client: &Client) -> Result<()> {
        if client.client_name.trim().is_empty() {
            bail!("client name must not be blank");
        }
        for (field, value) in [
            ("posts_per_month", client.posts_per_month),
            ("ads_per_month", client.ads_per_month),
        ] {
            if value.is_some_and(|v| v < 0) {
                bail!("{field} must not be negative");
            }
        }
        Ok(())
    }

    fn check_members(&self, client_id: Uuid, members: &[(Uuid, TeamRole)]) -> Result<()> {
        if !self.clients.contains_key(&client_id) {
            bail!("client {client_id} does not exist");
        }
        if let Some((user_id, _)) = members.iter().find(|(id, _)| !self.users.contains_key(id)) {
            bail!("user {user_id} does not exist");
        }
        Ok(())
    }

    fn push_assignment(&mut self, client_id: Uuid, user_id: Uuid, role: TeamRole) {
        let exists = self
            .assignments
            .iter()
            .any(|a| a.client_id == client_id && a.user_id == user_id && a.role == role);
        if !exists {
            self.assignments.push(ClientTeamAssignment {
                id: Uuid::new_v4(),
                client_id,
                user_id,
                role,
                created_at: Utc::now(),
            });
        }
    }

    fn manager_count(&self, client_id: Uuid) -> usize {
        self.assignments
            .iter()
            .filter(|a| a.client_id == client_id && a.role == TeamRole::Manager)
            .count()
    }

    fn find_plan(&self, client_id: Uuid, month: &str) -> Option<&MonthlyContentPlan> {
        self.plans
            .iter()
            .find(|p| p.client_id == client_id && p.month == month)
    }

    fn check_plan(&self, client_id: Uuid, posts: i32, ads: i32) -> Result<()> {
        if !self.clients.contains_key(&client_id) {
            bail!("client {client_id} does not exist");
        }
        if posts < 0 || ads < 0 {
            bail!("planned counts must not be negative");
        }
        Ok(())
    }
}

/// [`HiveStore`] backed by in-memory maps behind a mutex.
///
/// Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful mutating calls so far.
    pub async fn write_count(&self) -> usize {
        self.inner.lock().await.writes
    }

    /// Make every mutating call fail once `writes` of them have succeeded.
    pub async fn fail_after_writes(&self, writes: usize) {
        self.inner.lock().await.fail_after = Some(writes);
    }

    /// All assignments currently stored, for assertions.
    pub async fn assignments(&self) -> Vec<ClientTeamAssignment> {
        self.inner.lock().await.assignments.clone()
    }

    /// All plans currently stored, for assertions.
    pub async fn plans(&self) -> Vec<MonthlyContentPlan> {
        self.inner.lock().await.plans.clone()
    }
}

#[async_trait]
impl HiveStore for MemoryStore {
    async fn list_clients(&self) -> Result<Vec<Client>> {
        let inner = self.inner.lock().await;
        let mut clients: Vec<Client> = inner.clients.values().cloned().collect();
        clients.sort_by(|a, b| {
            a.due_date
                .cmp(&b.due_date)
                .then_with(|| a.client_name.cmp(&b.client_name))
        });
        Ok(clients)
    }

    async fn get_client(&self, id: Uuid) -> Result<Option<Client>> {
        Ok(self.inner.lock().await.clients.get(&id).cloned())
    }

    async fn insert_client(&self, new: &NewClient) -> Result<Client> {
        let mut inner = self.inner.lock().await;
        inner.begin_write("add client")?;

        let now = Utc::now();
        let client = Client {
            id: Uuid::new_v4(),
            client_name: new.client_name.clone(),
            due_date: new.due_date,
            content_due_date: new.content_due_date,
            contract_renewal_date: new.contract_renewal_date,
            shoot_date: new.shoot_date,
            posts_per_month: new.posts_per_month,
            ads_per_month: new.ads_per_month,
            package: new.package.clone(),
            monthly_reporting_canva_link: new.monthly_reporting_canva_link.clone(),
            recurrence: new.recurrence,
            last_recurring_update: None,
            shoot_status: new.shoot_status,
            shoot_notes: new.shoot_notes.clone(),
            notes: new.notes.clone(),
            reminders: new.reminders.clone(),
            created_at: now,
            updated_at: now,
        };
        Inner::check_client(&client)?;

        inner.clients.insert(client.id, client.clone());
        inner.commit_write();
        Ok(client)
    }

    async fn update_client(&self, id: Uuid, changes: &ClientChanges) -> Result<Option<Client>> {
        let mut inner = self.inner.lock().await;
        inner.begin_write("update client")?;

        let Some(existing) = inner.clients.get(&id) else {
            return Ok(None);
        };
        let mut updated = existing.clone();
        changes.apply_to(&mut updated);
        updated.updated_at = Utc::now();
        Inner::check_client(&updated)?;

        inner.clients.insert(id, updated.clone());
        inner.commit_write();
        Ok(Some(updated))
    }

    async fn delete_client(&self, id: Uuid) -> Result<bool> {
        let mut inner = self.inner.lock().await;
        inner.begin_write("delete client")?;

        if inner.clients.remove(&id).is_none() {
            return Ok(false);
        }
        inner.assignments.retain(|a| a.client_id != id);
        inner.plans.retain(|p| p.client_id != id);
        inner.commit_write();
        Ok(true)
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let inner = self.inner.lock().await;
        let mut users: Vec<User> = inner.users.values().cloned().collect();
        users.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(users)
    }

    async fn insert_user(&self, new: &NewUser) -> Result<User> {
        let mut inner = self.inner.lock().await;
        inner.begin_write("add user")?;

        if inner.users.values().any(|u| u.email == new.email) {
            bail!("failed to add user: email {:?} already exists", new.email);
        }
        let user = User {
            id: Uuid::new_v4(),
            name: new.name.clone(),
            email: new.email.clone(),
            avatar_url: new.avatar_url.clone(),
            role: new.role.clone(),
            created_at: Utc::now(),
        };
        inner.users.insert(user.id, user.clone());
        inner.commit_write();
        Ok(user)
    }

    async fn list_team(&self, client_id: Uuid) -> Result<Vec<AssignedUser>> {
        let inner = self.inner.lock().await;
        let mut team: Vec<AssignedUser> = inner
            .assignments
            .iter()
            .filter(|a| a.client_id == client_id)
            .filter_map(|a| {
                inner.users.get(&a.user_id).map(|user| AssignedUser {
                    role: a.role,
                    user: user.clone(),
                })
            })
            .collect();
        team.sort_by(|a, b| {
            a.role
                .to_string()
                .cmp(&b.role.to_string())
                .then_with(|| a.user.name.cmp(&b.user.name))
        });
        Ok(team)
    }

    async fn add_team_members(&self, client_id: Uuid, members: &[(Uuid, TeamRole)]) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.begin_write("add team members")?;
        inner.check_members(client_id, members)?;

        let new_managers = members
            .iter()
            .filter(|(_, role)| *role == TeamRole::Manager)
            .count();
        if inner.manager_count(client_id) + new_managers > 1 {
            bail!("client {client_id} can have at most one manager");
        }

        for &(user_id, role) in members {
            inner.push_assignment(client_id, user_id, role);
        }
        inner.commit_write();
        Ok(())
    }

    async fn replace_team(&self, client_id: Uuid, members: &[(Uuid, TeamRole)]) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.begin_write("replace team")?;
        inner.check_members(client_id, members)?;

        let managers = members
            .iter()
            .filter(|(_, role)| *role == TeamRole::Manager)
            .count();
        if managers > 1 {
            bail!("client {client_id} can have at most one manager");
        }

        inner.assignments.retain(|a| a.client_id != client_id);
        for &(user_id, role) in members {
            inner.push_assignment(client_id, user_id, role);
        }
        inner.commit_write();
        Ok(())
    }

    async fn get_plan(&self, client_id: Uuid, month: Month) -> Result<Option<MonthlyContentPlan>> {
        let inner = self.inner.lock().await;
        Ok(inner.find_plan(client_id, &month.to_string()).cloned())
    }

    async fn latest_plan(&self, client_id: Uuid) -> Result<Option<MonthlyContentPlan>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .plans
            .iter()
            .filter(|p| p.client_id == client_id)
            .max_by(|a, b| a.month.cmp(&b.month))
            .cloned())
    }

    async fn insert_plan_if_absent(
        &self,
        client_id: Uuid,
        month: Month,
        posts_planned: i32,
        ads_planned: i32,
    ) -> Result<MonthlyContentPlan> {
        let mut inner = self.inner.lock().await;
        let key = month.to_string();
        if let Some(existing) = inner.find_plan(client_id, &key) {
            return Ok(existing.clone());
        }

        inner.begin_write("create content plan")?;
        inner.check_plan(client_id, posts_planned, ads_planned)?;
        let now = Utc::now();
        let plan = MonthlyContentPlan {
            id: Uuid::new_v4(),
            client_id,
            month: key,
            posts_planned,
            ads_planned,
            created_at: now,
            updated_at: now,
        };
        inner.plans.push(plan.clone());
        inner.commit_write();
        Ok(plan)
    }

    async fn upsert_plan(
        &self,
        client_id: Uuid,
        month: Month,
        posts_planned: i32,
        ads_planned: i32,
    ) -> Result<MonthlyContentPlan> {
        let mut inner = self.inner.lock().await;
        inner.begin_write("save content plan")?;
        inner.check_plan(client_id, posts_planned, ads_planned)?;

        let key = month.to_string();
        let now = Utc::now();
        let plan = match inner
            .plans
            .iter_mut()
            .find(|p| p.client_id == client_id && p.month == key)
        {
            Some(existing) => {
                existing.posts_planned = posts_planned;
                existing.ads_planned = ads_planned;
                existing.updated_at = now;
                existing.clone()
            }
            None => {
                let plan = MonthlyContentPlan {
                    id: Uuid::new_v4(),
                    client_id,
                    month: key,
                    posts_planned,
                    ads_planned,
                    created_at: now,
                    updated_at: now,
                };
                inner.plans.push(plan.clone());
                plan
            }
        };
        inner.commit_write();
        Ok(plan)
    }
}
