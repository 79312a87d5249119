//! [`HiveStore`] over PostgreSQL, delegating to `hive_db::queries`.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use hive_db::models::{AssignedUser, Client, MonthlyContentPlan, TeamRole, User};
use hive_db::queries::clients::{self, ClientChanges, NewClient};
use hive_db::queries::users::{self, NewUser};
use hive_db::queries::{monthly_plans, team};

use super::HiveStore;
use crate::month::Month;

/// PostgreSQL-backed store. Cheap to clone (the pool is reference counted).
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl HiveStore for PgStore {
    async fn list_clients(&self) -> Result<Vec<Client>> {
        clients::list_clients(&self.pool).await
    }

    async fn get_client(&self, id: Uuid) -> Result<Option<Client>> {
        clients::get_client(&self.pool, id).await
    }

    async fn insert_client(&self, new: &NewClient) -> Result<Client> {
        clients::insert_client(&self.pool, new).await
    }

    async fn update_client(&self, id: Uuid, changes: &ClientChanges) -> Result<Option<Client>> {
        clients::update_client(&self.pool, id, changes).await
    }

    async fn delete_client(&self, id: Uuid) -> Result<bool> {
        clients::delete_client(&self.pool, id).await
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        users::list_users(&self.pool).await
    }

    async fn insert_user(&self, new: &NewUser) -> Result<User> {
        users::insert_user(&self.pool, new).await
    }

    async fn list_team(&self, client_id: Uuid) -> Result<Vec<AssignedUser>> {
        team::list_team_for_client(&self.pool, client_id).await
    }

    async fn add_team_members(&self, client_id: Uuid, members: &[(Uuid, TeamRole)]) -> Result<()> {
        team::insert_assignments(&self.pool, client_id, members).await?;
        Ok(())
    }

    async fn replace_team(&self, client_id: Uuid, members: &[(Uuid, TeamRole)]) -> Result<()> {
        team::replace_team(&self.pool, client_id, members).await?;
        Ok(())
    }

    async fn get_plan(&self, client_id: Uuid, month: Month) -> Result<Option<MonthlyContentPlan>> {
        monthly_plans::get_plan(&self.pool, client_id, &month.to_string()).await
    }

    async fn latest_plan(&self, client_id: Uuid) -> Result<Option<MonthlyContentPlan>> {
        monthly_plans::get_latest_plan(&self.pool, client_id).await
    }

    async fn insert_plan_if_absent(
        &self,
        client_id: Uuid,
        month: Month,
        posts_planned: i32,
        ads_planned: i32,
    ) -> Result<MonthlyContentPlan> {
        monthly_plans::insert_plan_if_absent(
            &self.pool,
            client_id,
            &month.to_string(),
            posts_planned,
            ads_planned,
        )
        .await
    }

    async fn upsert_plan(
        &self,
        client_id: Uuid,
        month: Month,
        posts_planned: i32,
        ads_planned: i32,
    ) -> Result<MonthlyContentPlan> {
        monthly_plans::upsert_plan(
            &self.pool,
            client_id,
            &month.to_string(),
            posts_planned,
            ads_planned,
        )
        .await
    }
}
