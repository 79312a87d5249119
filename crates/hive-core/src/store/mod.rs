//! The `HiveStore` trait -- the persistence boundary the services run against.
//!
//! [`PgStore`] is the production implementation over PostgreSQL;
//! [`MemoryStore`] keeps everything in process for tests and dry runs. The
//! trait is object-safe so services take `&dyn HiveStore`.

pub mod memory;
pub mod postgres;

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use hive_db::models::{AssignedUser, Client, MonthlyContentPlan, TeamRole, User};
use hive_db::queries::clients::{ClientChanges, NewClient};
use hive_db::queries::users::NewUser;

use crate::month::Month;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Minimum set of persistence operations the services need.
///
/// Every call is a single round trip with no retry; failures surface as
/// `anyhow` errors carrying a description of the failed operation.
#[async_trait]
pub trait HiveStore: Send + Sync {
    /// All clients, earliest report due date first.
    async fn list_clients(&self) -> Result<Vec<Client>>;

    async fn get_client(&self, id: Uuid) -> Result<Option<Client>>;

    async fn insert_client(&self, new: &NewClient) -> Result<Client>;

    /// `None` when the client does not exist.
    async fn update_client(&self, id: Uuid, changes: &ClientChanges) -> Result<Option<Client>>;

    /// `false` when the client did not exist.
    async fn delete_client(&self, id: Uuid) -> Result<bool>;

    /// All users, ordered by name.
    async fn list_users(&self) -> Result<Vec<User>>;

    async fn insert_user(&self, new: &NewUser) -> Result<User>;

    /// A client's assignments joined with their users.
    async fn list_team(&self, client_id: Uuid) -> Result<Vec<AssignedUser>>;

    /// Add assignments, keeping existing ones.
    async fn add_team_members(&self, client_id: Uuid, members: &[(Uuid, TeamRole)]) -> Result<()>;

    /// Atomically swap the client's whole assignment set for `members`.
    async fn replace_team(&self, client_id: Uuid, members: &[(Uuid, TeamRole)]) -> Result<()>;

    async fn get_plan(&self, client_id: Uuid, month: Month) -> Result<Option<MonthlyContentPlan>>;

    /// The client's plan with the greatest month.
    async fn latest_plan(&self, client_id: Uuid) -> Result<Option<MonthlyContentPlan>>;

    /// Create the (client, month) plan unless one exists; return the stored row.
    async fn insert_plan_if_absent(
        &self,
        client_id: Uuid,
        month: Month,
        posts_planned: i32,
        ads_planned: i32,
    ) -> Result<MonthlyContentPlan>;

    /// Insert or overwrite the (client, month) plan.
    async fn upsert_plan(
        &self,
        client_id: Uuid,
        month: Month,
        posts_planned: i32,
        ads_planned: i32,
    ) -> Result<MonthlyContentPlan>;
}

// HiveStore must stay usable as `dyn HiveStore`.
const _: () = {
    fn _assert_object_safe(_: &dyn HiveStore) {}
};
