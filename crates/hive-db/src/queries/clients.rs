//! Database query functions for the `clients` table.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::models::{Client, RecurrenceConfig, ShootStatus};

/// Parameters for inserting a new client row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewClient {
    pub client_name: String,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub content_due_date: Option<NaiveDate>,
    #[serde(default)]
    pub contract_renewal_date: Option<NaiveDate>,
    #[serde(default)]
    pub shoot_date: Option<NaiveDate>,
    #[serde(default)]
    pub posts_per_month: Option<i32>,
    #[serde(default)]
    pub ads_per_month: Option<i32>,
    #[serde(default)]
    pub package: Option<String>,
    #[serde(default)]
    pub monthly_reporting_canva_link: Option<String>,
    #[serde(default)]
    pub recurrence: RecurrenceConfig,
    #[serde(default)]
    pub shoot_status: ShootStatus,
    #[serde(default)]
    pub shoot_notes: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub reminders: Option<String>,
}

impl NewClient {
    /// A minimal client: name and report due date, everything else default.
    pub fn new(client_name: impl Into<String>, due_date: NaiveDate) -> Self {
        Self {
            client_name: client_name.into(),
            due_date,
            content_due_date: None,
            contract_renewal_date: None,
            shoot_date: None,
            posts_per_month: None,
            ads_per_month: None,
            package: None,
            monthly_reporting_canva_link: None,
            recurrence: RecurrenceConfig::Disabled,
            shoot_status: ShootStatus::NotBooked,
            shoot_notes: None,
            notes: None,
            reminders: None,
        }
    }
}

/// A partial update. `None` leaves a column untouched; for nullable columns
/// `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientChanges {
    pub client_name: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub content_due_date: Option<Option<NaiveDate>>,
    pub contract_renewal_date: Option<Option<NaiveDate>>,
    pub shoot_date: Option<Option<NaiveDate>>,
    pub posts_per_month: Option<Option<i32>>,
    pub ads_per_month: Option<Option<i32>>,
    pub package: Option<Option<String>>,
    pub monthly_reporting_canva_link: Option<Option<String>>,
    pub recurrence: Option<RecurrenceConfig>,
    pub last_recurring_update: Option<DateTime<Utc>>,
    pub shoot_status: Option<ShootStatus>,
    pub shoot_notes: Option<Option<String>>,
    pub notes: Option<Option<String>>,
    pub reminders: Option<Option<String>>,
}

impl ClientChanges {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply the changes to an in-memory client, mirroring [`update_client`].
    pub fn apply_to(&self, client: &mut Client) {
        fn set<T: Clone>(slot: &mut T, value: &Option<T>) {
            if let Some(v) = value {
                *slot = v.clone();
            }
        }

        set(&mut client.client_name, &self.client_name);
        set(&mut client.due_date, &self.due_date);
        set(&mut client.content_due_date, &self.content_due_date);
        set(&mut client.contract_renewal_date, &self.contract_renewal_date);
        set(&mut client.shoot_date, &self.shoot_date);
        set(&mut client.posts_per_month, &self.posts_per_month);
        set(&mut client.ads_per_month, &self.ads_per_month);
        set(&mut client.package, &self.package);
        set(
            &mut client.monthly_reporting_canva_link,
            &self.monthly_reporting_canva_link,
        );
        set(&mut client.recurrence, &self.recurrence);
        if let Some(at) = self.last_recurring_update {
            client.last_recurring_update = Some(at);
        }
        set(&mut client.shoot_status, &self.shoot_status);
        set(&mut client.shoot_notes, &self.shoot_notes);
        set(&mut client.notes, &self.notes);
        set(&mut client.reminders, &self.reminders);
    }
}

/// Insert a new client. Returns the row with server-generated defaults
/// (id, timestamps).
pub async fn insert_client(pool: &PgPool, new: &NewClient) -> Result<Client> {
    let (is_recurring, interval) = new.recurrence.columns();
    let client = sqlx::query_as::<_, Client>(
        "INSERT INTO clients (client_name, due_date, content_due_date, contract_renewal_date, \
         shoot_date, posts_per_month, ads_per_month, package, monthly_reporting_canva_link, \
         is_recurring, recurring_interval, shoot_status, shoot_notes, notes, reminders) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15) \
         RETURNING *",
    )
    .bind(&new.client_name)
    .bind(new.due_date)
    .bind(new.content_due_date)
    .bind(new.contract_renewal_date)
    .bind(new.shoot_date)
    .bind(new.posts_per_month)
    .bind(new.ads_per_month)
    .bind(&new.package)
    .bind(&new.monthly_reporting_canva_link)
    .bind(is_recurring)
    .bind(interval)
    .bind(new.shoot_status)
    .bind(&new.shoot_notes)
    .bind(&new.notes)
    .bind(&new.reminders)
    .fetch_one(pool)
    .await
    .with_context(|| format!("failed to add client {:?}", new.client_name))?;

    Ok(client)
}

/// Fetch a client by ID.
pub async fn get_client(pool: &PgPool, id: Uuid) -> Result<Option<Client>> {
    let client = sqlx::query_as::<_, Client>("SELECT * FROM clients WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch client")?;

    Ok(client)
}

/// List all clients, soonest report due date first.
pub async fn list_clients(pool: &PgPool) -> Result<Vec<Client>> {
    let clients =
        sqlx::query_as::<_, Client>("SELECT * FROM clients ORDER BY due_date ASC, client_name ASC")
            .fetch_all(pool)
            .await
            .context("failed to fetch clients")?;

    Ok(clients)
}

/// Apply a partial update and return the updated row, or `None` if the
/// client does not exist. Always bumps `updated_at`.
pub async fn update_client(
    pool: &PgPool,
    id: Uuid,
    changes: &ClientChanges,
) -> Result<Option<Client>> {
    let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new("UPDATE clients SET ");
    {
        let mut set = qb.separated(", ");
        set.push("updated_at = now()");

        if let Some(v) = &changes.client_name {
            set.push("client_name = ").push_bind_unseparated(v.clone());
        }
        if let Some(v) = changes.due_date {
            set.push("due_date = ").push_bind_unseparated(v);
        }
        if let Some(v) = changes.content_due_date {
            set.push("content_due_date = ").push_bind_unseparated(v);
        }
        if let Some(v) = changes.contract_renewal_date {
            set.push("contract_renewal_date = ").push_bind_unseparated(v);
        }
        if let Some(v) = changes.shoot_date {
            set.push("shoot_date = ").push_bind_unseparated(v);
        }
        if let Some(v) = changes.posts_per_month {
            set.push("posts_per_month = ").push_bind_unseparated(v);
        }
        if let Some(v) = changes.ads_per_month {
            set.push("ads_per_month = ").push_bind_unseparated(v);
        }
        if let Some(v) = &changes.package {
            set.push("package = ").push_bind_unseparated(v.clone());
        }
        if let Some(v) = &changes.monthly_reporting_canva_link {
            set.push("monthly_reporting_canva_link = ")
                .push_bind_unseparated(v.clone());
        }
        if let Some(recurrence) = changes.recurrence {
            let (is_recurring, interval) = recurrence.columns();
            set.push("is_recurring = ").push_bind_unseparated(is_recurring);
            set.push("recurring_interval = ").push_bind_unseparated(interval);
        }
        if let Some(v) = changes.last_recurring_update {
            set.push("last_recurring_update = ").push_bind_unseparated(v);
        }
        if let Some(v) = changes.shoot_status {
            set.push("shoot_status = ").push_bind_unseparated(v);
        }
        if let Some(v) = &changes.shoot_notes {
            set.push("shoot_notes = ").push_bind_unseparated(v.clone());
        }
        if let Some(v) = &changes.notes {
            set.push("notes = ").push_bind_unseparated(v.clone());
        }
        if let Some(v) = &changes.reminders {
            set.push("reminders = ").push_bind_unseparated(v.clone());
        }
    }
    qb.push(" WHERE id = ").push_bind(id).push(" RETURNING *");

    let client = qb
        .build_query_as::<Client>()
        .fetch_optional(pool)
        .await
        .with_context(|| format!("failed to update client {id}"))?;

    Ok(client)
}

/// Delete a client. Team assignments and plans go with it (ON DELETE
/// CASCADE). Returns `false` if no such client existed.
pub async fn delete_client(pool: &PgPool, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM clients WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .with_context(|| format!("failed to delete client {id}"))?;

    Ok(result.rows_affected() > 0)
}
