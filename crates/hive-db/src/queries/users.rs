//! Database query functions for the `users` table.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::User;

/// Parameters for inserting a new user row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// Insert a user. Fails on a duplicate email (UNIQUE constraint).
pub async fn insert_user(pool: &PgPool, new: &NewUser) -> Result<User> {
    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (name, email, avatar_url, role) \
         VALUES ($1, $2, $3, $4) \
         RETURNING *",
    )
    .bind(&new.name)
    .bind(&new.email)
    .bind(&new.avatar_url)
    .bind(&new.role)
    .fetch_one(pool)
    .await
    .with_context(|| format!("failed to add user {:?}", new.email))?;

    Ok(user)
}

/// Fetch a user by ID.
pub async fn get_user(pool: &PgPool, id: Uuid) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch user")?;

    Ok(user)
}

/// List all users, ordered by name.
pub async fn list_users(pool: &PgPool) -> Result<Vec<User>> {
    let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY name ASC")
        .fetch_all(pool)
        .await
        .context("failed to fetch users")?;

    Ok(users)
}
