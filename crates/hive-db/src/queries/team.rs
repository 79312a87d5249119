//! Database query functions for the `client_team_assignments` table.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{AssignedUser, ClientTeamAssignment, TeamRole};

/// List a client's assignments joined with their users, ordered by role
/// then user name.
pub async fn list_team_for_client(pool: &PgPool, client_id: Uuid) -> Result<Vec<AssignedUser>> {
    let rows = sqlx::query_as::<_, AssignedUser>(
        "SELECT a.role, u.id AS user_id, u.name, u.email, u.avatar_url, \
                u.role AS user_role, u.created_at AS user_created_at \
         FROM client_team_assignments a \
         JOIN users u ON u.id = a.user_id \
         WHERE a.client_id = $1 \
         ORDER BY a.role, u.name",
    )
    .bind(client_id)
    .fetch_all(pool)
    .await
    .context("failed to fetch client team")?;

    Ok(rows)
}

/// Insert assignments for a client without touching existing ones.
///
/// Uses `ON CONFLICT DO NOTHING` on the (client, user, role) triple, so
/// repeating an assignment is harmless.
pub async fn insert_assignments(
    pool: &PgPool,
    client_id: Uuid,
    members: &[(Uuid, TeamRole)],
) -> Result<Vec<ClientTeamAssignment>> {
    let mut tx = pool.begin().await.context("failed to begin transaction")?;
    let mut inserted = Vec::with_capacity(members.len());

    for (user_id, role) in members {
        let row = sqlx::query_as::<_, ClientTeamAssignment>(
            "INSERT INTO client_team_assignments (client_id, user_id, role) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (client_id, user_id, role) DO NOTHING \
             RETURNING *",
        )
        .bind(client_id)
        .bind(user_id)
        .bind(role)
        .fetch_optional(&mut *tx)
        .await
        .with_context(|| format!("failed to assign user {user_id} as {role}"))?;
        inserted.extend(row);
    }

    tx.commit().await.context("failed to commit transaction")?;
    Ok(inserted)
}

/// Replace a client's whole team in one transaction.
///
/// All existing assignments are deleted and `members` inserted inside a
/// single `BEGIN ... COMMIT`; any failure rolls back and leaves the previous
/// team in place.
pub async fn replace_team(
    pool: &PgPool,
    client_id: Uuid,
    members: &[(Uuid, TeamRole)],
) -> Result<Vec<ClientTeamAssignment>> {
    let mut tx = pool.begin().await.context("failed to begin transaction")?;

    sqlx::query("DELETE FROM client_team_assignments WHERE client_id = $1")
        .bind(client_id)
        .execute(&mut *tx)
        .await
        .context("failed to clear existing team")?;

    let mut inserted = Vec::with_capacity(members.len());
    for (user_id, role) in members {
        let row = sqlx::query_as::<_, ClientTeamAssignment>(
            "INSERT INTO client_team_assignments (client_id, user_id, role) \
             VALUES ($1, $2, $3) \
             RETURNING *",
        )
        .bind(client_id)
        .bind(user_id)
        .bind(role)
        .fetch_one(&mut *tx)
        .await
        .with_context(|| format!("failed to update team assignments: user {user_id} as {role}"))?;
        inserted.push(row);
    }

    // Rolls back on drop if we never get here.
    tx.commit().await.context("failed to commit transaction")?;

    Ok(inserted)
}

/// Count assignments for a client.
pub async fn count_assignments(pool: &PgPool, client_id: Uuid) -> Result<i64> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM client_team_assignments WHERE client_id = $1")
            .bind(client_id)
            .fetch_one(pool)
            .await
            .context("failed to count team assignments")?;

    Ok(count)
}
