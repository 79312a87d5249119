//! Database query functions for the `monthly_content_plans` table.
//!
//! `month` is always a `YYYY-MM` string; the table's CHECK constraint rejects
//! anything else, and lexical order on that format is chronological.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::MonthlyContentPlan;

/// Fetch the plan for one (client, month) pair.
pub async fn get_plan(
    pool: &PgPool,
    client_id: Uuid,
    month: &str,
) -> Result<Option<MonthlyContentPlan>> {
    let plan = sqlx::query_as::<_, MonthlyContentPlan>(
        "SELECT * FROM monthly_content_plans WHERE client_id = $1 AND month = $2",
    )
    .bind(client_id)
    .bind(month)
    .fetch_optional(pool)
    .await
    .context("failed to fetch monthly plan")?;

    Ok(plan)
}

/// The client's plan with the greatest month, if any.
pub async fn get_latest_plan(pool: &PgPool, client_id: Uuid) -> Result<Option<MonthlyContentPlan>> {
    let plan = sqlx::query_as::<_, MonthlyContentPlan>(
        "SELECT * FROM monthly_content_plans \
         WHERE client_id = $1 \
         ORDER BY month DESC \
         LIMIT 1",
    )
    .bind(client_id)
    .fetch_optional(pool)
    .await
    .context("failed to fetch latest monthly plan")?;

    Ok(plan)
}

/// List every plan for a client, newest month first.
pub async fn list_plans_for_client(
    pool: &PgPool,
    client_id: Uuid,
) -> Result<Vec<MonthlyContentPlan>> {
    let plans = sqlx::query_as::<_, MonthlyContentPlan>(
        "SELECT * FROM monthly_content_plans WHERE client_id = $1 ORDER BY month DESC",
    )
    .bind(client_id)
    .fetch_all(pool)
    .await
    .context("failed to list monthly plans")?;

    Ok(plans)
}

/// Create the plan for (client, month) unless one already exists, and return
/// whichever row is stored afterwards.
///
/// `ON CONFLICT DO NOTHING` means a concurrent creator wins and this call
/// returns its row instead of inserting a duplicate.
pub async fn insert_plan_if_absent(
    pool: &PgPool,
    client_id: Uuid,
    month: &str,
    posts_planned: i32,
    ads_planned: i32,
) -> Result<MonthlyContentPlan> {
    let inserted = sqlx::query_as::<_, MonthlyContentPlan>(
        "INSERT INTO monthly_content_plans (client_id, month, posts_planned, ads_planned) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT (client_id, month) DO NOTHING \
         RETURNING *",
    )
    .bind(client_id)
    .bind(month)
    .bind(posts_planned)
    .bind(ads_planned)
    .fetch_optional(pool)
    .await
    .context("failed to create recurring plan")?;

    match inserted {
        Some(plan) => Ok(plan),
        None => get_plan(pool, client_id, month)
            .await?
            .with_context(|| format!("plan for client {client_id} month {month} vanished")),
    }
}

/// Insert or overwrite the plan for (client, month).
pub async fn upsert_plan(
    pool: &PgPool,
    client_id: Uuid,
    month: &str,
    posts_planned: i32,
    ads_planned: i32,
) -> Result<MonthlyContentPlan> {
    let plan = sqlx::query_as::<_, MonthlyContentPlan>(
        "INSERT INTO monthly_content_plans (client_id, month, posts_planned, ads_planned) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT (client_id, month) DO UPDATE \
         SET posts_planned = EXCLUDED.posts_planned, \
             ads_planned = EXCLUDED.ads_planned, \
             updated_at = now() \
         RETURNING *",
    )
    .bind(client_id)
    .bind(month)
    .bind(posts_planned)
    .bind(ads_planned)
    .fetch_one(pool)
    .await
    .context("failed to update monthly plan")?;

    Ok(plan)
}
