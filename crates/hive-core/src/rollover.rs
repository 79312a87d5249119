//! Monthly content-plan rollover.
//!
//! A recurring client's plan for a month is created lazily the first time
//! that month is looked at. The new plan copies the client's most recent
//! plan, or falls back to the client's default monthly counts. Lookups for
//! non-recurring clients never write.

use uuid::Uuid;

use hive_db::models::{Client, MonthlyContentPlan};

use crate::error::{HiveError, HiveResult, ValidationError};
use crate::month::Month;
use crate::store::HiveStore;

/// Where a freshly materialized plan takes its counts from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanSeed {
    /// Copied from the client's most recent stored plan.
    CarryForward { from: String, posts: i32, ads: i32 },
    /// Taken from the client's `posts_per_month` / `ads_per_month`.
    Defaults { posts: i32, ads: i32 },
}

impl PlanSeed {
    pub fn counts(&self) -> (i32, i32) {
        match *self {
            Self::CarryForward { posts, ads, .. } | Self::Defaults { posts, ads } => (posts, ads),
        }
    }
}

/// Decide how to seed a missing plan, or `None` when nothing should be
/// created.
///
/// `latest` is the client's most recent plan for any month.
pub fn rollover_seed(client: &Client, latest: Option<&MonthlyContentPlan>) -> Option<PlanSeed> {
    if !client.recurrence.is_recurring() {
        return None;
    }
    if let Some(prev) = latest {
        return Some(PlanSeed::CarryForward {
            from: prev.month.clone(),
            posts: prev.posts_planned,
            ads: prev.ads_planned,
        });
    }
    if client.posts_per_month.is_none() && client.ads_per_month.is_none() {
        return None;
    }
    Some(PlanSeed::Defaults {
        posts: client.posts_per_month.unwrap_or(0),
        ads: client.ads_per_month.unwrap_or(0),
    })
}

/// The plan for `client_id` in `month`, creating it for recurring clients
/// when it does not exist yet.
///
/// Safe to call repeatedly and concurrently: creation is insert-if-absent,
/// so every caller gets the same stored row.
pub async fn resolve_monthly_plan(
    store: &dyn HiveStore,
    client_id: Uuid,
    month: Month,
) -> HiveResult<Option<MonthlyContentPlan>> {
    if let Some(plan) = store.get_plan(client_id, month).await? {
        return Ok(Some(plan));
    }

    let client = store
        .get_client(client_id)
        .await?
        .ok_or(HiveError::ClientNotFound(client_id))?;
    if !client.recurrence.is_recurring() {
        return Ok(None);
    }

    let latest = store.latest_plan(client_id).await?;
    let Some(seed) = rollover_seed(&client, latest.as_ref()) else {
        tracing::debug!(client_id = %client_id, month = %month, "no plan to roll over");
        return Ok(None);
    };

    let (posts, ads) = seed.counts();
    let plan = store
        .insert_plan_if_absent(client_id, month, posts, ads)
        .await?;

    match &seed {
        PlanSeed::CarryForward { from, .. } => tracing::info!(
            client_id = %client_id,
            month = %month,
            from = %from,
            posts,
            ads,
            "carried content plan forward"
        ),
        PlanSeed::Defaults { .. } => tracing::info!(
            client_id = %client_id,
            month = %month,
            posts,
            ads,
            "seeded content plan from client defaults"
        ),
    }

    Ok(Some(plan))
}

/// Create or overwrite the plan for (client, month).
pub async fn save_plan(
    store: &dyn HiveStore,
    client_id: Uuid,
    month: Month,
    posts_planned: i32,
    ads_planned: i32,
) -> HiveResult<MonthlyContentPlan> {
    check_plan_counts(posts_planned, ads_planned)?;

    if store.get_client(client_id).await?.is_none() {
        return Err(HiveError::ClientNotFound(client_id));
    }
    let plan = store
        .upsert_plan(client_id, month, posts_planned, ads_planned)
        .await?;
    Ok(plan)
}

pub(crate) fn check_plan_counts(posts: i32, ads: i32) -> Result<(), ValidationError> {
    if posts < 0 {
        return Err(ValidationError::NegativeCount {
            field: "posts_planned",
            value: posts,
        });
    }
    if ads < 0 {
        return Err(ValidationError::NegativeCount {
            field: "ads_planned",
            value: ads,
        });
    }
    Ok(())
}
