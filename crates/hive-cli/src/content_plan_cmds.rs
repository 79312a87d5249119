//! CLI handlers for `hive content-plan` subcommands.

use anyhow::Result;

use hive_core::client::get_client;
use hive_core::dates;
use hive_core::rollover::{resolve_monthly_plan, save_plan};
use hive_core::{HiveStore, Month};

use crate::ContentPlanCommands;
use crate::resolve::resolve_client_id;

/// Dispatch a `ContentPlanCommands` variant to the appropriate handler.
pub async fn run_content_plan_command(
    command: ContentPlanCommands,
    store: &dyn HiveStore,
) -> Result<()> {
    match command {
        ContentPlanCommands::Show { client, month } => {
            let month = month.unwrap_or_else(|| Month::of(dates::today()));
            let id = resolve_client_id(store, &client).await?;
            let client = get_client(store, id).await?;
            match resolve_monthly_plan(store, id, month).await? {
                Some(plan) => {
                    println!("Content plan for {} ({month}):", client.client_name);
                    println!("  Posts planned: {}", plan.posts_planned);
                    println!("  Ads planned:   {}", plan.ads_planned);
                    println!(
                        "  Updated:       {}",
                        plan.updated_at.format("%Y-%m-%d %H:%M:%S UTC")
                    );
                }
                None => {
                    println!("No content plan for {} in {month}.", client.client_name);
                    println!("Use `hive content-plan set` to create one.");
                }
            }
            Ok(())
        }
        ContentPlanCommands::Set {
            client,
            month,
            posts,
            ads,
        } => {
            let month = month.unwrap_or_else(|| Month::of(dates::today()));
            let id = resolve_client_id(store, &client).await?;
            let plan = save_plan(store, id, month, posts, ads).await?;
            println!(
                "Content plan for {month} saved: {} posts, {} ads.",
                plan.posts_planned, plan.ads_planned
            );
            Ok(())
        }
    }
}
