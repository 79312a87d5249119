//! CLI handlers for `hive client` subcommands.
//!
//! Implements:
//! - `hive client list`             -- filtered, sorted client table
//! - `hive client show <client>`    -- one client with team, status, and plan
//! - `hive client add <name>`       -- create a client, optionally with team and plan
//! - `hive client edit <client>`    -- partial update
//! - `hive client delete <client>`  -- delete with team and plans
//! - `hive client advance <client>` -- move a recurring report date forward

use anyhow::{Context, Result, bail};
use chrono::{NaiveDate, Utc};

use hive_core::client::{
    ClientDraft, ClientPatch, InitialPlan, advance_client_due_date,
    create_client_with_team_and_plan, delete_client, get_client, list_clients_with_team,
    update_client,
};
use hive_core::dates::{self, client_status, parse_optional_date};
use hive_core::filter::ClientQuery;
use hive_core::recurrence::{RecurrenceConfig, recurrence_from_flags};
use hive_core::team::{Team, TeamSelection, fetch_team};
use hive_core::{HiveStore, Month};
use hive_db::models::Client;

use crate::resolve::{resolve_client_id, resolve_user_id, resolve_user_ids};
use crate::{ClientCommands, ClientFields};

// -----------------------------------------------------------------------
// Public entry point
// -----------------------------------------------------------------------

/// Dispatch a `ClientCommands` variant to the appropriate handler.
pub async fn run_client_command(command: ClientCommands, store: &dyn HiveStore) -> Result<()> {
    match command {
        ClientCommands::List {
            search,
            status,
            assignee,
            role,
            sort,
        } => {
            let assignee = match assignee {
                Some(input) => Some(resolve_user_id(store, &input).await?),
                None => None,
            };
            let query = ClientQuery {
                search,
                status,
                assignee,
                role,
                sort,
            };
            cmd_list(store, &query).await
        }
        ClientCommands::Show { client } => cmd_show(store, &client).await,
        ClientCommands::Add {
            name,
            due,
            fields,
            manager,
            editors,
            scripting,
            plan_month,
            plan_posts,
            plan_ads,
        } => {
            let draft = build_draft(name, due, &fields)?;
            let selection = TeamSelection {
                manager_id: match manager {
                    Some(input) => Some(resolve_user_id(store, &input).await?),
                    None => None,
                },
                editor_ids: resolve_user_ids(store, &editors).await?,
                scripting_ids: resolve_user_ids(store, &scripting).await?,
            };
            let plan = match (plan_month, plan_posts) {
                (Some(month), Some(posts)) => Some(InitialPlan {
                    month,
                    posts_planned: posts,
                    ads_planned: plan_ads,
                }),
                _ => None,
            };
            cmd_add(store, &draft, &selection, plan.as_ref()).await
        }
        ClientCommands::Edit {
            client,
            name,
            due,
            fields,
        } => {
            let changes = build_changes(name, due, &fields)?;
            cmd_edit(store, &client, &changes).await
        }
        ClientCommands::Delete { client } => cmd_delete(store, &client).await,
        ClientCommands::Advance { client } => cmd_advance(store, &client).await,
    }
}

// -----------------------------------------------------------------------
// Flag conversion
// -----------------------------------------------------------------------

/// `None` leaves the field alone; an empty string clears it.
fn text_change(value: &Option<String>) -> Option<Option<String>> {
    value.as_ref().map(|v| {
        let v = v.trim();
        if v.is_empty() { None } else { Some(v.to_owned()) }
    })
}

fn date_change(flag: &str, value: &Option<String>) -> Result<Option<Option<NaiveDate>>> {
    value
        .as_deref()
        .map(|v| parse_optional_date(v).with_context(|| format!("invalid --{flag}")))
        .transpose()
}

fn count_change(flag: &str, value: &Option<String>) -> Result<Option<Option<i32>>> {
    value
        .as_deref()
        .map(|v| {
            let v = v.trim();
            if v.is_empty() {
                Ok(None)
            } else {
                v.parse::<i32>()
                    .map(Some)
                    .with_context(|| format!("invalid --{flag} value {v:?} (expected a whole number)"))
            }
        })
        .transpose()
}

fn recurrence_change(fields: &ClientFields) -> Result<Option<RecurrenceConfig>> {
    if fields.recurring {
        Ok(Some(recurrence_from_flags(true, fields.interval)?))
    } else if fields.not_recurring {
        Ok(Some(RecurrenceConfig::Disabled))
    } else {
        Ok(None)
    }
}

fn build_draft(name: String, due: NaiveDate, fields: &ClientFields) -> Result<ClientDraft> {
    let mut draft = ClientDraft::new(name, due);
    draft.content_due_date = date_change("content-due", &fields.content_due)?.flatten();
    draft.contract_renewal_date = date_change("renewal", &fields.renewal)?.flatten();
    draft.shoot_date = date_change("shoot-date", &fields.shoot_date)?.flatten();
    draft.posts_per_month = count_change("posts", &fields.posts)?.flatten();
    draft.ads_per_month = count_change("ads", &fields.ads)?.flatten();
    draft.package = text_change(&fields.package).flatten();
    draft.monthly_reporting_canva_link = text_change(&fields.canva_link).flatten();
    draft.shoot_notes = text_change(&fields.shoot_notes).flatten();
    draft.notes = text_change(&fields.notes).flatten();
    draft.reminders = text_change(&fields.reminders).flatten();
    draft.shoot_status = fields.shoot_status.unwrap_or_default();
    draft.recurrence = recurrence_change(fields)?.unwrap_or_default();
    Ok(draft)
}

fn build_changes(
    name: Option<String>,
    due: Option<NaiveDate>,
    fields: &ClientFields,
) -> Result<ClientPatch> {
    Ok(ClientPatch {
        client_name: name,
        due_date: due,
        content_due_date: date_change("content-due", &fields.content_due)?,
        contract_renewal_date: date_change("renewal", &fields.renewal)?,
        shoot_date: date_change("shoot-date", &fields.shoot_date)?,
        posts_per_month: count_change("posts", &fields.posts)?,
        ads_per_month: count_change("ads", &fields.ads)?,
        package: text_change(&fields.package),
        monthly_reporting_canva_link: text_change(&fields.canva_link),
        recurrence: recurrence_change(fields)?,
        last_recurring_update: None,
        shoot_status: fields.shoot_status,
        shoot_notes: text_change(&fields.shoot_notes),
        notes: text_change(&fields.notes),
        reminders: text_change(&fields.reminders),
    })
}

// -----------------------------------------------------------------------
// hive client list
// -----------------------------------------------------------------------

async fn cmd_list(store: &dyn HiveStore, query: &ClientQuery) -> Result<()> {
    let today = dates::today();
    let clients = query.apply(list_clients_with_team(store).await?, today);

    if clients.is_empty() {
        println!("No clients found.");
        return Ok(());
    }

    let name_w = clients
        .iter()
        .map(|c| c.client.client_name.len())
        .max()
        .unwrap_or(4)
        .max(4);
    let due_w = 10;
    let status_w = clients
        .iter()
        .map(|c| dates::format_due_status(c.client.due_date, today).len())
        .max()
        .unwrap_or(6)
        .max(6);
    let package_w = clients
        .iter()
        .map(|c| c.client.package.as_deref().unwrap_or("-").len())
        .max()
        .unwrap_or(7)
        .max(7);

    println!(
        "{:<name_w$}  {:<due_w$}  {:<status_w$}  {:<package_w$}  {:<5}  MANAGER",
        "NAME", "REPORT DUE", "STATUS", "PACKAGE", "SHOOT",
    );

    for entry in &clients {
        let client = &entry.client;
        let status = client_status(client, today);
        let manager = entry
            .team
            .manager
            .as_ref()
            .map(|u| u.name.as_str())
            .unwrap_or("-");
        println!(
            "{:<name_w$}  {:<due_w$}  {:<status_w$}  {:<package_w$}  {:<5}  {}",
            client.client_name,
            client.due_date,
            status.label,
            client.package.as_deref().unwrap_or("-"),
            if status.shoot_warning { "!" } else { "" },
            manager,
        );
    }

    println!();
    println!("{} client(s)", clients.len());
    Ok(())
}

// -----------------------------------------------------------------------
// hive client show <client>
// -----------------------------------------------------------------------

async fn cmd_show(store: &dyn HiveStore, input: &str) -> Result<()> {
    let id = resolve_client_id(store, input).await?;
    let client = get_client(store, id).await?;
    let team = fetch_team(store, id).await?;
    let today = dates::today();
    let month = Month::of(today);
    let plan = store.get_plan(id, month).await?;

    print_client(&client, today);
    print_team(&team);

    println!();
    match plan {
        Some(plan) => println!(
            "Plan {}:  {} posts, {} ads",
            plan.month, plan.posts_planned, plan.ads_planned
        ),
        None => println!("Plan {month}:  (none)"),
    }
    Ok(())
}

fn or_dash<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_owned())
}

fn print_client(client: &Client, today: NaiveDate) {
    let status = client_status(client, today);

    println!("Client: {}", client.client_name);
    println!("  ID:            {}", client.id);
    println!("  Report due:    {} ({})", client.due_date, status.label);
    println!("  Content due:   {}", or_dash(client.content_due_date));
    println!("  Renewal:       {}", or_dash(client.contract_renewal_date));
    println!(
        "  Shoot:         {} {}",
        client.shoot_status.label(),
        client
            .shoot_date
            .map(|d| format!("on {d}"))
            .unwrap_or_default()
    );
    if status.shoot_warning {
        println!("                 ! content due soon and no shoot booked");
    }
    println!(
        "  Recurring:     {}",
        client
            .recurrence
            .interval()
            .map(|i| i.label())
            .unwrap_or("No")
    );
    if let Some(at) = client.last_recurring_update {
        println!("  Last advanced: {}", at.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    println!("  Posts/month:   {}", or_dash(client.posts_per_month));
    println!("  Ads/month:     {}", or_dash(client.ads_per_month));
    println!("  Package:       {}", or_dash(client.package.as_deref()));
    println!(
        "  Canva link:    {}",
        or_dash(client.monthly_reporting_canva_link.as_deref())
    );
    for (label, text) in [
        ("Shoot notes", &client.shoot_notes),
        ("Notes", &client.notes),
        ("Reminders", &client.reminders),
    ] {
        if let Some(text) = text {
            println!("  {label}:");
            for line in text.lines() {
                println!("    {line}");
            }
        }
    }
}

pub(crate) fn print_team(team: &Team) {
    println!();
    if team.is_empty() {
        println!("Team: (none assigned)");
        return;
    }
    println!("Team:");
    for (user, role) in team.members() {
        println!("  {:<10} {} <{}>", role.to_string(), user.name, user.email);
    }
}

// -----------------------------------------------------------------------
// hive client add <name>
// -----------------------------------------------------------------------

async fn cmd_add(
    store: &dyn HiveStore,
    draft: &ClientDraft,
    selection: &TeamSelection,
    plan: Option<&InitialPlan>,
) -> Result<()> {
    let created = create_client_with_team_and_plan(store, draft, selection, plan).await?;

    println!("Client added.");
    println!();
    println!("  ID:         {}", created.client.id);
    println!("  Name:       {}", created.client.client_name);
    println!("  Report due: {}", created.client.due_date);
    println!("  Team:       {} member(s)", created.team.members().count());
    if let Some(plan) = plan {
        println!(
            "  Plan:       {} ({} posts, {} ads)",
            plan.month, plan.posts_planned, plan.ads_planned
        );
    }
    Ok(())
}

// -----------------------------------------------------------------------
// hive client edit <client>
// -----------------------------------------------------------------------

async fn cmd_edit(store: &dyn HiveStore, input: &str, changes: &ClientPatch) -> Result<()> {
    if changes.is_empty() {
        bail!("nothing to change; pass at least one field flag");
    }
    let id = resolve_client_id(store, input).await?;
    let client = update_client(store, id, changes).await?;
    println!("Client {} updated.", client.client_name);
    Ok(())
}

// -----------------------------------------------------------------------
// hive client delete <client>
// -----------------------------------------------------------------------

async fn cmd_delete(store: &dyn HiveStore, input: &str) -> Result<()> {
    let id = resolve_client_id(store, input).await?;
    let client = get_client(store, id).await?;
    delete_client(store, id).await?;
    println!("Deleted client {} ({}).", client.client_name, client.id);
    Ok(())
}

// -----------------------------------------------------------------------
// hive client advance <client>
// -----------------------------------------------------------------------

async fn cmd_advance(store: &dyn HiveStore, input: &str) -> Result<()> {
    let id = resolve_client_id(store, input).await?;
    let before = get_client(store, id).await?;
    let after = advance_client_due_date(store, id, Utc::now()).await?;
    println!(
        "Report due date for {} moved from {} to {}.",
        after.client_name, before.due_date, after.due_date
    );
    Ok(())
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use hive_core::filter::{SortOrder, StatusFilter};
    use hive_core::recurrence::RecurringInterval;
    use hive_core::{HiveError, MemoryStore, ValidationError};
    use hive_db::models::{ShootStatus, TeamRole};

    #[derive(Parser)]
    #[command(name = "hive")]
    struct TestCli {
        #[command(subcommand)]
        command: TestCommands,
    }

    #[derive(clap::Subcommand)]
    enum TestCommands {
        Client {
            #[command(subcommand)]
            command: ClientCommands,
        },
    }

    fn parse(args: &[&str]) -> ClientCommands {
        let mut argv = vec!["hive", "client"];
        argv.extend_from_slice(args);
        match TestCli::try_parse_from(argv).expect("should parse").command {
            TestCommands::Client { command } => command,
        }
    }

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn clap_parses_list_defaults() {
        match parse(&["list"]) {
            ClientCommands::List {
                search,
                status,
                assignee,
                role,
                sort,
            } => {
                assert!(search.is_none());
                assert_eq!(status, StatusFilter::All);
                assert!(assignee.is_none());
                assert!(role.is_none());
                assert_eq!(sort, SortOrder::DueDate);
            }
            _ => panic!("expected Client List"),
        }
    }

    #[test]
    fn clap_parses_list_filters() {
        match parse(&[
            "list",
            "--status",
            "shoot-not-booked",
            "--role",
            "editor",
            "--sort",
            "contract-renewal",
            "--search",
            "gold",
        ]) {
            ClientCommands::List {
                search,
                status,
                role,
                sort,
                ..
            } => {
                assert_eq!(search.as_deref(), Some("gold"));
                assert_eq!(status, StatusFilter::ShootNotBooked);
                assert_eq!(role, Some(TeamRole::Editor));
                assert_eq!(sort, SortOrder::ContractRenewal);
            }
            _ => panic!("expected Client List"),
        }
    }

    #[test]
    fn clap_rejects_unknown_status() {
        let result = TestCli::try_parse_from(["hive", "client", "list", "--status", "late"]);
        assert!(result.is_err());
    }

    #[test]
    fn clap_parses_add_with_all_options() {
        match parse(&[
            "add",
            "Acme",
            "--due",
            "2025-07-31",
            "--content-due",
            "2025-07-20",
            "--posts",
            "12",
            "--recurring",
            "--interval",
            "quarterly",
            "--shoot-status",
            "booked",
            "--manager",
            "ann@example.com",
            "--editor",
            "bob@example.com",
            "--editor",
            "cy@example.com",
            "--plan-month",
            "2025-07",
            "--plan-posts",
            "10",
        ]) {
            ClientCommands::Add {
                name,
                due,
                fields,
                manager,
                editors,
                scripting,
                plan_month,
                plan_posts,
                plan_ads,
            } => {
                assert_eq!(name, "Acme");
                assert_eq!(due, d("2025-07-31"));
                assert!(fields.recurring);
                assert_eq!(fields.interval, Some(RecurringInterval::Quarterly));
                assert_eq!(fields.shoot_status, Some(ShootStatus::Booked));
                assert_eq!(manager.as_deref(), Some("ann@example.com"));
                assert_eq!(editors.len(), 2);
                assert!(scripting.is_empty());
                assert_eq!(plan_month.map(|m| m.to_string()).as_deref(), Some("2025-07"));
                assert_eq!(plan_posts, Some(10));
                assert_eq!(plan_ads, 0);
            }
            _ => panic!("expected Client Add"),
        }
    }

    #[test]
    fn clap_requires_due_date_on_add() {
        assert!(TestCli::try_parse_from(["hive", "client", "add", "Acme"]).is_err());
    }

    #[test]
    fn clap_rejects_plan_month_without_posts() {
        let result = TestCli::try_parse_from([
            "hive",
            "client",
            "add",
            "Acme",
            "--due",
            "2025-07-31",
            "--plan-month",
            "2025-07",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn clap_rejects_recurring_and_not_recurring() {
        let result = TestCli::try_parse_from([
            "hive",
            "client",
            "edit",
            "Acme",
            "--recurring",
            "--interval",
            "monthly",
            "--not-recurring",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn recurring_without_interval_is_rejected() {
        let fields = ClientFields {
            recurring: true,
            ..Default::default()
        };
        let err = build_draft("Acme".into(), d("2025-07-31"), &fields).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ValidationError>(),
            Some(&ValidationError::IntervalRequired)
        );
    }

    #[test]
    fn clap_rejects_interval_without_recurring() {
        let result = TestCli::try_parse_from([
            "hive", "client", "edit", "Acme", "--interval", "monthly",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn interval_without_recurring_flag_is_ignored() {
        let fields = ClientFields {
            interval: Some(RecurringInterval::Monthly),
            ..Default::default()
        };
        let draft = build_draft("Acme".into(), d("2025-07-31"), &fields).unwrap();
        assert_eq!(draft.recurrence, RecurrenceConfig::Disabled);
    }

    #[test]
    fn edit_empty_string_clears_and_omitted_leaves_alone() {
        let fields = ClientFields {
            package: Some(String::new()),
            renewal: Some(String::new()),
            posts: Some("8".into()),
            notes: Some("  call first ".into()),
            ..Default::default()
        };
        let changes = build_changes(None, None, &fields).unwrap();
        assert_eq!(changes.package, Some(None));
        assert_eq!(changes.contract_renewal_date, Some(None));
        assert_eq!(changes.posts_per_month, Some(Some(8)));
        assert_eq!(changes.notes, Some(Some("call first".into())));
        assert_eq!(changes.reminders, None);
        assert_eq!(changes.recurrence, None);
    }

    #[test]
    fn bad_count_flag_names_the_flag() {
        let fields = ClientFields {
            ads: Some("lots".into()),
            ..Default::default()
        };
        let err = build_changes(None, None, &fields).unwrap_err();
        assert!(err.to_string().contains("--ads"));
    }

    #[tokio::test]
    async fn add_edit_advance_delete_flow() {
        let store = MemoryStore::new();

        run_client_command(
            parse(&[
                "add",
                "Acme",
                "--due",
                "2025-01-31",
                "--recurring",
                "--interval",
                "monthly",
                "--plan-month",
                "2025-01",
                "--plan-posts",
                "6",
            ]),
            &store,
        )
        .await
        .unwrap();
        let id = store.list_clients().await.unwrap()[0].id;
        assert_eq!(store.plans().await.len(), 1);

        run_client_command(parse(&["edit", "acme", "--package", "Gold"]), &store)
            .await
            .unwrap();
        run_client_command(parse(&["advance", "Acme"]), &store)
            .await
            .unwrap();

        let client = store.get_client(id).await.unwrap().unwrap();
        assert_eq!(client.package.as_deref(), Some("Gold"));
        assert_eq!(client.due_date, d("2025-02-28"));

        run_client_command(parse(&["delete", &id.to_string()]), &store)
            .await
            .unwrap();
        assert!(store.list_clients().await.unwrap().is_empty());
        assert!(store.plans().await.is_empty());
    }

    #[tokio::test]
    async fn advance_rejects_non_recurring_client() {
        let store = MemoryStore::new();
        run_client_command(parse(&["add", "Gym", "--due", "2025-03-01"]), &store)
            .await
            .unwrap();

        let err = run_client_command(parse(&["advance", "Gym"]), &store)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<HiveError>(),
            Some(HiveError::NotRecurring(_))
        ));
    }

    #[tokio::test]
    async fn edit_without_flags_is_rejected() {
        let store = MemoryStore::new();
        let err = run_client_command(parse(&["edit", "Gym"]), &store)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("nothing to change"));
    }
}
