mod calendar_cmd;
mod client_cmds;
mod config;
mod content_plan_cmds;
mod csv_cmds;
mod resolve;
mod serve_cmd;
mod team_cmds;
mod user_cmds;

use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use hive_core::filter::{SortOrder, StatusFilter};
use hive_core::{Month, PgStore};
use hive_db::models::{RecurringInterval, ShootStatus, TeamRole};
use hive_db::pool;

use config::HiveConfig;

#[derive(Parser)]
#[command(name = "hive", about = "Client due-date, team, and content-plan tracker")]
struct Cli {
    /// Database URL (overrides HIVE_DATABASE_URL env var)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a hive config file (no database required)
    Init {
        /// PostgreSQL connection URL
        #[arg(long, default_value = "postgresql://localhost:5432/hive")]
        db_url: String,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Create the hive database if needed and run migrations
    DbInit,
    /// Client management
    Client {
        #[command(subcommand)]
        command: ClientCommands,
    },
    /// Team member (user) management
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
    /// Client team assignment
    Team {
        #[command(subcommand)]
        command: TeamCommands,
    },
    /// Monthly content plans
    ContentPlan {
        #[command(subcommand)]
        command: ContentPlanCommands,
    },
    /// Show client dates for a month
    Calendar {
        /// Month to show (YYYY-MM, defaults to the current month)
        #[arg(long)]
        month: Option<Month>,
    },
    /// Export all clients as CSV
    Export {
        /// Output file path (defaults to stdout)
        #[arg(long)]
        output: Option<String>,
    },
    /// Import clients from a CSV file
    Import {
        /// Path to the CSV file
        file: String,
    },
    /// Serve the JSON API
    Serve {
        /// Address to bind (defaults to config file, then 127.0.0.1)
        #[arg(long)]
        bind: Option<String>,
        /// Port to listen on (defaults to config file, then 3000)
        #[arg(long)]
        port: Option<u16>,
    },
}

/// Client fields shared by `client add` and `client edit`.
///
/// For `edit`, an empty string clears an optional field.
#[derive(clap::Args, Debug, Default)]
pub struct ClientFields {
    /// Content due date (YYYY-MM-DD)
    #[arg(long)]
    content_due: Option<String>,
    /// Contract renewal date (YYYY-MM-DD)
    #[arg(long)]
    renewal: Option<String>,
    /// Shoot date (YYYY-MM-DD)
    #[arg(long)]
    shoot_date: Option<String>,
    /// Shoot status: not_booked, booked, completed
    #[arg(long)]
    shoot_status: Option<ShootStatus>,
    /// Posts per month
    #[arg(long)]
    posts: Option<String>,
    /// Ads per month
    #[arg(long)]
    ads: Option<String>,
    #[arg(long)]
    package: Option<String>,
    /// Monthly reporting Canva link
    #[arg(long)]
    canva_link: Option<String>,
    #[arg(long)]
    shoot_notes: Option<String>,
    #[arg(long)]
    notes: Option<String>,
    #[arg(long)]
    reminders: Option<String>,
    /// Make the report cycle recurring (requires --interval)
    #[arg(long, conflicts_with = "not_recurring")]
    recurring: bool,
    /// Stop the report cycle from recurring
    #[arg(long)]
    not_recurring: bool,
    /// Recurrence interval: monthly, quarterly, semi-annually
    #[arg(long, requires = "recurring")]
    interval: Option<RecurringInterval>,
}

#[derive(Subcommand)]
pub enum ClientCommands {
    /// List clients
    List {
        /// Case-insensitive match on name, notes, or package
        #[arg(long)]
        search: Option<String>,
        /// all, overdue, today, week, contract-renewal, shoot-not-booked, shoot-booked
        #[arg(long, default_value = "all")]
        status: StatusFilter,
        /// Only clients this user (ID or email) is assigned to
        #[arg(long)]
        assignee: Option<String>,
        /// Only clients with someone in this role: manager, editor, scripting
        #[arg(long)]
        role: Option<TeamRole>,
        /// due-date, name, package, contract-renewal
        #[arg(long, default_value = "due-date")]
        sort: SortOrder,
    },
    /// Show one client with team and status
    Show {
        /// Client ID or exact name
        client: String,
    },
    /// Add a client
    Add {
        /// Client name
        name: String,
        /// Report due date (YYYY-MM-DD)
        #[arg(long)]
        due: NaiveDate,
        #[command(flatten)]
        fields: ClientFields,
        /// Manager (user ID or email)
        #[arg(long)]
        manager: Option<String>,
        /// Editor (user ID or email); repeatable
        #[arg(long = "editor")]
        editors: Vec<String>,
        /// Scripting (user ID or email); repeatable
        #[arg(long = "scripting")]
        scripting: Vec<String>,
        /// Month of the first content plan (YYYY-MM)
        #[arg(long, requires = "plan_posts")]
        plan_month: Option<Month>,
        /// Posts planned for --plan-month
        #[arg(long, requires = "plan_month")]
        plan_posts: Option<i32>,
        /// Ads planned for --plan-month
        #[arg(long, requires = "plan_month", default_value_t = 0)]
        plan_ads: i32,
    },
    /// Edit a client
    Edit {
        /// Client ID or exact name
        client: String,
        /// New name
        #[arg(long)]
        name: Option<String>,
        /// New report due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<NaiveDate>,
        #[command(flatten)]
        fields: ClientFields,
    },
    /// Delete a client with its team and plans
    Delete {
        /// Client ID or exact name
        client: String,
    },
    /// Move a recurring client's report due date forward one interval
    Advance {
        /// Client ID or exact name
        client: String,
    },
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// List users
    List,
    /// Add a user
    Add {
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        avatar_url: Option<String>,
        /// Free-form role tag
        #[arg(long)]
        role: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum TeamCommands {
    /// Show a client's team
    Show {
        /// Client ID or exact name
        client: String,
    },
    /// Replace a client's whole team
    Set {
        /// Client ID or exact name
        client: String,
        /// Manager (user ID or email)
        #[arg(long)]
        manager: Option<String>,
        /// Editor (user ID or email); repeatable
        #[arg(long = "editor")]
        editors: Vec<String>,
        /// Scripting (user ID or email); repeatable
        #[arg(long = "scripting")]
        scripting: Vec<String>,
    },
}

#[derive(Subcommand)]
pub enum ContentPlanCommands {
    /// Show a month's plan, rolling a recurring client's plan forward if needed
    Show {
        /// Client ID or exact name
        client: String,
        /// Month (YYYY-MM, defaults to the current month)
        #[arg(long)]
        month: Option<Month>,
    },
    /// Set a month's planned posts and ads
    Set {
        /// Client ID or exact name
        client: String,
        /// Month (YYYY-MM, defaults to the current month)
        #[arg(long)]
        month: Option<Month>,
        #[arg(long)]
        posts: i32,
        #[arg(long, default_value_t = 0)]
        ads: i32,
    },
}

/// Execute the `hive init` command: write config file.
fn cmd_init(db_url: &str, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let cfg = config::ConfigFile {
        database: config::DatabaseSection {
            url: db_url.to_string(),
        },
        server: config::ServerSection::default(),
    };

    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  database.url = {db_url}");
    println!();
    println!("Next: run `hive db-init` to create and migrate the database.");

    Ok(())
}

/// Execute the `hive db-init` command: create database and run migrations.
async fn cmd_db_init(cli_db_url: Option<&str>) -> anyhow::Result<()> {
    let resolved = HiveConfig::resolve(cli_db_url)?;

    println!("Initializing hive database...");

    pool::ensure_database_exists(&resolved.db_config).await?;
    let db_pool = pool::create_pool(&resolved.db_config).await?;
    pool::run_migrations(&db_pool).await?;

    let counts = pool::table_counts(&db_pool).await?;
    println!("Database ready. Tables:");
    for (table, count) in &counts {
        println!("  {table}: {count} rows");
    }

    db_pool.close().await;

    println!("hive db-init complete.");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { db_url, force } => {
            cmd_init(&db_url, force)?;
        }
        Commands::DbInit => {
            cmd_db_init(cli.database_url.as_deref()).await?;
        }
        Commands::Serve { bind, port } => {
            let resolved = HiveConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let bind = bind.unwrap_or(resolved.server.bind);
            let port = port.unwrap_or(resolved.server.port);
            let store = Arc::new(PgStore::new(db_pool.clone()));
            let result = serve_cmd::run_serve(store, &bind, port).await;
            db_pool.close().await;
            result?;
        }
        command => {
            let resolved = HiveConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let store = PgStore::new(db_pool.clone());
            let result = run_store_command(command, &store).await;
            db_pool.close().await;
            result?;
        }
    }

    Ok(())
}

/// Dispatch the commands that only need a store.
async fn run_store_command(command: Commands, store: &PgStore) -> anyhow::Result<()> {
    match command {
        Commands::Client { command } => client_cmds::run_client_command(command, store).await,
        Commands::User { command } => user_cmds::run_user_command(command, store).await,
        Commands::Team { command } => team_cmds::run_team_command(command, store).await,
        Commands::ContentPlan { command } => {
            content_plan_cmds::run_content_plan_command(command, store).await
        }
        Commands::Calendar { month } => calendar_cmd::run_calendar(store, month).await,
        Commands::Export { output } => csv_cmds::run_export(store, output.as_deref()).await,
        Commands::Import { file } => csv_cmds::run_import(store, &file).await,
        Commands::Init { .. } | Commands::DbInit | Commands::Serve { .. } => {
            anyhow::bail!("command does not run against a store")
        }
    }
}
