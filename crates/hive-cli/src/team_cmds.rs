//! CLI handlers for `hive team` subcommands.

use anyhow::Result;

use hive_core::HiveStore;
use hive_core::client::get_client;
use hive_core::team::{TeamSelection, fetch_team, set_team};

use crate::TeamCommands;
use crate::client_cmds::print_team;
use crate::resolve::{resolve_client_id, resolve_user_id, resolve_user_ids};

/// Dispatch a `TeamCommands` variant to the appropriate handler.
pub async fn run_team_command(command: TeamCommands, store: &dyn HiveStore) -> Result<()> {
    match command {
        TeamCommands::Show { client } => {
            let id = resolve_client_id(store, &client).await?;
            let client = get_client(store, id).await?;
            let team = fetch_team(store, id).await?;
            println!("Client: {}", client.client_name);
            print_team(&team);
            Ok(())
        }
        TeamCommands::Set {
            client,
            manager,
            editors,
            scripting,
        } => {
            let id = resolve_client_id(store, &client).await?;
            let selection = TeamSelection {
                manager_id: match manager {
                    Some(input) => Some(resolve_user_id(store, &input).await?),
                    None => None,
                },
                editor_ids: resolve_user_ids(store, &editors).await?,
                scripting_ids: resolve_user_ids(store, &scripting).await?,
            };
            let team = set_team(store, id, &selection).await?;
            println!("Team replaced.");
            print_team(&team);
            Ok(())
        }
    }
}
