//! CLI handlers for `hive user` subcommands.

use anyhow::Result;

use hive_core::HiveStore;
use hive_core::user::create_user;
use hive_db::queries::users::NewUser;

use crate::UserCommands;

/// Dispatch a `UserCommands` variant to the appropriate handler.
pub async fn run_user_command(command: UserCommands, store: &dyn HiveStore) -> Result<()> {
    match command {
        UserCommands::List => cmd_list(store).await,
        UserCommands::Add {
            name,
            email,
            avatar_url,
            role,
        } => {
            let new = NewUser {
                name: name.trim().to_owned(),
                email: email.trim().to_owned(),
                avatar_url,
                role,
            };
            let user = create_user(store, &new).await?;
            println!("User added: {} <{}>", user.name, user.email);
            println!("  ID: {}", user.id);
            Ok(())
        }
    }
}

async fn cmd_list(store: &dyn HiveStore) -> Result<()> {
    let users = store.list_users().await?;

    if users.is_empty() {
        println!("No users found. Use `hive user add` to create one.");
        return Ok(());
    }

    let id_w = 36;
    let name_w = users.iter().map(|u| u.name.len()).max().unwrap_or(4).max(4);
    let email_w = users.iter().map(|u| u.email.len()).max().unwrap_or(5).max(5);

    println!("{:<id_w$}  {:<name_w$}  {:<email_w$}  ROLE", "ID", "NAME", "EMAIL");
    for user in &users {
        println!(
            "{:<id_w$}  {:<name_w$}  {:<email_w$}  {}",
            user.id.to_string(),
            user.name,
            user.email,
            user.role.as_deref().unwrap_or("-"),
        );
    }

    Ok(())
}
