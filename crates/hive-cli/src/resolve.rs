//! Client and user ID resolution.
//!
//! - [`resolve_client_id`] accepts either a UUID string or a client name,
//!   matched case-insensitively against the whole name.
//! - [`resolve_user_id`] accepts either a UUID string or an email address.

use anyhow::{Result, bail};
use uuid::Uuid;

use hive_core::HiveStore;
use hive_db::models::{Client, User};

/// Determine whether `input` is a client UUID or a client name, and return
/// the resolved client UUID.
///
/// A UUID is returned as-is; whether it exists is checked by the command
/// that uses it. A name must match exactly one client.
pub async fn resolve_client_id(store: &dyn HiveStore, input: &str) -> Result<Uuid> {
    if let Ok(id) = Uuid::parse_str(input) {
        return Ok(id);
    }
    let clients = store.list_clients().await?;
    match_client_name(&clients, input)
}

fn match_client_name(clients: &[Client], input: &str) -> Result<Uuid> {
    let wanted = input.trim().to_lowercase();
    let matches: Vec<&Client> = clients
        .iter()
        .filter(|c| c.client_name.trim().to_lowercase() == wanted)
        .collect();

    match matches.as_slice() {
        [] => bail!("no client named {input:?} (pass a client name or ID)"),
        [one] => Ok(one.id),
        many => {
            let ids: Vec<String> = many.iter().map(|c| c.id.to_string()).collect();
            bail!(
                "{} clients are named {input:?}; pass an ID instead:\n  {}",
                many.len(),
                ids.join("\n  ")
            )
        }
    }
}

/// Determine whether `input` is a user UUID or an email address, and return
/// the resolved user UUID.
pub async fn resolve_user_id(store: &dyn HiveStore, input: &str) -> Result<Uuid> {
    if let Ok(id) = Uuid::parse_str(input) {
        return Ok(id);
    }
    let users = store.list_users().await?;
    match_user_email(&users, input)
}

fn match_user_email(users: &[User], input: &str) -> Result<Uuid> {
    let wanted = input.trim().to_lowercase();
    users
        .iter()
        .find(|u| u.email.to_lowercase() == wanted)
        .map(|u| u.id)
        .ok_or_else(|| anyhow::anyhow!("no user with email {input:?} (pass an email or user ID)"))
}

/// Resolve several user references, preserving order.
pub async fn resolve_user_ids(store: &dyn HiveStore, inputs: &[String]) -> Result<Vec<Uuid>> {
    if inputs.is_empty() {
        return Ok(Vec::new());
    }
    let users = store.list_users().await?;
    inputs
        .iter()
        .map(|input| match Uuid::parse_str(input) {
            Ok(id) => Ok(id),
            Err(_) => match_user_email(&users, input),
        })
        .collect()
}
