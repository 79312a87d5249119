//! Team member records.

use hive_db::models::User;
use hive_db::queries::users::NewUser;

use crate::error::{HiveResult, ValidationError};
use crate::store::HiveStore;

/// Reject a blank name or an email without a local part and domain.
pub fn validate_user(new: &NewUser) -> Result<(), ValidationError> {
    if new.name.trim().is_empty() {
        return Err(ValidationError::BlankUserName);
    }
    let email = new.email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(ValidationError::InvalidEmail(new.email.clone())),
    }
}

pub async fn create_user(store: &dyn HiveStore, new: &NewUser) -> HiveResult<User> {
    validate_user(new)?;
    let user = store.insert_user(new).await?;
    tracing::info!(user_id = %user.id, email = %user.email, "created user");
    Ok(user)
}
