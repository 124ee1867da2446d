//! First-run administrator

use anyhow::Result;
use pressroom_auth::AuthService;
use pressroom_db::{NewUser, User, UserRole};
use tracing::{info, warn};

use crate::config::BootstrapConfig;

/// Create the configured administrator if the store has no users yet
pub async fn ensure_admin(auth: &AuthService, config: &BootstrapConfig) -> Result<Option<User>> {
    let store = auth.store();
    if store.has_users().await? {
        return Ok(None);
    }

    let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) else {
        warn!("No users exist and no [bootstrap] administrator is configured");
        return Ok(None);
    };

    let password_hash = auth.hasher().hash_blocking(password.clone()).await?;
    let user = store
        .insert(NewUser {
            username: config.admin_username.trim().to_string(),
            email: email.trim().to_lowercase(),
            password_hash,
            first_name: config.admin_first_name.clone(),
            last_name: config.admin_last_name.clone(),
            role: UserRole::Admin,
            active: true,
        })
        .await?;

    info!("Created administrator {} ({})", user.username, user.email);
    Ok(Some(user))
}
