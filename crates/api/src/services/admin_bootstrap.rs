//! Admin bootstrap for initial setup.
//!
//! Ensures the configured account exists with the admin role. Runs after
//! migrations on every startup and is idempotent.

use persistence::entities::UserRoleDb;
use persistence::repositories::{NewUser, UserRepository};
use shared::password::{hash_password, PasswordError};
use shared::validation::normalize_email;
use sqlx::PgPool;
use tracing::{info, warn};

use crate::config::AdminBootstrapConfig;

/// Error types for admin bootstrap.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Password hashing error: {0}")]
    PasswordHash(#[from] PasswordError),
}

/// What the bootstrap did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    Skipped,
    Created,
    Promoted,
    AlreadyAdmin,
}

/// Create the bootstrap admin, or promote the existing account with that
/// email. An existing account keeps its password.
pub async fn bootstrap_admin(
    pool: &PgPool,
    config: &AdminBootstrapConfig,
) -> Result<BootstrapOutcome, BootstrapError> {
    if config.bootstrap_email.trim().is_empty() {
        return Ok(BootstrapOutcome::Skipped);
    }

    if config.bootstrap_password.is_empty() {
        warn!(
            "CE__ADMIN__BOOTSTRAP_EMAIL is set but CE__ADMIN__BOOTSTRAP_PASSWORD is empty - skipping bootstrap"
        );
        return Ok(BootstrapOutcome::Skipped);
    }

    let users = UserRepository::new(pool.clone());
    let email = normalize_email(&config.bootstrap_email);

    if let Some(existing) = users.find_by_email(&email).await? {
        if existing.role == UserRoleDb::Admin {
            info!(email = %email, "Bootstrap admin already present");
            return Ok(BootstrapOutcome::AlreadyAdmin);
        }
        users.promote_to_admin(existing.id).await?;
        info!(email = %email, user_id = %existing.id, "Existing account promoted to admin");
        return Ok(BootstrapOutcome::Promoted);
    }

    let password_hash = hash_password(&config.bootstrap_password)?;
    let name = match config.bootstrap_name.trim() {
        "" => "Administrator",
        name => name,
    };
    let created = users
        .create(NewUser {
            name,
            email: &email,
            password_hash: &password_hash,
            role: UserRoleDb::Admin,
        })
        .await?;

    info!(email = %email, user_id = %created.id, "Bootstrap admin user created");
    warn!(
        "SECURITY: Remove CE__ADMIN__BOOTSTRAP_PASSWORD from configuration after initial setup"
    );

    Ok(BootstrapOutcome::Created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    fn lazy_pool() -> PgPool {
        PgPoolOptions::new()
            .connect_lazy("postgres://localhost/never_connected")
            .expect("lazy pool")
    }

    #[tokio::test]
    async fn test_skips_without_email() {
        let config = AdminBootstrapConfig::default();
        let outcome = bootstrap_admin(&lazy_pool(), &config).await.unwrap();
        assert_eq!(outcome, BootstrapOutcome::Skipped);
    }

    #[tokio::test]
    async fn test_skips_without_password() {
        let config = AdminBootstrapConfig {
            bootstrap_email: "admin@umib.net".to_string(),
            bootstrap_password: String::new(),
            ..AdminBootstrapConfig::default()
        };
        let outcome = bootstrap_admin(&lazy_pool(), &config).await.unwrap();
        assert_eq!(outcome, BootstrapOutcome::Skipped);
    }
}
