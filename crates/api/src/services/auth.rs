//! Authentication service for user registration, login, and token management.

use chrono::{Duration, Utc};
use domain::models::auth::AuthTokens;
use domain::models::user::{LoginRequest, RegisterUserRequest};
use domain::models::{AuthResponse, User};
use persistence::repositories::{NewUser, UserRepository};
use shared::crypto::sha256_hex;
use shared::jwt::{extract_user_id, JwtConfig, JwtError, TokenSubject};
use shared::password::{hash_password, verify_dummy, verify_password, PasswordError};
use shared::validation::{email_has_domain, normalize_email};
use sqlx::PgPool;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::error::ApiError;
use crate::middleware::metrics::record_user_registered;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Email is already registered")]
    EmailAlreadyExists,

    #[error("Only @{0} email addresses can register")]
    EmailDomainNotAllowed(String),

    #[error("Admin accounts cannot be created through registration")]
    AdminRoleRefused,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Admin access required")]
    NotAdmin,

    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    #[error("Token error: {0}")]
    TokenError(#[from] JwtError),

    #[error("Password error: {0}")]
    PasswordError(#[from] PasswordError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::EmailAlreadyExists | AuthError::EmailDomainNotAllowed(_) => {
                ApiError::Validation(err.to_string())
            }
            AuthError::AdminRoleRefused | AuthError::NotAdmin => {
                ApiError::Forbidden(err.to_string())
            }
            AuthError::InvalidCredentials | AuthError::InvalidRefreshToken => {
                ApiError::Unauthorized(err.to_string())
            }
            AuthError::TokenError(e) => e.into(),
            AuthError::PasswordError(e) => e.into(),
            AuthError::DatabaseError(e) => e.into(),
        }
    }
}

/// Authentication service.
pub struct AuthService {
    users: UserRepository,
    jwt: Arc<JwtConfig>,
    allowed_email_domain: String,
}

impl AuthService {
    pub fn new(pool: PgPool, jwt: Arc<JwtConfig>, allowed_email_domain: &str) -> Self {
        Self {
            users: UserRepository::new(pool),
            jwt,
            allowed_email_domain: allowed_email_domain.trim().to_string(),
        }
    }

    /// Self-service registration. The request must already be validated.
    pub async fn register(&self, request: &RegisterUserRequest) -> Result<AuthResponse, AuthError> {
        let role = request.role.unwrap_or_default();
        if role.is_admin() {
            return Err(AuthError::AdminRoleRefused);
        }

        let email = normalize_email(&request.email);
        if !self.allowed_email_domain.is_empty()
            && !email_has_domain(&email, &self.allowed_email_domain)
        {
            return Err(AuthError::EmailDomainNotAllowed(
                self.allowed_email_domain.clone(),
            ));
        }

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailAlreadyExists);
        }

        let password_hash = hash_password(&request.password)?;

        let created = self
            .users
            .create(NewUser {
                name: request.name.trim(),
                email: &email,
                password_hash: &password_hash,
                role: role.into(),
            })
            .await;

        // A concurrent registration with the same email hits the unique index.
        let entity = match created {
            Err(sqlx::Error::Database(db_err)) if db_err.code().as_deref() == Some("23505") => {
                return Err(AuthError::EmailAlreadyExists);
            }
            other => other?,
        };

        record_user_registered("self_service");
        info!(user_id = %entity.id, role = %role, "User registered");

        let user = User::from(entity);
        let tokens = self.issue_tokens(&user).await?;
        Ok(AuthResponse { user, tokens })
    }

    /// Email and password login.
    pub async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, AuthError> {
        let user = self.authenticate(&request.email, &request.password).await?;
        let tokens = self.issue_tokens(&user).await?;
        info!(user_id = %user.id, "User logged in");
        Ok(AuthResponse { user, tokens })
    }

    /// Login for the admin console. Valid credentials of a non-admin are refused.
    pub async fn admin_login(&self, request: &LoginRequest) -> Result<AuthResponse, AuthError> {
        let user = self.authenticate(&request.email, &request.password).await?;
        if !user.role.is_admin() {
            return Err(AuthError::NotAdmin);
        }
        let tokens = self.issue_tokens(&user).await?;
        info!(user_id = %user.id, "Admin logged in");
        Ok(AuthResponse { user, tokens })
    }

    /// Exchange a refresh token for a new token pair. The presented token is
    /// spent: a second refresh with it fails.
    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthTokens, AuthError> {
        let claims = self
            .jwt
            .validate_refresh_token(refresh_token)
            .map_err(|_| AuthError::InvalidRefreshToken)?;
        let user_id = extract_user_id(&claims).map_err(|_| AuthError::InvalidRefreshToken)?;
        let current_hash = sha256_hex(&claims.jti);

        let session = self
            .users
            .find_session_by_refresh_hash(&current_hash)
            .await?
            .filter(|s| s.user_id == user_id)
            .ok_or(AuthError::InvalidRefreshToken)?;

        // Role or email may have changed since the session began.
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .map(User::from)
            .ok_or(AuthError::InvalidRefreshToken)?;

        let subject = token_subject(&user);
        let (access_token, access_jti) = self.jwt.generate_access_token(subject)?;
        let (new_refresh_token, refresh_jti) = self.jwt.generate_refresh_token(subject)?;

        let rotated = self
            .users
            .rotate_session(
                session.id,
                &current_hash,
                &sha256_hex(&access_jti),
                &sha256_hex(&refresh_jti),
                self.refresh_expiry(),
            )
            .await?;
        if !rotated {
            return Err(AuthError::InvalidRefreshToken);
        }

        Ok(AuthTokens::bearer(
            access_token,
            new_refresh_token,
            self.jwt.access_token_expiry_secs,
        ))
    }

    /// End the session owning `refresh_token`, or every session of its user.
    pub async fn logout(&self, refresh_token: &str, all_sessions: bool) -> Result<(), AuthError> {
        let claims = self
            .jwt
            .validate_refresh_token(refresh_token)
            .map_err(|_| AuthError::InvalidRefreshToken)?;
        let user_id = extract_user_id(&claims).map_err(|_| AuthError::InvalidRefreshToken)?;

        if all_sessions {
            let removed = self.users.delete_user_sessions(user_id).await?;
            info!(user_id = %user_id, sessions = removed, "Logged out of all sessions");
        } else {
            self.users
                .delete_session_by_refresh_hash(user_id, &sha256_hex(&claims.jti))
                .await?;
            info!(user_id = %user_id, "Logged out");
        }
        Ok(())
    }

    /// Check credentials. Unknown emails cost the same work as a wrong password.
    async fn authenticate(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let Some(entity) = self.users.find_by_email(&normalize_email(email)).await? else {
            verify_dummy(password);
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password(password, &entity.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        Ok(entity.into())
    }

    async fn issue_tokens(&self, user: &User) -> Result<AuthTokens, AuthError> {
        let subject = token_subject(user);
        let (access_token, access_jti) = self.jwt.generate_access_token(subject)?;
        let (refresh_token, refresh_jti) = self.jwt.generate_refresh_token(subject)?;

        self.users
            .create_session(
                user.id,
                &sha256_hex(&access_jti),
                &sha256_hex(&refresh_jti),
                self.refresh_expiry(),
            )
            .await?;

        Ok(AuthTokens::bearer(
            access_token,
            refresh_token,
            self.jwt.access_token_expiry_secs,
        ))
    }

    fn refresh_expiry(&self) -> chrono::DateTime<Utc> {
        Utc::now() + Duration::seconds(self.jwt.refresh_token_expiry_secs)
    }
}

fn token_subject(user: &User) -> TokenSubject<'_> {
    TokenSubject {
        user_id: user.id,
        email: &user.email,
        role: user.role.as_str(),
    }
}
