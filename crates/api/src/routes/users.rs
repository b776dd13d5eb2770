//! User account routes: the caller's profile and admin user management.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use domain::models::user::{
    CreateUserRequest, ListUsersQuery, ListUsersResponse, UpdateProfileRequest, UpdateUserRequest,
};
use domain::models::User;
use persistence::repositories::{NewUser, UserChanges, UserRepository};
use shared::password::hash_password;
use shared::validation::{email_has_domain, normalize_email};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{AdminAuth, UserAuth};
use crate::middleware::metrics::record_user_registered;

fn user_not_found() -> ApiError {
    ApiError::NotFound("User not found".to_string())
}

/// GET /api/v1/users/me
pub async fn get_me(
    State(state): State<AppState>,
    user_auth: UserAuth,
) -> Result<Json<User>, ApiError> {
    let user = UserRepository::new(state.pool.clone())
        .find_by_id(user_auth.user_id)
        .await?
        .ok_or_else(user_not_found)?;
    Ok(Json(user.into()))
}

/// Edit the caller's own name or email.
///
/// PUT /api/v1/users/me
pub async fn update_me(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<User>, ApiError> {
    request.validate()?;

    let email = request.email.as_deref().map(normalize_email);
    let allowed_domain = &state.config.auth.allowed_email_domain;
    if let Some(email) = &email {
        if !user_auth.is_admin()
            && !allowed_domain.is_empty()
            && !email_has_domain(email, allowed_domain)
        {
            return Err(ApiError::Validation(format!(
                "Only @{} email addresses are allowed",
                allowed_domain
            )));
        }
    }

    let changes = UserChanges {
        name: request.name.as_deref().map(str::trim),
        email: email.as_deref(),
        ..UserChanges::default()
    };

    let user = UserRepository::new(state.pool.clone())
        .update(user_auth.user_id, changes)
        .await?
        .ok_or_else(user_not_found)?;

    info!(user_id = %user.id, "Profile updated");
    Ok(Json(user.into()))
}

/// GET /api/v1/users
pub async fn list_users(
    State(state): State<AppState>,
    _admin: AdminAuth,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<ListUsersResponse>, ApiError> {
    let repo = UserRepository::new(state.pool.clone());
    let page = query.page_params();
    let role = query.role.map(Into::into);

    let users = repo.list(role, page.limit(), page.offset()).await?;
    let total = repo.count(role).await?;

    Ok(Json(ListUsersResponse {
        data: users.into_iter().map(User::from).collect(),
        pagination: page.info(total),
    }))
}

/// Create an account with any role.
///
/// POST /api/v1/users
pub async fn create_user(
    State(state): State<AppState>,
    AdminAuth(admin): AdminAuth,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    request.validate()?;

    let email = normalize_email(&request.email);
    let password_hash = hash_password(&request.password)?;

    let user = UserRepository::new(state.pool.clone())
        .create(NewUser {
            name: request.name.trim(),
            email: &email,
            password_hash: &password_hash,
            role: request.role.into(),
        })
        .await?;

    record_user_registered("admin");
    info!(
        admin_id = %admin.user_id,
        user_id = %user.id,
        role = %request.role,
        "User created by admin"
    );

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// GET /api/v1/users/:user_id
pub async fn get_user(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(user_id): Path<Uuid>,
) -> Result<Json<User>, ApiError> {
    if !user_auth.actor().can_view_user(user_id) {
        return Err(ApiError::Forbidden(
            "You can only view your own account".to_string(),
        ));
    }

    let user = UserRepository::new(state.pool.clone())
        .find_by_id(user_id)
        .await?
        .ok_or_else(user_not_found)?;
    Ok(Json(user.into()))
}

/// PUT /api/v1/users/:user_id
pub async fn update_user(
    State(state): State<AppState>,
    AdminAuth(admin): AdminAuth,
    Path(user_id): Path<Uuid>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<User>, ApiError> {
    request.validate()?;

    let email = request.email.as_deref().map(normalize_email);
    let password_hash = request.password.as_deref().map(hash_password).transpose()?;

    let changes = UserChanges {
        name: request.name.as_deref().map(str::trim),
        email: email.as_deref(),
        role: request.role.map(Into::into),
        password_hash: password_hash.as_deref(),
    };

    let user = UserRepository::new(state.pool.clone())
        .update(user_id, changes)
        .await?
        .ok_or_else(user_not_found)?;

    info!(admin_id = %admin.user_id, user_id = %user.id, "User updated by admin");
    Ok(Json(user.into()))
}

/// Delete an account with its sessions, registrations and organized events.
///
/// DELETE /api/v1/users/:user_id
pub async fn delete_user(
    State(state): State<AppState>,
    AdminAuth(admin): AdminAuth,
    Path(user_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if admin.user_id == user_id {
        return Err(ApiError::Validation(
            "You cannot delete your own account".to_string(),
        ));
    }

    let deleted = UserRepository::new(state.pool.clone())
        .delete(user_id)
        .await?;
    if !deleted {
        return Err(user_not_found());
    }

    info!(admin_id = %admin.user_id, user_id = %user_id, "User deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::models::UserRole;

    #[test]
    fn test_update_user_request_partial() {
        let request: UpdateUserRequest =
            serde_json::from_value(serde_json::json!({ "role": "staff" })).unwrap();
        assert!(request.validate().is_ok());
        assert_eq!(request.role, Some(UserRole::Staff));
        assert!(request.password.is_none());
    }

    #[test]
    fn test_create_user_request_requires_role() {
        let result: Result<CreateUserRequest, _> = serde_json::from_value(serde_json::json!({
            "name": "Blerta",
            "email": "blerta@umib.net",
            "password": "longenough"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_profile_update_rejects_invalid_email() {
        let request: UpdateProfileRequest =
            serde_json::from_value(serde_json::json!({ "email": "not-an-email" })).unwrap();
        assert!(request.validate().is_err());
    }
}
