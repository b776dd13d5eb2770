//! Authentication routes for registration, login, and token management.

use axum::{extract::State, http::StatusCode, Json};
use domain::models::auth::{LogoutRequest, RefreshResponse, RefreshTokenRequest};
use domain::models::user::{LoginRequest, RegisterUserRequest};
use domain::models::{AuthResponse, User};
use persistence::repositories::UserRepository;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::AdminAuth;

/// Register a new account.
///
/// POST /api/v1/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterUserRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    request.validate()?;
    let response = state.auth_service().register(&request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    request.validate()?;
    let response = state.auth_service().login(&request).await?;
    Ok(Json(response))
}

/// Login restricted to admin accounts.
///
/// POST /api/v1/auth/admin-login
pub async fn admin_login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    request.validate()?;
    let response = state.auth_service().admin_login(&request).await?;
    Ok(Json(response))
}

/// POST /api/v1/auth/refresh
pub async fn refresh(
    State(state): State<AppState>,
    Json(request): Json<RefreshTokenRequest>,
) -> Result<Json<RefreshResponse>, ApiError> {
    request.validate()?;
    let tokens = state.auth_service().refresh(&request.refresh_token).await?;
    Ok(Json(RefreshResponse { tokens }))
}

/// POST /api/v1/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    Json(request): Json<LogoutRequest>,
) -> Result<StatusCode, ApiError> {
    request.validate()?;
    state
        .auth_service()
        .logout(&request.refresh_token, request.all_sessions)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List admin accounts.
///
/// GET /api/v1/auth/admins
pub async fn list_admins(
    State(state): State<AppState>,
    _admin: AdminAuth,
) -> Result<Json<Vec<User>>, ApiError> {
    let admins = UserRepository::new(state.pool.clone())
        .list_admins()
        .await?
        .into_iter()
        .map(User::from)
        .collect();
    Ok(Json(admins))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_validation() {
        let request: RegisterUserRequest = serde_json::from_value(serde_json::json!({
            "name": "Arta Krasniqi",
            "email": "arta@umib.net",
            "password": "longenough"
        }))
        .unwrap();
        assert!(request.validate().is_ok());
        assert!(request.role.is_none());
    }

    #[test]
    fn test_register_request_short_password() {
        let request: RegisterUserRequest = serde_json::from_value(serde_json::json!({
            "name": "Arta",
            "email": "arta@umib.net",
            "password": "short"
        }))
        .unwrap();
        let err = ApiError::from(request.validate().unwrap_err());
        assert!(err.to_string().contains("Password must be between 8 and 128 characters"));
    }

    #[test]
    fn test_logout_request_defaults_to_single_session() {
        let request: LogoutRequest =
            serde_json::from_value(serde_json::json!({ "refresh_token": "abc" })).unwrap();
        assert!(!request.all_sessions);
    }
}
