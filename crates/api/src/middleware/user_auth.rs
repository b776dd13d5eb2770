//! User JWT authentication middleware.
//!
//! Validates the bearer token once per request and stores the caller in the
//! request extensions, where the extractors and the rate limiter pick it up.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use domain::models::UserRole;
use domain::services::Actor;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use shared::jwt::{extract_user_id, JwtConfig};

/// Authenticated caller taken from a validated access token.
#[derive(Debug, Clone)]
pub struct UserAuth {
    pub user_id: Uuid,
    pub email: String,
    pub role: UserRole,
    /// JWT ID (jti) of the access token.
    pub jti: String,
}

impl UserAuth {
    /// Validates an access token and returns the caller it names.
    pub fn validate(jwt_config: &JwtConfig, token: &str) -> Result<Self, ApiError> {
        let claims = jwt_config.validate_access_token(token)?;
        let user_id = extract_user_id(&claims)?;
        let role = claims
            .role
            .parse::<UserRole>()
            .map_err(|_| ApiError::Unauthorized("Invalid token".to_string()))?;

        Ok(UserAuth {
            user_id,
            email: claims.email,
            role,
            jti: claims.jti,
        })
    }

    pub fn actor(&self) -> Actor {
        Actor::new(self.user_id, self.role)
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Bearer token from the `Authorization` header, if well formed.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .typed_get::<Authorization<Bearer>>()
        .map(|auth| auth.token().to_string())
}

/// Middleware that requires JWT user authentication.
pub async fn require_user_auth(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(req.headers()) else {
        return ApiError::Unauthorized("Missing or invalid Authorization header".to_string())
            .into_response();
    };

    match UserAuth::validate(&state.jwt, &token) {
        Ok(auth) => {
            req.extensions_mut().insert(auth);
            next.run(req).await
        }
        Err(e) => {
            tracing::debug!(error = %e, "JWT validation failed");
            e.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, HeaderValue, StatusCode};
    use shared::jwt::TokenSubject;

    fn jwt() -> JwtConfig {
        JwtConfig::from_secret("unit-test-secret-with-enough-length!!", 3600, 86400, 30)
            .expect("jwt config")
    }

    #[test]
    fn test_validate_access_token() {
        let jwt = jwt();
        let user_id = Uuid::new_v4();
        let (token, jti) = jwt
            .generate_access_token(TokenSubject {
                user_id,
                email: "organizer@umib.net",
                role: "staff",
            })
            .expect("token");

        let auth = UserAuth::validate(&jwt, &token).expect("valid");
        assert_eq!(auth.user_id, user_id);
        assert_eq!(auth.role, UserRole::Staff);
        assert_eq!(auth.jti, jti);
        assert!(!auth.is_admin());
        assert_eq!(auth.actor().user_id, user_id);
    }

    #[test]
    fn test_refresh_token_is_not_an_access_token() {
        let jwt = jwt();
        let (token, _) = jwt
            .generate_refresh_token(TokenSubject {
                user_id: Uuid::new_v4(),
                email: "student@umib.net",
                role: "student",
            })
            .expect("token");

        let err = UserAuth::validate(&jwt, &token).unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert!(bearer_token(&headers).is_none());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(bearer_token(&headers).is_none());

        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer abc.def.ghi"),
        );
        assert_eq!(bearer_token(&headers).as_deref(), Some("abc.def.ghi"));
    }
}
