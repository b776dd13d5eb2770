//! Integration tests for registration, login and token lifecycle.
//!
//! Requires a PostgreSQL database at `TEST_DATABASE_URL`.

mod common;

use axum::http::{Method, StatusCode};
use common::{
    create_admin_user, create_authenticated_user, get_request_with_auth, json_request,
    parse_response_body, setup, TestUser,
};
use tower::ServiceExt;

#[tokio::test]
async fn test_register_returns_user_and_tokens() {
    let (_pool, app) = setup().await;
    let user = TestUser::new();

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/auth/register",
            user.registration_body(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = parse_response_body(response).await;
    assert_eq!(body["user"]["email"], user.email);
    assert_eq!(body["user"]["role"], "student");
    assert!(body["user"].get("password_hash").is_none());
    assert_eq!(body["tokens"]["token_type"], "Bearer");
    assert!(body["tokens"]["access_token"].is_string());
}

#[tokio::test]
async fn test_register_with_department_role() {
    let (_pool, app) = setup().await;
    let user = TestUser::new().with_role("mechanical_engineering");

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/auth/register",
            user.registration_body(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = parse_response_body(response).await;
    assert_eq!(body["user"]["role"], "mechanical_engineering");
}

#[tokio::test]
async fn test_register_duplicate_email_rejected() {
    let (_pool, app) = setup().await;
    let user = TestUser::new();
    create_authenticated_user(&app, &user).await;

    let mut body = user.registration_body();
    body["email"] = serde_json::json!(user.email.to_uppercase());
    let response = app
        .clone()
        .oneshot(json_request(Method::POST, "/api/v1/auth/register", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_admin_role_refused() {
    let (_pool, app) = setup().await;
    let user = TestUser::new().with_role("admin");

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/auth/register",
            user.registration_body(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_register_outside_campus_domain_rejected() {
    let (_pool, app) = setup().await;
    let mut user = TestUser::new();
    user.email = format!("outsider_{}@gmail.com", uuid::Uuid::new_v4().simple());

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/auth/register",
            user.registration_body(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = parse_response_body(response).await;
    assert!(body["message"].as_str().unwrap_or_default().contains("umib.net"));
}

#[tokio::test]
async fn test_register_short_password_rejected() {
    let (_pool, app) = setup().await;
    let mut user = TestUser::new();
    user.password = "short".to_string();

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/auth/register",
            user.registration_body(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_success_and_wrong_password() {
    let (_pool, app) = setup().await;
    let user = TestUser::new();
    create_authenticated_user(&app, &user).await;

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/auth/login",
            serde_json::json!({ "email": user.email, "password": user.password }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/auth/login",
            serde_json::json!({ "email": user.email, "password": "WrongPassword1!" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_unknown_email_unauthorized() {
    let (_pool, app) = setup().await;

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/auth/login",
            serde_json::json!({ "email": common::unique_test_email(), "password": "whatever123" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_login_refuses_non_admin() {
    let (_pool, app) = setup().await;
    let user = TestUser::new();
    create_authenticated_user(&app, &user).await;

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/auth/admin-login",
            serde_json::json!({ "email": user.email, "password": user.password }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_refresh_rotates_and_spends_token() {
    let (_pool, app) = setup().await;
    let auth = create_authenticated_user(&app, &TestUser::new()).await;

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/auth/refresh",
            serde_json::json!({ "refresh_token": auth.refresh_token }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    let new_refresh = body["tokens"]["refresh_token"].as_str().unwrap().to_string();
    assert_ne!(new_refresh, auth.refresh_token);

    // The old refresh token was spent by the rotation.
    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/auth/refresh",
            serde_json::json!({ "refresh_token": auth.refresh_token }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/auth/refresh",
            serde_json::json!({ "refresh_token": new_refresh }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_access_token_cannot_refresh() {
    let (_pool, app) = setup().await;
    let auth = create_authenticated_user(&app, &TestUser::new()).await;

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/auth/refresh",
            serde_json::json!({ "refresh_token": auth.access_token }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_ends_session() {
    let (_pool, app) = setup().await;
    let auth = create_authenticated_user(&app, &TestUser::new()).await;

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/auth/logout",
            serde_json::json!({ "refresh_token": auth.refresh_token }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/auth/refresh",
            serde_json::json!({ "refresh_token": auth.refresh_token }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_route_requires_token() {
    let (_pool, app) = setup().await;

    let response = app
        .clone()
        .oneshot(common::get_request("/api/v1/users/me"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(get_request_with_auth("/api/v1/users/me", "not-a-jwt"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_list_admins_requires_admin() {
    let (pool, app) = setup().await;
    let student = create_authenticated_user(&app, &TestUser::new()).await;
    let admin = create_admin_user(&app, &pool).await;

    let response = app
        .clone()
        .oneshot(get_request_with_auth(
            "/api/v1/auth/admins",
            &student.access_token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .clone()
        .oneshot(get_request_with_auth("/api/v1/auth/admins", &admin.access_token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    let admins = body.as_array().expect("array");
    assert!(admins.iter().any(|a| a["email"] == admin.email));
    assert!(admins.iter().all(|a| a["role"] == "admin"));
}

#[tokio::test]
async fn test_stats_are_public() {
    let (_pool, app) = setup().await;
    create_authenticated_user(&app, &TestUser::new()).await;

    let response = app
        .clone()
        .oneshot(common::get_request("/api/v1/stats"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert!(body["total_users"].as_i64().unwrap() >= 1);
    assert!(body["total_events"].is_i64());
    assert!(body["total_registrations"].is_i64());
}

#[tokio::test]
async fn test_health_endpoints() {
    let (_pool, app) = setup().await;

    let response = app
        .clone()
        .oneshot(common::get_request("/api/health"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["external_services"]["image_uploads_enabled"], false);

    let response = app
        .clone()
        .oneshot(common::get_request("/api/health/live"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_upload_without_image_host_is_unavailable() {
    let (_pool, app) = setup().await;
    let auth = create_authenticated_user(&app, &TestUser::new()).await;

    let boundary = "campus-events-boundary";
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"poster.png\"\r\nContent-Type: image/png\r\n\r\n\u{89}PNG\r\n--{b}--\r\n",
        b = boundary
    );
    let request = axum::http::Request::builder()
        .method(Method::POST)
        .uri("/api/v1/uploads/images")
        .header(
            axum::http::header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .header(
            axum::http::header::AUTHORIZATION,
            format!("Bearer {}", auth.access_token),
        )
        .body(axum::body::Body::from(body))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_basic_auth_scheme_unauthorized() {
    let (_pool, app) = setup().await;

    let request = axum::http::Request::builder()
        .method(Method::GET)
        .uri("/api/v1/registrations/mine")
        .header(axum::http::header::AUTHORIZATION, "Basic dXNlcjpwYXNz")
        .body(axum::body::Body::empty())
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
