//! Integration tests for the startup admin bootstrap.

mod common;

use axum::http::{Method, StatusCode};
use campus_events_api::config::AdminBootstrapConfig;
use campus_events_api::services::admin_bootstrap::{bootstrap_admin, BootstrapOutcome};
use common::{
    create_authenticated_user, json_request, setup, unique_test_email, TestUser, TEST_PASSWORD,
};
use sqlx::PgPool;
use tower::ServiceExt;

fn bootstrap_config(email: &str, password: &str) -> AdminBootstrapConfig {
    AdminBootstrapConfig {
        bootstrap_email: email.to_string(),
        bootstrap_password: password.to_string(),
        bootstrap_name: "Campus Admin".to_string(),
    }
}

async fn stored_account(pool: &PgPool, email: &str) -> (String, String) {
    sqlx::query_as("SELECT role::text, password_hash FROM users WHERE email = $1")
        .bind(email)
        .fetch_one(pool)
        .await
        .expect("Failed to read user")
}

#[tokio::test]
async fn test_bootstrap_creates_admin_then_is_idempotent() {
    let (pool, app) = setup().await;
    let email = unique_test_email();
    let config = bootstrap_config(&email, TEST_PASSWORD);

    let outcome = bootstrap_admin(&pool, &config).await.unwrap();
    assert_eq!(outcome, BootstrapOutcome::Created);

    let (role, _) = stored_account(&pool, &email).await;
    assert_eq!(role, "admin");

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/auth/admin-login",
            serde_json::json!({ "email": email, "password": TEST_PASSWORD }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let outcome = bootstrap_admin(&pool, &config).await.unwrap();
    assert_eq!(outcome, BootstrapOutcome::AlreadyAdmin);
}

#[tokio::test]
async fn test_bootstrap_promotes_existing_account_keeping_password() {
    let (pool, app) = setup().await;
    let user = TestUser::new();
    create_authenticated_user(&app, &user).await;
    let (role, hash_before) = stored_account(&pool, &user.email).await;
    assert_eq!(role, "student");

    // Mixed case in the configured email still matches the stored account.
    let config = bootstrap_config(&user.email.to_uppercase(), "AnotherP@ssword9");
    let outcome = bootstrap_admin(&pool, &config).await.unwrap();
    assert_eq!(outcome, BootstrapOutcome::Promoted);

    let (role, hash_after) = stored_account(&pool, &user.email).await;
    assert_eq!(role, "admin");
    assert_eq!(hash_after, hash_before);

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/auth/admin-login",
            serde_json::json!({ "email": user.email, "password": user.password }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
