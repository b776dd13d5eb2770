use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
    Router,
};
use shared::jwt::{JwtConfig, JwtError};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{
    metrics_handler, metrics_middleware, rate_limit_middleware, require_user_auth,
    security_headers_middleware, trace_id, RateLimiterState,
};
use crate::routes::{auth, events, health, registrations, stats, uploads, users};
use crate::services::{AuthService, EmailService, ImageUploadService};

/// Room for multipart framing around an image at the size limit.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub jwt: Arc<JwtConfig>,
    pub rate_limiter: Option<Arc<RateLimiterState>>,
    pub email: EmailService,
    /// `None` when the image host is not configured.
    pub images: Option<ImageUploadService>,
}

impl AppState {
    pub fn auth_service(&self) -> AuthService {
        AuthService::new(
            self.pool.clone(),
            self.jwt.clone(),
            &self.config.auth.allowed_email_domain,
        )
    }
}

pub fn create_app(config: Config, pool: PgPool) -> Result<Router, JwtError> {
    let config = Arc::new(config);
    let jwt = Arc::new(config.jwt.build()?);

    // Disabled when rate_limit_per_minute is 0
    let rate_limiter = RateLimiterState::new(config.security.rate_limit_per_minute).map(Arc::new);

    let state = AppState {
        pool,
        config: config.clone(),
        jwt,
        rate_limiter,
        email: EmailService::new(config.email.clone()),
        images: ImageUploadService::new(config.images.clone()),
    };

    let cors = if config.security.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Middleware order: auth runs first, then rate limiting (which needs the caller)
    let authenticated_routes = Router::new()
        .route("/api/v1/auth/admins", get(auth::list_admins))
        // Users
        .route("/api/v1/users/me", get(users::get_me).put(users::update_me))
        .route("/api/v1/users", get(users::list_users).post(users::create_user))
        .route(
            "/api/v1/users/:user_id",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        // Events
        .route("/api/v1/events", post(events::create_event))
        .route("/api/v1/events/mine", get(events::list_my_events))
        .route(
            "/api/v1/events/:event_id",
            put(events::update_event).delete(events::delete_event),
        )
        .route("/api/v1/events/:event_id/status", put(events::moderate_event))
        .route(
            "/api/v1/events/:event_id/registrations",
            get(events::list_event_registrations),
        )
        // Registrations
        .route(
            "/api/v1/registrations",
            get(registrations::list_registrations).post(registrations::register_for_event),
        )
        .route(
            "/api/v1/registrations/mine",
            get(registrations::list_my_registrations),
        )
        .route(
            "/api/v1/registrations/:registration_id",
            get(registrations::get_registration).delete(registrations::withdraw_registration),
        )
        .route(
            "/api/v1/registrations/:registration_id/status",
            put(registrations::update_registration_status),
        )
        // Uploads
        .route(
            "/api/v1/uploads/images",
            post(uploads::upload_image).layer(DefaultBodyLimit::max(
                config.images.max_bytes + MULTIPART_OVERHEAD_BYTES,
            )),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_user_auth,
        ));

    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler))
        // Auth
        .route("/api/v1/auth/register", post(auth::register))
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/admin-login", post(auth::admin_login))
        .route("/api/v1/auth/refresh", post(auth::refresh))
        .route("/api/v1/auth/logout", post(auth::logout))
        // Event browsing; unapproved events need a token
        .route("/api/v1/events", get(events::list_events))
        .route("/api/v1/events/:event_id", get(events::get_event))
        .route("/api/v1/stats", get(stats::get_stats));

    Ok(Router::new()
        .merge(public_routes)
        .merge(authenticated_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(DefaultBodyLimit::max(config.server.max_body_size))
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state))
}
