//! Registration routes. Every seat change goes through the repository's
//! transactional operations so the event counter stays exact.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use domain::models::registration::{
    CreateRegistrationRequest, ListRegistrationsQuery, ListRegistrationsResponse,
    UpdateRegistrationStatusRequest,
};
use domain::models::{
    Event, Registration, RegistrationDetail, ReserveOutcome, StatusChangeOutcome,
};
use persistence::repositories::{EventRepository, RegistrationFilter, RegistrationRepository};
use tracing::info;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{AdminAuth, UserAuth};
use crate::middleware::metrics::record_registration;
use crate::services::notifications;

fn registration_not_found() -> ApiError {
    ApiError::NotFound("Registration not found".to_string())
}

async fn load_registration(
    repo: &RegistrationRepository,
    registration_id: Uuid,
) -> Result<Registration, ApiError> {
    Ok(repo
        .find_by_id(registration_id)
        .await?
        .ok_or_else(registration_not_found)?
        .into())
}

async fn load_event(state: &AppState, event_id: Uuid) -> Result<Event, ApiError> {
    Ok(EventRepository::new(state.pool.clone())
        .find_by_id(event_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Event not found".to_string()))?
        .into())
}

async fn fetch_detail(
    repo: &RegistrationRepository,
    registration_id: Uuid,
) -> Result<RegistrationDetail, ApiError> {
    repo.find_detail(registration_id)
        .await?
        .map(RegistrationDetail::from)
        .ok_or_else(registration_not_found)
}

async fn list_with_filter(
    repo: &RegistrationRepository,
    filter: RegistrationFilter,
    query: &ListRegistrationsQuery,
) -> Result<ListRegistrationsResponse, ApiError> {
    let page = query.page_params();
    let rows = repo.list(&filter, page.limit(), page.offset()).await?;
    let total = repo.count(&filter).await?;

    Ok(ListRegistrationsResponse {
        data: rows.into_iter().map(RegistrationDetail::from).collect(),
        pagination: page.info(total),
    })
}

/// Register the caller for an approved event.
///
/// POST /api/v1/registrations
pub async fn register_for_event(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Json(request): Json<CreateRegistrationRequest>,
) -> Result<(StatusCode, Json<RegistrationDetail>), ApiError> {
    let repo = RegistrationRepository::new(state.pool.clone());

    let registration = match repo.register(user_auth.user_id, request.event_id).await? {
        ReserveOutcome::Created(registration) => {
            record_registration("created");
            registration
        }
        ReserveOutcome::Reactivated(registration) => {
            record_registration("reactivated");
            registration
        }
        ReserveOutcome::AlreadyRegistered(_) => {
            record_registration("duplicate");
            return Err(ApiError::Validation(
                "You are already registered for this event".to_string(),
            ));
        }
        ReserveOutcome::EventFull => {
            record_registration("full");
            return Err(ApiError::Validation("Event is full".to_string()));
        }
        ReserveOutcome::EventNotFound => {
            return Err(ApiError::NotFound("Event not found".to_string()));
        }
        ReserveOutcome::EventNotOpen(status) => {
            return Err(ApiError::Validation(format!(
                "Event is not open for registration (status: {})",
                status
            )));
        }
    };

    info!(
        registration_id = %registration.id,
        event_id = %registration.event_id,
        user_id = %user_auth.user_id,
        "Registered for event"
    );

    let detail = fetch_detail(&repo, registration.id).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// Every registration on the platform, newest first.
///
/// GET /api/v1/registrations
pub async fn list_registrations(
    State(state): State<AppState>,
    _admin: AdminAuth,
    Query(query): Query<ListRegistrationsQuery>,
) -> Result<Json<ListRegistrationsResponse>, ApiError> {
    let filter = RegistrationFilter {
        status: query.status.map(Into::into),
        event_id: query.event_id,
        user_id: None,
    };
    let repo = RegistrationRepository::new(state.pool.clone());
    Ok(Json(list_with_filter(&repo, filter, &query).await?))
}

/// GET /api/v1/registrations/mine
pub async fn list_my_registrations(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Query(query): Query<ListRegistrationsQuery>,
) -> Result<Json<ListRegistrationsResponse>, ApiError> {
    let filter = RegistrationFilter {
        status: query.status.map(Into::into),
        event_id: query.event_id,
        user_id: Some(user_auth.user_id),
    };
    let repo = RegistrationRepository::new(state.pool.clone());
    Ok(Json(list_with_filter(&repo, filter, &query).await?))
}

/// GET /api/v1/registrations/:registration_id
pub async fn get_registration(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(registration_id): Path<Uuid>,
) -> Result<Json<RegistrationDetail>, ApiError> {
    let repo = RegistrationRepository::new(state.pool.clone());
    let registration = load_registration(&repo, registration_id).await?;
    let event = load_event(&state, registration.event_id).await?;

    if !user_auth
        .actor()
        .can_view_registration(&registration, &event)
    {
        return Err(ApiError::Forbidden(
            "You cannot view this registration".to_string(),
        ));
    }

    Ok(Json(fetch_detail(&repo, registration_id).await?))
}

/// Confirm, cancel or reopen a registration. The registrant is emailed on
/// confirmation and cancellation.
///
/// PUT /api/v1/registrations/:registration_id/status
pub async fn update_registration_status(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(registration_id): Path<Uuid>,
    Json(request): Json<UpdateRegistrationStatusRequest>,
) -> Result<Json<RegistrationDetail>, ApiError> {
    let repo = RegistrationRepository::new(state.pool.clone());
    let registration = load_registration(&repo, registration_id).await?;
    let event = load_event(&state, registration.event_id).await?;

    if !user_auth.actor().can_manage_registrations_of(&event) {
        return Err(ApiError::Forbidden(
            "Only the organizer or an admin can change registration status".to_string(),
        ));
    }

    let previous = match repo.change_status(registration_id, request.status).await? {
        StatusChangeOutcome::Updated { previous, .. } => previous,
        StatusChangeOutcome::NotFound => return Err(registration_not_found()),
        StatusChangeOutcome::EventFull => {
            return Err(ApiError::Validation("Event is full".to_string()));
        }
    };

    info!(
        registration_id = %registration_id,
        user_id = %user_auth.user_id,
        from = %previous,
        to = %request.status,
        "Registration status changed"
    );

    let detail = fetch_detail(&repo, registration_id).await?;
    if previous != request.status {
        notifications::notify_registration_status(
            &state.email,
            event,
            request.status,
            detail.user.email.clone(),
            detail.user.name.clone(),
        );
    }

    Ok(Json(detail))
}

/// Withdraw a registration, freeing its seat.
///
/// DELETE /api/v1/registrations/:registration_id
pub async fn withdraw_registration(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(registration_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let repo = RegistrationRepository::new(state.pool.clone());
    let registration = load_registration(&repo, registration_id).await?;

    if !user_auth.actor().can_withdraw(&registration) {
        return Err(ApiError::Forbidden(
            "You can only withdraw your own registration".to_string(),
        ));
    }

    if repo.withdraw(registration_id).await?.is_none() {
        return Err(registration_not_found());
    }

    record_registration("withdrawn");
    info!(
        registration_id = %registration_id,
        user_id = %user_auth.user_id,
        "Registration withdrawn"
    );
    Ok(StatusCode::NO_CONTENT)
}
