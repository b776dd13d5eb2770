//! Event routes: browsing, organizing and moderation.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use domain::models::event::{
    CreateEventRequest, ListEventsQuery, ListEventsResponse, ModerateEventRequest,
    UpdateEventRequest,
};
use domain::models::registration::{ListRegistrationsQuery, ListRegistrationsResponse};
use domain::models::{Event, EventDetail, EventStatus, RegistrationDetail};
use domain::services::access::can_view_event;
use persistence::repositories::{
    EventFilter, EventRepository, EventUpdateOutcome, NewEvent, RegistrationFilter,
    RegistrationRepository,
};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{AdminAuth, OptionalUserAuth, UserAuth};
use crate::middleware::metrics::{record_event_created, record_event_moderated};
use crate::services::notifications;

fn event_not_found() -> ApiError {
    ApiError::NotFound("Event not found".to_string())
}

/// Load an event the caller may manage: 404 when missing, 403 otherwise.
async fn load_managed_event(
    repo: &EventRepository,
    user_auth: &UserAuth,
    event_id: Uuid,
) -> Result<Event, ApiError> {
    let event: Event = repo
        .find_by_id(event_id)
        .await?
        .ok_or_else(event_not_found)?
        .into();

    if !user_auth.actor().can_manage_event(&event) {
        return Err(ApiError::Forbidden(
            "Only the organizer or an admin can manage this event".to_string(),
        ));
    }
    Ok(event)
}

async fn fetch_detail(repo: &EventRepository, event_id: Uuid) -> Result<EventDetail, ApiError> {
    repo.find_detail(event_id)
        .await?
        .map(EventDetail::from)
        .ok_or_else(event_not_found)
}

async fn list_with_filter(
    repo: &EventRepository,
    filter: EventFilter,
    query: &ListEventsQuery,
) -> Result<ListEventsResponse, ApiError> {
    let page = query.page_params();
    let rows = repo.list(&filter, page.limit(), page.offset()).await?;
    let total = repo.count(&filter).await?;

    Ok(ListEventsResponse {
        data: rows.into_iter().map(EventDetail::from).collect(),
        pagination: page.info(total),
    })
}

fn base_filter(query: &ListEventsQuery) -> EventFilter {
    EventFilter {
        category: query.category.map(Into::into),
        status: query.status.map(Into::into),
        organizer_id: query.organizer_id,
        starts_after: query.upcoming.unwrap_or(false).then(Utc::now),
    }
}

/// Public event listing, soonest first.
///
/// GET /api/v1/events
///
/// Only admins see unapproved events here; organizers use `/events/mine`.
pub async fn list_events(
    State(state): State<AppState>,
    OptionalUserAuth(user_auth): OptionalUserAuth,
    Query(query): Query<ListEventsQuery>,
) -> Result<Json<ListEventsResponse>, ApiError> {
    let mut filter = base_filter(&query);
    let is_admin = user_auth.as_ref().is_some_and(UserAuth::is_admin);
    if !is_admin {
        filter.status = Some(EventStatus::Approved.into());
    }

    let repo = EventRepository::new(state.pool.clone());
    Ok(Json(list_with_filter(&repo, filter, &query).await?))
}

/// Events organized by the caller, in every status.
///
/// GET /api/v1/events/mine
pub async fn list_my_events(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Query(query): Query<ListEventsQuery>,
) -> Result<Json<ListEventsResponse>, ApiError> {
    let filter = EventFilter {
        organizer_id: Some(user_auth.user_id),
        ..base_filter(&query)
    };

    let repo = EventRepository::new(state.pool.clone());
    Ok(Json(list_with_filter(&repo, filter, &query).await?))
}

/// GET /api/v1/events/:event_id
pub async fn get_event(
    State(state): State<AppState>,
    OptionalUserAuth(user_auth): OptionalUserAuth,
    Path(event_id): Path<Uuid>,
) -> Result<Json<EventDetail>, ApiError> {
    let repo = EventRepository::new(state.pool.clone());
    let detail = fetch_detail(&repo, event_id).await?;

    // Unapproved events are reported missing rather than forbidden.
    let actor = user_auth.as_ref().map(UserAuth::actor);
    if !can_view_event(actor.as_ref(), &detail.event) {
        return Err(event_not_found());
    }

    Ok(Json(detail))
}

/// Create an event organized by the caller. It starts pending moderation.
///
/// POST /api/v1/events
pub async fn create_event(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Json(request): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<EventDetail>), ApiError> {
    request.validate()?;

    let repo = EventRepository::new(state.pool.clone());
    let created = repo
        .create(NewEvent {
            title: request.title.trim(),
            description: request.description.as_deref(),
            starts_at: request.starts_at,
            organizer_id: user_auth.user_id,
            location: request.location.trim(),
            capacity: request.capacity,
            category: request.category.into(),
            image_url: request.image_url.as_deref(),
        })
        .await?;

    record_event_created();
    info!(
        event_id = %created.id,
        organizer_id = %user_auth.user_id,
        "Event created"
    );

    let detail = fetch_detail(&repo, created.id).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// Partially update an event.
///
/// PUT /api/v1/events/:event_id
pub async fn update_event(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(event_id): Path<Uuid>,
    Json(request): Json<UpdateEventRequest>,
) -> Result<Json<EventDetail>, ApiError> {
    request.validate()?;
    if request.is_empty() {
        return Err(ApiError::Validation("No fields to update".to_string()));
    }

    let repo = EventRepository::new(state.pool.clone());
    load_managed_event(&repo, &user_auth, event_id).await?;

    match repo.update(event_id, &request).await? {
        EventUpdateOutcome::Updated(_) => {}
        EventUpdateOutcome::NotFound => return Err(event_not_found()),
        EventUpdateOutcome::CapacityBelowRegistrations { registration_count } => {
            return Err(ApiError::Validation(format!(
                "Capacity cannot be lower than the {} registrations already taken",
                registration_count
            )));
        }
    }

    info!(event_id = %event_id, user_id = %user_auth.user_id, "Event updated");
    Ok(Json(fetch_detail(&repo, event_id).await?))
}

/// Approve or reject an event.
///
/// PUT /api/v1/events/:event_id/status
pub async fn moderate_event(
    State(state): State<AppState>,
    AdminAuth(admin): AdminAuth,
    Path(event_id): Path<Uuid>,
    Json(request): Json<ModerateEventRequest>,
) -> Result<Json<EventDetail>, ApiError> {
    let repo = EventRepository::new(state.pool.clone());
    let (_, previous) = repo
        .set_status(event_id, request.status.into())
        .await?
        .ok_or_else(event_not_found)?;
    let previous: EventStatus = previous.into();

    let detail = fetch_detail(&repo, event_id).await?;

    record_event_moderated(request.status.as_str());
    info!(
        event_id = %event_id,
        admin_id = %admin.user_id,
        from = %previous,
        to = %request.status,
        "Event moderated"
    );

    if previous != request.status {
        notifications::notify_moderation(
            &state.email,
            detail.event.clone(),
            detail.organizer.email.clone(),
            detail.organizer.name.clone(),
        );
        if request.status == EventStatus::Approved {
            notifications::announce_event(&state.email, &state.pool, detail.event.clone());
        }
    }

    Ok(Json(detail))
}

/// DELETE /api/v1/events/:event_id
pub async fn delete_event(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(event_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let repo = EventRepository::new(state.pool.clone());
    load_managed_event(&repo, &user_auth, event_id).await?;

    if !repo.delete(event_id).await? {
        return Err(event_not_found());
    }

    info!(event_id = %event_id, user_id = %user_auth.user_id, "Event deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Registrations for one event, newest first.
///
/// GET /api/v1/events/:event_id/registrations
pub async fn list_event_registrations(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(event_id): Path<Uuid>,
    Query(query): Query<ListRegistrationsQuery>,
) -> Result<Json<ListRegistrationsResponse>, ApiError> {
    let events = EventRepository::new(state.pool.clone());
    let event = load_managed_event(&events, &user_auth, event_id).await?;

    let filter = RegistrationFilter {
        status: query.status.map(Into::into),
        event_id: Some(event.id),
        user_id: None,
    };
    let page = query.page_params();
    let registrations = RegistrationRepository::new(state.pool.clone());
    let rows = registrations
        .list(&filter, page.limit(), page.offset())
        .await?;
    let total = registrations.count(&filter).await?;

    Ok(Json(ListRegistrationsResponse {
        data: rows.into_iter().map(RegistrationDetail::from).collect(),
        pagination: page.info(total),
    }))
}
