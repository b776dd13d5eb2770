//! Event domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::deserialize_some;
use super::user::UserSummary;
use crate::services::seats;

/// Faculty category an event belongs to.
///
/// The department labels used by the campus front end are accepted as input
/// aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    #[serde(alias = "Inxh.Kompjuterike")]
    ComputerEngineering,
    #[serde(alias = "Inxh.Mekanike")]
    MechanicalEngineering,
}

impl EventCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventCategory::ComputerEngineering => "computer_engineering",
            EventCategory::MechanicalEngineering => "mechanical_engineering",
        }
    }

    /// Human-readable department name.
    pub fn display_name(&self) -> &'static str {
        match self {
            EventCategory::ComputerEngineering => "Computer Engineering",
            EventCategory::MechanicalEngineering => "Mechanical Engineering",
        }
    }
}

impl FromStr for EventCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "computer_engineering" | "Inxh.Kompjuterike" => Ok(EventCategory::ComputerEngineering),
            "mechanical_engineering" | "Inxh.Mekanike" => Ok(EventCategory::MechanicalEngineering),
            _ => Err(format!("Invalid event category: {}", s)),
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Moderation status of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Pending => "pending",
            EventStatus::Approved => "approved",
            EventStatus::Rejected => "rejected",
        }
    }

    /// Approved events are listed publicly and accept registrations.
    pub fn is_public(&self) -> bool {
        matches!(self, EventStatus::Approved)
    }
}

impl FromStr for EventStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(EventStatus::Pending),
            "approved" => Ok(EventStatus::Approved),
            "rejected" => Ok(EventStatus::Rejected),
            _ => Err(format!("Invalid event status: {}", s)),
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A campus event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "date")]
    pub starts_at: DateTime<Utc>,
    pub organizer_id: Uuid,
    pub location: String,
    /// `None` means unlimited.
    pub capacity: Option<i32>,
    pub category: EventCategory,
    pub image_url: Option<String>,
    pub status: EventStatus,
    /// Number of registrations currently holding a seat.
    pub registration_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    pub fn spots_left(&self) -> Option<i32> {
        seats::spots_left(self.capacity, self.registration_count)
    }

    pub fn is_full(&self) -> bool {
        !seats::has_room(self.capacity, self.registration_count)
    }

    pub fn summary(&self) -> EventSummary {
        EventSummary {
            id: self.id,
            title: self.title.clone(),
            starts_at: self.starts_at,
            location: self.location.clone(),
            status: self.status,
        }
    }
}

/// Event with its organizer, as returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct EventDetail {
    #[serde(flatten)]
    pub event: Event,
    pub organizer: UserSummary,
    pub spots_left: Option<i32>,
}

impl EventDetail {
    pub fn new(event: Event, organizer: UserSummary) -> Self {
        let spots_left = event.spots_left();
        Self {
            event,
            organizer,
            spots_left,
        }
    }
}

/// Minimal event view embedded in registration payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSummary {
    pub id: Uuid,
    pub title: String,
    #[serde(rename = "date")]
    pub starts_at: DateTime<Utc>,
    pub location: String,
    pub status: EventStatus,
}

/// Request payload for creating an event.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateEventRequest {
    #[validate(
        length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"),
        custom(function = "shared::validation::validate_not_blank")
    )]
    pub title: String,

    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: Option<String>,

    #[serde(rename = "date")]
    pub starts_at: DateTime<Utc>,

    #[validate(
        length(min = 1, max = 300, message = "Location must be between 1 and 300 characters"),
        custom(function = "shared::validation::validate_not_blank")
    )]
    pub location: String,

    #[validate(custom(function = "shared::validation::validate_capacity"))]
    pub capacity: Option<i32>,

    pub category: EventCategory,

    #[validate(url(message = "Image URL must be a valid URL"))]
    pub image_url: Option<String>,
}

/// Request payload for editing an event.
///
/// Absent fields are left unchanged. For `description`, `capacity` and
/// `image_url` an explicit `null` clears the value; a cleared capacity means
/// unlimited seats. Moderation status is not editable here.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[validate(schema(function = "validate_update_event"))]
pub struct UpdateEventRequest {
    #[validate(
        length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"),
        custom(function = "shared::validation::validate_not_blank")
    )]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "deserialize_some")]
    pub description: Option<Option<String>>,

    #[serde(rename = "date")]
    pub starts_at: Option<DateTime<Utc>>,

    #[validate(
        length(min = 1, max = 300, message = "Location must be between 1 and 300 characters"),
        custom(function = "shared::validation::validate_not_blank")
    )]
    pub location: Option<String>,

    #[serde(default, deserialize_with = "deserialize_some")]
    pub capacity: Option<Option<i32>>,

    pub category: Option<EventCategory>,

    #[serde(default, deserialize_with = "deserialize_some")]
    pub image_url: Option<Option<String>>,
}

impl UpdateEventRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.starts_at.is_none()
            && self.location.is_none()
            && self.capacity.is_none()
            && self.category.is_none()
            && self.image_url.is_none()
    }
}

fn validate_update_event(req: &UpdateEventRequest) -> Result<(), ValidationError> {
    if let Some(Some(capacity)) = req.capacity {
        shared::validation::validate_capacity(capacity)?;
    }
    if let Some(Some(description)) = &req.description {
        if description.chars().count() > 5000 {
            let mut err = ValidationError::new("length");
            err.message = Some("Description must be at most 5000 characters".into());
            return Err(err);
        }
    }
    if let Some(Some(url)) = &req.image_url {
        if !validator::ValidateUrl::validate_url(url) {
            let mut err = ValidationError::new("url");
            err.message = Some("Image URL must be a valid URL".into());
            return Err(err);
        }
    }
    Ok(())
}

/// Request payload for moderating an event.
#[derive(Debug, Clone, Deserialize)]
pub struct ModerateEventRequest {
    pub status: EventStatus,
}

/// Query parameters for listing events.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListEventsQuery {
    pub category: Option<EventCategory>,
    /// Only honored for admins; everyone else sees approved events.
    pub status: Option<EventStatus>,
    pub organizer_id: Option<Uuid>,
    /// When true, only events that have not started yet.
    pub upcoming: Option<bool>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ListEventsQuery {
    pub fn page_params(&self) -> shared::pagination::PageParams {
        shared::pagination::PageParams {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

/// Paginated event listing.
#[derive(Debug, Clone, Serialize)]
pub struct ListEventsResponse {
    pub data: Vec<EventDetail>,
    pub pagination: shared::pagination::PageInfo,
}
