//! Registration domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::event::{EventStatus, EventSummary};
use super::user::UserSummary;

/// Lifecycle status of a registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    #[default]
    Pending,
    Confirmed,
    Cancelled,
}

impl RegistrationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationStatus::Pending => "pending",
            RegistrationStatus::Confirmed => "confirmed",
            RegistrationStatus::Cancelled => "cancelled",
        }
    }

    /// Whether a registration in this status occupies one of the event's seats.
    pub fn holds_seat(&self) -> bool {
        !matches!(self, RegistrationStatus::Cancelled)
    }
}

impl FromStr for RegistrationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(RegistrationStatus::Pending),
            "confirmed" => Ok(RegistrationStatus::Confirmed),
            "cancelled" | "canceled" => Ok(RegistrationStatus::Cancelled),
            _ => Err(format!("Invalid registration status: {}", s)),
        }
    }
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A user's registration for an event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub status: RegistrationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Registration with the registrant and event, as returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct RegistrationDetail {
    #[serde(flatten)]
    pub registration: Registration,
    pub user: UserSummary,
    pub event: EventSummary,
}

/// Result of trying to take a seat at an event.
#[derive(Debug, Clone)]
pub enum ReserveOutcome {
    /// A new registration was created.
    Created(Registration),
    /// A previously cancelled registration was made pending again.
    Reactivated(Registration),
    /// The user already holds a pending or confirmed registration.
    AlreadyRegistered(Registration),
    /// No seats left.
    EventFull,
    EventNotFound,
    /// The event exists but is not open for registration.
    EventNotOpen(EventStatus),
}

/// Result of moving a registration to another status.
#[derive(Debug, Clone)]
pub enum StatusChangeOutcome {
    Updated {
        registration: Registration,
        previous: RegistrationStatus,
    },
    NotFound,
    /// Reactivating the registration would exceed the event's capacity.
    EventFull,
}

/// Request payload for registering to an event.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateRegistrationRequest {
    pub event_id: Uuid,
}

/// Request payload for changing a registration's status.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateRegistrationStatusRequest {
    pub status: RegistrationStatus,
}

/// Query parameters for listing registrations.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListRegistrationsQuery {
    pub status: Option<RegistrationStatus>,
    pub event_id: Option<Uuid>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ListRegistrationsQuery {
    pub fn page_params(&self) -> shared::pagination::PageParams {
        shared::pagination::PageParams {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

/// Paginated registration listing.
#[derive(Debug, Clone, Serialize)]
pub struct ListRegistrationsResponse {
    pub data: Vec<RegistrationDetail>,
    pub pagination: shared::pagination::PageInfo,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_holds_seat() {
        assert!(RegistrationStatus::Pending.holds_seat());
        assert!(RegistrationStatus::Confirmed.holds_seat());
        assert!(!RegistrationStatus::Cancelled.holds_seat());
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!(
            "CONFIRMED".parse::<RegistrationStatus>().unwrap(),
            RegistrationStatus::Confirmed
        );
        assert_eq!(
            "canceled".parse::<RegistrationStatus>().unwrap(),
            RegistrationStatus::Cancelled
        );
        assert!("waitlisted".parse::<RegistrationStatus>().is_err());
    }

    #[test]
    fn test_status_request_deserialization() {
        let req: UpdateRegistrationStatusRequest =
            serde_json::from_str(r#"{"status":"cancelled"}"#).unwrap();
        assert_eq!(req.status, RegistrationStatus::Cancelled);

        assert!(serde_json::from_str::<UpdateRegistrationStatusRequest>(r#"{"status":"gone"}"#)
            .is_err());
    }

    #[test]
    fn test_detail_flattens_registration() {
        let registration = Registration {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            event_id: Uuid::new_v4(),
            status: RegistrationStatus::Pending,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let detail = RegistrationDetail {
            user: UserSummary {
                id: registration.user_id,
                name: "Student".to_string(),
                email: "student@umib.net".to_string(),
            },
            event: EventSummary {
                id: registration.event_id,
                title: "Career Fair".to_string(),
                starts_at: Utc::now(),
                location: "Main Hall".to_string(),
                status: EventStatus::Approved,
            },
            registration,
        };

        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["status"], "pending");
        assert_eq!(json["user"]["email"], "student@umib.net");
        assert_eq!(json["event"]["title"], "Career Fair");
    }
}
