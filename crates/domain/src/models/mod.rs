//! Domain models for campus events.

pub mod auth;
pub mod event;
pub mod registration;
pub mod stats;
pub mod user;

pub use auth::{AuthResponse, AuthTokens};
pub use event::{
    Event, EventCategory, EventDetail, EventStatus, EventSummary, UpdateEventRequest,
};
pub use registration::{
    Registration, RegistrationDetail, RegistrationStatus, ReserveOutcome, StatusChangeOutcome,
};
pub use stats::PlatformStats;
pub use user::{User, UserRole, UserSummary};

use serde::{Deserialize, Deserializer};

/// Deserializes a present field into `Some`, so that combined with
/// `#[serde(default)]` an `Option<Option<T>>` distinguishes a missing field
/// (`None`) from an explicit `null` (`Some(None)`).
pub(crate) fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}
