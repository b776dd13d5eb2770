//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod event;
pub mod registration;
pub mod user;

pub use event::{EventCategoryDb, EventEntity, EventStatusDb, EventWithOrganizerEntity};
pub use registration::{RegistrationDetailEntity, RegistrationEntity, RegistrationStatusDb};
pub use user::{UserEntity, UserRoleDb, UserSessionEntity};
