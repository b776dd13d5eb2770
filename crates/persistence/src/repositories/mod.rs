//! Repository implementations for database operations.

pub mod event;
pub mod registration;
pub mod stats;
pub mod user;

pub use event::{EventFilter, EventRepository, EventUpdateOutcome, NewEvent};
pub use registration::{RegistrationFilter, RegistrationRepository};
pub use stats::{PlatformStatsRow, StatsRepository};
pub use user::{NewUser, UserChanges, UserRepository};
