//! Domain services for campus events.
//!
//! Services contain business rules that operate on domain models.

pub mod access;
pub mod notification;
pub mod seats;

pub use access::Actor;
pub use notification::{
    event_announcement, moderation_decision, registration_status_changed, NotificationContent,
};
pub use seats::{has_room, seat_delta, spots_left};
