//! Seat accounting for the registration capacity counter.
//!
//! An event's `registration_count` equals the number of its registrations
//! whose status holds a seat. Every status transition adjusts the counter by
//! [`seat_delta`], so the counter and the registrations move in lockstep.

use crate::models::RegistrationStatus;

/// Change to the event counter when a registration moves `from` → `to`.
pub fn seat_delta(from: RegistrationStatus, to: RegistrationStatus) -> i32 {
    match (from.holds_seat(), to.holds_seat()) {
        (false, true) => 1,
        (true, false) => -1,
        _ => 0,
    }
}

/// Seats still available, or `None` for unlimited events.
pub fn spots_left(capacity: Option<i32>, registration_count: i32) -> Option<i32> {
    capacity.map(|c| (c - registration_count).max(0))
}

/// Whether one more seat can be taken.
pub fn has_room(capacity: Option<i32>, registration_count: i32) -> bool {
    match capacity {
        Some(c) => registration_count < c,
        None => true,
    }
}
