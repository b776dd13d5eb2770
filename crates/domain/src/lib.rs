//! Domain layer for the campus events backend.
//!
//! This crate contains:
//! - Domain models (User, Event, Registration) and their request DTOs
//! - Access rules for organizers, registrants and admins
//! - Seat accounting for the registration capacity counter
//! - Notification message content

pub mod models;
pub mod services;
