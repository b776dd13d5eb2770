//! HTTP route handlers.

pub mod auth;
pub mod events;
pub mod health;
pub mod registrations;
pub mod stats;
pub mod uploads;
pub mod users;
