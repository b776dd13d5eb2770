//! Platform-wide counters.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformStats {
    pub total_users: i64,
    pub total_events: i64,
    pub total_registrations: i64,
}
