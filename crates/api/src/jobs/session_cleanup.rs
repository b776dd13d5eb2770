//! Removes refresh-token sessions that can no longer be used.

use persistence::repositories::UserRepository;
use tracing::info;

use super::scheduler::{Job, JobFrequency};

pub struct SessionCleanupJob {
    users: UserRepository,
}

impl SessionCleanupJob {
    pub fn new(users: UserRepository) -> Self {
        Self { users }
    }
}

#[async_trait::async_trait]
impl Job for SessionCleanupJob {
    fn name(&self) -> &'static str {
        "session_cleanup"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Hourly
    }

    async fn execute(&self) -> Result<(), String> {
        let removed = self
            .users
            .delete_expired_sessions()
            .await
            .map_err(|e| format!("Failed to delete expired sessions: {}", e))?;
        if removed > 0 {
            info!(removed, "Expired sessions deleted");
        }
        Ok(())
    }
}
