//! Platform-wide counters.

use sqlx::PgPool;

use crate::metrics::QueryTimer;

#[derive(Debug, Clone, Copy, sqlx::FromRow)]
pub struct PlatformStatsRow {
    pub total_users: i64,
    pub total_events: i64,
    pub total_registrations: i64,
}

#[derive(Clone)]
pub struct StatsRepository {
    pool: PgPool,
}

impl StatsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Totals across all users, events and registrations.
    pub async fn platform_totals(&self) -> Result<PlatformStatsRow, sqlx::Error> {
        let timer = QueryTimer::new("platform_totals");
        let result = sqlx::query_as::<_, PlatformStatsRow>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM users) AS total_users,
                (SELECT COUNT(*) FROM events) AS total_events,
                (SELECT COUNT(*) FROM registrations) AS total_registrations
            "#,
        )
        .fetch_one(&self.pool)
        .await;
        timer.finish(result)
    }

    /// Events still waiting for an admin decision.
    pub async fn pending_moderation(&self) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("pending_moderation");
        let result = sqlx::query_scalar("SELECT COUNT(*) FROM events WHERE status = 'pending'")
            .fetch_one(&self.pool)
            .await;
        timer.finish(result)
    }
}
