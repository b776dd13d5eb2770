//! Periodic gauges: connection pool usage and platform totals.

use metrics::gauge;
use persistence::repositories::StatsRepository;
use sqlx::PgPool;

use super::scheduler::{Job, JobFrequency};

/// Refreshes gauges that would otherwise only move on a `/metrics` scrape
/// or never move at all (row totals, the moderation backlog).
pub struct GaugeSnapshotJob {
    pool: PgPool,
    stats: StatsRepository,
}

impl GaugeSnapshotJob {
    pub fn new(pool: PgPool) -> Self {
        Self {
            stats: StatsRepository::new(pool.clone()),
            pool,
        }
    }
}

#[async_trait::async_trait]
impl Job for GaugeSnapshotJob {
    fn name(&self) -> &'static str {
        "gauge_snapshot"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Seconds(30)
    }

    async fn execute(&self) -> Result<(), String> {
        persistence::metrics::record_pool_metrics(&self.pool);

        let totals = self
            .stats
            .platform_totals()
            .await
            .map_err(|e| format!("Failed to read platform totals: {}", e))?;
        let pending = self
            .stats
            .pending_moderation()
            .await
            .map_err(|e| format!("Failed to count pending events: {}", e))?;

        gauge!("campus_users").set(totals.total_users as f64);
        gauge!("campus_events").set(totals.total_events as f64);
        gauge!("campus_registrations").set(totals.total_registrations as f64);
        gauge!("campus_events_pending_moderation").set(pending as f64);
        Ok(())
    }
}
