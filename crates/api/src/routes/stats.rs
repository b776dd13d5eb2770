//! Platform statistics.

use axum::{extract::State, Json};
use domain::models::PlatformStats;
use persistence::repositories::StatsRepository;

use crate::app::AppState;
use crate::error::ApiError;

/// Totals shown on the landing page.
///
/// GET /api/v1/stats
pub async fn get_stats(State(state): State<AppState>) -> Result<Json<PlatformStats>, ApiError> {
    let row = StatsRepository::new(state.pool.clone())
        .platform_totals()
        .await?;

    Ok(Json(PlatformStats {
        total_users: row.total_users,
        total_events: row.total_events,
        total_registrations: row.total_registrations,
    }))
}
