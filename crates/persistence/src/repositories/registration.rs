//! Registration repository.
//!
//! Every write that changes whether a registration holds a seat adjusts
//! `events.registration_count` in the same transaction. Locks are always taken
//! event first, registration second, so concurrent writers queue on the event
//! row and cannot deadlock each other.

use domain::models::{RegistrationStatus, ReserveOutcome, StatusChangeOutcome};
use domain::services::{has_room, seat_delta};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::entities::{
    EventStatusDb, RegistrationDetailEntity, RegistrationEntity, RegistrationStatusDb,
};
use crate::metrics::QueryTimer;

const REGISTRATION_COLUMNS: &str = "id, user_id, event_id, status, created_at, updated_at";

const REGISTRATION_DETAIL_SELECT: &str = r#"
    SELECT r.id, r.user_id, r.event_id, r.status, r.created_at, r.updated_at,
           u.name AS user_name, u.email AS user_email,
           e.title AS event_title, e.starts_at AS event_starts_at,
           e.location AS event_location, e.status AS event_status
    FROM registrations r
    JOIN users u ON u.id = r.user_id
    JOIN events e ON e.id = r.event_id
"#;

/// Filters for registration listings.
#[derive(Debug, Clone, Default)]
pub struct RegistrationFilter {
    pub status: Option<RegistrationStatusDb>,
    pub event_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
}

/// Seat counter snapshot of a locked event row.
#[derive(Debug, sqlx::FromRow)]
struct EventSeats {
    status: EventStatusDb,
    capacity: Option<i32>,
    registration_count: i32,
}

/// Repository for registrations and the seat counter they drive.
#[derive(Clone)]
pub struct RegistrationRepository {
    pool: PgPool,
}

impl RegistrationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Take a seat at an event for a user.
    ///
    /// A cancelled registration for the same pair is reactivated as pending
    /// instead of inserting a second row.
    pub async fn register(
        &self,
        user_id: Uuid,
        event_id: Uuid,
    ) -> Result<ReserveOutcome, sqlx::Error> {
        let timer = QueryTimer::new("register_for_event");
        let mut tx = self.pool.begin().await?;

        let Some(seats) = lock_event(&mut tx, event_id).await? else {
            timer.record();
            return Ok(ReserveOutcome::EventNotFound);
        };
        if seats.status != EventStatusDb::Approved {
            timer.record();
            return Ok(ReserveOutcome::EventNotOpen(seats.status.into()));
        }

        let existing = sqlx::query_as::<_, RegistrationEntity>(&format!(
            r#"
            SELECT {REGISTRATION_COLUMNS} FROM registrations
            WHERE user_id = $1 AND event_id = $2
            FOR UPDATE
            "#
        ))
        .bind(user_id)
        .bind(event_id)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(existing) = &existing {
            let status: RegistrationStatus = existing.status.into();
            if status.holds_seat() {
                timer.record();
                return Ok(ReserveOutcome::AlreadyRegistered(existing.clone().into()));
            }
        }

        if !has_room(seats.capacity, seats.registration_count)
            || !adjust_seats(&mut tx, event_id, 1).await?
        {
            timer.record();
            return Ok(ReserveOutcome::EventFull);
        }

        let outcome = match existing {
            Some(cancelled) => {
                let row = sqlx::query_as::<_, RegistrationEntity>(&format!(
                    r#"
                    UPDATE registrations SET status = 'pending', updated_at = NOW()
                    WHERE id = $1
                    RETURNING {REGISTRATION_COLUMNS}
                    "#
                ))
                .bind(cancelled.id)
                .fetch_one(&mut *tx)
                .await?;
                ReserveOutcome::Reactivated(row.into())
            }
            None => {
                let row = sqlx::query_as::<_, RegistrationEntity>(&format!(
                    r#"
                    INSERT INTO registrations (user_id, event_id, status)
                    VALUES ($1, $2, 'pending')
                    RETURNING {REGISTRATION_COLUMNS}
                    "#
                ))
                .bind(user_id)
                .bind(event_id)
                .fetch_one(&mut *tx)
                .await?;
                ReserveOutcome::Created(row.into())
            }
        };

        tx.commit().await?;
        timer.record();
        Ok(outcome)
    }

    /// Move a registration to `status`, keeping the event counter in step.
    pub async fn change_status(
        &self,
        registration_id: Uuid,
        status: RegistrationStatus,
    ) -> Result<StatusChangeOutcome, sqlx::Error> {
        let timer = QueryTimer::new("change_registration_status");
        let mut tx = self.pool.begin().await?;

        let Some((current, Some(seats))) = lock_registration(&mut tx, registration_id).await?
        else {
            timer.record();
            return Ok(StatusChangeOutcome::NotFound);
        };

        let previous: RegistrationStatus = current.status.into();
        let delta = seat_delta(previous, status);
        if delta > 0 && !has_room(seats.capacity, seats.registration_count) {
            timer.record();
            return Ok(StatusChangeOutcome::EventFull);
        }
        if delta != 0 && !adjust_seats(&mut tx, current.event_id, delta).await? {
            timer.record();
            return Ok(StatusChangeOutcome::EventFull);
        }

        let updated = sqlx::query_as::<_, RegistrationEntity>(&format!(
            r#"
            UPDATE registrations SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {REGISTRATION_COLUMNS}
            "#
        ))
        .bind(registration_id)
        .bind(RegistrationStatusDb::from(status))
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();
        Ok(StatusChangeOutcome::Updated {
            registration: updated.into(),
            previous,
        })
    }

    /// Delete a registration, releasing its seat if it held one.
    /// Returns the deleted row.
    pub async fn withdraw(
        &self,
        registration_id: Uuid,
    ) -> Result<Option<RegistrationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("withdraw_registration");
        let mut tx = self.pool.begin().await?;

        let Some((current, _)) = lock_registration(&mut tx, registration_id).await? else {
            timer.record();
            return Ok(None);
        };

        sqlx::query("DELETE FROM registrations WHERE id = $1")
            .bind(registration_id)
            .execute(&mut *tx)
            .await?;

        let status: RegistrationStatus = current.status.into();
        if status.holds_seat() {
            adjust_seats(&mut tx, current.event_id, -1).await?;
        }

        tx.commit().await?;
        timer.record();
        Ok(Some(current))
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<RegistrationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_registration_by_id");
        let result = sqlx::query_as::<_, RegistrationEntity>(&format!(
            "SELECT {REGISTRATION_COLUMNS} FROM registrations WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(result)
    }

    /// Find a registration joined with its registrant and event.
    pub async fn find_detail(
        &self,
        id: Uuid,
    ) -> Result<Option<RegistrationDetailEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_registration_detail");
        let result = sqlx::query_as::<_, RegistrationDetailEntity>(&format!(
            "{REGISTRATION_DETAIL_SELECT} WHERE r.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(result)
    }

    /// List registrations, newest first.
    pub async fn list(
        &self,
        filter: &RegistrationFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<RegistrationDetailEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_registrations");
        let result = sqlx::query_as::<_, RegistrationDetailEntity>(&format!(
            r#"
            {REGISTRATION_DETAIL_SELECT}
            WHERE ($1::registration_status IS NULL OR r.status = $1)
              AND ($2::uuid IS NULL OR r.event_id = $2)
              AND ($3::uuid IS NULL OR r.user_id = $3)
            ORDER BY r.created_at DESC, r.id
            LIMIT $4 OFFSET $5
            "#
        ))
        .bind(filter.status)
        .bind(filter.event_id)
        .bind(filter.user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await;
        timer.finish(result)
    }

    pub async fn count(&self, filter: &RegistrationFilter) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_registrations");
        let count: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM registrations r
            WHERE ($1::registration_status IS NULL OR r.status = $1)
              AND ($2::uuid IS NULL OR r.event_id = $2)
              AND ($3::uuid IS NULL OR r.user_id = $3)
            "#,
        )
        .bind(filter.status)
        .bind(filter.event_id)
        .bind(filter.user_id)
        .fetch_one(&self.pool)
        .await?;
        timer.record();
        Ok(count.0)
    }
}

async fn lock_event(
    tx: &mut Transaction<'_, Postgres>,
    event_id: Uuid,
) -> Result<Option<EventSeats>, sqlx::Error> {
    sqlx::query_as::<_, EventSeats>(
        "SELECT status, capacity, registration_count FROM events WHERE id = $1 FOR UPDATE",
    )
    .bind(event_id)
    .fetch_optional(&mut **tx)
    .await
}

/// Lock the registration's event row, then the registration row itself.
async fn lock_registration(
    tx: &mut Transaction<'_, Postgres>,
    registration_id: Uuid,
) -> Result<Option<(RegistrationEntity, Option<EventSeats>)>, sqlx::Error> {
    let event_id: Option<(Uuid,)> =
        sqlx::query_as("SELECT event_id FROM registrations WHERE id = $1")
            .bind(registration_id)
            .fetch_optional(&mut **tx)
            .await?;
    let Some((event_id,)) = event_id else {
        return Ok(None);
    };

    let seats = lock_event(tx, event_id).await?;

    let registration = sqlx::query_as::<_, RegistrationEntity>(&format!(
        "SELECT {REGISTRATION_COLUMNS} FROM registrations WHERE id = $1 FOR UPDATE"
    ))
    .bind(registration_id)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(registration.map(|r| (r, seats)))
}

/// Move the event counter by `delta`. Increments only apply while the event
/// has room; returns whether the counter moved.
async fn adjust_seats(
    tx: &mut Transaction<'_, Postgres>,
    event_id: Uuid,
    delta: i32,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE events
        SET registration_count = registration_count + $2, updated_at = NOW()
        WHERE id = $1
          AND ($2 <= 0 OR capacity IS NULL OR registration_count < capacity)
        "#,
    )
    .bind(event_id)
    .bind(delta)
    .execute(&mut **tx)
    .await?;
    Ok(result.rows_affected() > 0)
}
