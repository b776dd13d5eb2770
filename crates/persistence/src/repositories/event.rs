//! Event repository for database operations.

use chrono::{DateTime, Utc};
use domain::models::UpdateEventRequest;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{EventCategoryDb, EventEntity, EventStatusDb, EventWithOrganizerEntity};
use crate::metrics::QueryTimer;

const EVENT_COLUMNS: &str = "id, title, description, starts_at, organizer_id, location, capacity, \
     category, image_url, status, registration_count, created_at, updated_at";

const EVENT_DETAIL_SELECT: &str = r#"
    SELECT e.id, e.title, e.description, e.starts_at, e.organizer_id, e.location, e.capacity,
           e.category, e.image_url, e.status, e.registration_count, e.created_at, e.updated_at,
           u.name AS organizer_name, u.email AS organizer_email
    FROM events e
    JOIN users u ON u.id = e.organizer_id
"#;

/// Fields for inserting an event. New events always start pending.
#[derive(Debug, Clone)]
pub struct NewEvent<'a> {
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub starts_at: DateTime<Utc>,
    pub organizer_id: Uuid,
    pub location: &'a str,
    pub capacity: Option<i32>,
    pub category: EventCategoryDb,
    pub image_url: Option<&'a str>,
}

/// Filters for event listings. Every field is optional.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub category: Option<EventCategoryDb>,
    pub status: Option<EventStatusDb>,
    pub organizer_id: Option<Uuid>,
    pub starts_after: Option<DateTime<Utc>>,
}

/// Result of an event update.
#[derive(Debug)]
pub enum EventUpdateOutcome {
    Updated(EventEntity),
    NotFound,
    /// The requested capacity is lower than the seats already taken.
    CapacityBelowRegistrations { registration_count: i32 },
}

/// Repository for event-related database operations.
#[derive(Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, event: NewEvent<'_>) -> Result<EventEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_event");
        let result = sqlx::query_as::<_, EventEntity>(&format!(
            r#"
            INSERT INTO events
                (title, description, starts_at, organizer_id, location, capacity, category, image_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(event.title)
        .bind(event.description)
        .bind(event.starts_at)
        .bind(event.organizer_id)
        .bind(event.location)
        .bind(event.capacity)
        .bind(event.category)
        .bind(event.image_url)
        .fetch_one(&self.pool)
        .await;
        timer.finish(result)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<EventEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_event_by_id");
        let result = sqlx::query_as::<_, EventEntity>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(result)
    }

    /// Find an event together with its organizer.
    pub async fn find_detail(
        &self,
        id: Uuid,
    ) -> Result<Option<EventWithOrganizerEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_event_detail");
        let result = sqlx::query_as::<_, EventWithOrganizerEntity>(&format!(
            "{EVENT_DETAIL_SELECT} WHERE e.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(result)
    }

    /// List events in start order, soonest first.
    pub async fn list(
        &self,
        filter: &EventFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<EventWithOrganizerEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_events");
        let result = sqlx::query_as::<_, EventWithOrganizerEntity>(&format!(
            r#"
            {EVENT_DETAIL_SELECT}
            WHERE ($1::event_category IS NULL OR e.category = $1)
              AND ($2::event_status IS NULL OR e.status = $2)
              AND ($3::uuid IS NULL OR e.organizer_id = $3)
              AND ($4::timestamptz IS NULL OR e.starts_at >= $4)
            ORDER BY e.starts_at ASC, e.id
            LIMIT $5 OFFSET $6
            "#
        ))
        .bind(filter.category)
        .bind(filter.status)
        .bind(filter.organizer_id)
        .bind(filter.starts_after)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await;
        timer.finish(result)
    }

    pub async fn count(&self, filter: &EventFilter) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_events");
        let count: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM events e
            WHERE ($1::event_category IS NULL OR e.category = $1)
              AND ($2::event_status IS NULL OR e.status = $2)
              AND ($3::uuid IS NULL OR e.organizer_id = $3)
              AND ($4::timestamptz IS NULL OR e.starts_at >= $4)
            "#,
        )
        .bind(filter.category)
        .bind(filter.status)
        .bind(filter.organizer_id)
        .bind(filter.starts_after)
        .fetch_one(&self.pool)
        .await?;
        timer.record();
        Ok(count.0)
    }

    /// Apply a partial update under a row lock so the capacity check sees
    /// the current seat count.
    pub async fn update(
        &self,
        id: Uuid,
        changes: &UpdateEventRequest,
    ) -> Result<EventUpdateOutcome, sqlx::Error> {
        let timer = QueryTimer::new("update_event");
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, EventEntity>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(current) = current else {
            timer.record();
            return Ok(EventUpdateOutcome::NotFound);
        };

        let capacity = match changes.capacity {
            Some(capacity) => capacity,
            None => current.capacity,
        };
        if let Some(capacity) = capacity {
            if capacity < current.registration_count {
                timer.record();
                return Ok(EventUpdateOutcome::CapacityBelowRegistrations {
                    registration_count: current.registration_count,
                });
            }
        }

        let description = match &changes.description {
            Some(description) => description.clone(),
            None => current.description,
        };
        let image_url = match &changes.image_url {
            Some(image_url) => image_url.clone(),
            None => current.image_url,
        };
        let category: EventCategoryDb = changes
            .category
            .map(Into::into)
            .unwrap_or(current.category);

        let updated = sqlx::query_as::<_, EventEntity>(&format!(
            r#"
            UPDATE events
            SET title = $2,
                description = $3,
                starts_at = $4,
                location = $5,
                capacity = $6,
                category = $7,
                image_url = $8,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(changes.title.as_deref().map(str::trim).unwrap_or(&current.title))
        .bind(description)
        .bind(changes.starts_at.unwrap_or(current.starts_at))
        .bind(changes.location.as_deref().map(str::trim).unwrap_or(&current.location))
        .bind(capacity)
        .bind(category)
        .bind(image_url)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();
        Ok(EventUpdateOutcome::Updated(updated))
    }

    /// Set the moderation status. Returns the updated row and the status it
    /// had before, or `None` when the event does not exist.
    pub async fn set_status(
        &self,
        id: Uuid,
        status: EventStatusDb,
    ) -> Result<Option<(EventEntity, EventStatusDb)>, sqlx::Error> {
        let timer = QueryTimer::new("set_event_status");
        let mut tx = self.pool.begin().await?;

        let previous: Option<(EventStatusDb,)> =
            sqlx::query_as("SELECT status FROM events WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        let Some((previous,)) = previous else {
            timer.record();
            return Ok(None);
        };

        let updated = sqlx::query_as::<_, EventEntity>(&format!(
            r#"
            UPDATE events SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(status)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();
        Ok(Some((updated, previous)))
    }

    /// Delete an event and, by cascade, its registrations.
    pub async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("delete_event");
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        timer.record();
        Ok(result.rows_affected() > 0)
    }
}
