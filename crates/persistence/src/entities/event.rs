//! Event entities (database row mappings).

use chrono::{DateTime, Utc};
use domain::models::{Event, EventCategory, EventDetail, EventStatus, UserSummary};
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for event categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "event_category", rename_all = "snake_case")]
pub enum EventCategoryDb {
    ComputerEngineering,
    MechanicalEngineering,
}

impl From<EventCategoryDb> for EventCategory {
    fn from(db: EventCategoryDb) -> Self {
        match db {
            EventCategoryDb::ComputerEngineering => EventCategory::ComputerEngineering,
            EventCategoryDb::MechanicalEngineering => EventCategory::MechanicalEngineering,
        }
    }
}

impl From<EventCategory> for EventCategoryDb {
    fn from(category: EventCategory) -> Self {
        match category {
            EventCategory::ComputerEngineering => EventCategoryDb::ComputerEngineering,
            EventCategory::MechanicalEngineering => EventCategoryDb::MechanicalEngineering,
        }
    }
}

/// Database enum for event moderation status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "event_status", rename_all = "lowercase")]
pub enum EventStatusDb {
    Pending,
    Approved,
    Rejected,
}

impl From<EventStatusDb> for EventStatus {
    fn from(db: EventStatusDb) -> Self {
        match db {
            EventStatusDb::Pending => EventStatus::Pending,
            EventStatusDb::Approved => EventStatus::Approved,
            EventStatusDb::Rejected => EventStatus::Rejected,
        }
    }
}

impl From<EventStatus> for EventStatusDb {
    fn from(status: EventStatus) -> Self {
        match status {
            EventStatus::Pending => EventStatusDb::Pending,
            EventStatus::Approved => EventStatusDb::Approved,
            EventStatus::Rejected => EventStatusDb::Rejected,
        }
    }
}

/// Database row mapping for the events table.
#[derive(Debug, Clone, FromRow)]
pub struct EventEntity {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub organizer_id: Uuid,
    pub location: String,
    pub capacity: Option<i32>,
    pub category: EventCategoryDb,
    pub image_url: Option<String>,
    pub status: EventStatusDb,
    pub registration_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<EventEntity> for Event {
    fn from(entity: EventEntity) -> Self {
        Self {
            id: entity.id,
            title: entity.title,
            description: entity.description,
            starts_at: entity.starts_at,
            organizer_id: entity.organizer_id,
            location: entity.location,
            capacity: entity.capacity,
            category: entity.category.into(),
            image_url: entity.image_url,
            status: entity.status.into(),
            registration_count: entity.registration_count,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// Event row joined with its organizer's name and email.
#[derive(Debug, Clone, FromRow)]
pub struct EventWithOrganizerEntity {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub organizer_id: Uuid,
    pub location: String,
    pub capacity: Option<i32>,
    pub category: EventCategoryDb,
    pub image_url: Option<String>,
    pub status: EventStatusDb,
    pub registration_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub organizer_name: String,
    pub organizer_email: String,
}

impl From<EventWithOrganizerEntity> for EventDetail {
    fn from(row: EventWithOrganizerEntity) -> Self {
        let organizer = UserSummary {
            id: row.organizer_id,
            name: row.organizer_name,
            email: row.organizer_email,
        };
        let event = Event {
            id: row.id,
            title: row.title,
            description: row.description,
            starts_at: row.starts_at,
            organizer_id: row.organizer_id,
            location: row.location,
            capacity: row.capacity,
            category: row.category.into(),
            image_url: row.image_url,
            status: row.status.into(),
            registration_count: row.registration_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        };
        EventDetail::new(event, organizer)
    }
}
