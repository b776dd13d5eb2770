//! Registration entities (database row mappings).

use chrono::{DateTime, Utc};
use domain::models::{
    EventSummary, Registration, RegistrationDetail, RegistrationStatus, UserSummary,
};
use sqlx::FromRow;
use uuid::Uuid;

use super::event::EventStatusDb;

/// Database enum for registration status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "registration_status", rename_all = "lowercase")]
pub enum RegistrationStatusDb {
    Pending,
    Confirmed,
    Cancelled,
}

impl From<RegistrationStatusDb> for RegistrationStatus {
    fn from(db: RegistrationStatusDb) -> Self {
        match db {
            RegistrationStatusDb::Pending => RegistrationStatus::Pending,
            RegistrationStatusDb::Confirmed => RegistrationStatus::Confirmed,
            RegistrationStatusDb::Cancelled => RegistrationStatus::Cancelled,
        }
    }
}

impl From<RegistrationStatus> for RegistrationStatusDb {
    fn from(status: RegistrationStatus) -> Self {
        match status {
            RegistrationStatus::Pending => RegistrationStatusDb::Pending,
            RegistrationStatus::Confirmed => RegistrationStatusDb::Confirmed,
            RegistrationStatus::Cancelled => RegistrationStatusDb::Cancelled,
        }
    }
}

/// Database row mapping for the registrations table.
#[derive(Debug, Clone, FromRow)]
pub struct RegistrationEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub status: RegistrationStatusDb,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<RegistrationEntity> for Registration {
    fn from(entity: RegistrationEntity) -> Self {
        Self {
            id: entity.id,
            user_id: entity.user_id,
            event_id: entity.event_id,
            status: entity.status.into(),
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// Registration row joined with the registrant and the event.
#[derive(Debug, Clone, FromRow)]
pub struct RegistrationDetailEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub status: RegistrationStatusDb,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user_name: String,
    pub user_email: String,
    pub event_title: String,
    pub event_starts_at: DateTime<Utc>,
    pub event_location: String,
    pub event_status: EventStatusDb,
}

impl From<RegistrationDetailEntity> for RegistrationDetail {
    fn from(row: RegistrationDetailEntity) -> Self {
        Self {
            user: UserSummary {
                id: row.user_id,
                name: row.user_name,
                email: row.user_email,
            },
            event: EventSummary {
                id: row.event_id,
                title: row.event_title,
                starts_at: row.event_starts_at,
                location: row.event_location,
                status: row.event_status.into(),
            },
            registration: Registration {
                id: row.id,
                user_id: row.user_id,
                event_id: row.event_id,
                status: row.status.into(),
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_conversion() {
        for status in [
            RegistrationStatus::Pending,
            RegistrationStatus::Confirmed,
            RegistrationStatus::Cancelled,
        ] {
            let db: RegistrationStatusDb = status.into();
            assert_eq!(RegistrationStatus::from(db), status);
        }
    }

    #[test]
    fn test_detail_conversion() {
        let row = RegistrationDetailEntity {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            event_id: Uuid::new_v4(),
            status: RegistrationStatusDb::Confirmed,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            user_name: "Ardit".to_string(),
            user_email: "ardit@umib.net".to_string(),
            event_title: "CAD Bootcamp".to_string(),
            event_starts_at: Utc::now(),
            event_location: "Lab M2".to_string(),
            event_status: EventStatusDb::Approved,
        };
        let user_id = row.user_id;

        let detail: RegistrationDetail = row.into();
        assert_eq!(detail.user.id, user_id);
        assert_eq!(detail.registration.user_id, user_id);
        assert_eq!(detail.registration.status, RegistrationStatus::Confirmed);
        assert_eq!(detail.event.title, "CAD Bootcamp");
    }
}
