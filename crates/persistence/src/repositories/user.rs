//! User repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{UserEntity, UserRoleDb, UserSessionEntity};
use crate::metrics::QueryTimer;

const USER_COLUMNS: &str = "id, name, email, password_hash, role, google_id, created_at, updated_at";

/// Fields for inserting a user. The email must already be normalized.
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub role: UserRoleDb,
}

/// Partial update of a user row; `None` leaves the column unchanged.
#[derive(Debug, Clone, Default)]
pub struct UserChanges<'a> {
    pub name: Option<&'a str>,
    pub email: Option<&'a str>,
    pub role: Option<UserRoleDb>,
    pub password_hash: Option<&'a str>,
}

/// Repository for user-related database operations.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Creates a new UserRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_by_id");
        let result = sqlx::query_as::<_, UserEntity>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(result)
    }

    /// Find a user by email address, ignoring case.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_by_email");
        let result = sqlx::query_as::<_, UserEntity>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(result)
    }

    /// List users, newest first, optionally filtered by role.
    pub async fn list(
        &self,
        role: Option<UserRoleDb>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_users");
        let result = sqlx::query_as::<_, UserEntity>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE ($1::user_role IS NULL OR role = $1)
            ORDER BY created_at DESC, id
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(role)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await;
        timer.finish(result)
    }

    /// Count users, optionally filtered by role.
    pub async fn count(&self, role: Option<UserRoleDb>) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_users");
        let count: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM users
            WHERE ($1::user_role IS NULL OR role = $1)
            "#,
        )
        .bind(role)
        .fetch_one(&self.pool)
        .await?;
        timer.record();
        Ok(count.0)
    }

    /// List all administrator accounts.
    pub async fn list_admins(&self) -> Result<Vec<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_admins");
        let result = sqlx::query_as::<_, UserEntity>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE role = 'admin' ORDER BY created_at"
        ))
        .fetch_all(&self.pool)
        .await;
        timer.finish(result)
    }

    /// Every non-admin account, used as the audience for event announcements.
    pub async fn list_announcement_recipients(&self) -> Result<Vec<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_announcement_recipients");
        let result = sqlx::query_as::<_, UserEntity>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE role <> 'admin' ORDER BY created_at"
        ))
        .fetch_all(&self.pool)
        .await;
        timer.finish(result)
    }

    /// Create a new user account.
    pub async fn create(&self, user: NewUser<'_>) -> Result<UserEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_user");
        let result = sqlx::query_as::<_, UserEntity>(&format!(
            r#"
            INSERT INTO users (name, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user.name)
        .bind(user.email)
        .bind(user.password_hash)
        .bind(user.role)
        .fetch_one(&self.pool)
        .await;
        timer.finish(result)
    }

    /// Apply a partial update. Returns `None` when the user does not exist.
    pub async fn update(
        &self,
        id: Uuid,
        changes: UserChanges<'_>,
    ) -> Result<Option<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_user");
        let result = sqlx::query_as::<_, UserEntity>(&format!(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                email = COALESCE($3, email),
                role = COALESCE($4, role),
                password_hash = COALESCE($5, password_hash),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(changes.name)
        .bind(changes.email)
        .bind(changes.role)
        .bind(changes.password_hash)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(result)
    }

    /// Grant the admin role to an existing account.
    pub async fn promote_to_admin(&self, id: Uuid) -> Result<Option<UserEntity>, sqlx::Error> {
        self.update(
            id,
            UserChanges {
                role: Some(UserRoleDb::Admin),
                ..Default::default()
            },
        )
        .await
    }

    /// Delete a user.
    ///
    /// Their registrations and organized events go with them; seats they held
    /// at other organizers' events are released first so the counters stay
    /// in step with the remaining registrations.
    ///
    /// Locks follow the registration repository's order: event rows first
    /// (by id), then the user's registration rows.
    pub async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("delete_user");
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            SELECT id FROM events
            WHERE id IN (SELECT event_id FROM registrations WHERE user_id = $1)
            ORDER BY id
            FOR UPDATE
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("SELECT id FROM registrations WHERE user_id = $1 FOR UPDATE")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        // Counted under both locks.
        sqlx::query(
            r#"
            UPDATE events e
            SET registration_count = e.registration_count - held.seats,
                updated_at = NOW()
            FROM (
                SELECT event_id, COUNT(*)::int AS seats
                FROM registrations
                WHERE user_id = $1 AND status <> 'cancelled'
                GROUP BY event_id
            ) held
            WHERE e.id = held.event_id AND e.organizer_id <> $1
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        timer.record();
        Ok(result.rows_affected() > 0)
    }

    /// Create a new user session.
    pub async fn create_session(
        &self,
        user_id: Uuid,
        token_hash: &str,
        refresh_token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<UserSessionEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_user_session");
        let result = sqlx::query_as::<_, UserSessionEntity>(
            r#"
            INSERT INTO user_sessions (user_id, token_hash, refresh_token_hash, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, token_hash, refresh_token_hash, expires_at, created_at, last_used_at
            "#,
        )
        .bind(user_id)
        .bind(token_hash)
        .bind(refresh_token_hash)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await;
        timer.finish(result)
    }

    /// Find an unexpired session by its refresh token hash.
    pub async fn find_session_by_refresh_hash(
        &self,
        refresh_token_hash: &str,
    ) -> Result<Option<UserSessionEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_session_by_refresh_hash");
        let result = sqlx::query_as::<_, UserSessionEntity>(
            r#"
            SELECT id, user_id, token_hash, refresh_token_hash, expires_at, created_at, last_used_at
            FROM user_sessions
            WHERE refresh_token_hash = $1 AND expires_at > NOW()
            "#,
        )
        .bind(refresh_token_hash)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(result)
    }

    /// Replace a session's token pair after a refresh.
    ///
    /// Only succeeds while the session still holds `current_refresh_hash`, so
    /// a refresh token can be spent once.
    pub async fn rotate_session(
        &self,
        session_id: Uuid,
        current_refresh_hash: &str,
        token_hash: &str,
        refresh_token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("rotate_user_session");
        let result = sqlx::query(
            r#"
            UPDATE user_sessions
            SET token_hash = $2,
                refresh_token_hash = $3,
                expires_at = $4,
                last_used_at = NOW()
            WHERE id = $1 AND refresh_token_hash = $5
            "#,
        )
        .bind(session_id)
        .bind(token_hash)
        .bind(refresh_token_hash)
        .bind(expires_at)
        .bind(current_refresh_hash)
        .execute(&self.pool)
        .await?;
        timer.record();
        Ok(result.rows_affected() > 0)
    }

    /// Delete the session owning a refresh token (logout).
    pub async fn delete_session_by_refresh_hash(
        &self,
        user_id: Uuid,
        refresh_token_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("delete_session_by_refresh_hash");
        let result = sqlx::query(
            r#"
            DELETE FROM user_sessions
            WHERE user_id = $1 AND refresh_token_hash = $2
            "#,
        )
        .bind(user_id)
        .bind(refresh_token_hash)
        .execute(&self.pool)
        .await?;
        timer.record();
        Ok(result.rows_affected() > 0)
    }

    /// Remove sessions whose refresh token has expired.
    pub async fn delete_expired_sessions(&self) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_expired_sessions");
        let result = sqlx::query("DELETE FROM user_sessions WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await?;
        timer.record();
        Ok(result.rows_affected())
    }

    /// Revoke all sessions for a user.
    pub async fn delete_user_sessions(&self, user_id: Uuid) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("delete_user_sessions");
        let result = sqlx::query("DELETE FROM user_sessions WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        timer.record();
        Ok(result.rows_affected() as i64)
    }
}
