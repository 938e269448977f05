//! Repository for the `users` table.

use dinebot_core::inbound::ClientProfile;
use dinebot_core::types::{ChatId, Timestamp};
use sqlx::PgPool;

use crate::models::user::UserRow;

/// Column list for `users` queries.
const COLUMNS: &str =
    "id, username, first_name, last_name, is_admin, is_manager, registered_at";

pub struct UserRepo;

impl UserRepo {
    /// Insert a user or refresh the profile fields of an existing one.
    ///
    /// Returns `true` when the row was inserted.
    pub async fn upsert(
        pool: &PgPool,
        profile: &ClientProfile,
        now: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO users (id, username, first_name, last_name, registered_at) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (id) DO UPDATE SET \
                username = EXCLUDED.username, \
                first_name = EXCLUDED.first_name, \
                last_name = EXCLUDED.last_name \
             RETURNING (xmax = 0)",
        )
        .bind(profile.id)
        .bind(&profile.username)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(now)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: ChatId) -> Result<Option<UserRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, UserRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_username(
        pool: &PgPool,
        username: &str,
    ) -> Result<Option<UserRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE username = $1 LIMIT 1");
        sqlx::query_as::<_, UserRow>(&query)
            .bind(username)
            .fetch_optional(pool)
            .await
    }

    /// Newest registrations first.
    pub async fn list_recent(pool: &PgPool, limit: i64) -> Result<Vec<UserRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM users ORDER BY registered_at DESC, id DESC LIMIT $1"
        );
        sqlx::query_as::<_, UserRow>(&query)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    pub async fn set_permissions(
        pool: &PgPool,
        id: ChatId,
        is_admin: bool,
        is_manager: bool,
    ) -> Result<Option<UserRow>, sqlx::Error> {
        let query = format!(
            "UPDATE users SET is_admin = $2, is_manager = $3 WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UserRow>(&query)
            .bind(id)
            .bind(is_admin)
            .bind(is_manager)
            .fetch_optional(pool)
            .await
    }

    /// Create the user if needed and grant admin and manager rights.
    pub async fn ensure_admin(pool: &PgPool, id: ChatId, now: Timestamp) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO users (id, is_admin, is_manager, registered_at) \
             VALUES ($1, TRUE, TRUE, $2) \
             ON CONFLICT (id) DO UPDATE SET is_admin = TRUE, is_manager = TRUE",
        )
        .bind(id)
        .bind(now)
        .execute(pool)
        .await?;
        Ok(())
    }
}
