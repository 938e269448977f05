//! Repository for the `restaurants` and `restaurant_schedules` tables.

use dinebot_core::availability::Schedule;
use dinebot_core::catalog::NewRestaurant;
use dinebot_core::types::DbId;
use sqlx::PgPool;

use crate::models::catalog::{RestaurantRow, ScheduleRow};

/// Column list for `restaurants` queries.
const COLUMNS: &str = "id, name, currency, enabled";

pub struct RestaurantRepo;

impl RestaurantRepo {
    /// List restaurants ordered by name.
    pub async fn list(pool: &PgPool, enabled_only: bool) -> Result<Vec<RestaurantRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM restaurants WHERE ($1 = FALSE OR enabled) ORDER BY name"
        );
        sqlx::query_as::<_, RestaurantRow>(&query)
            .bind(enabled_only)
            .fetch_all(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<RestaurantRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM restaurants WHERE id = $1");
        sqlx::query_as::<_, RestaurantRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Case-insensitive lookup, matching the unique index on `lower(name)`.
    pub async fn find_by_name(
        pool: &PgPool,
        name: &str,
    ) -> Result<Option<RestaurantRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM restaurants WHERE lower(name) = lower($1)");
        sqlx::query_as::<_, RestaurantRow>(&query)
            .bind(name)
            .fetch_optional(pool)
            .await
    }

    pub async fn set_enabled(
        pool: &PgPool,
        id: DbId,
        enabled: bool,
    ) -> Result<Option<RestaurantRow>, sqlx::Error> {
        let query = format!("UPDATE restaurants SET enabled = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, RestaurantRow>(&query)
            .bind(id)
            .bind(enabled)
            .fetch_optional(pool)
            .await
    }

    /// Insert a disabled restaurant together with its schedule.
    pub async fn create(
        pool: &PgPool,
        input: &NewRestaurant,
        schedule: &Schedule,
    ) -> Result<RestaurantRow, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let insert_query = format!(
            "INSERT INTO restaurants (name, currency, enabled) \
             VALUES ($1, $2, FALSE) \
             RETURNING {COLUMNS}"
        );
        let restaurant = sqlx::query_as::<_, RestaurantRow>(&insert_query)
            .bind(&input.name)
            .bind(&input.currency)
            .fetch_one(&mut *tx)
            .await?;

        Self::set_schedule_inner(&mut tx, restaurant.id, schedule).await?;

        tx.commit().await?;
        Ok(restaurant)
    }

    /// Schedule rows ordered by day of week.
    pub async fn get_schedule(
        pool: &PgPool,
        restaurant_id: DbId,
    ) -> Result<Vec<ScheduleRow>, sqlx::Error> {
        sqlx::query_as::<_, ScheduleRow>(
            "SELECT day_of_week, opens_at, closes_at FROM restaurant_schedules \
             WHERE restaurant_id = $1 ORDER BY day_of_week",
        )
        .bind(restaurant_id)
        .fetch_all(pool)
        .await
    }

    /// Replace the whole schedule in one transaction.
    pub async fn replace_schedule(
        pool: &PgPool,
        restaurant_id: DbId,
        schedule: &Schedule,
    ) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;
        Self::set_schedule_inner(&mut tx, restaurant_id, schedule).await?;
        tx.commit().await
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    async fn set_schedule_inner(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        restaurant_id: DbId,
        schedule: &Schedule,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM restaurant_schedules WHERE restaurant_id = $1")
            .bind(restaurant_id)
            .execute(&mut **tx)
            .await?;

        for (day, hours) in schedule {
            sqlx::query(
                "INSERT INTO restaurant_schedules (restaurant_id, day_of_week, opens_at, closes_at) \
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(restaurant_id)
            .bind(i16::from(*day))
            .bind(hours.opens_at)
            .bind(hours.closes_at)
            .execute(&mut **tx)
            .await?;
        }

        Ok(())
    }
}
