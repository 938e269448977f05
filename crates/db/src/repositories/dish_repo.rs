//! Repository for the `dishes` table.

use dinebot_core::catalog::NewDish;
use dinebot_core::types::DbId;
use sqlx::PgPool;

use crate::models::catalog::DishRow;

/// Column list for `dishes` queries.
const COLUMNS: &str =
    "id, restaurant_id, category_id, name, description, photo_file_id, price, enabled";

pub struct DishRepo;

impl DishRepo {
    /// Dishes of one restaurant and category, ordered by name.
    pub async fn list(
        pool: &PgPool,
        restaurant_id: DbId,
        category_id: DbId,
        enabled_only: bool,
    ) -> Result<Vec<DishRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM dishes \
             WHERE restaurant_id = $1 AND category_id = $2 AND ($3 = FALSE OR enabled) \
             ORDER BY name"
        );
        sqlx::query_as::<_, DishRow>(&query)
            .bind(restaurant_id)
            .bind(category_id)
            .bind(enabled_only)
            .fetch_all(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<DishRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM dishes WHERE id = $1");
        sqlx::query_as::<_, DishRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn set_enabled(
        pool: &PgPool,
        id: DbId,
        enabled: bool,
    ) -> Result<Option<DishRow>, sqlx::Error> {
        let query = format!("UPDATE dishes SET enabled = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, DishRow>(&query)
            .bind(id)
            .bind(enabled)
            .fetch_optional(pool)
            .await
    }

    /// Insert an enabled dish.
    pub async fn create(pool: &PgPool, input: &NewDish) -> Result<DishRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO dishes \
                (restaurant_id, category_id, name, description, photo_file_id, price, enabled) \
             VALUES ($1, $2, $3, $4, $5, $6, TRUE) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DishRow>(&query)
            .bind(input.restaurant_id)
            .bind(input.category_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.photo_file_id)
            .bind(input.price)
            .fetch_one(pool)
            .await
    }
}
