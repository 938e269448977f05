//! Repository for the `dish_categories` table.

use dinebot_core::types::DbId;
use sqlx::PgPool;

use crate::models::catalog::DishCategoryRow;

pub struct CategoryRepo;

impl CategoryRepo {
    pub async fn list(pool: &PgPool) -> Result<Vec<DishCategoryRow>, sqlx::Error> {
        sqlx::query_as::<_, DishCategoryRow>("SELECT id, name FROM dish_categories ORDER BY name")
            .fetch_all(pool)
            .await
    }

    /// Categories with at least one dish in the restaurant.
    pub async fn list_for_restaurant(
        pool: &PgPool,
        restaurant_id: DbId,
        enabled_dishes_only: bool,
    ) -> Result<Vec<DishCategoryRow>, sqlx::Error> {
        sqlx::query_as::<_, DishCategoryRow>(
            "SELECT DISTINCT c.id, c.name FROM dish_categories c \
             JOIN dishes d ON d.category_id = c.id \
             WHERE d.restaurant_id = $1 AND ($2 = FALSE OR d.enabled) \
             ORDER BY c.name",
        )
        .bind(restaurant_id)
        .bind(enabled_dishes_only)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_name(
        pool: &PgPool,
        name: &str,
    ) -> Result<Option<DishCategoryRow>, sqlx::Error> {
        sqlx::query_as::<_, DishCategoryRow>(
            "SELECT id, name FROM dish_categories WHERE lower(name) = lower($1)",
        )
        .bind(name)
        .fetch_optional(pool)
        .await
    }

    pub async fn create(pool: &PgPool, name: &str) -> Result<DishCategoryRow, sqlx::Error> {
        sqlx::query_as::<_, DishCategoryRow>(
            "INSERT INTO dish_categories (name) VALUES ($1) RETURNING id, name",
        )
        .bind(name)
        .fetch_one(pool)
        .await
    }
}
