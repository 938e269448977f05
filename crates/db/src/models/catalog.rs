//! Restaurant, schedule, category, and dish rows.

use chrono::NaiveTime;
use dinebot_core::availability::{OpeningHours, Schedule};
use dinebot_core::catalog::{Dish, DishCategory, Restaurant};
use dinebot_core::types::DbId;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `restaurants` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RestaurantRow {
    pub id: DbId,
    pub name: String,
    pub currency: String,
    pub enabled: bool,
}

impl From<RestaurantRow> for Restaurant {
    fn from(row: RestaurantRow) -> Self {
        Restaurant {
            id: row.id,
            name: row.name,
            currency: row.currency,
            enabled: row.enabled,
        }
    }
}

/// A row from the `restaurant_schedules` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ScheduleRow {
    pub day_of_week: i16,
    pub opens_at: NaiveTime,
    pub closes_at: NaiveTime,
}

/// Collect schedule rows into a [`Schedule`]. Rows with an out-of-range day
/// are skipped; the table constraint prevents them anyway.
pub fn into_schedule(rows: Vec<ScheduleRow>) -> Schedule {
    rows.into_iter()
        .filter_map(|row| {
            let day = u8::try_from(row.day_of_week).ok()?;
            Some((day, OpeningHours::new(row.opens_at, row.closes_at)))
        })
        .collect()
}

/// A row from the `dish_categories` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DishCategoryRow {
    pub id: DbId,
    pub name: String,
}

impl From<DishCategoryRow> for DishCategory {
    fn from(row: DishCategoryRow) -> Self {
        DishCategory {
            id: row.id,
            name: row.name,
        }
    }
}

/// A row from the `dishes` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DishRow {
    pub id: DbId,
    pub restaurant_id: DbId,
    pub category_id: DbId,
    pub name: String,
    pub description: String,
    pub photo_file_id: Option<String>,
    pub price: Decimal,
    pub enabled: bool,
}

impl From<DishRow> for Dish {
    fn from(row: DishRow) -> Self {
        Dish {
            id: row.id,
            restaurant_id: row.restaurant_id,
            category_id: row.category_id,
            name: row.name,
            description: row.description,
            photo_file_id: row.photo_file_id,
            price: row.price,
            enabled: row.enabled,
        }
    }
}
