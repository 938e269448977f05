//! [`Repository`] implementation over PostgreSQL.

use async_trait::async_trait;
use dinebot_core::availability::Schedule;
use dinebot_core::catalog::{
    Dish, DishCategory, NewDish, NewDishCategory, NewRestaurant, Restaurant, User,
};
use dinebot_core::error::CoreError;
use dinebot_core::inbound::ClientProfile;
use dinebot_core::order::{NewOrder, Order, OrderStatus, OrderSummary};
use dinebot_core::repository::Repository;
use dinebot_core::types::{ChatId, DbId, Timestamp};

use crate::models::catalog::into_schedule;
use crate::repositories::{CategoryRepo, DishRepo, OrderRepo, RestaurantRepo, UserRepo};
use crate::DbPool;

/// Map a database error onto the domain taxonomy. Unique violations become
/// [`CoreError::Conflict`]; everything else is a store fault.
fn store_error(err: sqlx::Error) -> CoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return CoreError::Conflict(db.message().to_string());
        }
    }
    tracing::error!(error = %err, "Database error");
    CoreError::Store(err.to_string())
}

#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl Repository for PgStore {
    // ---- users ----

    async fn upsert_user(&self, profile: &ClientProfile, now: Timestamp) -> Result<bool, CoreError> {
        UserRepo::upsert(&self.pool, profile, now)
            .await
            .map_err(store_error)
    }

    async fn find_user(&self, id: ChatId) -> Result<Option<User>, CoreError> {
        let row = UserRepo::find_by_id(&self.pool, id).await.map_err(store_error)?;
        Ok(row.map(User::from))
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, CoreError> {
        let row = UserRepo::find_by_username(&self.pool, username)
            .await
            .map_err(store_error)?;
        Ok(row.map(User::from))
    }

    async fn list_recent_users(&self, limit: i64) -> Result<Vec<User>, CoreError> {
        let rows = UserRepo::list_recent(&self.pool, limit)
            .await
            .map_err(store_error)?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn set_permissions(
        &self,
        id: ChatId,
        is_admin: bool,
        is_manager: bool,
    ) -> Result<User, CoreError> {
        UserRepo::set_permissions(&self.pool, id, is_admin, is_manager)
            .await
            .map_err(store_error)?
            .map(User::from)
            .ok_or(CoreError::NotFound { entity: "user", id })
    }

    async fn ensure_admin(&self, id: ChatId, now: Timestamp) -> Result<(), CoreError> {
        UserRepo::ensure_admin(&self.pool, id, now)
            .await
            .map_err(store_error)
    }

    // ---- restaurants ----

    async fn list_restaurants(&self, enabled_only: bool) -> Result<Vec<Restaurant>, CoreError> {
        let rows = RestaurantRepo::list(&self.pool, enabled_only)
            .await
            .map_err(store_error)?;
        Ok(rows.into_iter().map(Restaurant::from).collect())
    }

    async fn find_restaurant(&self, id: DbId) -> Result<Option<Restaurant>, CoreError> {
        let row = RestaurantRepo::find_by_id(&self.pool, id)
            .await
            .map_err(store_error)?;
        Ok(row.map(Restaurant::from))
    }

    async fn find_restaurant_by_name(&self, name: &str) -> Result<Option<Restaurant>, CoreError> {
        let row = RestaurantRepo::find_by_name(&self.pool, name)
            .await
            .map_err(store_error)?;
        Ok(row.map(Restaurant::from))
    }

    async fn set_restaurant_enabled(&self, id: DbId, enabled: bool) -> Result<Restaurant, CoreError> {
        RestaurantRepo::set_enabled(&self.pool, id, enabled)
            .await
            .map_err(store_error)?
            .map(Restaurant::from)
            .ok_or(CoreError::NotFound { entity: "restaurant", id })
    }

    async fn create_restaurant(
        &self,
        draft: &NewRestaurant,
        schedule: &Schedule,
    ) -> Result<Restaurant, CoreError> {
        let row = RestaurantRepo::create(&self.pool, draft, schedule)
            .await
            .map_err(store_error)?;
        tracing::info!(restaurant_id = row.id, name = %row.name, "Restaurant created");
        Ok(row.into())
    }

    async fn find_schedule(&self, restaurant_id: DbId) -> Result<Schedule, CoreError> {
        let rows = RestaurantRepo::get_schedule(&self.pool, restaurant_id)
            .await
            .map_err(store_error)?;
        Ok(into_schedule(rows))
    }

    async fn replace_schedule(&self, restaurant_id: DbId, schedule: &Schedule) -> Result<(), CoreError> {
        if self.find_restaurant(restaurant_id).await?.is_none() {
            return Err(CoreError::NotFound {
                entity: "restaurant",
                id: restaurant_id,
            });
        }
        RestaurantRepo::replace_schedule(&self.pool, restaurant_id, schedule)
            .await
            .map_err(store_error)
    }

    // ---- categories ----

    async fn list_categories(&self) -> Result<Vec<DishCategory>, CoreError> {
        let rows = CategoryRepo::list(&self.pool).await.map_err(store_error)?;
        Ok(rows.into_iter().map(DishCategory::from).collect())
    }

    async fn list_restaurant_categories(
        &self,
        restaurant_id: DbId,
        enabled_dishes_only: bool,
    ) -> Result<Vec<DishCategory>, CoreError> {
        let rows = CategoryRepo::list_for_restaurant(&self.pool, restaurant_id, enabled_dishes_only)
            .await
            .map_err(store_error)?;
        Ok(rows.into_iter().map(DishCategory::from).collect())
    }

    async fn find_category_by_name(&self, name: &str) -> Result<Option<DishCategory>, CoreError> {
        let row = CategoryRepo::find_by_name(&self.pool, name)
            .await
            .map_err(store_error)?;
        Ok(row.map(DishCategory::from))
    }

    async fn create_category(&self, draft: &NewDishCategory) -> Result<DishCategory, CoreError> {
        let row = CategoryRepo::create(&self.pool, &draft.name)
            .await
            .map_err(store_error)?;
        Ok(row.into())
    }

    // ---- dishes ----

    async fn list_dishes(
        &self,
        restaurant_id: DbId,
        category_id: DbId,
        enabled_only: bool,
    ) -> Result<Vec<Dish>, CoreError> {
        let rows = DishRepo::list(&self.pool, restaurant_id, category_id, enabled_only)
            .await
            .map_err(store_error)?;
        Ok(rows.into_iter().map(Dish::from).collect())
    }

    async fn find_dish(&self, id: DbId) -> Result<Option<Dish>, CoreError> {
        let row = DishRepo::find_by_id(&self.pool, id).await.map_err(store_error)?;
        Ok(row.map(Dish::from))
    }

    async fn set_dish_enabled(&self, id: DbId, enabled: bool) -> Result<Dish, CoreError> {
        DishRepo::set_enabled(&self.pool, id, enabled)
            .await
            .map_err(store_error)?
            .map(Dish::from)
            .ok_or(CoreError::NotFound { entity: "dish", id })
    }

    async fn create_dish(&self, draft: &NewDish) -> Result<Dish, CoreError> {
        let row = DishRepo::create(&self.pool, draft).await.map_err(store_error)?;
        Ok(row.into())
    }

    // ---- orders ----

    async fn create_order(&self, order: &NewOrder, now: Timestamp) -> Result<Order, CoreError> {
        let (row, lines) = OrderRepo::create(&self.pool, order, now)
            .await
            .map_err(store_error)?;
        row.into_order(lines)
    }

    async fn find_order(&self, id: DbId) -> Result<Option<Order>, CoreError> {
        let Some(row) = OrderRepo::find_by_id(&self.pool, id).await.map_err(store_error)? else {
            return Ok(None);
        };
        let lines = OrderRepo::list_lines(&self.pool, id)
            .await
            .map_err(store_error)?;
        row.into_order(lines).map(Some)
    }

    async fn list_client_orders(&self, client_id: ChatId) -> Result<Vec<OrderSummary>, CoreError> {
        OrderRepo::list_for_client(&self.pool, client_id)
            .await
            .map_err(store_error)?
            .into_iter()
            .map(OrderSummary::try_from)
            .collect()
    }

    async fn list_recent_orders(&self, limit: i64) -> Result<Vec<OrderSummary>, CoreError> {
        OrderRepo::list_recent(&self.pool, limit)
            .await
            .map_err(store_error)?
            .into_iter()
            .map(OrderSummary::try_from)
            .collect()
    }

    async fn update_order_status(
        &self,
        id: DbId,
        status: OrderStatus,
        staff_id: ChatId,
    ) -> Result<Order, CoreError> {
        let row = OrderRepo::update_status(&self.pool, id, status, staff_id)
            .await
            .map_err(store_error)?
            .ok_or(CoreError::NotFound { entity: "order", id })?;
        let lines = OrderRepo::list_lines(&self.pool, id)
            .await
            .map_err(store_error)?;
        row.into_order(lines)
    }
}
