//! Store capability consumed by the bot.
//!
//! Implemented by `dinebot_db::PgStore` for production and by
//! [`crate::memory::InMemoryRepository`] for tests and local runs. Every
//! method is atomic on its own; multi-row writes happen in one transaction.

use async_trait::async_trait;

use crate::availability::Schedule;
use crate::catalog::{
    Dish, DishCategory, NewDish, NewDishCategory, NewRestaurant, Restaurant, User,
};
use crate::error::CoreError;
use crate::inbound::ClientProfile;
use crate::order::{NewOrder, Order, OrderStatus, OrderSummary};
use crate::types::{ChatId, DbId, Timestamp};

#[async_trait]
pub trait Repository: Send + Sync {
    // ---- users ----

    /// Insert or refresh a user profile. Returns `true` when the user is new.
    async fn upsert_user(&self, profile: &ClientProfile, now: Timestamp)
        -> Result<bool, CoreError>;

    async fn find_user(&self, id: ChatId) -> Result<Option<User>, CoreError>;

    /// Lookup by username without the leading `@`.
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, CoreError>;

    /// Most recently registered users first.
    async fn list_recent_users(&self, limit: i64) -> Result<Vec<User>, CoreError>;

    async fn set_permissions(
        &self,
        id: ChatId,
        is_admin: bool,
        is_manager: bool,
    ) -> Result<User, CoreError>;

    /// Make sure `id` exists and holds admin and manager rights.
    async fn ensure_admin(&self, id: ChatId, now: Timestamp) -> Result<(), CoreError>;

    // ---- restaurants ----

    /// Ordered by name.
    async fn list_restaurants(&self, enabled_only: bool) -> Result<Vec<Restaurant>, CoreError>;

    async fn find_restaurant(&self, id: DbId) -> Result<Option<Restaurant>, CoreError>;

    /// Case-insensitive name match.
    async fn find_restaurant_by_name(&self, name: &str)
        -> Result<Option<Restaurant>, CoreError>;

    async fn set_restaurant_enabled(&self, id: DbId, enabled: bool)
        -> Result<Restaurant, CoreError>;

    /// New restaurants start disabled.
    async fn create_restaurant(
        &self,
        draft: &NewRestaurant,
        schedule: &Schedule,
    ) -> Result<Restaurant, CoreError>;

    async fn find_schedule(&self, restaurant_id: DbId) -> Result<Schedule, CoreError>;

    /// Replace the whole schedule; days missing from `schedule` are removed.
    async fn replace_schedule(&self, restaurant_id: DbId, schedule: &Schedule)
        -> Result<(), CoreError>;

    // ---- categories ----

    /// All categories, ordered by name.
    async fn list_categories(&self) -> Result<Vec<DishCategory>, CoreError>;

    /// Categories that have at least one dish in the restaurant, ordered by
    /// name. With `enabled_dishes_only` disabled dishes do not count.
    async fn list_restaurant_categories(
        &self,
        restaurant_id: DbId,
        enabled_dishes_only: bool,
    ) -> Result<Vec<DishCategory>, CoreError>;

    /// Case-insensitive name match.
    async fn find_category_by_name(&self, name: &str) -> Result<Option<DishCategory>, CoreError>;

    async fn create_category(&self, draft: &NewDishCategory) -> Result<DishCategory, CoreError>;

    // ---- dishes ----

    /// Ordered by name.
    async fn list_dishes(
        &self,
        restaurant_id: DbId,
        category_id: DbId,
        enabled_only: bool,
    ) -> Result<Vec<Dish>, CoreError>;

    async fn find_dish(&self, id: DbId) -> Result<Option<Dish>, CoreError>;

    async fn set_dish_enabled(&self, id: DbId, enabled: bool) -> Result<Dish, CoreError>;

    async fn create_dish(&self, draft: &NewDish) -> Result<Dish, CoreError>;

    // ---- orders ----

    /// Persist the order and its lines with status `AwaitingResponse`.
    async fn create_order(&self, order: &NewOrder, now: Timestamp) -> Result<Order, CoreError>;

    async fn find_order(&self, id: DbId) -> Result<Option<Order>, CoreError>;

    /// Newest first.
    async fn list_client_orders(&self, client_id: ChatId)
        -> Result<Vec<OrderSummary>, CoreError>;

    /// Newest first.
    async fn list_recent_orders(&self, limit: i64) -> Result<Vec<OrderSummary>, CoreError>;

    async fn update_order_status(
        &self,
        id: DbId,
        status: OrderStatus,
        staff_id: ChatId,
    ) -> Result<Order, CoreError>;
}
