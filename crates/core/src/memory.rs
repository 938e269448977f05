//! In-process [`Repository`] used by tests and by local runs without a
//! database.
//!
//! All data sits behind one `RwLock`, so every call is atomic the same way a
//! single SQL transaction would be.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::availability::Schedule;
use crate::catalog::{
    Dish, DishCategory, NewDish, NewDishCategory, NewRestaurant, Restaurant, User,
};
use crate::error::CoreError;
use crate::inbound::ClientProfile;
use crate::order::{NewOrder, Order, OrderStatus, OrderSummary};
use crate::repository::Repository;
use crate::types::{ChatId, DbId, Timestamp};

#[derive(Default)]
struct Tables {
    users: BTreeMap<ChatId, User>,
    restaurants: BTreeMap<DbId, Restaurant>,
    schedules: BTreeMap<DbId, Schedule>,
    categories: BTreeMap<DbId, DishCategory>,
    dishes: BTreeMap<DbId, Dish>,
    orders: BTreeMap<DbId, Order>,
    last_id: DbId,
}

impl Tables {
    fn next_id(&mut self) -> DbId {
        self.last_id += 1;
        self.last_id
    }
}

#[derive(Default)]
pub struct InMemoryRepository {
    tables: RwLock<Tables>,
}

fn by_name<'a, T>(
    items: impl Iterator<Item = &'a T>,
    name: &str,
    key: impl Fn(&T) -> &str,
) -> Option<&'a T>
where
    T: 'a,
{
    let wanted = name.to_lowercase();
    items.into_iter().find(|item| key(item).to_lowercase() == wanted)
}

fn sorted_by_name<T: Clone>(items: impl Iterator<Item = T>, key: impl Fn(&T) -> String) -> Vec<T> {
    let mut items: Vec<T> = items.collect();
    items.sort_by_key(|item| key(item));
    items
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a restaurant directly with an explicit enabled flag.
    pub async fn seed_restaurant(
        &self,
        name: &str,
        currency: &str,
        enabled: bool,
        schedule: Schedule,
    ) -> Restaurant {
        let mut tables = self.tables.write().await;
        let id = tables.next_id();
        let restaurant = Restaurant {
            id,
            name: name.to_string(),
            currency: currency.to_string(),
            enabled,
        };
        tables.restaurants.insert(id, restaurant.clone());
        tables.schedules.insert(id, schedule);
        restaurant
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    // ---- users ----

    async fn upsert_user(&self, profile: &ClientProfile, now: Timestamp) -> Result<bool, CoreError> {
        let mut tables = self.tables.write().await;
        match tables.users.get_mut(&profile.id) {
            Some(user) => {
                user.username = profile.username.clone();
                user.first_name = profile.first_name.clone();
                user.last_name = profile.last_name.clone();
                Ok(false)
            }
            None => {
                tables.users.insert(
                    profile.id,
                    User {
                        id: profile.id,
                        username: profile.username.clone(),
                        first_name: profile.first_name.clone(),
                        last_name: profile.last_name.clone(),
                        is_admin: false,
                        is_manager: false,
                        registered_at: now,
                    },
                );
                Ok(true)
            }
        }
    }

    async fn find_user(&self, id: ChatId) -> Result<Option<User>, CoreError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, CoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.username.as_deref() == Some(username))
            .cloned())
    }

    async fn list_recent_users(&self, limit: i64) -> Result<Vec<User>, CoreError> {
        let tables = self.tables.read().await;
        let mut users: Vec<User> = tables.users.values().cloned().collect();
        users.sort_by(|a, b| b.registered_at.cmp(&a.registered_at).then(b.id.cmp(&a.id)));
        users.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(users)
    }

    async fn set_permissions(
        &self,
        id: ChatId,
        is_admin: bool,
        is_manager: bool,
    ) -> Result<User, CoreError> {
        let mut tables = self.tables.write().await;
        let user = tables
            .users
            .get_mut(&id)
            .ok_or(CoreError::NotFound { entity: "user", id })?;
        user.is_admin = is_admin;
        user.is_manager = is_manager;
        Ok(user.clone())
    }

    async fn ensure_admin(&self, id: ChatId, now: Timestamp) -> Result<(), CoreError> {
        let mut tables = self.tables.write().await;
        let user = tables.users.entry(id).or_insert_with(|| User {
            id,
            username: None,
            first_name: None,
            last_name: None,
            is_admin: false,
            is_manager: false,
            registered_at: now,
        });
        user.is_admin = true;
        user.is_manager = true;
        Ok(())
    }

    // ---- restaurants ----

    async fn list_restaurants(&self, enabled_only: bool) -> Result<Vec<Restaurant>, CoreError> {
        let tables = self.tables.read().await;
        Ok(sorted_by_name(
            tables
                .restaurants
                .values()
                .filter(|r| !enabled_only || r.enabled)
                .cloned(),
            |r| r.name.clone(),
        ))
    }

    async fn find_restaurant(&self, id: DbId) -> Result<Option<Restaurant>, CoreError> {
        Ok(self.tables.read().await.restaurants.get(&id).cloned())
    }

    async fn find_restaurant_by_name(&self, name: &str) -> Result<Option<Restaurant>, CoreError> {
        let tables = self.tables.read().await;
        Ok(by_name(tables.restaurants.values(), name, |r| &r.name).cloned())
    }

    async fn set_restaurant_enabled(&self, id: DbId, enabled: bool) -> Result<Restaurant, CoreError> {
        let mut tables = self.tables.write().await;
        let restaurant = tables
            .restaurants
            .get_mut(&id)
            .ok_or(CoreError::NotFound { entity: "restaurant", id })?;
        restaurant.enabled = enabled;
        Ok(restaurant.clone())
    }

    async fn create_restaurant(
        &self,
        draft: &NewRestaurant,
        schedule: &Schedule,
    ) -> Result<Restaurant, CoreError> {
        let mut tables = self.tables.write().await;
        if by_name(tables.restaurants.values(), &draft.name, |r| &r.name).is_some() {
            return Err(CoreError::Conflict(format!(
                "restaurant '{}' already exists",
                draft.name
            )));
        }
        let id = tables.next_id();
        let restaurant = Restaurant {
            id,
            name: draft.name.clone(),
            currency: draft.currency.clone(),
            enabled: false,
        };
        tables.restaurants.insert(id, restaurant.clone());
        tables.schedules.insert(id, schedule.clone());
        Ok(restaurant)
    }

    async fn find_schedule(&self, restaurant_id: DbId) -> Result<Schedule, CoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .schedules
            .get(&restaurant_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn replace_schedule(&self, restaurant_id: DbId, schedule: &Schedule) -> Result<(), CoreError> {
        let mut tables = self.tables.write().await;
        if !tables.restaurants.contains_key(&restaurant_id) {
            return Err(CoreError::NotFound {
                entity: "restaurant",
                id: restaurant_id,
            });
        }
        tables.schedules.insert(restaurant_id, schedule.clone());
        Ok(())
    }

    // ---- categories ----

    async fn list_categories(&self) -> Result<Vec<DishCategory>, CoreError> {
        let tables = self.tables.read().await;
        Ok(sorted_by_name(tables.categories.values().cloned(), |c| c.name.clone()))
    }

    async fn list_restaurant_categories(
        &self,
        restaurant_id: DbId,
        enabled_dishes_only: bool,
    ) -> Result<Vec<DishCategory>, CoreError> {
        let tables = self.tables.read().await;
        let used: Vec<DbId> = tables
            .dishes
            .values()
            .filter(|d| d.restaurant_id == restaurant_id && (!enabled_dishes_only || d.enabled))
            .map(|d| d.category_id)
            .collect();
        Ok(sorted_by_name(
            tables
                .categories
                .values()
                .filter(|c| used.contains(&c.id))
                .cloned(),
            |c| c.name.clone(),
        ))
    }

    async fn find_category_by_name(&self, name: &str) -> Result<Option<DishCategory>, CoreError> {
        let tables = self.tables.read().await;
        Ok(by_name(tables.categories.values(), name, |c| &c.name).cloned())
    }

    async fn create_category(&self, draft: &NewDishCategory) -> Result<DishCategory, CoreError> {
        let mut tables = self.tables.write().await;
        if by_name(tables.categories.values(), &draft.name, |c| &c.name).is_some() {
            return Err(CoreError::Conflict(format!(
                "dish category '{}' already exists",
                draft.name
            )));
        }
        let id = tables.next_id();
        let category = DishCategory {
            id,
            name: draft.name.clone(),
        };
        tables.categories.insert(id, category.clone());
        Ok(category)
    }

    // ---- dishes ----

    async fn list_dishes(
        &self,
        restaurant_id: DbId,
        category_id: DbId,
        enabled_only: bool,
    ) -> Result<Vec<Dish>, CoreError> {
        let tables = self.tables.read().await;
        Ok(sorted_by_name(
            tables
                .dishes
                .values()
                .filter(|d| {
                    d.restaurant_id == restaurant_id
                        && d.category_id == category_id
                        && (!enabled_only || d.enabled)
                })
                .cloned(),
            |d| d.name.clone(),
        ))
    }

    async fn find_dish(&self, id: DbId) -> Result<Option<Dish>, CoreError> {
        Ok(self.tables.read().await.dishes.get(&id).cloned())
    }

    async fn set_dish_enabled(&self, id: DbId, enabled: bool) -> Result<Dish, CoreError> {
        let mut tables = self.tables.write().await;
        let dish = tables
            .dishes
            .get_mut(&id)
            .ok_or(CoreError::NotFound { entity: "dish", id })?;
        dish.enabled = enabled;
        Ok(dish.clone())
    }

    async fn create_dish(&self, draft: &NewDish) -> Result<Dish, CoreError> {
        let mut tables = self.tables.write().await;
        if !tables.restaurants.contains_key(&draft.restaurant_id) {
            return Err(CoreError::NotFound {
                entity: "restaurant",
                id: draft.restaurant_id,
            });
        }
        if !tables.categories.contains_key(&draft.category_id) {
            return Err(CoreError::NotFound {
                entity: "dish category",
                id: draft.category_id,
            });
        }
        let id = tables.next_id();
        let dish = Dish {
            id,
            restaurant_id: draft.restaurant_id,
            category_id: draft.category_id,
            name: draft.name.clone(),
            description: draft.description.clone(),
            photo_file_id: draft.photo_file_id.clone(),
            price: draft.price,
            enabled: true,
        };
        tables.dishes.insert(id, dish.clone());
        Ok(dish)
    }

    // ---- orders ----

    async fn create_order(&self, order: &NewOrder, now: Timestamp) -> Result<Order, CoreError> {
        let mut tables = self.tables.write().await;
        let id = tables.next_id();
        let order = Order {
            id,
            client_id: order.client_id,
            staff_id: None,
            status: OrderStatus::AwaitingResponse,
            location: order.location,
            restaurant: order.restaurant.clone(),
            lines: order.lines.clone(),
            created_at: now,
        };
        tables.orders.insert(id, order.clone());
        Ok(order)
    }

    async fn find_order(&self, id: DbId) -> Result<Option<Order>, CoreError> {
        Ok(self.tables.read().await.orders.get(&id).cloned())
    }

    async fn list_client_orders(&self, client_id: ChatId) -> Result<Vec<OrderSummary>, CoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .orders
            .values()
            .rev()
            .filter(|o| o.client_id == client_id)
            .map(OrderSummary::from)
            .collect())
    }

    async fn list_recent_orders(&self, limit: i64) -> Result<Vec<OrderSummary>, CoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .orders
            .values()
            .rev()
            .take(usize::try_from(limit).unwrap_or(0))
            .map(OrderSummary::from)
            .collect())
    }

    async fn update_order_status(
        &self,
        id: DbId,
        status: OrderStatus,
        staff_id: ChatId,
    ) -> Result<Order, CoreError> {
        let mut tables = self.tables.write().await;
        let order = tables
            .orders
            .get_mut(&id)
            .ok_or(CoreError::NotFound { entity: "order", id })?;
        order.status = status;
        order.staff_id = Some(staff_id);
        Ok(order.clone())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn profile(id: ChatId) -> ClientProfile {
        ClientProfile {
            id,
            username: Some(format!("user{id}")),
            first_name: None,
            last_name: None,
            is_bot: false,
        }
    }

    #[tokio::test]
    async fn upsert_reports_new_users_once() {
        let repo = InMemoryRepository::new();
        assert!(repo.upsert_user(&profile(1), Utc::now()).await.unwrap());
        assert!(!repo.upsert_user(&profile(1), Utc::now()).await.unwrap());
        assert!(repo.find_user_by_username("user1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn restaurant_names_are_unique_ignoring_case() {
        let repo = InMemoryRepository::new();
        let draft = NewRestaurant {
            name: "Pho".into(),
            currency: "VND".into(),
        };
        let created = repo.create_restaurant(&draft, &Schedule::new()).await.unwrap();
        assert!(!created.enabled);

        let dup = NewRestaurant {
            name: "PHO".into(),
            currency: "VND".into(),
        };
        assert_matches!(
            repo.create_restaurant(&dup, &Schedule::new()).await,
            Err(CoreError::Conflict(_))
        );
        assert_eq!(
            repo.find_restaurant_by_name("pho").await.unwrap().map(|r| r.id),
            Some(created.id)
        );
    }

    #[tokio::test]
    async fn categories_follow_enabled_dishes() {
        let repo = InMemoryRepository::new();
        let r = repo.seed_restaurant("Pho", "VND", true, Schedule::new()).await;
        let soups = repo
            .create_category(&NewDishCategory { name: "Soups".into() })
            .await
            .unwrap();
        let dish = repo
            .create_dish(&NewDish {
                restaurant_id: r.id,
                category_id: soups.id,
                name: "Pho Bo".into(),
                description: String::new(),
                price: Decimal::from(5),
                photo_file_id: None,
            })
            .await
            .unwrap();

        assert_eq!(repo.list_restaurant_categories(r.id, true).await.unwrap().len(), 1);
        repo.set_dish_enabled(dish.id, false).await.unwrap();
        assert!(repo.list_restaurant_categories(r.id, true).await.unwrap().is_empty());
        assert_eq!(repo.list_restaurant_categories(r.id, false).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn status_update_records_latest_staff() {
        let repo = InMemoryRepository::new();
        let r = repo.seed_restaurant("Pho", "VND", true, Schedule::new()).await;
        let order = repo
            .create_order(
                &NewOrder {
                    client_id: 1,
                    location: crate::types::GeoPoint {
                        latitude: 1.0,
                        longitude: 2.0,
                    },
                    restaurant: r.reference(),
                    lines: Vec::new(),
                },
                Utc::now(),
            )
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::AwaitingResponse);

        repo.update_order_status(order.id, OrderStatus::InProgress, 10)
            .await
            .unwrap();
        let updated = repo
            .update_order_status(order.id, OrderStatus::InProgress, 11)
            .await
            .unwrap();
        assert_eq!(updated.staff_id, Some(11));
        assert_eq!(repo.list_client_orders(1).await.unwrap().len(), 1);
    }
}
