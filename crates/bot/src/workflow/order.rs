use std::sync::Arc;

use dinebot_core::error::CoreError;
use dinebot_core::order::{NewOrder, Order};
use dinebot_core::types::{DbId, GeoPoint};

use crate::context::BotContext;
use crate::session::Session;

#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("cart is empty")]
    EmptyCart,

    #[error("restaurant {0} is closed")]
    RestaurantClosed(String),

    /// Dishes that were removed or disabled after being added.
    #[error("cart contains unavailable dishes {0:?}")]
    IrrelevantItems(Vec<DbId>),

    #[error(transparent)]
    Store(#[from] CoreError),
}

/// Turns a client's cart into a persisted order.
pub struct OrderWorkflow {
    ctx: Arc<BotContext>,
}

impl OrderWorkflow {
    pub fn new(ctx: Arc<BotContext>) -> Self {
        Self { ctx }
    }

    /// Validate the cart against current data and persist the order.
    ///
    /// Nothing is written unless every check passes. The session is not
    /// touched; clearing it is up to the caller.
    pub async fn submit(&self, session: &Session, location: GeoPoint) -> Result<Order, SubmissionError> {
        let cart = &session.cart;
        let restaurant = match cart.restaurant() {
            Some(restaurant) if !cart.is_empty() => restaurant,
            _ => return Err(SubmissionError::EmptyCart),
        };

        let open = match self.ctx.repo.find_restaurant(restaurant.id).await? {
            Some(current) => self.ctx.is_open(&current).await?,
            None => false,
        };
        if !open {
            return Err(SubmissionError::RestaurantClosed(restaurant.name.clone()));
        }

        let mut irrelevant = Vec::new();
        for line in cart.lines() {
            match self.ctx.repo.find_dish(line.dish_id).await? {
                Some(dish) if dish.enabled && dish.restaurant_id == restaurant.id => {}
                _ => irrelevant.push(line.dish_id),
            }
        }
        if !irrelevant.is_empty() {
            return Err(SubmissionError::IrrelevantItems(irrelevant));
        }

        let draft = NewOrder::from_cart(session.client_id, location, cart)
            .ok_or(SubmissionError::EmptyCart)?;
        let order = self.ctx.repo.create_order(&draft, self.ctx.now()).await?;

        tracing::info!(
            order_id = order.id,
            client_id = order.client_id,
            restaurant = %order.restaurant.name,
            total = %order.total(),
            "Order placed"
        );
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::{FixedOffset, TimeZone, Utc};
    use dinebot_core::availability::Schedule;
    use dinebot_core::cart::CartLine;
    use dinebot_core::clock::FixedClock;
    use dinebot_core::memory::InMemoryRepository;
    use dinebot_core::repository::Repository;
    use rust_decimal::Decimal;

    use crate::config::Settings;

    const CLIENT: i64 = 100;

    fn point() -> GeoPoint {
        GeoPoint {
            latitude: 38.7,
            longitude: -9.1,
        }
    }

    fn workflow(repo: Arc<InMemoryRepository>) -> OrderWorkflow {
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap(),
        ));
        let settings = Settings {
            staff_chat_id: -500,
            developer_id: 1,
            manager_id: 2,
            utc_offset: FixedOffset::east_opt(0).unwrap(),
            city: "Lisbon".into(),
        };
        OrderWorkflow::new(Arc::new(BotContext::new(repo, clock, settings)))
    }

    #[tokio::test]
    async fn empty_cart_creates_no_order() {
        let repo = Arc::new(InMemoryRepository::new());
        let orders = workflow(repo.clone());

        let result = orders.submit(&Session::new(CLIENT), point()).await;

        assert_matches!(result, Err(SubmissionError::EmptyCart));
        assert!(repo.list_client_orders(CLIENT).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn restaurant_without_working_hours_is_closed() {
        let repo = Arc::new(InMemoryRepository::new());
        let restaurant = repo
            .seed_restaurant("Tasca", "EUR", true, Schedule::new())
            .await;
        let orders = workflow(repo.clone());

        let mut session = Session::new(CLIENT);
        session
            .cart
            .add_or_replace(
                &restaurant.reference(),
                CartLine {
                    dish_id: 9,
                    dish_name: "Bifana".into(),
                    unit_price: Decimal::new(450, 2),
                    quantity: 1,
                },
            )
            .unwrap();

        let result = orders.submit(&session, point()).await;

        assert_matches!(result, Err(SubmissionError::RestaurantClosed(name)) if name == "Tasca");
        assert!(repo.list_client_orders(CLIENT).await.unwrap().is_empty());
        assert_eq!(session.cart.lines().count(), 1);
    }
}
