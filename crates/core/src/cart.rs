//! Per-session shopping cart.
//!
//! A cart is either empty or holds lines from exactly one restaurant.
//! Adding a dish from another restaurant is refused rather than silently
//! clearing the cart; the caller decides what to ask the client.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::catalog::RestaurantRef;
use crate::types::DbId;

/// Largest quantity a single line may hold.
pub const MAX_QUANTITY: u32 = 60;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CartError {
    #[error("cart holds items from {current}, cannot add items from {requested}")]
    RestaurantMismatch { current: String, requested: String },

    #[error("quantity {0} is outside 1..=60")]
    QuantityOutOfRange(u32),

    #[error("dish {0} is not in the cart")]
    LineNotFound(DbId),
}

/// A dish in the cart. Name and price are captured when the dish is added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartLine {
    pub dish_id: DbId,
    pub dish_name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
}

impl CartLine {
    pub fn subtotal(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Cart {
    restaurant: Option<RestaurantRef>,
    lines: BTreeMap<DbId, CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The restaurant of the current lines, `None` while the cart is empty.
    pub fn restaurant(&self) -> Option<&RestaurantRef> {
        self.restaurant.as_ref()
    }

    pub fn lines(&self) -> impl Iterator<Item = &CartLine> {
        self.lines.values()
    }

    pub fn line(&self, dish_id: DbId) -> Option<&CartLine> {
        self.lines.get(&dish_id)
    }

    /// True when adding from `restaurant_id` would mix restaurants.
    pub fn conflicts_with(&self, restaurant_id: DbId) -> bool {
        self.restaurant
            .as_ref()
            .is_some_and(|current| !self.is_empty() && current.id != restaurant_id)
    }

    /// Insert a line or replace the existing line for the same dish.
    pub fn add_or_replace(
        &mut self,
        restaurant: &RestaurantRef,
        line: CartLine,
    ) -> Result<(), CartError> {
        if !(1..=MAX_QUANTITY).contains(&line.quantity) {
            return Err(CartError::QuantityOutOfRange(line.quantity));
        }
        if let Some(current) = self.restaurant.as_ref() {
            if self.conflicts_with(restaurant.id) {
                return Err(CartError::RestaurantMismatch {
                    current: current.name.clone(),
                    requested: restaurant.name.clone(),
                });
            }
        }

        self.restaurant = Some(restaurant.clone());
        self.lines.insert(line.dish_id, line);
        Ok(())
    }

    pub fn remove(&mut self, dish_id: DbId) -> Option<CartLine> {
        let removed = self.lines.remove(&dish_id);
        if self.lines.is_empty() {
            self.restaurant = None;
        }
        removed
    }

    /// Set the quantity of an existing line. Zero removes the line.
    pub fn set_quantity(&mut self, dish_id: DbId, quantity: u32) -> Result<(), CartError> {
        if quantity > MAX_QUANTITY {
            return Err(CartError::QuantityOutOfRange(quantity));
        }
        if !self.lines.contains_key(&dish_id) {
            return Err(CartError::LineNotFound(dish_id));
        }

        if quantity == 0 {
            self.remove(dish_id);
        } else if let Some(line) = self.lines.get_mut(&dish_id) {
            line.quantity = quantity;
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.restaurant = None;
    }

    pub fn snapshot(&self) -> Cart {
        self.clone()
    }

    pub fn total(&self) -> Decimal {
        self.lines.values().map(CartLine::subtotal).sum()
    }

    /// Cart listing used by the cart view and the checkout prompt.
    ///
    /// ```text
    /// 🛒 Cart
    ///
    /// Burger House:
    /// Cheeseburger x2: 15.00 EUR
    /// ```
    pub fn summary(&self) -> String {
        let Some(restaurant) = self.restaurant.as_ref() else {
            return String::new();
        };
        let mut text = format!("{}\n\n{}:\n", crate::text::CART, restaurant.name);
        for line in self.lines.values() {
            text.push_str(&format!(
                "{} x{}: {} {}\n",
                line.dish_name,
                line.quantity,
                line.subtotal(),
                restaurant.currency
            ));
        }
        text
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
