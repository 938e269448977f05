//! Catalog models: users, restaurants, dish categories, and dishes.
//!
//! Also carries the staff-entered drafts used to create catalog entries,
//! validated with the `validator` derive before they reach the store.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::types::{ChatId, DbId, Timestamp};

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// A registered client or staff member.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: ChatId,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_admin: bool,
    pub is_manager: bool,
    pub registered_at: Timestamp,
}

impl User {
    /// Staff may handle orders and manage the catalog. Admins always have
    /// manager rights.
    pub fn is_staff(&self) -> bool {
        self.is_manager || self.is_admin
    }
}

// ---------------------------------------------------------------------------
// Restaurants
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Restaurant {
    pub id: DbId,
    pub name: String,
    pub currency: String,
    /// Disabled restaurants are invisible to clients and always closed.
    pub enabled: bool,
}

impl Restaurant {
    pub fn reference(&self) -> RestaurantRef {
        RestaurantRef {
            id: self.id,
            name: self.name.clone(),
            currency: self.currency.clone(),
        }
    }
}

/// The part of a restaurant a cart or an order keeps a copy of.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestaurantRef {
    pub id: DbId,
    pub name: String,
    pub currency: String,
}

#[derive(Debug, Clone, Validate)]
pub struct NewRestaurant {
    #[validate(length(min = 1, max = 32, message = "Name is too long"))]
    pub name: String,
    #[validate(length(min = 1, max = 32, message = "Currency is too long"))]
    pub currency: String,
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DishCategory {
    pub id: DbId,
    pub name: String,
}

#[derive(Debug, Clone, Validate)]
pub struct NewDishCategory {
    #[validate(length(min = 1, max = 32, message = "Name is too long"))]
    pub name: String,
}

// ---------------------------------------------------------------------------
// Dishes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dish {
    pub id: DbId,
    pub restaurant_id: DbId,
    pub category_id: DbId,
    pub name: String,
    pub description: String,
    /// Platform file id of the dish photo, reused when sending the card.
    pub photo_file_id: Option<String>,
    pub price: Decimal,
    pub enabled: bool,
}

impl Dish {
    /// Card body shown to clients and staff: name, description, price.
    pub fn card_text(&self, currency: &str) -> String {
        format!(
            "{}\n\n{}\n\nPrice: {} {}",
            self.name, self.description, self.price, currency
        )
    }
}

#[derive(Debug, Clone, Validate)]
pub struct NewDish {
    pub restaurant_id: DbId,
    pub category_id: DbId,
    #[validate(length(min = 1, max = 32, message = "Name is too long"))]
    pub name: String,
    #[validate(length(max = 128, message = "Description is too long"))]
    pub description: String,
    #[validate(custom(function = "non_negative_price"))]
    pub price: Decimal,
    pub photo_file_id: Option<String>,
}

fn non_negative_price(price: &Decimal) -> Result<(), ValidationError> {
    if *price < Decimal::ZERO {
        let mut err = ValidationError::new("non_negative");
        err.message = Some("Price must not be negative".into());
        return Err(err);
    }
    Ok(())
}

/// Parse a staff-entered price such as `12.50` or `12`.
pub fn parse_price(input: &str) -> Result<Decimal, crate::error::CoreError> {
    let price: Decimal = input
        .trim()
        .replace(',', ".")
        .parse()
        .map_err(|e| crate::error::CoreError::Validation(format!("{e}")))?;
    non_negative_price(&price)
        .map_err(|_| crate::error::CoreError::Validation("Price must not be negative".into()))?;
    Ok(price)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::str::FromStr;

    use crate::error::CoreError;

    fn dish() -> Dish {
        Dish {
            id: 1,
            restaurant_id: 1,
            category_id: 1,
            name: "Cheeseburger".into(),
            description: "Beef, cheddar, pickles".into(),
            photo_file_id: None,
            price: Decimal::from_str("7.50").unwrap(),
            enabled: true,
        }
    }

    #[test]
    fn admin_counts_as_staff() {
        let user = User {
            id: 1,
            username: None,
            first_name: None,
            last_name: None,
            is_admin: true,
            is_manager: false,
            registered_at: chrono::Utc::now(),
        };
        assert!(user.is_staff());
    }

    #[test]
    fn card_text_includes_price_and_currency() {
        assert_eq!(
            dish().card_text("EUR"),
            "Cheeseburger\n\nBeef, cheddar, pickles\n\nPrice: 7.50 EUR"
        );
    }

    #[test]
    fn long_restaurant_name_rejected() {
        let draft = NewRestaurant {
            name: "x".repeat(33),
            currency: "EUR".into(),
        };
        let err: CoreError = draft.validate().unwrap_err().into();
        assert_matches!(err, CoreError::Validation(msg) if msg.contains("Name is too long"));
    }

    #[test]
    fn name_limit_counts_characters_not_bytes() {
        let draft = NewDishCategory {
            name: "🍔".repeat(32),
        };
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn negative_dish_price_rejected() {
        let draft = NewDish {
            restaurant_id: 1,
            category_id: 1,
            name: "Soup".into(),
            description: String::new(),
            price: Decimal::from_str("-1").unwrap(),
            photo_file_id: None,
        };
        assert!(draft.validate().is_err());
    }

    #[test]
    fn parse_price_accepts_integer_and_decimal() {
        assert_eq!(parse_price("12").unwrap(), Decimal::from(12));
        assert_eq!(parse_price(" 12.50 ").unwrap(), Decimal::from_str("12.5").unwrap());
        assert_eq!(parse_price("3,25").unwrap(), Decimal::from_str("3.25").unwrap());
    }

    #[test]
    fn parse_price_rejects_garbage_and_negatives() {
        assert_matches!(parse_price("abc"), Err(CoreError::Validation(_)));
        assert_matches!(parse_price("-3"), Err(CoreError::Validation(_)));
    }
}
