//! Per-client conversation state.
//!
//! A [`Session`] belongs to exactly one client and is only ever touched by
//! that client's dispatcher worker, so it needs no locking.

use rust_decimal::Decimal;
use serde::Serialize;

use dinebot_core::cart::Cart;
use dinebot_core::catalog::{DishCategory, RestaurantRef};
use dinebot_core::types::{ChatId, DbId};

/// Where the client is in the ordering dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DialogState {
    Idle,
    BrowsingRestaurants,
    BrowsingDishes,
    CartReview,
    AwaitingLocation,
    ViewingOrders,
    /// Only `/start` re-enters the dialog.
    Ended,
}

/// The restaurant a client is browsing, kept while in `BrowsingDishes`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrowsingContext {
    pub restaurant: RestaurantRef,
    pub categories: Vec<DishCategory>,
}

impl BrowsingContext {
    pub fn category(&self, name: &str) -> Option<&DishCategory> {
        self.categories.iter().find(|c| c.name == name)
    }
}

// ---------------------------------------------------------------------------
// Staff flows
// ---------------------------------------------------------------------------

/// A restaurant opened with `/restaurant`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManagedRestaurant {
    pub id: DbId,
    pub name: String,
    pub categories: Vec<DishCategory>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RestaurantDraft {
    pub name: Option<String>,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DishDraft {
    pub restaurant: Option<RestaurantRef>,
    pub category: Option<DishCategory>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
}

/// Multi-step staff conversation in progress.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum StaffFlow {
    ManagingRestaurant(ManagedRestaurant),
    EditingSchedule(ManagedRestaurant),
    NewRestaurant(RestaurantDraft),
    NewCategory,
    NewDish(DishDraft),
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    pub client_id: ChatId,
    pub state: DialogState,
    pub cart: Cart,
    pub browsing: Option<BrowsingContext>,
    pub staff: Option<StaffFlow>,
    /// Set once the welcome text has been shown.
    pub welcomed: bool,
}

impl Session {
    pub fn new(client_id: ChatId) -> Self {
        Self {
            client_id,
            state: DialogState::Idle,
            cart: Cart::new(),
            browsing: None,
            staff: None,
            welcomed: false,
        }
    }

    /// Drop the cart, the browsing context and any staff flow.
    pub fn reset(&mut self) {
        self.cart.clear();
        self.browsing = None;
        self.staff = None;
    }

    /// Reset and leave the dialog.
    pub fn end(&mut self) {
        self.reset();
        self.state = DialogState::Ended;
    }

    /// Whether the session holds a cart or an unfinished staff flow.
    pub fn holds_progress(&self) -> bool {
        !self.cart.is_empty() || self.staff.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dinebot_core::cart::CartLine;

    #[test]
    fn new_session_starts_idle_and_empty() {
        let session = Session::new(9);

        assert_eq!(session.state, DialogState::Idle);
        assert!(session.cart.is_empty());
        assert!(session.browsing.is_none());
        assert!(!session.welcomed);
    }

    #[test]
    fn end_clears_everything_but_identity() {
        let mut session = Session::new(9);
        session.state = DialogState::CartReview;
        session.welcomed = true;
        session.staff = Some(StaffFlow::NewCategory);
        session
            .cart
            .add_or_replace(
                &RestaurantRef {
                    id: 1,
                    name: "Tasca".into(),
                    currency: "EUR".into(),
                },
                CartLine {
                    dish_id: 3,
                    dish_name: "Bifana".into(),
                    unit_price: Decimal::new(450, 2),
                    quantity: 2,
                },
            )
            .unwrap();

        assert!(session.holds_progress());
        session.end();

        assert!(!session.holds_progress());
        assert_eq!(session.state, DialogState::Ended);
        assert!(session.cart.is_empty());
        assert!(session.staff.is_none());
        assert!(session.welcomed);
        assert_eq!(session.client_id, 9);
    }
}
