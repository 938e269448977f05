//! Orders, their statuses, and the staff handshake decision.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::cart::{Cart, CartLine};
use crate::catalog::RestaurantRef;
use crate::types::{ChatId, DbId, GeoPoint, Timestamp};

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Order status IDs matching `order_statuses` seed data (1-based SMALLSERIAL).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum OrderStatus {
    AwaitingResponse,
    InProgress,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::AwaitingResponse,
        OrderStatus::InProgress,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    pub fn id(self) -> i16 {
        match self {
            OrderStatus::AwaitingResponse => 1,
            OrderStatus::InProgress => 2,
            OrderStatus::Completed => 3,
            OrderStatus::Cancelled => 4,
        }
    }

    pub fn from_id(id: i16) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.id() == id)
    }

    pub fn name(self) -> &'static str {
        match self {
            OrderStatus::AwaitingResponse => "Awaiting Response",
            OrderStatus::InProgress => "In Progress",
            OrderStatus::Completed => "Completed",
            OrderStatus::Cancelled => "Cancelled",
        }
    }

    /// Completed and cancelled orders are listed as past orders.
    pub fn is_past(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Staff answer to a new order request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HandshakeDecision {
    Confirm,
    Cancel,
}

impl HandshakeDecision {
    pub fn status(self) -> OrderStatus {
        match self {
            HandshakeDecision::Confirm => OrderStatus::InProgress,
            HandshakeDecision::Cancel => OrderStatus::Cancelled,
        }
    }
}

// ---------------------------------------------------------------------------
// Order
// ---------------------------------------------------------------------------

/// A line frozen at submission time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderLine {
    pub dish_id: DbId,
    pub dish_name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
}

impl OrderLine {
    pub fn subtotal(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

impl From<&CartLine> for OrderLine {
    fn from(line: &CartLine) -> Self {
        Self {
            dish_id: line.dish_id,
            dish_name: line.dish_name.clone(),
            unit_price: line.unit_price,
            quantity: line.quantity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Order {
    pub id: DbId,
    pub client_id: ChatId,
    /// Staff member who last acted on the order.
    pub staff_id: Option<ChatId>,
    pub status: OrderStatus,
    pub location: GeoPoint,
    pub restaurant: RestaurantRef,
    pub lines: Vec<OrderLine>,
    pub created_at: Timestamp,
}

impl Order {
    pub fn total(&self) -> Decimal {
        self.lines.iter().map(OrderLine::subtotal).sum()
    }
}

/// Everything needed to persist a new order.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub client_id: ChatId,
    pub location: GeoPoint,
    pub restaurant: RestaurantRef,
    pub lines: Vec<OrderLine>,
}

impl NewOrder {
    /// `None` when the cart is empty.
    pub fn from_cart(client_id: ChatId, location: GeoPoint, cart: &Cart) -> Option<Self> {
        let restaurant = cart.restaurant()?.clone();
        let lines: Vec<OrderLine> = cart.lines().map(OrderLine::from).collect();
        if lines.is_empty() {
            return None;
        }
        Some(Self {
            client_id,
            location,
            restaurant,
            lines,
        })
    }
}

/// One row of an order list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderSummary {
    pub id: DbId,
    pub created_at: Timestamp,
    pub status: OrderStatus,
    pub total: Decimal,
    pub currency: String,
}

impl From<&Order> for OrderSummary {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id,
            created_at: order.created_at,
            status: order.status,
            total: order.total(),
            currency: order.restaurant.currency.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_ids_round_trip() {
        for status in OrderStatus::ALL {
            assert_eq!(OrderStatus::from_id(status.id()), Some(status));
        }
        assert_eq!(OrderStatus::from_id(0), None);
        assert_eq!(OrderStatus::from_id(5), None);
    }

    #[test]
    fn only_completed_and_cancelled_are_past() {
        assert!(!OrderStatus::AwaitingResponse.is_past());
        assert!(!OrderStatus::InProgress.is_past());
        assert!(OrderStatus::Completed.is_past());
        assert!(OrderStatus::Cancelled.is_past());
    }

    #[test]
    fn decisions_map_to_statuses() {
        assert_eq!(HandshakeDecision::Confirm.status(), OrderStatus::InProgress);
        assert_eq!(HandshakeDecision::Cancel.status(), OrderStatus::Cancelled);
    }

    #[test]
    fn empty_cart_builds_no_order() {
        let point = GeoPoint {
            latitude: 0.0,
            longitude: 0.0,
        };
        assert!(NewOrder::from_cart(1, point, &Cart::new()).is_none());
    }

    #[test]
    fn new_order_copies_cart_lines() {
        let restaurant = RestaurantRef {
            id: 3,
            name: "Pho".into(),
            currency: "VND".into(),
        };
        let mut cart = Cart::new();
        cart.add_or_replace(
            &restaurant,
            CartLine {
                dish_id: 9,
                dish_name: "Pho Bo".into(),
                unit_price: Decimal::from(50_000),
                quantity: 2,
            },
        )
        .unwrap();

        let point = GeoPoint {
            latitude: 10.77,
            longitude: 106.7,
        };
        let order = NewOrder::from_cart(42, point, &cart).unwrap();
        assert_eq!(order.restaurant, restaurant);
        assert_eq!(order.lines.len(), 1);
        assert_eq!(order.lines[0].subtotal(), Decimal::from(100_000));
    }
}
