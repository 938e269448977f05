//! Order and order line rows.

use dinebot_core::catalog::RestaurantRef;
use dinebot_core::error::CoreError;
use dinebot_core::order::{Order, OrderLine, OrderStatus, OrderSummary};
use dinebot_core::types::{ChatId, DbId, GeoPoint, Timestamp};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `orders` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OrderRow {
    pub id: DbId,
    pub client_id: ChatId,
    pub staff_id: Option<ChatId>,
    pub status_id: i16,
    pub latitude: f64,
    pub longitude: f64,
    pub restaurant_id: DbId,
    pub restaurant_name: String,
    pub currency: String,
    pub created_at: Timestamp,
}

/// A row from the `order_lines` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OrderLineRow {
    pub dish_id: DbId,
    pub dish_name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
}

/// One order with its computed total, as returned by the list queries.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OrderSummaryRow {
    pub id: DbId,
    pub created_at: Timestamp,
    pub status_id: i16,
    pub total: Decimal,
    pub currency: String,
}

fn status(id: i16) -> Result<OrderStatus, CoreError> {
    OrderStatus::from_id(id).ok_or_else(|| CoreError::Internal(format!("unknown order status {id}")))
}

impl OrderRow {
    pub fn into_order(self, lines: Vec<OrderLineRow>) -> Result<Order, CoreError> {
        let lines = lines
            .into_iter()
            .map(|line| {
                Ok(OrderLine {
                    dish_id: line.dish_id,
                    dish_name: line.dish_name,
                    unit_price: line.unit_price,
                    quantity: u32::try_from(line.quantity).map_err(|_| {
                        CoreError::Internal(format!("negative quantity on order {}", self.id))
                    })?,
                })
            })
            .collect::<Result<Vec<_>, CoreError>>()?;

        Ok(Order {
            id: self.id,
            client_id: self.client_id,
            staff_id: self.staff_id,
            status: status(self.status_id)?,
            location: GeoPoint {
                latitude: self.latitude,
                longitude: self.longitude,
            },
            restaurant: RestaurantRef {
                id: self.restaurant_id,
                name: self.restaurant_name,
                currency: self.currency,
            },
            lines,
            created_at: self.created_at,
        })
    }
}

impl TryFrom<OrderSummaryRow> for OrderSummary {
    type Error = CoreError;

    fn try_from(row: OrderSummaryRow) -> Result<Self, Self::Error> {
        Ok(OrderSummary {
            id: row.id,
            created_at: row.created_at,
            status: status(row.status_id)?,
            total: row.total,
            currency: row.currency,
        })
    }
}
