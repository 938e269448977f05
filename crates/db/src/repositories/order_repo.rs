//! Repository for the `orders` and `order_lines` tables.

use dinebot_core::order::{NewOrder, OrderStatus};
use dinebot_core::types::{ChatId, DbId, Timestamp};
use sqlx::PgPool;

use crate::models::order::{OrderLineRow, OrderRow, OrderSummaryRow};

/// Column list for `orders` queries.
const COLUMNS: &str = "id, client_id, staff_id, status_id, latitude, longitude, \
                       restaurant_id, restaurant_name, currency, created_at";

/// Summary projection shared by the list queries.
const SUMMARY_SELECT: &str = "SELECT o.id, o.created_at, o.status_id, \
        COALESCE(SUM(l.unit_price * l.quantity), 0) AS total, o.currency \
     FROM orders o LEFT JOIN order_lines l ON l.order_id = o.id";

pub struct OrderRepo;

impl OrderRepo {
    /// Insert the order and all of its lines in one transaction.
    pub async fn create(
        pool: &PgPool,
        input: &NewOrder,
        now: Timestamp,
    ) -> Result<(OrderRow, Vec<OrderLineRow>), sqlx::Error> {
        let mut tx = pool.begin().await?;

        let insert_query = format!(
            "INSERT INTO orders \
                (client_id, status_id, latitude, longitude, restaurant_id, restaurant_name, currency, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {COLUMNS}"
        );
        let order = sqlx::query_as::<_, OrderRow>(&insert_query)
            .bind(input.client_id)
            .bind(OrderStatus::AwaitingResponse.id())
            .bind(input.location.latitude)
            .bind(input.location.longitude)
            .bind(input.restaurant.id)
            .bind(&input.restaurant.name)
            .bind(&input.restaurant.currency)
            .bind(now)
            .fetch_one(&mut *tx)
            .await?;

        let mut lines = Vec::with_capacity(input.lines.len());
        for line in &input.lines {
            let quantity = i32::try_from(line.quantity)
                .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;
            let row = sqlx::query_as::<_, OrderLineRow>(
                "INSERT INTO order_lines (order_id, dish_id, dish_name, unit_price, quantity) \
                 VALUES ($1, $2, $3, $4, $5) \
                 RETURNING dish_id, dish_name, unit_price, quantity",
            )
            .bind(order.id)
            .bind(line.dish_id)
            .bind(&line.dish_name)
            .bind(line.unit_price)
            .bind(quantity)
            .fetch_one(&mut *tx)
            .await?;
            lines.push(row);
        }

        tx.commit().await?;
        Ok((order, lines))
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<OrderRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM orders WHERE id = $1");
        sqlx::query_as::<_, OrderRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_lines(pool: &PgPool, order_id: DbId) -> Result<Vec<OrderLineRow>, sqlx::Error> {
        sqlx::query_as::<_, OrderLineRow>(
            "SELECT dish_id, dish_name, unit_price, quantity FROM order_lines \
             WHERE order_id = $1 ORDER BY dish_name",
        )
        .bind(order_id)
        .fetch_all(pool)
        .await
    }

    /// A client's orders, newest first.
    pub async fn list_for_client(
        pool: &PgPool,
        client_id: ChatId,
    ) -> Result<Vec<OrderSummaryRow>, sqlx::Error> {
        let query = format!(
            "{SUMMARY_SELECT} WHERE o.client_id = $1 \
             GROUP BY o.id ORDER BY o.created_at DESC, o.id DESC"
        );
        sqlx::query_as::<_, OrderSummaryRow>(&query)
            .bind(client_id)
            .fetch_all(pool)
            .await
    }

    /// Most recent orders of all clients, newest first.
    pub async fn list_recent(pool: &PgPool, limit: i64) -> Result<Vec<OrderSummaryRow>, sqlx::Error> {
        let query = format!(
            "{SUMMARY_SELECT} GROUP BY o.id ORDER BY o.created_at DESC, o.id DESC LIMIT $1"
        );
        sqlx::query_as::<_, OrderSummaryRow>(&query)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    pub async fn update_status(
        pool: &PgPool,
        id: DbId,
        status: OrderStatus,
        staff_id: ChatId,
    ) -> Result<Option<OrderRow>, sqlx::Error> {
        let query = format!(
            "UPDATE orders SET status_id = $2, staff_id = $3 WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, OrderRow>(&query)
            .bind(id)
            .bind(status.id())
            .bind(staff_id)
            .fetch_optional(pool)
            .await
    }
}
