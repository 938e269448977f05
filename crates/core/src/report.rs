//! Plain-text tables for orders and users.
//!
//! Layout follows the common "simple" table style: a header row, a dashed
//! rule under each column, two spaces between columns, and numeric columns
//! right-aligned.

use chrono::FixedOffset;

use crate::catalog::User;
use crate::order::{Order, OrderSummary};
use crate::transport::Content;
use crate::types::Timestamp;

/// Tables with more rows than this are sent as a document.
pub const MAX_INLINE_ROWS: usize = 10;

pub const ORDER_LIST_HEADERS: [&str; 4] = ["Order Number", "Date", "Status", "Total Price"];
pub const ORDER_LINE_HEADERS: [&str; 3] = ["Name", "Quantity", "Price"];
pub const USER_HEADERS: [&str; 7] = [
    "ID",
    "Username",
    "First Name",
    "Last Name",
    "Admin",
    "Manager",
    "Date Registered",
];

const COLUMN_GAP: &str = "  ";

// ---------------------------------------------------------------------------
// Generic table
// ---------------------------------------------------------------------------

pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    fn cell(row: &[String], col: usize) -> &str {
        row.get(col).map(String::as_str).unwrap_or("")
    }

    let columns = headers.len();

    let widths: Vec<usize> = (0..columns)
        .map(|col| {
            rows.iter()
                .map(|row| cell(row, col).chars().count())
                .chain(std::iter::once(headers[col].chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let numeric: Vec<bool> = (0..columns)
        .map(|col| {
            let mut values = rows.iter().map(|row| cell(row, col)).filter(|v| !v.is_empty());
            let mut any = false;
            let all = values.all(|v| {
                any = true;
                v.parse::<f64>().is_ok()
            });
            any && all
        })
        .collect();

    let render_row = |cells: Vec<&str>| -> String {
        let padded: Vec<String> = cells
            .iter()
            .enumerate()
            .map(|(col, value)| {
                if numeric[col] {
                    format!("{value:>width$}", width = widths[col])
                } else {
                    format!("{value:<width$}", width = widths[col])
                }
            })
            .collect();
        padded.join(COLUMN_GAP).trim_end().to_string()
    };

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(render_row(headers.to_vec()));
    lines.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join(COLUMN_GAP),
    );
    for row in rows {
        lines.push(render_row((0..columns).map(|col| cell(row, col)).collect()));
    }
    lines.join("\n")
}

/// Table as a monospace message, or as a `.txt` document past
/// [`MAX_INLINE_ROWS`].
pub fn table_content(file_name: &str, caption: &str, table: String, rows: usize) -> Content {
    if rows > MAX_INLINE_ROWS {
        Content::Document {
            file_name: file_name.to_string(),
            bytes: table.into_bytes(),
            caption: Some(caption.to_string()),
        }
    } else {
        Content::Monospace(format!("{caption}\n\n{table}"))
    }
}

pub fn format_date(at: Timestamp, offset: FixedOffset) -> String {
    at.with_timezone(&offset).format("%H:%M %d.%m.%Y").to_string()
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

/// Line table with a Total row followed by the order details.
pub fn order_details(order: &Order, offset: FixedOffset) -> String {
    let currency = &order.restaurant.currency;
    let mut rows: Vec<Vec<String>> = order
        .lines
        .iter()
        .map(|line| {
            vec![
                line.dish_name.clone(),
                line.quantity.to_string(),
                format!("{} {currency}", line.unit_price),
            ]
        })
        .collect();
    rows.push(vec![
        "Total".to_string(),
        String::new(),
        format!("{} {currency}", order.total()),
    ]);

    format!(
        "{}\n\nOrder Number: {}\nRestaurant: {}\nStatus: {}\nOrder Date: {}",
        render_table(&ORDER_LINE_HEADERS, &rows),
        order.id,
        order.restaurant.name,
        order.status,
        format_date(order.created_at, offset)
    )
}

pub fn order_list_rows(orders: &[OrderSummary], offset: FixedOffset) -> Vec<Vec<String>> {
    orders
        .iter()
        .map(|o| {
            vec![
                format!("{:02}", o.id),
                format_date(o.created_at, offset),
                o.status.to_string(),
                format!("{} {}", o.total, o.currency),
            ]
        })
        .collect()
}

pub fn orders_table(orders: &[OrderSummary], offset: FixedOffset) -> String {
    render_table(&ORDER_LIST_HEADERS, &order_list_rows(orders, offset))
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

pub fn users_table(users: &[User], offset: FixedOffset) -> String {
    let rows: Vec<Vec<String>> = users
        .iter()
        .map(|u| {
            vec![
                u.id.to_string(),
                u.username.clone().unwrap_or_default(),
                u.first_name.clone().unwrap_or_default(),
                u.last_name.clone().unwrap_or_default(),
                u.is_admin.to_string(),
                u.is_manager.to_string(),
                format_date(u.registered_at, offset),
            ]
        })
        .collect();
    render_table(&USER_HEADERS, &rows)
}

/// Profile card shown by the staff `/user` command.
pub fn user_card(user: &User, offset: FixedOffset) -> String {
    format!(
        "ID: {}\nusername: {}\nfirst name: {}\nlast name: {}\ndate registered: {}",
        user.id,
        user.username.as_deref().unwrap_or("-"),
        user.first_name.as_deref().unwrap_or("-"),
        user.last_name.as_deref().unwrap_or("-"),
        format_date(user.registered_at, offset)
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    use crate::catalog::RestaurantRef;
    use crate::order::{OrderLine, OrderStatus};
    use crate::types::GeoPoint;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn numeric_columns_are_right_aligned() {
        let table = render_table(
            &["Name", "Qty"],
            &[
                vec!["Soup".into(), "2".into()],
                vec!["Cheeseburger".into(), "12".into()],
            ],
        );
        assert_eq!(
            table,
            "Name          Qty\n------------  ---\nSoup            2\nCheeseburger   12"
        );
    }

    #[test]
    fn missing_cells_render_blank() {
        let table = render_table(
            &["Name", "Phone", "Qty"],
            &[vec!["Ana".into()], vec!["Rui".into(), "912".into(), "3".into()]],
        );
        assert_eq!(
            table,
            "Name  Phone  Qty\n----  -----  ---\nAna\nRui     912    3"
        );
    }

    #[test]
    fn short_tables_stay_inline() {
        let content = table_content("orders.txt", "Orders", "t".into(), 3);
        assert_eq!(content, Content::Monospace("Orders\n\nt".into()));

        let content = table_content("orders.txt", "Orders", "t".into(), 11);
        assert!(matches!(content, Content::Document { .. }));
    }

    #[test]
    fn order_details_include_total_and_local_date() {
        let order = Order {
            id: 5,
            client_id: 1,
            staff_id: None,
            status: OrderStatus::AwaitingResponse,
            location: GeoPoint {
                latitude: 0.0,
                longitude: 0.0,
            },
            restaurant: RestaurantRef {
                id: 1,
                name: "Burger House".into(),
                currency: "EUR".into(),
            },
            lines: vec![OrderLine {
                dish_id: 1,
                dish_name: "Cheeseburger".into(),
                unit_price: Decimal::new(750, 2),
                quantity: 2,
            }],
            created_at: Utc.with_ymd_and_hms(2024, 3, 9, 21, 5, 0).unwrap(),
        };
        let text = order_details(&order, FixedOffset::east_opt(3 * 3600).unwrap());
        assert!(text.contains("Total"));
        assert!(text.contains("15.00 EUR"));
        assert!(text.ends_with("Status: Awaiting Response\nOrder Date: 00:05 10.03.2024"));
    }

    #[test]
    fn order_ids_are_zero_padded() {
        let rows = order_list_rows(
            &[OrderSummary {
                id: 7,
                created_at: Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap(),
                status: OrderStatus::Completed,
                total: Decimal::from(20),
                currency: "EUR".into(),
            }],
            utc(),
        );
        assert_eq!(rows[0][0], "07");
        assert_eq!(rows[0][1], "09:00 01.01.2024");
    }
}
