use dinebot_core::callback::CallbackData;
use dinebot_core::catalog::User;
use dinebot_core::error::CoreError;
use dinebot_core::order::{Order, OrderStatus};
use dinebot_core::report;
use dinebot_core::text::{self, CONTACT_USER, ORDERS_EMPTY, ORDERS_USAGE, ORDER_NOT_FOUND, ORDER_USAGE};
use dinebot_core::transport::{CallbackRef, Content, InlineButton, InlineKeyboard, Keyboard, MessageRef};
use dinebot_core::types::{ChatId, DbId};
use dinebot_events::OrderEvent;

use crate::context::BotContext;
use crate::effects::Transition;
use crate::error::BotError;

/// Status button plus contact links for the client and the last staff
/// member who handled the order.
pub fn order_keyboard(order: &Order) -> InlineKeyboard {
    let mut rows = vec![
        vec![InlineButton::callback(
            text::status_button(order.status.name()),
            CallbackData::ShowStatuses { order_id: order.id },
        )],
        vec![InlineButton::url(
            format!("{CONTACT_USER} ({})", order.client_id),
            text::user_link(order.client_id),
        )],
    ];
    if let Some(staff_id) = order.staff_id {
        rows.push(vec![InlineButton::url(
            format!("Contact manager ({staff_id})"),
            text::user_link(staff_id),
        )]);
    }
    InlineKeyboard::new(rows)
}

/// `/order <id>`
pub(super) async fn show_order(
    ctx: &BotContext,
    chat: ChatId,
    args: &[String],
) -> Result<Transition, BotError> {
    let Some(order_id) = args.first().and_then(|a| a.parse::<DbId>().ok()) else {
        return Ok(Transition::stay().text(chat, ORDER_USAGE));
    };
    let Some(order) = ctx.repo.find_order(order_id).await? else {
        return Ok(Transition::stay().text(chat, ORDER_NOT_FOUND));
    };

    let user_command = format!("/user {}", order.client_id);
    Ok(Transition::stay()
        .send(
            chat,
            Content::Monospace(report::order_details(&order, ctx.settings.utc_offset)),
            Some(Keyboard::Inline(order_keyboard(&order))),
        )
        .send(
            chat,
            Content::Location(order.location),
            Some(Keyboard::reply(vec![vec![user_command.as_str()]])),
        ))
}

/// `/orders <n>`
pub(super) async fn recent_orders(
    ctx: &BotContext,
    chat: ChatId,
    args: &[String],
) -> Result<Transition, BotError> {
    let Some(limit) = positive_count(args) else {
        return Ok(Transition::stay().text(chat, ORDERS_USAGE));
    };

    let orders = ctx.repo.list_recent_orders(limit).await?;
    if orders.is_empty() {
        return Ok(Transition::stay().text(chat, ORDERS_EMPTY));
    }

    let table = report::orders_table(&orders, ctx.settings.utc_offset);
    Ok(Transition::stay().send(
        chat,
        Content::Document {
            file_name: "orders.txt".into(),
            bytes: table.into_bytes(),
            caption: Some(format!("Last {limit} orders")),
        },
        None,
    ))
}

pub(super) fn show_statuses(callback: &CallbackRef, message: MessageRef, order_id: DbId) -> Transition {
    let rows = OrderStatus::ALL
        .iter()
        .map(|&status| {
            vec![InlineButton::callback(
                status.name(),
                CallbackData::SetStatus { order_id, status },
            )]
        })
        .collect();

    Transition::stay()
        .answer(callback, None, false)
        .edit(message, None, Some(InlineKeyboard::new(rows)))
}

pub(super) async fn set_status(
    ctx: &BotContext,
    actor: &User,
    callback: &CallbackRef,
    message: MessageRef,
    order_id: DbId,
    status: OrderStatus,
) -> Result<Transition, BotError> {
    let order = match ctx.repo.update_order_status(order_id, status, actor.id).await {
        Ok(order) => order,
        Err(CoreError::NotFound { .. }) => {
            return Ok(Transition::stay()
                .alert(callback, ORDER_NOT_FOUND)
                .edit(message, None, None));
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(order_id, staff_id = actor.id, %status, "Order status set");
    Ok(Transition::stay()
        .answer(callback, None, false)
        .edit(message, None, Some(order_keyboard(&order)))
        .publish(OrderEvent::status_changed(order, actor.id, ctx.now())))
}

// ---- private helpers ----

pub(super) fn positive_count(args: &[String]) -> Option<i64> {
    args.first()
        .and_then(|a| a.parse::<i64>().ok())
        .filter(|n| *n > 0)
}
