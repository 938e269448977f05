//! Staff answer to a new order request.
//!
//! The request message in the staff chat carries a Confirm and a Cancel
//! button. Pressing either one sets the order status, records the staff
//! member and tells the client. Pressing again re-applies the decision.

use std::sync::Arc;

use dinebot_core::error::CoreError;
use dinebot_core::order::{HandshakeDecision, Order};
use dinebot_core::text;
use dinebot_core::transport::{CallbackRef, InlineButton, InlineKeyboard, MessageRef};
use dinebot_core::types::{ChatId, DbId};
use dinebot_events::OrderEvent;

use crate::context::BotContext;
use crate::effects::Transition;
use crate::error::BotError;

#[derive(Debug, thiserror::Error)]
pub enum HandshakeError {
    #[error("user {0} is not staff")]
    Forbidden(ChatId),

    #[error("order {0} not found")]
    OrderNotFound(DbId),

    #[error(transparent)]
    Store(#[from] CoreError),
}

pub struct Handshake {
    ctx: Arc<BotContext>,
}

impl Handshake {
    pub fn new(ctx: Arc<BotContext>) -> Self {
        Self { ctx }
    }

    /// Apply `decision` to the order on behalf of `actor`.
    pub async fn apply(
        &self,
        actor: ChatId,
        order_id: DbId,
        decision: HandshakeDecision,
    ) -> Result<Order, HandshakeError> {
        if self.ctx.staff_member(actor).await?.is_none() {
            return Err(HandshakeError::Forbidden(actor));
        }

        let order = self
            .ctx
            .repo
            .update_order_status(order_id, decision.status(), actor)
            .await
            .map_err(|e| match e {
                CoreError::NotFound { .. } => HandshakeError::OrderNotFound(order_id),
                other => HandshakeError::Store(other),
            })?;

        tracing::info!(
            order_id,
            staff_id = actor,
            status = %order.status,
            "Order request answered"
        );
        Ok(order)
    }

    /// Button handler for the staff request message.
    pub async fn handle(
        &self,
        actor: ChatId,
        callback: &CallbackRef,
        message: MessageRef,
        order_id: DbId,
        decision: HandshakeDecision,
    ) -> Result<Transition, BotError> {
        match self.apply(actor, order_id, decision).await {
            Ok(order) => {
                let button = InlineButton::url(
                    text::handshake_button(
                        decision == HandshakeDecision::Confirm,
                        order.status.name(),
                    ),
                    text::user_link(order.client_id),
                );
                Ok(Transition::stay()
                    .answer(callback, None, false)
                    .edit(message, None, Some(InlineKeyboard::single(button)))
                    .publish(OrderEvent::status_changed(order, actor, self.ctx.now())))
            }
            Err(HandshakeError::Forbidden(_)) => {
                Ok(Transition::stay().alert(callback, text::NOT_MANAGER))
            }
            Err(HandshakeError::OrderNotFound(_)) => Ok(Transition::stay()
                .alert(callback, text::ORDER_NOT_FOUND)
                .edit(message, None, None)),
            Err(HandshakeError::Store(e)) => Err(e.into()),
        }
    }
}
