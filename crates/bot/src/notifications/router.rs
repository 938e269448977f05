//! Event-to-message routing.

use std::sync::Arc;

use tokio::sync::broadcast;

use dinebot_core::callback::CallbackData;
use dinebot_core::order::{HandshakeDecision, Order};
use dinebot_core::report;
use dinebot_core::text::{self, BOT_NOT_IN_CHAT, CANCEL, CHAT_WITH_USER, CONFIRM};
use dinebot_core::transport::{
    Content, InlineButton, InlineKeyboard, Keyboard, Transport, TransportError,
};
use dinebot_core::types::ChatId;
use dinebot_events::{OrderEvent, OrderEventKind};

use crate::config::Settings;

/// Confirm/cancel buttons plus a link to the client.
pub fn request_keyboard(order: &Order) -> InlineKeyboard {
    InlineKeyboard::new(vec![
        vec![
            InlineButton::callback(
                CONFIRM,
                CallbackData::OrderDecision {
                    order_id: order.id,
                    decision: HandshakeDecision::Confirm,
                },
            ),
            InlineButton::callback(
                CANCEL,
                CallbackData::OrderDecision {
                    order_id: order.id,
                    decision: HandshakeDecision::Cancel,
                },
            ),
        ],
        vec![InlineButton::url(CHAT_WITH_USER, text::user_link(order.client_id))],
    ])
}

/// Delivers order events as chat messages.
///
/// Delivery failures never touch the order itself: the order is already
/// stored by the time its event is published.
pub struct NotificationRouter {
    transport: Arc<dyn Transport>,
    settings: Settings,
}

impl NotificationRouter {
    pub fn new(transport: Arc<dyn Transport>, settings: Settings) -> Self {
        Self {
            transport,
            settings,
        }
    }

    /// Run the main routing loop.
    ///
    /// The loop exits when the channel is closed (i.e. the
    /// [`EventBus`](dinebot_events::EventBus) is dropped).
    pub async fn run(self, mut receiver: broadcast::Receiver<OrderEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if let Err(e) = self.route_event(&event).await {
                        tracing::error!(
                            error = %e,
                            event_type = event.event_type(),
                            order_id = event.order_id(),
                            "Failed to route event"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Notification router lagged");
                    self.report(&text::notifications_skipped(n)).await;
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, notification router shutting down");
                    break;
                }
            }
        }
    }

    /// Route a single event.
    pub async fn route_event(&self, event: &OrderEvent) -> Result<(), TransportError> {
        match event.kind {
            OrderEventKind::Placed => self.deliver_request(&event.order).await,
            OrderEventKind::StatusChanged => {
                let order = &event.order;
                self.transport
                    .send(
                        order.client_id,
                        &Content::text(text::order_status_changed(order.id, order.status.name())),
                        None,
                    )
                    .await?;
                Ok(())
            }
        }
    }

    /// Send the handshake request to the staff chat, or to the developer
    /// when the staff chat is unusable.
    async fn deliver_request(&self, order: &Order) -> Result<(), TransportError> {
        let target = self.request_target().await;

        match self.send_request(target, order).await {
            Ok(()) => {
                tracing::info!(order_id = order.id, chat = target, "Order request delivered");
                Ok(())
            }
            Err(e) if target != self.settings.developer_id => {
                tracing::warn!(
                    error = %e,
                    order_id = order.id,
                    chat = target,
                    "Order request failed, falling back to developer"
                );
                self.report(&e.to_string()).await;
                self.send_request(self.settings.developer_id, order).await
            }
            Err(e) => Err(e),
        }
    }

    /// The staff chat when the bot can post there, the developer otherwise.
    async fn request_target(&self) -> ChatId {
        let staff = self.settings.staff_chat_id;
        match self.transport.can_post(staff).await {
            Ok(true) => staff,
            Ok(false) => {
                tracing::warn!(chat = staff, "Bot cannot post to the staff chat");
                self.report(BOT_NOT_IN_CHAT).await;
                self.settings.developer_id
            }
            Err(e) => {
                tracing::warn!(error = %e, chat = staff, "Staff chat check failed");
                self.report(&e.to_string()).await;
                self.settings.developer_id
            }
        }
    }

    async fn send_request(&self, chat: ChatId, order: &Order) -> Result<(), TransportError> {
        let details = report::order_details(order, self.settings.utc_offset);
        self.transport
            .send(
                chat,
                &Content::Monospace(details),
                Some(&Keyboard::Inline(request_keyboard(order))),
            )
            .await?;
        self.transport
            .send(chat, &Content::Location(order.location), None)
            .await?;
        Ok(())
    }

    /// Best-effort diagnostic for the developer.
    async fn report(&self, diagnostic: &str) {
        let developer = self.settings.developer_id;
        if let Err(e) = self
            .transport
            .send(developer, &Content::text(diagnostic), None)
            .await
        {
            tracing::error!(error = %e, chat = developer, "Failed to report to developer");
        }
    }
}
