//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] carries [`OrderEvent`]s from the order workflow and the
//! staff handshake to the notification router. It is shared via
//! `Arc<EventBus>`.

use chrono::{DateTime, Utc};
use dinebot_core::order::Order;
use dinebot_core::types::{ChatId, DbId};
use serde::Serialize;
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// OrderEvent
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OrderEventKind {
    /// A client submitted a new order; staff must confirm or cancel it.
    Placed,
    /// Staff changed the status of an order.
    StatusChanged,
}

/// Something that happened to an order.
///
/// Carries a full copy of the order as it was right after the change, so
/// subscribers never need to read it back from the store.
#[derive(Debug, Clone, Serialize)]
pub struct OrderEvent {
    pub kind: OrderEventKind,

    pub order: Order,

    /// Staff member who caused the event, unset for client actions.
    pub actor_id: Option<ChatId>,

    /// When the event was created (UTC).
    pub timestamp: DateTime<Utc>,
}

impl OrderEvent {
    pub fn placed(order: Order, at: DateTime<Utc>) -> Self {
        Self {
            kind: OrderEventKind::Placed,
            order,
            actor_id: None,
            timestamp: at,
        }
    }

    pub fn status_changed(order: Order, actor_id: ChatId, at: DateTime<Utc>) -> Self {
        Self {
            kind: OrderEventKind::StatusChanged,
            order,
            actor_id: Some(actor_id),
            timestamp: at,
        }
    }

    pub fn order_id(&self) -> DbId {
        self.order.id
    }

    /// Dot-separated event name used in logs, e.g. `"order.placed"`.
    pub fn event_type(&self) -> &'static str {
        match self.kind {
            OrderEventKind::Placed => "order.placed",
            OrderEventKind::StatusChanged => "order.status_changed",
        }
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// # Usage
///
/// ```rust,ignore
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(OrderEvent::placed(order, ctx.now()));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<OrderEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full the oldest un-consumed events are dropped and
    /// slow receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// Without subscribers the event is dropped.
    pub fn publish(&self, event: OrderEvent) {
        tracing::debug!(
            event_type = event.event_type(),
            order_id = event.order_id(),
            "Publishing order event"
        );
        // A send error only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<OrderEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use dinebot_core::catalog::RestaurantRef;
    use dinebot_core::order::OrderStatus;
    use dinebot_core::types::GeoPoint;

    fn order(id: DbId) -> Order {
        Order {
            id,
            client_id: 100,
            staff_id: None,
            status: OrderStatus::AwaitingResponse,
            location: GeoPoint {
                latitude: 41.1,
                longitude: -8.6,
            },
            restaurant: RestaurantRef {
                id: 1,
                name: "Tasca".into(),
                currency: "EUR".into(),
            },
            lines: Vec::new(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn status_change_carries_the_actor() {
        let bus = EventBus::default();
        let mut notifications = bus.subscribe();

        bus.publish(OrderEvent::status_changed(order(42), 7, Utc::now()));

        let event = notifications.recv().await.unwrap();
        assert_eq!(event.kind, OrderEventKind::StatusChanged);
        assert_eq!(event.order_id(), 42);
        assert_eq!(event.actor_id, Some(7));
        assert_eq!(event.event_type(), "order.status_changed");
    }

    #[tokio::test]
    async fn router_and_audit_subscribers_both_see_a_placed_order() {
        let bus = EventBus::default();
        let mut router = bus.subscribe();
        let mut audit = bus.subscribe();

        bus.publish(OrderEvent::placed(order(1), Utc::now()));

        assert_eq!(router.recv().await.unwrap().order_id(), 1);
        assert_eq!(audit.recv().await.unwrap().order_id(), 1);
    }

    #[test]
    fn orders_placed_before_the_router_starts_are_dropped() {
        let bus = EventBus::default();
        bus.publish(OrderEvent::placed(order(3), Utc::now()));

        let mut late = bus.subscribe();
        assert!(late.try_recv().is_err());
    }

    #[tokio::test]
    async fn slow_subscriber_observes_lag() {
        let bus = EventBus::new(2);
        let mut slow = bus.subscribe();
        for id in 1..=3 {
            bus.publish(OrderEvent::placed(order(id), Utc::now()));
        }

        assert!(matches!(
            slow.recv().await,
            Err(broadcast::error::RecvError::Lagged(1))
        ));
        assert_eq!(slow.recv().await.unwrap().order_id(), 2);
    }

    #[test]
    fn placed_event_has_no_actor() {
        let event = OrderEvent::placed(order(5), Utc::now());
        assert_eq!(event.kind, OrderEventKind::Placed);
        assert!(event.actor_id.is_none());
    }
}
