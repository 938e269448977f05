//! Staff confirm/cancel handshake and order notifications.

mod common;

use common::{callback, inbound, location, text, TestBot, CLIENT, DEVELOPER, MANAGER, STAFF_CHAT};

use dinebot_bot::notifications::NotificationRouter;
use dinebot_bot::session::Session;
use dinebot_core::callback::CallbackData;
use dinebot_core::order::{HandshakeDecision, Order, OrderStatus};
use dinebot_core::repository::Repository;
use dinebot_core::text::{
    notifications_skipped, BOT_NOT_IN_CHAT, NOT_MANAGER, ORDER_NOT_FOUND, PLACE_ORDER,
};
use dinebot_core::transport::{ButtonAction, Content, Keyboard};
use dinebot_events::{OrderEvent, OrderEventKind};

/// Place an order for two Bifanas through the client dialog.
async fn placed_order(bot: &TestBot) -> Order {
    let mut session = bot.with_bifanas(2).await;
    bot.send(&mut session, text(PLACE_ORDER)).await;
    bot.send(&mut session, location()).await;
    let id = bot.repo.list_client_orders(CLIENT).await.unwrap()[0].id;
    bot.repo.find_order(id).await.unwrap().unwrap()
}

fn decision(order_id: i64, decision: HandshakeDecision) -> CallbackData {
    CallbackData::OrderDecision { order_id, decision }
}

/// Press a handshake button in the staff chat.
async fn press(bot: &TestBot, actor: i64, data: CallbackData) {
    let mut session = Session::new(actor);
    bot.send_as(&mut session, inbound(actor, STAFF_CHAT, callback(STAFF_CHAT, data)))
        .await;
}

fn status_messages(bot: &TestBot) -> usize {
    bot.transport
        .texts_to(CLIENT)
        .iter()
        .filter(|t| t.starts_with("Status of your order"))
        .count()
}

// ---------------------------------------------------------------------------
// Handshake
// ---------------------------------------------------------------------------

#[tokio::test]
async fn confirming_twice_is_idempotent_and_notifies_twice() {
    let bot = TestBot::new().await;
    let order = placed_order(&bot).await;
    let mut events = bot.bus.subscribe();
    let router = NotificationRouter::new(bot.transport.clone(), bot.settings.clone());

    press(&bot, MANAGER, decision(order.id, HandshakeDecision::Confirm)).await;
    press(&bot, DEVELOPER, decision(order.id, HandshakeDecision::Confirm)).await;

    let stored = bot.repo.find_order(order.id).await.unwrap().unwrap();
    assert_eq!(stored.status, OrderStatus::InProgress);
    assert_eq!(stored.staff_id, Some(DEVELOPER));

    while let Ok(event) = events.try_recv() {
        assert_eq!(event.kind, OrderEventKind::StatusChanged);
        router.route_event(&event).await.unwrap();
    }
    assert_eq!(status_messages(&bot), 2);
}

#[tokio::test]
async fn decision_replaces_the_keyboard_with_a_user_link() {
    let bot = TestBot::new().await;
    let order = placed_order(&bot).await;
    bot.transport.clear();

    press(&bot, MANAGER, decision(order.id, HandshakeDecision::Cancel)).await;

    let edits = bot.transport.edits();
    assert_eq!(edits.len(), 1);
    let keyboard = edits[0].keyboard.as_ref().unwrap();
    assert_eq!(keyboard.rows.len(), 1);
    let button = &keyboard.rows[0][0];
    assert!(button.text.contains("Cancelled"));
    assert_eq!(
        button.action,
        ButtonAction::Url(format!("tg://user?id={CLIENT}"))
    );

    let stored = bot.repo.find_order(order.id).await.unwrap().unwrap();
    assert_eq!(stored.status, OrderStatus::Cancelled);
}

#[tokio::test]
async fn non_staff_cannot_answer_requests() {
    let bot = TestBot::new().await;
    let order = placed_order(&bot).await;
    bot.transport.clear();

    press(&bot, CLIENT, decision(order.id, HandshakeDecision::Confirm)).await;

    let answers = bot.transport.answers();
    assert_eq!(answers.len(), 1);
    assert_eq!(answers[0].text.as_deref(), Some(NOT_MANAGER));
    assert!(answers[0].alert);

    let stored = bot.repo.find_order(order.id).await.unwrap().unwrap();
    assert_eq!(stored.status, OrderStatus::AwaitingResponse);
    assert_eq!(stored.staff_id, None);
}

#[tokio::test]
async fn unknown_order_removes_the_buttons() {
    let bot = TestBot::new().await;

    press(&bot, MANAGER, decision(9999, HandshakeDecision::Confirm)).await;

    assert_eq!(
        bot.transport.answers()[0].text.as_deref(),
        Some(ORDER_NOT_FOUND)
    );
    let edits = bot.transport.edits();
    assert_eq!(edits.len(), 1);
    assert!(edits[0].keyboard.is_none());
}

// ---------------------------------------------------------------------------
// Notification routing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn new_order_request_goes_to_the_staff_chat() {
    let bot = TestBot::new().await;
    let order = placed_order(&bot).await;
    let router = NotificationRouter::new(bot.transport.clone(), bot.settings.clone());

    router.route_event(&OrderEvent::placed(order.clone(), bot.ctx.now())).await.unwrap();

    let sent = bot.transport.sent_to(STAFF_CHAT);
    assert_eq!(sent.len(), 2);
    assert!(matches!(sent[0].content, Content::Monospace(_)));
    let Some(Keyboard::Inline(keyboard)) = &sent[0].keyboard else {
        panic!("request without inline keyboard");
    };
    assert_eq!(
        keyboard.callbacks().cloned().collect::<Vec<_>>(),
        vec![
            decision(order.id, HandshakeDecision::Confirm),
            decision(order.id, HandshakeDecision::Cancel),
        ]
    );
    assert_eq!(sent[1].content, Content::Location(order.location));
    assert!(bot.transport.sent_to(DEVELOPER).is_empty());
}

#[tokio::test]
async fn request_falls_back_to_the_developer_when_bot_left_the_staff_chat() {
    let bot = TestBot::new().await;
    let order = placed_order(&bot).await;
    bot.transport.close_chats();
    let router = NotificationRouter::new(bot.transport.clone(), bot.settings.clone());

    router.route_event(&OrderEvent::placed(order, bot.ctx.now())).await.unwrap();

    assert!(bot.transport.sent_to(STAFF_CHAT).is_empty());
    let to_developer = bot.transport.sent_to(DEVELOPER);
    assert_eq!(to_developer.len(), 3);
    assert_eq!(to_developer[0].content, Content::text(BOT_NOT_IN_CHAT));
    assert!(matches!(to_developer[1].content, Content::Monospace(_)));
}

#[tokio::test]
async fn request_falls_back_to_the_developer_when_delivery_fails() {
    let bot = TestBot::new().await;
    let order = placed_order(&bot).await;
    bot.transport.fail_chat(STAFF_CHAT);
    let router = NotificationRouter::new(bot.transport.clone(), bot.settings.clone());

    router.route_event(&OrderEvent::placed(order.clone(), bot.ctx.now())).await.unwrap();

    let texts = bot.transport.texts_to(DEVELOPER);
    assert!(texts[0].contains(&STAFF_CHAT.to_string()));
    assert!(texts[1].contains("Bifana"));

    // The order itself is untouched by delivery problems.
    let stored = bot.repo.find_order(order.id).await.unwrap().unwrap();
    assert_eq!(stored.status, OrderStatus::AwaitingResponse);
}

#[tokio::test]
async fn skipped_events_are_reported_to_the_developer() {
    let bot = TestBot::new().await;
    let order = placed_order(&bot).await;
    let bus = dinebot_events::EventBus::new(1);
    let receiver = bus.subscribe();
    let router = NotificationRouter::new(bot.transport.clone(), bot.settings.clone());

    // The second event overwrites the first before the router reads.
    bus.publish(OrderEvent::placed(order.clone(), bot.ctx.now()));
    bus.publish(OrderEvent::status_changed(order, MANAGER, bot.ctx.now()));
    drop(bus);
    router.run(receiver).await;

    assert_eq!(
        bot.transport.texts_to(DEVELOPER),
        vec![notifications_skipped(1)]
    );
    assert!(bot.transport.sent_to(STAFF_CHAT).is_empty());
    assert_eq!(status_messages(&bot), 1);
}

#[tokio::test]
async fn published_events_carry_the_clock_time() {
    let bot = TestBot::new().await;
    let mut events = bot.bus.subscribe();
    let order = placed_order(&bot).await;

    let placed = events.try_recv().unwrap();
    assert_eq!(placed.kind, OrderEventKind::Placed);
    assert_eq!(placed.timestamp, bot.ctx.now());

    let later = bot.ctx.now() + chrono::Duration::minutes(5);
    bot.clock.set(later);
    press(&bot, MANAGER, decision(order.id, HandshakeDecision::Confirm)).await;

    let changed = events.try_recv().unwrap();
    assert_eq!(changed.actor_id, Some(MANAGER));
    assert_eq!(changed.timestamp, later);
}

#[tokio::test]
async fn router_loop_stops_when_the_bus_closes() {
    let bot = TestBot::new().await;
    let order = placed_order(&bot).await;
    let bus = dinebot_events::EventBus::default();
    let router = NotificationRouter::new(bot.transport.clone(), bot.settings.clone());
    let handle = tokio::spawn(router.run(bus.subscribe()));

    bus.publish(OrderEvent::status_changed(order, MANAGER, bot.ctx.now()));
    drop(bus);
    handle.await.unwrap();

    assert_eq!(status_messages(&bot), 1);
}
