//! Staff console: order and user management, catalog editing, wizards.

mod common;

use common::{callback, command, location, text, TestBot, CLIENT, DEVELOPER, MANAGER};

use dinebot_bot::session::{Session, StaffFlow};
use dinebot_core::callback::{CallbackData, Permission};
use dinebot_core::repository::Repository;
use dinebot_core::text::{
    MANAGER_GRANTED, NOT_ADMIN, NOT_MANAGER, ORDERS_USAGE, ORDER_USAGE, PLACE_ORDER,
    RESTAURANT_EXISTS, SELF_PERMISSION, USER_NOT_FOUND,
};
use dinebot_core::transport::Content;
use rust_decimal::Decimal;

// ---------------------------------------------------------------------------
// Access
// ---------------------------------------------------------------------------

#[tokio::test]
async fn clients_are_refused() {
    let bot = TestBot::new().await;
    let mut session = bot.started(CLIENT).await;
    bot.transport.clear();

    bot.send(&mut session, command("orders", &["10"])).await;

    assert_eq!(bot.transport.texts_to(CLIENT), vec![NOT_MANAGER]);
}

#[tokio::test]
async fn revoked_staff_lose_their_flow() {
    let bot = TestBot::new().await;
    let mut session = Session::new(MANAGER);
    bot.send(&mut session, command("new_category", &[])).await;
    assert_eq!(session.staff, Some(StaffFlow::NewCategory));

    bot.repo.set_permissions(MANAGER, false, false).await.unwrap();
    bot.send(&mut session, text("Soups")).await;

    assert_eq!(session.staff, None);
    assert!(bot.repo.find_category_by_name("Soups").await.unwrap().is_none());
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

#[tokio::test]
async fn order_command_shows_details_and_location() {
    let bot = TestBot::new().await;
    let mut client = bot.with_bifanas(1).await;
    bot.send(&mut client, text(PLACE_ORDER)).await;
    bot.send(&mut client, location()).await;
    let order_id = bot.repo.list_client_orders(CLIENT).await.unwrap()[0].id;

    let mut session = Session::new(MANAGER);
    bot.send(&mut session, command("order", &[&order_id.to_string()]))
        .await;

    let sent = bot.transport.sent_to(MANAGER);
    assert_eq!(sent.len(), 2);
    assert!(matches!(sent[0].content, Content::Monospace(_)));
    assert!(matches!(sent[1].content, Content::Location(_)));
}

#[tokio::test]
async fn bad_arguments_get_usage_hints() {
    let bot = TestBot::new().await;
    let mut session = Session::new(MANAGER);

    bot.send(&mut session, command("order", &["abc"])).await;
    bot.send(&mut session, command("orders", &["0"])).await;

    assert_eq!(
        bot.transport.texts_to(MANAGER),
        vec![ORDER_USAGE, ORDERS_USAGE]
    );
}

#[tokio::test]
async fn recent_orders_arrive_as_a_document() {
    let bot = TestBot::new().await;
    let mut client = bot.with_bifanas(1).await;
    bot.send(&mut client, text(PLACE_ORDER)).await;
    bot.send(&mut client, location()).await;

    let mut session = Session::new(MANAGER);
    bot.send(&mut session, command("orders", &["5"])).await;

    let sent = bot.transport.sent_to(MANAGER);
    let Content::Document { file_name, .. } = &sent[0].content else {
        panic!("expected a document, got {:?}", sent[0].content);
    };
    assert_eq!(file_name, "orders.txt");
}

#[tokio::test]
async fn setting_a_status_records_the_actor() {
    let bot = TestBot::new().await;
    let mut client = bot.with_bifanas(1).await;
    bot.send(&mut client, text(PLACE_ORDER)).await;
    bot.send(&mut client, location()).await;
    let order_id = bot.repo.list_client_orders(CLIENT).await.unwrap()[0].id;

    let mut session = Session::new(MANAGER);
    bot.send(
        &mut session,
        callback(
            MANAGER,
            CallbackData::SetStatus {
                order_id,
                status: dinebot_core::order::OrderStatus::Completed,
            },
        ),
    )
    .await;

    let order = bot.repo.find_order(order_id).await.unwrap().unwrap();
    assert_eq!(order.status, dinebot_core::order::OrderStatus::Completed);
    assert_eq!(order.staff_id, Some(MANAGER));
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[tokio::test]
async fn admin_grants_manager_rights() {
    let bot = TestBot::new().await;
    bot.started(CLIENT).await;
    let mut session = Session::new(DEVELOPER);

    bot.send(
        &mut session,
        callback(
            DEVELOPER,
            CallbackData::TogglePermission {
                user_id: CLIENT,
                permission: Permission::Manager,
            },
        ),
    )
    .await;

    let user = bot.repo.find_user(CLIENT).await.unwrap().unwrap();
    assert!(user.is_manager);
    assert!(!user.is_admin);
    assert_eq!(
        bot.transport.answers()[0].text.as_deref(),
        Some(MANAGER_GRANTED)
    );
}

#[tokio::test]
async fn permission_changes_are_guarded() {
    let bot = TestBot::new().await;
    bot.started(CLIENT).await;
    bot.transport.clear();

    let mut admin = Session::new(DEVELOPER);
    bot.send(
        &mut admin,
        callback(
            DEVELOPER,
            CallbackData::TogglePermission {
                user_id: DEVELOPER,
                permission: Permission::Admin,
            },
        ),
    )
    .await;

    let mut manager = Session::new(MANAGER);
    bot.send(
        &mut manager,
        callback(
            MANAGER,
            CallbackData::TogglePermission {
                user_id: CLIENT,
                permission: Permission::Manager,
            },
        ),
    )
    .await;

    let answers: Vec<_> = bot
        .transport
        .answers()
        .into_iter()
        .filter_map(|a| a.text)
        .collect();
    assert_eq!(answers, vec![SELF_PERMISSION, NOT_ADMIN]);
    assert!(!bot.repo.find_user(CLIENT).await.unwrap().unwrap().is_manager);
}

#[tokio::test]
async fn user_lookup_by_username() {
    let bot = TestBot::new().await;
    bot.started(CLIENT).await;
    let mut session = Session::new(MANAGER);

    bot.send(&mut session, command("user", &["@user100"])).await;
    bot.send(&mut session, command("user", &["@nobody"])).await;

    let texts = bot.transport.texts_to(MANAGER);
    assert!(texts[0].contains("100"));
    assert_eq!(texts[1], USER_NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[tokio::test]
async fn restaurant_toggle_hides_it_from_clients() {
    let bot = TestBot::new().await;
    let mut session = Session::new(MANAGER);

    bot.send(
        &mut session,
        callback(
            MANAGER,
            CallbackData::ToggleRestaurant {
                restaurant_id: bot.tasca.id,
            },
        ),
    )
    .await;

    let restaurant = bot.repo.find_restaurant(bot.tasca.id).await.unwrap().unwrap();
    assert!(!restaurant.enabled);
}

#[tokio::test]
async fn schedule_edit_replaces_the_whole_schedule() {
    let bot = TestBot::new().await;
    let mut session = Session::new(MANAGER);

    bot.send(&mut session, command("restaurant", &["tasca"])).await;
    assert!(matches!(
        session.staff,
        Some(StaffFlow::ManagingRestaurant(ref m)) if m.id == bot.tasca.id
    ));

    bot.send(
        &mut session,
        callback(
            MANAGER,
            CallbackData::EditSchedule {
                restaurant_id: bot.tasca.id,
            },
        ),
    )
    .await;
    assert!(matches!(session.staff, Some(StaffFlow::EditingSchedule(_))));

    bot.send(&mut session, text("nonsense")).await;
    assert!(matches!(session.staff, Some(StaffFlow::EditingSchedule(_))));

    bot.send(&mut session, text("2 - 10.00 - 16.00")).await;

    let schedule = bot.repo.find_schedule(bot.tasca.id).await.unwrap();
    assert_eq!(schedule.keys().copied().collect::<Vec<_>>(), vec![2]);
    assert!(matches!(
        session.staff,
        Some(StaffFlow::ManagingRestaurant(_))
    ));
}

#[tokio::test]
async fn category_text_lists_every_dish_with_a_toggle() {
    let bot = TestBot::new().await;
    bot.repo.set_dish_enabled(bot.prego.id, false).await.unwrap();
    let mut session = Session::new(MANAGER);
    bot.send(&mut session, command("restaurant", &["Tasca"])).await;
    bot.transport.clear();

    bot.send(&mut session, text("Mains")).await;

    assert_eq!(bot.transport.sent_to(MANAGER).len(), 2);
}

#[tokio::test]
async fn new_restaurant_wizard_creates_a_disabled_restaurant() {
    let bot = TestBot::new().await;
    let mut session = Session::new(MANAGER);

    bot.send(&mut session, command("new_restaurant", &[])).await;
    bot.send(&mut session, text("Tasca")).await;
    assert_eq!(
        bot.transport.texts_to(MANAGER).last().map(String::as_str),
        Some(RESTAURANT_EXISTS)
    );

    bot.send(&mut session, text("Pizzeria")).await;
    bot.send(&mut session, text("EUR")).await;
    bot.send(&mut session, text("1 - 10.00 - 20.00\n5 - 10.00 - 00.00"))
        .await;

    assert_eq!(session.staff, None);
    let created = bot
        .repo
        .find_restaurant_by_name("pizzeria")
        .await
        .unwrap()
        .unwrap();
    assert!(!created.enabled);
    assert_eq!(created.currency, "EUR");
    assert_eq!(bot.repo.find_schedule(created.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn new_dish_wizard_creates_an_enabled_dish() {
    let bot = TestBot::new().await;
    let mut session = Session::new(MANAGER);

    bot.send(&mut session, command("new_dish", &[])).await;
    bot.send(&mut session, text("Tasca")).await;
    bot.send(&mut session, text("Mains")).await;
    bot.send(&mut session, text("Francesinha")).await;
    bot.send(&mut session, text("Porto sandwich")).await;

    bot.send(&mut session, text("twelve")).await;
    assert!(bot
        .transport
        .texts_to(MANAGER)
        .last()
        .unwrap()
        .starts_with("Error:"));

    bot.send(&mut session, text("12.50")).await;
    bot.send(&mut session, text("No")).await;

    assert_eq!(session.staff, None);
    let dishes = bot
        .repo
        .list_dishes(bot.tasca.id, bot.mains.id, true)
        .await
        .unwrap();
    let created = dishes.iter().find(|d| d.name == "Francesinha").unwrap();
    assert_eq!(created.price, Decimal::new(1250, 2));
    assert_eq!(created.description, "Porto sandwich");
    assert_eq!(created.photo_file_id, None);
}

#[tokio::test]
async fn new_dish_takes_a_photo_as_the_last_step() {
    let bot = TestBot::new().await;
    let mut session = Session::new(MANAGER);

    bot.send(&mut session, command("new_dish", &[])).await;
    for step in ["Sushi Bar", "Rolls", "Uramaki", "Inside-out roll", "1200"] {
        bot.send(&mut session, text(step)).await;
    }
    bot.send(
        &mut session,
        dinebot_core::inbound::InboundEvent::Photo {
            file_id: "AgADphoto".into(),
        },
    )
    .await;

    let dishes = bot
        .repo
        .list_dishes(bot.sushi.id, bot.rolls.id, false)
        .await
        .unwrap();
    let created = dishes.iter().find(|d| d.name == "Uramaki").unwrap();
    assert_eq!(created.photo_file_id.as_deref(), Some("AgADphoto"));
}

#[tokio::test]
async fn new_category_names_are_unique() {
    let bot = TestBot::new().await;
    let mut session = Session::new(MANAGER);

    bot.send(&mut session, command("new_category", &[])).await;
    bot.send(&mut session, text("mains")).await;
    assert_eq!(session.staff, Some(StaffFlow::NewCategory));

    bot.send(&mut session, text("Soups")).await;
    assert_eq!(session.staff, None);
    assert!(bot.repo.find_category_by_name("Soups").await.unwrap().is_some());
}
