use std::sync::Arc;

use dinebot_core::availability::closed_notice;
use dinebot_core::callback::CallbackData;
use dinebot_core::cart::{CartError, CartLine, MAX_QUANTITY};
use dinebot_core::catalog::{Dish, DishCategory, Restaurant, RestaurantRef};
use dinebot_core::inbound::{Inbound, InboundEvent};
use dinebot_core::paginator::FIRST_CURSOR;
use dinebot_core::report;
use dinebot_core::text::{
    ABOUT_US, ABOUT_US_TEXT, BACK_TO_MENU, BACK_TO_RESTAURANT, CART, CART_CHANGED,
    CART_ANOTHER_RESTAURANT, CART_IS_EMPTY, CART_NOT_CHANGED, CHOOSE_RESTAURANT,
    COME_AGAIN, CONTACT_MANAGER, CURRENT_ORDERS, DISH_UNAVAILABLE, EMPTY_THE_CART, ENTER_ORDER,
    INPUT_VALUE, IRRELEVANT_ITEMS, MY_ORDERS, NO_ORDERS, ORDER_CONFIRMATION, ORDER_NOT_FOUND,
    PAST_ORDERS, PLACE_ORDER, RESTAURANT_CLOSED, SELECT_DISH_TO_CHANGE, SELECT_QUANTITY,
    TOTAL_PRICE, UNCAUGHT_CALLBACK, WELCOME,
};
use dinebot_core::text;
use dinebot_core::transport::{CallbackRef, Content, InlineButton, InlineKeyboard, Keyboard, MessageRef};
use dinebot_core::types::{ChatId, DbId, GeoPoint};
use dinebot_events::OrderEvent;

use super::{dish_content, keyboard_unavailable, keyboards, not_recognized};
use crate::context::BotContext;
use crate::effects::Transition;
use crate::error::BotError;
use crate::session::{BrowsingContext, DialogState, Session};
use crate::workflow::{OrderWorkflow, SubmissionError};

/// Result of re-reading a dish at press time.
enum Availability {
    Orderable(Dish, Restaurant),
    Unavailable(&'static str),
}

/// Client-facing state machine.
///
/// `handle` never performs I/O besides store reads and writes; everything
/// the client should see comes back as effects.
pub struct DialogEngine {
    ctx: Arc<BotContext>,
    orders: OrderWorkflow,
}

impl DialogEngine {
    pub fn new(ctx: Arc<BotContext>) -> Self {
        Self {
            orders: OrderWorkflow::new(Arc::clone(&ctx)),
            ctx,
        }
    }

    pub async fn handle(
        &self,
        session: &mut Session,
        inbound: &Inbound,
    ) -> Result<Transition, BotError> {
        let chat = inbound.chat;

        if inbound.event.is_command("start") {
            return self.start(session, inbound).await;
        }
        if session.state == DialogState::Ended {
            return Ok(ended(inbound));
        }

        match &inbound.event {
            InboundEvent::Text(text) => self.on_text(session, chat, text).await,
            InboundEvent::Location(point) => self.on_location(session, chat, *point).await,
            InboundEvent::Callback {
                callback,
                message,
                data: Some(data),
            } => self.on_callback(session, callback, *message, data).await,
            InboundEvent::Callback {
                callback,
                message,
                data: None,
            } => Ok(keyboard_unavailable(callback, *message)),
            InboundEvent::Command { .. } | InboundEvent::Photo { .. } | InboundEvent::Unsupported => {
                Ok(not_recognized(chat))
            }
        }
    }

    /// `/start`: refresh the profile, greet first-time clients and show the
    /// lobby. The cart survives a restart of the dialog.
    async fn start(&self, session: &mut Session, inbound: &Inbound) -> Result<Transition, BotError> {
        let is_new = self
            .ctx
            .repo
            .upsert_user(&inbound.client, self.ctx.now())
            .await?;

        session.staff = None;
        let mut transition = Transition::stay();
        if is_new || !session.welcomed {
            session.welcomed = true;
            transition = transition.text(inbound.chat, WELCOME);
        }
        Ok(transition.extend(lobby(session, inbound.chat)))
    }

    // -----------------------------------------------------------------------
    // Text input
    // -----------------------------------------------------------------------

    async fn on_text(
        &self,
        session: &mut Session,
        chat: ChatId,
        text: &str,
    ) -> Result<Transition, BotError> {
        match text {
            BACK_TO_MENU => return Ok(lobby(session, chat)),
            CART => return Ok(show_cart(session, chat)),
            PLACE_ORDER => return Ok(checkout(session, chat)),
            _ => {}
        }

        match session.state {
            DialogState::Idle => self.lobby_choice(session, chat, text).await,
            DialogState::BrowsingRestaurants => self.choose_restaurant(session, chat, text).await,
            DialogState::BrowsingDishes => self.choose_category(session, chat, text).await,
            DialogState::CartReview if text == EMPTY_THE_CART => {
                session.cart.clear();
                Ok(Transition::to(DialogState::Idle).send(
                    chat,
                    Content::text(CART_IS_EMPTY),
                    Some(keyboards::lobby()),
                ))
            }
            DialogState::ViewingOrders => self.show_order(session, chat, text).await,
            DialogState::CartReview | DialogState::AwaitingLocation | DialogState::Ended => {
                Ok(not_recognized(chat))
            }
        }
    }

    async fn lobby_choice(
        &self,
        session: &mut Session,
        chat: ChatId,
        text: &str,
    ) -> Result<Transition, BotError> {
        match text {
            CHOOSE_RESTAURANT => self.restaurant_list(session, chat).await,
            ABOUT_US => {
                let contact = InlineButton::url(
                    CONTACT_MANAGER,
                    text::user_link(self.ctx.settings.manager_id),
                );
                Ok(Transition::stay().send(
                    chat,
                    Content::text(ABOUT_US_TEXT),
                    Some(Keyboard::Inline(InlineKeyboard::single(contact))),
                ))
            }
            MY_ORDERS => self.order_history(session, chat).await,
            _ => Ok(not_recognized(chat)),
        }
    }

    async fn restaurant_list(&self, session: &mut Session, chat: ChatId) -> Result<Transition, BotError> {
        let names: Vec<String> = self
            .ctx
            .repo
            .list_restaurants(true)
            .await?
            .into_iter()
            .map(|r| r.name)
            .collect();

        session.browsing = None;
        Ok(Transition::to(DialogState::BrowsingRestaurants).send(
            chat,
            Content::text(INPUT_VALUE),
            Some(keyboards::restaurants(&names)),
        ))
    }

    async fn choose_restaurant(
        &self,
        session: &mut Session,
        chat: ChatId,
        text: &str,
    ) -> Result<Transition, BotError> {
        let restaurant = self
            .ctx
            .repo
            .list_restaurants(true)
            .await?
            .into_iter()
            .find(|r| r.name == text);

        let Some(restaurant) = restaurant else {
            return Ok(not_recognized(chat));
        };

        let categories = self
            .ctx
            .repo
            .list_restaurant_categories(restaurant.id, true)
            .await?;
        let schedule = self.ctx.repo.find_schedule(restaurant.id).await?;

        let mut transition = Transition::to(DialogState::BrowsingDishes);
        if !self.ctx.gate.is_open(&schedule, self.ctx.now()) {
            transition = transition.text(chat, closed_notice(&schedule));
        }

        let names: Vec<String> = categories.iter().map(|c| c.name.clone()).collect();
        tracing::debug!(
            client_id = session.client_id,
            restaurant_id = restaurant.id,
            "Browsing restaurant"
        );
        session.browsing = Some(BrowsingContext {
            restaurant: restaurant.reference(),
            categories,
        });

        Ok(transition.send(
            chat,
            Content::text(restaurant.name),
            Some(keyboards::categories(&names)),
        ))
    }

    async fn choose_category(
        &self,
        session: &mut Session,
        chat: ChatId,
        text: &str,
    ) -> Result<Transition, BotError> {
        if text == BACK_TO_RESTAURANT {
            return self.restaurant_list(session, chat).await;
        }

        let Some(browsing) = session.browsing.as_ref() else {
            return self.restaurant_list(session, chat).await;
        };
        let Some(category) = browsing.category(text) else {
            return Ok(not_recognized(chat));
        };

        self.dish_cards(session, chat, &browsing.restaurant, category)
            .await
    }

    /// One card per enabled dish. Cards get a button only while the
    /// restaurant is open.
    async fn dish_cards(
        &self,
        session: &Session,
        chat: ChatId,
        restaurant: &RestaurantRef,
        category: &DishCategory,
    ) -> Result<Transition, BotError> {
        let open = match self.ctx.repo.find_restaurant(restaurant.id).await? {
            Some(current) => self.ctx.is_open(&current).await?,
            None => false,
        };
        let dishes = self
            .ctx
            .repo
            .list_dishes(restaurant.id, category.id, true)
            .await?;

        if dishes.is_empty() {
            return Ok(Transition::stay().text(chat, DISH_UNAVAILABLE));
        }

        let mut transition = Transition::stay();
        for dish in &dishes {
            let keyboard = open.then(|| {
                Keyboard::Inline(keyboards::dish_card(
                    &session.cart,
                    dish.id,
                    &restaurant.currency,
                ))
            });
            transition = transition.send(chat, dish_content(dish, &restaurant.currency), keyboard);
        }
        Ok(transition)
    }

    // -----------------------------------------------------------------------
    // Orders
    // -----------------------------------------------------------------------

    async fn order_history(&self, session: &mut Session, chat: ChatId) -> Result<Transition, BotError> {
        let orders = self.ctx.repo.list_client_orders(session.client_id).await?;
        if orders.is_empty() {
            return Ok(Transition::stay().text(chat, NO_ORDERS));
        }

        let offset = self.ctx.settings.utc_offset;
        let (past, current): (Vec<_>, Vec<_>) =
            orders.iter().cloned().partition(|o| o.status.is_past());

        let mut transition = Transition::to(DialogState::ViewingOrders);
        for (caption, list) in [(PAST_ORDERS, &past), (CURRENT_ORDERS, &current)] {
            if list.is_empty() {
                continue;
            }
            let table = report::orders_table(list, offset);
            transition = transition.send(
                chat,
                report::table_content("orders.txt", caption, table, list.len()),
                None,
            );
        }

        session.browsing = None;
        let ids: Vec<DbId> = orders.iter().map(|o| o.id).collect();
        Ok(transition.send(
            chat,
            Content::text(ENTER_ORDER),
            Some(keyboards::order_numbers(&ids)),
        ))
    }

    async fn show_order(
        &self,
        session: &Session,
        chat: ChatId,
        text: &str,
    ) -> Result<Transition, BotError> {
        let Ok(order_id) = text.trim().parse::<DbId>() else {
            return Ok(not_recognized(chat));
        };

        let order = self
            .ctx
            .repo
            .find_order(order_id)
            .await?
            .filter(|o| o.client_id == session.client_id);

        Ok(match order {
            Some(order) => Transition::stay().send(
                chat,
                Content::Monospace(report::order_details(&order, self.ctx.settings.utc_offset)),
                None,
            ),
            None => Transition::stay().text(chat, ORDER_NOT_FOUND),
        })
    }

    async fn on_location(
        &self,
        session: &mut Session,
        chat: ChatId,
        location: GeoPoint,
    ) -> Result<Transition, BotError> {
        if session.state != DialogState::AwaitingLocation {
            return Ok(not_recognized(chat));
        }

        match self.orders.submit(session, location).await {
            Ok(order) => {
                session.reset();
                Ok(Transition::to(DialogState::Idle)
                    .send(
                        chat,
                        Content::text(text::order_placed(order.id)),
                        Some(keyboards::lobby()),
                    )
                    .publish(OrderEvent::placed(order, self.ctx.now())))
            }
            Err(SubmissionError::EmptyCart) => Ok(Transition::to(DialogState::Idle).send(
                chat,
                Content::text(CART_IS_EMPTY),
                Some(keyboards::lobby()),
            )),
            Err(SubmissionError::RestaurantClosed(name)) => {
                tracing::debug!(client_id = session.client_id, restaurant = %name, "Submission refused, restaurant closed");
                Ok(Transition::stay()
                    .text(chat, RESTAURANT_CLOSED)
                    .extend(lobby(session, chat)))
            }
            Err(SubmissionError::IrrelevantItems(dishes)) => {
                tracing::debug!(client_id = session.client_id, ?dishes, "Submission refused, stale cart");
                Ok(Transition::stay()
                    .text(chat, IRRELEVANT_ITEMS)
                    .extend(show_cart(session, chat)))
            }
            Err(SubmissionError::Store(e)) => Err(e.into()),
        }
    }

    // -----------------------------------------------------------------------
    // Buttons
    // -----------------------------------------------------------------------

    async fn on_callback(
        &self,
        session: &mut Session,
        callback: &CallbackRef,
        message: MessageRef,
        data: &CallbackData,
    ) -> Result<Transition, BotError> {
        use CallbackData as C;
        use DialogState as S;

        match (session.state, data) {
            (S::BrowsingDishes, C::AddDish { dish_id } | C::ChangeDish { dish_id }) => {
                self.open_picker(session, callback, message, *dish_id).await
            }
            (S::BrowsingDishes, C::QuantityPage { dish_id, cursor }) => Ok(Transition::stay()
                .answer(callback, None, false)
                .edit(message, None, Some(keyboards::quantity_picker(*dish_id, *cursor)))),
            (S::BrowsingDishes, C::SelectQuantity { dish_id, quantity }) => {
                self.select_quantity(session, callback, message, *dish_id, *quantity)
                    .await
            }
            (S::BrowsingDishes, C::CancelDish { dish_id }) => {
                self.cancel_dish(session, callback, message, *dish_id).await
            }
            (S::BrowsingDishes, C::KeepCart) => Ok(Transition::stay()
                .answer(callback, None, false)
                .edit(message, Some(CART_NOT_CHANGED.into()), None)),
            (S::BrowsingDishes, C::EmptyCart) => {
                session.cart.clear();
                Ok(Transition::stay()
                    .answer(callback, None, false)
                    .edit(message, Some(CART_IS_EMPTY.into()), None))
            }
            (S::CartReview, C::TuneLine { dish_id, quantity }) => {
                let Some(line) = session.cart.line(*dish_id) else {
                    return Ok(keyboard_unavailable(callback, message));
                };
                let quantity = (*quantity).min(MAX_QUANTITY);
                Ok(Transition::stay().answer(callback, None, false).edit(
                    message,
                    Some(format!("{} x{quantity}", line.dish_name)),
                    Some(keyboards::tune_line(*dish_id, quantity)),
                ))
            }
            (S::CartReview, C::ConfirmLine { dish_id, quantity }) => {
                if session.cart.set_quantity(*dish_id, *quantity).is_err() {
                    return Ok(keyboard_unavailable(callback, message));
                }
                let acknowledged = Transition::stay()
                    .answer(callback, None, false)
                    .edit(message, Some(CART_CHANGED.into()), None);

                if session.cart.is_empty() {
                    return Ok(acknowledged.then(DialogState::Idle).send(
                        callback.chat,
                        Content::text(CART_IS_EMPTY),
                        Some(keyboards::lobby()),
                    ));
                }
                Ok(acknowledged.extend(show_cart(session, callback.chat)))
            }
            _ => Ok(Transition::stay().alert(callback, UNCAUGHT_CALLBACK)),
        }
    }

    async fn open_picker(
        &self,
        session: &Session,
        callback: &CallbackRef,
        message: MessageRef,
        dish_id: DbId,
    ) -> Result<Transition, BotError> {
        let (dish, restaurant) = match self.check_dish(dish_id).await? {
            Availability::Orderable(dish, restaurant) => (dish, restaurant),
            Availability::Unavailable(reason) => return Ok(unavailable(callback, message, reason)),
        };
        if session.cart.conflicts_with(restaurant.id) {
            return Ok(switch_prompt(callback));
        }

        let card = format!("{}\n\n{SELECT_QUANTITY}:", dish.card_text(&restaurant.currency));
        Ok(Transition::stay().answer(callback, None, false).edit(
            message,
            Some(card),
            Some(keyboards::quantity_picker(dish.id, FIRST_CURSOR)),
        ))
    }

    async fn select_quantity(
        &self,
        session: &mut Session,
        callback: &CallbackRef,
        message: MessageRef,
        dish_id: DbId,
        quantity: u32,
    ) -> Result<Transition, BotError> {
        let (dish, restaurant) = match self.check_dish(dish_id).await? {
            Availability::Orderable(dish, restaurant) => (dish, restaurant),
            Availability::Unavailable(reason) => return Ok(unavailable(callback, message, reason)),
        };

        let line = CartLine {
            dish_id: dish.id,
            dish_name: dish.name.clone(),
            unit_price: dish.price,
            quantity,
        };
        match session.cart.add_or_replace(&restaurant.reference(), line) {
            Ok(()) => {}
            Err(CartError::RestaurantMismatch { .. }) => return Ok(switch_prompt(callback)),
            Err(_) => return Ok(keyboard_unavailable(callback, message)),
        }

        tracing::debug!(client_id = session.client_id, dish_id, quantity, "Cart line stored");
        Ok(Transition::stay().answer(callback, None, false).edit(
            message,
            Some(dish.card_text(&restaurant.currency)),
            Some(keyboards::dish_card(&session.cart, dish.id, &restaurant.currency)),
        ))
    }

    async fn cancel_dish(
        &self,
        session: &Session,
        callback: &CallbackRef,
        message: MessageRef,
        dish_id: DbId,
    ) -> Result<Transition, BotError> {
        let Some(dish) = self.ctx.repo.find_dish(dish_id).await? else {
            return Ok(keyboard_unavailable(callback, message));
        };
        let Some(restaurant) = self.ctx.repo.find_restaurant(dish.restaurant_id).await? else {
            return Ok(keyboard_unavailable(callback, message));
        };

        Ok(Transition::stay().answer(callback, None, false).edit(
            message,
            Some(dish.card_text(&restaurant.currency)),
            Some(keyboards::dish_card(&session.cart, dish.id, &restaurant.currency)),
        ))
    }

    async fn check_dish(&self, dish_id: DbId) -> Result<Availability, BotError> {
        let Some(dish) = self.ctx.repo.find_dish(dish_id).await?.filter(|d| d.enabled) else {
            return Ok(Availability::Unavailable(DISH_UNAVAILABLE));
        };
        let Some(restaurant) = self.ctx.repo.find_restaurant(dish.restaurant_id).await? else {
            return Ok(Availability::Unavailable(DISH_UNAVAILABLE));
        };
        if !self.ctx.is_open(&restaurant).await? {
            return Ok(Availability::Unavailable(RESTAURANT_CLOSED));
        }
        Ok(Availability::Orderable(dish, restaurant))
    }
}

// ---- private helpers ----

fn lobby(session: &mut Session, chat: ChatId) -> Transition {
    session.browsing = None;
    Transition::to(DialogState::Idle).send(
        chat,
        Content::text(INPUT_VALUE),
        Some(keyboards::lobby()),
    )
}

/// Cart listing with the total, then one button per line to tune it.
fn show_cart(session: &mut Session, chat: ChatId) -> Transition {
    let Some(restaurant) = session.cart.restaurant() else {
        return Transition::stay().text(chat, CART_IS_EMPTY);
    };
    let listing = format!(
        "{}\n{} {}",
        session.cart.summary(),
        session.cart.total(),
        restaurant.currency
    );
    let lines = keyboards::cart_lines(&session.cart);

    session.browsing = None;
    Transition::to(DialogState::CartReview)
        .send(chat, Content::text(listing), Some(keyboards::cart_navigation()))
        .send(
            chat,
            Content::text(SELECT_DISH_TO_CHANGE),
            Some(Keyboard::Inline(lines)),
        )
}

fn checkout(session: &mut Session, chat: ChatId) -> Transition {
    let Some(restaurant) = session.cart.restaurant() else {
        return Transition::stay().text(chat, CART_IS_EMPTY);
    };
    let prompt = format!(
        "{}\n{TOTAL_PRICE}: {} {}\n\n{ORDER_CONFIRMATION}",
        session.cart.summary(),
        session.cart.total(),
        restaurant.currency
    );

    session.browsing = None;
    Transition::to(DialogState::AwaitingLocation).send(
        chat,
        Content::text(prompt),
        Some(keyboards::back_to_menu()),
    )
}

fn ended(inbound: &Inbound) -> Transition {
    match &inbound.event {
        InboundEvent::Callback { callback, .. } => {
            Transition::stay().alert(callback, UNCAUGHT_CALLBACK)
        }
        _ => Transition::stay().text(inbound.chat, COME_AGAIN),
    }
}

fn unavailable(callback: &CallbackRef, message: MessageRef, reason: &str) -> Transition {
    Transition::stay()
        .alert(callback, reason)
        .edit(message, None, None)
}

fn switch_prompt(callback: &CallbackRef) -> Transition {
    Transition::stay().answer(callback, None, false).send(
        callback.chat,
        Content::text(CART_ANOTHER_RESTAURANT),
        Some(Keyboard::Inline(keyboards::restaurant_switch())),
    )
}
