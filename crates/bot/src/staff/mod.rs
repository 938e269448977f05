//! Staff console: order management, user permissions and the catalog.
//!
//! Every entry point re-reads the actor from the store and refuses anyone
//! without manager or admin rights. A refusal also ends any staff flow the
//! session was in.

mod catalog;
mod orders;
mod users;

use std::sync::Arc;

use dinebot_core::callback::CallbackData;
use dinebot_core::catalog::User;
use dinebot_core::inbound::{Inbound, InboundEvent};
use dinebot_core::text::{NOT_MANAGER, UNCAUGHT_CALLBACK};
use dinebot_core::transport::{CallbackRef, MessageRef};

use crate::context::BotContext;
use crate::dialog::not_recognized;
use crate::effects::Transition;
use crate::error::BotError;
use crate::session::Session;

pub use orders::order_keyboard;

/// Commands served by the console.
pub const COMMANDS: [&str; 8] = [
    "order",
    "orders",
    "user",
    "users",
    "restaurant",
    "new_restaurant",
    "new_category",
    "new_dish",
];

pub struct StaffConsole {
    ctx: Arc<BotContext>,
}

impl StaffConsole {
    pub fn new(ctx: Arc<BotContext>) -> Self {
        Self { ctx }
    }

    pub fn handles(command: &str) -> bool {
        COMMANDS.contains(&command)
    }

    pub async fn command(
        &self,
        session: &mut Session,
        inbound: &Inbound,
        name: &str,
        args: &[String],
    ) -> Result<Transition, BotError> {
        let chat = inbound.chat;
        let Some(actor) = self.authorize(session, inbound).await? else {
            return Ok(Transition::stay().text(chat, NOT_MANAGER));
        };
        tracing::debug!(staff_id = actor.id, command = name, "Staff command");

        let ctx = self.ctx.as_ref();
        match name {
            "order" => orders::show_order(ctx, chat, args).await,
            "orders" => orders::recent_orders(ctx, chat, args).await,
            "user" => users::show_user(ctx, &actor, chat, args).await,
            "users" => users::recent_users(ctx, chat, args).await,
            "restaurant" => catalog::open_restaurant(ctx, session, chat, args).await,
            "new_restaurant" => Ok(catalog::start_new_restaurant(session, chat)),
            "new_category" => Ok(catalog::start_new_category(session, chat)),
            "new_dish" => catalog::start_new_dish(ctx, session, chat).await,
            _ => Ok(not_recognized(chat)),
        }
    }

    pub async fn callback(
        &self,
        session: &mut Session,
        inbound: &Inbound,
        callback: &CallbackRef,
        message: MessageRef,
        data: &CallbackData,
    ) -> Result<Transition, BotError> {
        let Some(actor) = self.authorize(session, inbound).await? else {
            return Ok(Transition::stay().alert(callback, NOT_MANAGER));
        };

        let ctx = self.ctx.as_ref();
        match *data {
            CallbackData::ShowStatuses { order_id } => {
                Ok(orders::show_statuses(callback, message, order_id))
            }
            CallbackData::SetStatus { order_id, status } => {
                orders::set_status(ctx, &actor, callback, message, order_id, status).await
            }
            CallbackData::TogglePermission {
                user_id,
                permission,
            } => users::toggle_permission(ctx, &actor, callback, message, user_id, permission).await,
            CallbackData::ToggleRestaurant { restaurant_id } => {
                catalog::toggle_restaurant(ctx, callback, message, restaurant_id).await
            }
            CallbackData::EditSchedule { restaurant_id } => {
                catalog::edit_schedule(ctx, session, callback, restaurant_id).await
            }
            CallbackData::CancelScheduleEdit => {
                Ok(catalog::cancel_schedule_edit(session, callback, message))
            }
            CallbackData::ToggleDish { dish_id } => {
                catalog::toggle_dish(ctx, callback, message, dish_id).await
            }
            _ => Ok(Transition::stay().alert(callback, UNCAUGHT_CALLBACK)),
        }
    }

    /// Text or photo typed while a staff flow is active.
    pub async fn input(
        &self,
        session: &mut Session,
        inbound: &Inbound,
    ) -> Result<Transition, BotError> {
        let chat = inbound.chat;
        if self.authorize(session, inbound).await?.is_none() {
            return Ok(Transition::stay().text(chat, NOT_MANAGER));
        }
        let Some(flow) = session.staff.clone() else {
            return Ok(not_recognized(chat));
        };

        match &inbound.event {
            InboundEvent::Text(text) => {
                catalog::flow_text(self.ctx.as_ref(), session, flow, chat, text).await
            }
            InboundEvent::Photo { file_id } => {
                catalog::flow_photo(self.ctx.as_ref(), session, flow, chat, file_id).await
            }
            _ => Ok(not_recognized(chat)),
        }
    }

    /// The actor as a staff member, or `None` after ending the staff flow.
    async fn authorize(
        &self,
        session: &mut Session,
        inbound: &Inbound,
    ) -> Result<Option<User>, BotError> {
        let actor = self.ctx.staff_member(inbound.client.id).await?;
        if actor.is_none() {
            tracing::warn!(client_id = inbound.client.id, "Staff action refused");
            session.staff = None;
        }
        Ok(actor)
    }
}
