//! Top-level update routing.
//!
//! Global handlers run first: undecodable buttons, staff order decisions,
//! other staff buttons, `/help`, `/cancel` and commands. Everything left
//! goes to the staff flow in progress or to the client dialog.

use std::sync::Arc;

use dinebot_core::callback::CallbackData;
use dinebot_core::inbound::{Inbound, InboundEvent};
use dinebot_core::text::{self, COME_AGAIN, HELP_MANAGER};
use dinebot_core::transport::{Content, Keyboard};

use crate::context::BotContext;
use crate::dialog::{keyboard_unavailable, DialogEngine};
use crate::effects::{Effect, Transition};
use crate::error::BotError;
use crate::session::Session;
use crate::staff::StaffConsole;
use crate::workflow::Handshake;

pub struct UpdateRouter {
    ctx: Arc<BotContext>,
    dialog: DialogEngine,
    staff: StaffConsole,
    handshake: Handshake,
}

impl UpdateRouter {
    pub fn new(ctx: Arc<BotContext>) -> Self {
        Self {
            dialog: DialogEngine::new(Arc::clone(&ctx)),
            staff: StaffConsole::new(Arc::clone(&ctx)),
            handshake: Handshake::new(Arc::clone(&ctx)),
            ctx,
        }
    }

    pub fn context(&self) -> &Arc<BotContext> {
        &self.ctx
    }

    /// Handle one inbound event against `session` and return the effects to
    /// perform.
    ///
    /// On error `session` may be partially modified; callers run this on a
    /// copy and only keep it on success.
    pub async fn route(
        &self,
        session: &mut Session,
        inbound: &Inbound,
    ) -> Result<Vec<Effect>, BotError> {
        let transition = self.dispatch(session, inbound).await?;
        if let Some(next) = transition.next {
            session.state = next;
        }

        let unanswered = match &inbound.event {
            InboundEvent::Callback { callback, .. } if !transition.answers(callback) => {
                Some(callback.clone())
            }
            _ => None,
        };

        let mut effects = transition.effects;
        if let Some(callback) = unanswered {
            effects.insert(
                0,
                Effect::Answer {
                    callback,
                    text: None,
                    alert: false,
                },
            );
        }

        tracing::debug!(
            client_id = inbound.client.id,
            event = inbound.event.label(),
            state = ?session.state,
            effects = effects.len(),
            "Update routed"
        );
        Ok(effects)
    }

    async fn dispatch(
        &self,
        session: &mut Session,
        inbound: &Inbound,
    ) -> Result<Transition, BotError> {
        let chat = inbound.chat;

        match &inbound.event {
            InboundEvent::Callback {
                callback,
                message,
                data: None,
            } => Ok(keyboard_unavailable(callback, *message)),
            InboundEvent::Callback {
                callback,
                message,
                data: Some(CallbackData::OrderDecision { order_id, decision }),
            } => {
                self.handshake
                    .handle(inbound.client.id, callback, *message, *order_id, *decision)
                    .await
            }
            InboundEvent::Callback {
                callback,
                message,
                data: Some(data),
            } if data.is_staff_action() => {
                self.staff
                    .callback(session, inbound, callback, *message, data)
                    .await
            }
            InboundEvent::Command { name, .. } if name == "help" => {
                let mut transition =
                    Transition::stay().text(chat, text::help_user(&self.ctx.settings.city));
                if self.ctx.staff_member(inbound.client.id).await?.is_some() {
                    transition = transition.text(chat, HELP_MANAGER);
                }
                Ok(transition)
            }
            InboundEvent::Command { name, .. } if name == "cancel" => {
                session.end();
                Ok(Transition::stay().send(chat, Content::text(COME_AGAIN), Some(Keyboard::Remove)))
            }
            InboundEvent::Command { name, .. } if name == "start" => {
                self.dialog.handle(session, inbound).await
            }
            InboundEvent::Command { name, args } => {
                session.end();
                if StaffConsole::handles(name) {
                    self.staff.command(session, inbound, name, args).await
                } else {
                    Ok(Transition::stay().text(chat, COME_AGAIN))
                }
            }
            InboundEvent::Text(_) | InboundEvent::Photo { .. } if session.staff.is_some() => {
                self.staff.input(session, inbound).await
            }
            _ => self.dialog.handle(session, inbound).await,
        }
    }
}
