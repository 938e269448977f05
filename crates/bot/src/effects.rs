//! Handler output.
//!
//! Handlers return a [`Transition`]: the list of [`Effect`]s to perform and
//! the next dialog state. The dispatcher commits the session first and then
//! hands the effects to an [`EffectRunner`], which performs them in order.

use std::sync::Arc;

use dinebot_core::transport::{
    CallbackRef, Content, InlineKeyboard, Keyboard, MessageRef, Transport, TransportError,
};
use dinebot_core::types::ChatId;
use dinebot_events::{EventBus, OrderEvent};

use crate::session::DialogState;

#[derive(Debug, Clone)]
pub enum Effect {
    Send {
        chat: ChatId,
        content: Content,
        keyboard: Option<Keyboard>,
    },
    /// `text: None` only swaps the inline keyboard.
    Edit {
        message: MessageRef,
        text: Option<String>,
        keyboard: Option<InlineKeyboard>,
    },
    Answer {
        callback: CallbackRef,
        text: Option<String>,
        alert: bool,
    },
    Publish(OrderEvent),
}

#[derive(Debug, Default)]
pub struct Transition {
    pub effects: Vec<Effect>,
    /// `None` keeps the current state.
    pub next: Option<DialogState>,
}

impl Transition {
    pub fn stay() -> Self {
        Self::default()
    }

    pub fn to(state: DialogState) -> Self {
        Self {
            effects: Vec::new(),
            next: Some(state),
        }
    }

    pub fn then(mut self, state: DialogState) -> Self {
        self.next = Some(state);
        self
    }

    pub fn send(mut self, chat: ChatId, content: Content, keyboard: Option<Keyboard>) -> Self {
        self.effects.push(Effect::Send {
            chat,
            content,
            keyboard,
        });
        self
    }

    pub fn text(self, chat: ChatId, text: impl Into<String>) -> Self {
        self.send(chat, Content::text(text), None)
    }

    pub fn edit(
        mut self,
        message: MessageRef,
        text: Option<String>,
        keyboard: Option<InlineKeyboard>,
    ) -> Self {
        self.effects.push(Effect::Edit {
            message,
            text,
            keyboard,
        });
        self
    }

    pub fn answer(mut self, callback: &CallbackRef, text: Option<&str>, alert: bool) -> Self {
        self.effects.push(Effect::Answer {
            callback: callback.clone(),
            text: text.map(String::from),
            alert,
        });
        self
    }

    pub fn alert(self, callback: &CallbackRef, text: &str) -> Self {
        self.answer(callback, Some(text), true)
    }

    pub fn publish(mut self, event: OrderEvent) -> Self {
        self.effects.push(Effect::Publish(event));
        self
    }

    pub fn extend(mut self, other: Transition) -> Self {
        self.effects.extend(other.effects);
        if other.next.is_some() {
            self.next = other.next;
        }
        self
    }

    pub fn answers(&self, callback: &CallbackRef) -> bool {
        self.effects
            .iter()
            .any(|e| matches!(e, Effect::Answer { callback: c, .. } if c.id == callback.id))
    }
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct EffectRunner {
    transport: Arc<dyn Transport>,
    event_bus: Arc<EventBus>,
}

impl EffectRunner {
    pub fn new(transport: Arc<dyn Transport>, event_bus: Arc<EventBus>) -> Self {
        Self {
            transport,
            event_bus,
        }
    }

    /// Perform `effects` in order. A failed effect does not stop the ones
    /// after it; the first failure is returned.
    pub async fn apply(&self, effects: Vec<Effect>) -> Result<(), TransportError> {
        let mut first_error = None;

        for effect in effects {
            if let Err(e) = self.apply_one(effect).await {
                tracing::warn!(error = %e, "Effect failed");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn apply_one(&self, effect: Effect) -> Result<(), TransportError> {
        match effect {
            Effect::Send {
                chat,
                content,
                keyboard,
            } => {
                self.transport.send(chat, &content, keyboard.as_ref()).await?;
            }
            Effect::Edit {
                message,
                text,
                keyboard,
            } => {
                self.transport
                    .edit(&message, text.as_deref(), keyboard.as_ref())
                    .await?;
            }
            Effect::Answer {
                callback,
                text,
                alert,
            } => {
                self.transport
                    .answer(&callback, text.as_deref(), alert)
                    .await?;
            }
            Effect::Publish(event) => self.event_bus.publish(event),
        }
        Ok(())
    }
}
