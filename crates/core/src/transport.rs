//! Outbound messaging capability.
//!
//! The bot never talks to the chat platform directly. It produces
//! [`Content`] and [`Keyboard`] values and hands them to a [`Transport`];
//! `dinebot_telegram::TelegramTransport` is the production implementation.

use async_trait::async_trait;
use serde::Serialize;

use crate::callback::CallbackData;
use crate::types::{ChatId, GeoPoint};

// ---------------------------------------------------------------------------
// Content
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Content {
    Text(String),
    /// Rendered in a fixed-width font; used for tables.
    Monospace(String),
    Photo {
        file_id: String,
        caption: Option<String>,
    },
    Document {
        file_name: String,
        bytes: Vec<u8>,
        caption: Option<String>,
    },
    Location(GeoPoint),
}

impl Content {
    pub fn text(text: impl Into<String>) -> Self {
        Content::Text(text.into())
    }

    /// Kind of message this content produces once sent.
    pub fn kind(&self) -> MessageKind {
        match self {
            Content::Text(_) | Content::Monospace(_) | Content::Location(_) => MessageKind::Text,
            Content::Photo { .. } | Content::Document { .. } => MessageKind::Media,
        }
    }
}

// ---------------------------------------------------------------------------
// Keyboards
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ButtonAction {
    Callback(CallbackData),
    Url(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InlineButton {
    pub text: String,
    pub action: ButtonAction,
}

impl InlineButton {
    pub fn callback(text: impl Into<String>, data: CallbackData) -> Self {
        Self {
            text: text.into(),
            action: ButtonAction::Callback(data),
        }
    }

    pub fn url(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            action: ButtonAction::Url(url.into()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InlineKeyboard {
    pub rows: Vec<Vec<InlineButton>>,
}

impl InlineKeyboard {
    pub fn new(rows: Vec<Vec<InlineButton>>) -> Self {
        Self { rows }
    }

    pub fn single(button: InlineButton) -> Self {
        Self {
            rows: vec![vec![button]],
        }
    }

    /// Every callback payload on the keyboard, in row order.
    pub fn callbacks(&self) -> impl Iterator<Item = &CallbackData> {
        self.rows.iter().flatten().filter_map(|b| match &b.action {
            ButtonAction::Callback(data) => Some(data),
            ButtonAction::Url(_) => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Keyboard {
    /// Replaces the client's reply keyboard; each button sends its label.
    Reply { rows: Vec<Vec<String>>, resize: bool },
    Inline(InlineKeyboard),
    /// Hide the reply keyboard.
    Remove,
}

impl Keyboard {
    pub fn reply(rows: Vec<Vec<&str>>) -> Self {
        Keyboard::Reply {
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(String::from).collect())
                .collect(),
            resize: true,
        }
    }
}

// ---------------------------------------------------------------------------
// References
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MessageKind {
    Text,
    /// Photo or document; edits change the caption.
    Media,
}

/// Handle to a message the bot sent or received, used for later edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MessageRef {
    pub chat: ChatId,
    pub message_id: i64,
    pub kind: MessageKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallbackRef {
    pub id: String,
    pub chat: ChatId,
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("chat {0} is not reachable")]
    ChatUnavailable(ChatId),

    #[error("platform rejected the request: {0}")]
    Rejected(String),

    #[error("transport failure: {0}")]
    Io(String),
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        chat: ChatId,
        content: &Content,
        keyboard: Option<&Keyboard>,
    ) -> Result<MessageRef, TransportError>;

    /// Edit a sent message. `text: None` keeps the body and only swaps the
    /// inline keyboard; `keyboard: None` removes it.
    async fn edit(
        &self,
        message: &MessageRef,
        text: Option<&str>,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<(), TransportError>;

    async fn answer(
        &self,
        callback: &CallbackRef,
        text: Option<&str>,
        alert: bool,
    ) -> Result<(), TransportError>;

    /// Whether the bot may post into `chat`.
    async fn can_post(&self, chat: ChatId) -> Result<bool, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_content_produces_media_messages() {
        let photo = Content::Photo {
            file_id: "AgAD".into(),
            caption: None,
        };
        assert_eq!(photo.kind(), MessageKind::Media);
        assert_eq!(Content::text("hi").kind(), MessageKind::Text);
    }

    #[test]
    fn callbacks_skip_url_buttons() {
        let kb = InlineKeyboard::new(vec![vec![
            InlineButton::url("Open", "tg://user?id=1"),
            InlineButton::callback("Keep", CallbackData::KeepCart),
        ]]);
        let all: Vec<_> = kb.callbacks().collect();
        assert_eq!(all, vec![&CallbackData::KeepCart]);
    }
}
