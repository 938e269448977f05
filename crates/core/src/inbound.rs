//! Platform-neutral inbound events.
//!
//! The transport crate converts raw updates into [`Inbound`] values; the
//! dispatcher and the dialog only ever see these.

use serde::Serialize;

use crate::callback::CallbackData;
use crate::transport::{CallbackRef, MessageRef};
use crate::types::{ChatId, GeoPoint};

/// Sender profile as reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientProfile {
    pub id: ChatId,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_bot: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Inbound {
    pub client: ClientProfile,
    /// Chat the event came from; equal to the client id in private chats.
    pub chat: ChatId,
    pub event: InboundEvent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum InboundEvent {
    /// `/name arg1 arg2`, name lowercased and without the `@bot` suffix.
    Command { name: String, args: Vec<String> },
    Text(String),
    Location(GeoPoint),
    Photo { file_id: String },
    Callback {
        callback: CallbackRef,
        message: MessageRef,
        /// `None` when the payload was not produced by this bot build.
        data: Option<CallbackData>,
    },
    Unsupported,
}

impl InboundEvent {
    /// Classify a text message as a command or plain text.
    pub fn from_text(text: &str) -> Self {
        let trimmed = text.trim();
        let Some(body) = trimmed.strip_prefix('/') else {
            return InboundEvent::Text(text.to_string());
        };

        let mut words = body.split_whitespace();
        let head = words.next().unwrap_or_default();
        let name = head.split('@').next().unwrap_or_default().to_lowercase();
        if name.is_empty() {
            return InboundEvent::Text(text.to_string());
        }
        InboundEvent::Command {
            name,
            args: words.map(String::from).collect(),
        }
    }

    pub fn is_command(&self, command: &str) -> bool {
        matches!(self, InboundEvent::Command { name, .. } if name == command)
    }

    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            InboundEvent::Command { .. } => "command",
            InboundEvent::Text(_) => "text",
            InboundEvent::Location(_) => "location",
            InboundEvent::Photo { .. } => "photo",
            InboundEvent::Callback { .. } => "callback",
            InboundEvent::Unsupported => "unsupported",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn commands_strip_bot_suffix_and_split_args() {
        assert_matches!(
            InboundEvent::from_text("/Orders@dine_bot 10"),
            InboundEvent::Command { name, args } if name == "orders" && args == ["10"]
        );
    }

    #[test]
    fn plain_text_is_kept_verbatim() {
        assert_eq!(
            InboundEvent::from_text("Burger House"),
            InboundEvent::Text("Burger House".into())
        );
        assert_eq!(InboundEvent::from_text("/"), InboundEvent::Text("/".into()));
    }

    #[test]
    fn is_command_matches_by_name() {
        assert!(InboundEvent::from_text("/cancel").is_command("cancel"));
        assert!(!InboundEvent::from_text("cancel").is_command("cancel"));
    }
}
