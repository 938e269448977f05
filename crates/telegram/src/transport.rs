//! [`Transport`] implementation over the Bot API.

use std::sync::Arc;

use async_trait::async_trait;
use dinebot_core::transport::{
    CallbackRef, Content, InlineKeyboard, Keyboard, MessageKind, MessageRef, Transport,
    TransportError,
};
use dinebot_core::types::ChatId;

use crate::api::{BotApi, TelegramError, PARSE_MODE_HTML};
use crate::convert::{inline_markup, message_ref, reply_markup};
use crate::types::ReplyMarkup;

#[derive(Clone)]
pub struct TelegramTransport {
    api: Arc<BotApi>,
    /// The bot's own user id, needed for membership checks.
    bot_id: i64,
}

impl TelegramTransport {
    pub fn new(api: Arc<BotApi>, bot_id: i64) -> Self {
        Self { api, bot_id }
    }
}

fn transport_error(chat: ChatId, err: TelegramError) -> TransportError {
    match err {
        TelegramError::Rejected { code: 403, .. } => TransportError::ChatUnavailable(chat),
        TelegramError::Rejected { description, .. }
            if description.contains("chat not found") =>
        {
            TransportError::ChatUnavailable(chat)
        }
        TelegramError::Rejected { description, .. } => TransportError::Rejected(description),
        other => TransportError::Io(other.to_string()),
    }
}

/// Escape text for HTML parse mode.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn send(
        &self,
        chat: ChatId,
        content: &Content,
        keyboard: Option<&Keyboard>,
    ) -> Result<MessageRef, TransportError> {
        let markup = keyboard.map(reply_markup);
        let markup = markup.as_ref();

        let sent = match content {
            Content::Text(text) => self.api.send_message(chat, text, None, markup).await,
            Content::Monospace(text) => {
                let html = format!("<pre>{}</pre>", escape_html(text));
                self.api
                    .send_message(chat, &html, Some(PARSE_MODE_HTML), markup)
                    .await
            }
            Content::Photo { file_id, caption } => {
                self.api
                    .send_photo(chat, file_id, caption.as_deref(), markup)
                    .await
            }
            Content::Document {
                file_name,
                bytes,
                caption,
            } => {
                self.api
                    .send_document(chat, file_name, bytes.clone(), caption.as_deref(), markup)
                    .await
            }
            Content::Location(point) => {
                self.api
                    .send_location(chat, point.latitude, point.longitude, markup)
                    .await
            }
        }
        .map_err(|e| transport_error(chat, e))?;

        Ok(message_ref(&sent))
    }

    async fn edit(
        &self,
        message: &MessageRef,
        text: Option<&str>,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<(), TransportError> {
        let markup = keyboard.map(|k| ReplyMarkup::Inline(inline_markup(k)));
        let markup = markup.as_ref();
        let (chat, id) = (message.chat, message.message_id);

        let result = match (text, message.kind) {
            (Some(text), MessageKind::Text) => {
                self.api.edit_message_text(chat, id, text, markup).await
            }
            (Some(caption), MessageKind::Media) => {
                self.api.edit_message_caption(chat, id, caption, markup).await
            }
            (None, _) => self.api.edit_message_reply_markup(chat, id, markup).await,
        };
        result.map_err(|e| transport_error(chat, e))
    }

    async fn answer(
        &self,
        callback: &CallbackRef,
        text: Option<&str>,
        alert: bool,
    ) -> Result<(), TransportError> {
        self.api
            .answer_callback_query(&callback.id, text, alert)
            .await
            .map_err(|e| transport_error(callback.chat, e))
    }

    async fn can_post(&self, chat: ChatId) -> Result<bool, TransportError> {
        match self.api.get_chat_member(chat, self.bot_id).await {
            Ok(member) => Ok(member.is_present()),
            Err(TelegramError::Rejected { code: 400 | 403, description }) => {
                tracing::warn!(chat_id = chat, %description, "Membership check refused");
                Ok(false)
            }
            Err(e) => Err(transport_error(chat, e)),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn html_special_characters_are_escaped() {
        assert_eq!(escape_html("a < b && c > d"), "a &lt; b &amp;&amp; c &gt; d");
    }

    #[test]
    fn forbidden_maps_to_unavailable_chat() {
        let err = transport_error(
            5,
            TelegramError::Rejected {
                code: 403,
                description: "Forbidden: bot was blocked by the user".into(),
            },
        );
        assert_matches!(err, TransportError::ChatUnavailable(5));
    }

    #[test]
    fn other_rejections_keep_description() {
        let err = transport_error(
            5,
            TelegramError::Rejected {
                code: 400,
                description: "Bad Request: message to edit not found".into(),
            },
        );
        assert_matches!(err, TransportError::Rejected(d) if d.contains("not found"));
    }
}
