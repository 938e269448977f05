//! REST client for the Telegram Bot API.
//!
//! Thin wrappers over the Bot API methods the bot uses, built on
//! [`reqwest`]. Every method posts JSON (or multipart for uploads) to
//! `https://api.telegram.org/bot<token>/<method>` and unwraps the response
//! envelope.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;

use crate::types::{ApiResponse, ChatMember, Message, ReplyMarkup, Update, User};

const DEFAULT_API_URL: &str = "https://api.telegram.org";

/// HTTP client for one bot token.
pub struct BotApi {
    client: reqwest::Client,
    base_url: String,
}

/// Errors from the Bot API layer.
#[derive(Debug, thiserror::Error)]
pub enum TelegramError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered with something that is not a Bot API envelope.
    #[error("Telegram API error ({status}): {body}")]
    ApiError { status: u16, body: String },

    /// The Bot API answered `ok: false`.
    #[error("Telegram rejected the request ({code}): {description}")]
    Rejected { code: i64, description: String },
}

impl TelegramError {
    /// Editing a message to its current content is reported as an error by
    /// the API; callers treat it as success.
    pub fn is_not_modified(&self) -> bool {
        matches!(self, TelegramError::Rejected { description, .. }
            if description.contains("message is not modified"))
    }
}

/// Parse mode for formatted text.
pub const PARSE_MODE_HTML: &str = "HTML";

impl BotApi {
    pub fn new(token: &str) -> Self {
        Self::with_client(reqwest::Client::new(), DEFAULT_API_URL, token)
    }

    /// Build a client against a custom API server (local Bot API server or a
    /// test double).
    pub fn with_client(client: reqwest::Client, api_url: &str, token: &str) -> Self {
        Self {
            client,
            base_url: format!("{}/bot{}", api_url.trim_end_matches('/'), token),
        }
    }

    pub async fn get_me(&self) -> Result<User, TelegramError> {
        self.call("getMe", &json!({})).await
    }

    /// Long-poll for updates after `offset`.
    pub async fn get_updates(
        &self,
        offset: i64,
        timeout_secs: u64,
    ) -> Result<Vec<Update>, TelegramError> {
        let body = json!({
            "offset": offset,
            "timeout": timeout_secs,
            "allowed_updates": ["message", "callback_query"],
        });
        self.call("getUpdates", &body).await
    }

    /// Required before `getUpdates` works if a webhook was ever set.
    pub async fn delete_webhook(&self) -> Result<bool, TelegramError> {
        self.call("deleteWebhook", &json!({})).await
    }

    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        parse_mode: Option<&str>,
        markup: Option<&ReplyMarkup>,
    ) -> Result<Message, TelegramError> {
        let mut body = json!({ "chat_id": chat_id, "text": text });
        with_optional(&mut body, "parse_mode", parse_mode);
        with_optional(&mut body, "reply_markup", markup);
        self.call("sendMessage", &body).await
    }

    pub async fn send_photo(
        &self,
        chat_id: i64,
        file_id: &str,
        caption: Option<&str>,
        markup: Option<&ReplyMarkup>,
    ) -> Result<Message, TelegramError> {
        let mut body = json!({ "chat_id": chat_id, "photo": file_id });
        with_optional(&mut body, "caption", caption);
        with_optional(&mut body, "reply_markup", markup);
        self.call("sendPhoto", &body).await
    }

    /// Upload `bytes` as a new document.
    pub async fn send_document(
        &self,
        chat_id: i64,
        file_name: &str,
        bytes: Vec<u8>,
        caption: Option<&str>,
        markup: Option<&ReplyMarkup>,
    ) -> Result<Message, TelegramError> {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str("text/plain")?;
        let mut form = reqwest::multipart::Form::new()
            .text("chat_id", chat_id.to_string())
            .part("document", part);
        if let Some(caption) = caption {
            form = form.text("caption", caption.to_string());
        }
        if let Some(markup) = markup {
            let encoded = serde_json::to_string(markup).map_err(|e| TelegramError::ApiError {
                status: 0,
                body: e.to_string(),
            })?;
            form = form.text("reply_markup", encoded);
        }

        let response = self
            .client
            .post(self.url("sendDocument"))
            .multipart(form)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    pub async fn send_location(
        &self,
        chat_id: i64,
        latitude: f64,
        longitude: f64,
        markup: Option<&ReplyMarkup>,
    ) -> Result<Message, TelegramError> {
        let mut body = json!({
            "chat_id": chat_id,
            "latitude": latitude,
            "longitude": longitude,
        });
        with_optional(&mut body, "reply_markup", markup);
        self.call("sendLocation", &body).await
    }

    /// Omitting `markup` removes the inline keyboard.
    pub async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        markup: Option<&ReplyMarkup>,
    ) -> Result<(), TelegramError> {
        let mut body = json!({ "chat_id": chat_id, "message_id": message_id, "text": text });
        with_optional(&mut body, "reply_markup", markup);
        self.call_edit("editMessageText", &body).await
    }

    pub async fn edit_message_caption(
        &self,
        chat_id: i64,
        message_id: i64,
        caption: &str,
        markup: Option<&ReplyMarkup>,
    ) -> Result<(), TelegramError> {
        let mut body =
            json!({ "chat_id": chat_id, "message_id": message_id, "caption": caption });
        with_optional(&mut body, "reply_markup", markup);
        self.call_edit("editMessageCaption", &body).await
    }

    pub async fn edit_message_reply_markup(
        &self,
        chat_id: i64,
        message_id: i64,
        markup: Option<&ReplyMarkup>,
    ) -> Result<(), TelegramError> {
        let mut body = json!({ "chat_id": chat_id, "message_id": message_id });
        with_optional(&mut body, "reply_markup", markup);
        self.call_edit("editMessageReplyMarkup", &body).await
    }

    pub async fn answer_callback_query(
        &self,
        callback_query_id: &str,
        text: Option<&str>,
        show_alert: bool,
    ) -> Result<(), TelegramError> {
        let mut body = json!({
            "callback_query_id": callback_query_id,
            "show_alert": show_alert,
        });
        with_optional(&mut body, "text", text);
        let _: bool = self.call("answerCallbackQuery", &body).await?;
        Ok(())
    }

    pub async fn get_chat_member(
        &self,
        chat_id: i64,
        user_id: i64,
    ) -> Result<ChatMember, TelegramError> {
        self.call(
            "getChatMember",
            &json!({ "chat_id": chat_id, "user_id": user_id }),
        )
        .await
    }

    // ---- private helpers ----

    fn url(&self, method: &str) -> String {
        format!("{}/{}", self.base_url, method)
    }

    async fn call<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: &str,
        body: &B,
    ) -> Result<T, TelegramError> {
        let response = self.client.post(self.url(method)).json(body).send().await?;
        Self::parse_response(response).await
    }

    /// Edit calls return either the edited message or `true`; neither is
    /// needed.
    async fn call_edit<B: Serialize + ?Sized>(
        &self,
        method: &str,
        body: &B,
    ) -> Result<(), TelegramError> {
        match self.call::<B, serde_json::Value>(method, body).await {
            Ok(_) => Ok(()),
            Err(e) if e.is_not_modified() => {
                tracing::debug!(method, "Edit skipped, message not modified");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Unwrap the Bot API envelope.
    async fn parse_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, TelegramError> {
        let status = response.status();
        let body = response.text().await?;

        let envelope: ApiResponse<T> =
            serde_json::from_str(&body).map_err(|_| TelegramError::ApiError {
                status: status.as_u16(),
                body: body.clone(),
            })?;

        match envelope.result {
            Some(result) if envelope.ok => Ok(result),
            _ => Err(TelegramError::Rejected {
                code: envelope.error_code.unwrap_or_else(|| i64::from(status.as_u16())),
                description: envelope.description.unwrap_or_default(),
            }),
        }
    }
}

fn with_optional<T: Serialize>(body: &mut serde_json::Value, key: &str, value: Option<T>) {
    if let (Some(value), Some(map)) = (value, body.as_object_mut()) {
        if let Ok(encoded) = serde_json::to_value(value) {
            map.insert(key.to_string(), encoded);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_embeds_token() {
        let api = BotApi::with_client(reqwest::Client::new(), "http://localhost:8081/", "42:abc");
        assert_eq!(api.url("getMe"), "http://localhost:8081/bot42:abc/getMe");
    }

    #[test]
    fn optional_fields_are_omitted_when_absent() {
        let mut body = json!({ "chat_id": 1 });
        with_optional::<&str>(&mut body, "parse_mode", None);
        with_optional(&mut body, "text", Some("hi"));
        assert_eq!(body, json!({ "chat_id": 1, "text": "hi" }));
    }

    #[test]
    fn not_modified_is_recognised() {
        let err = TelegramError::Rejected {
            code: 400,
            description: "Bad Request: message is not modified: specified new message content".into(),
        };
        assert!(err.is_not_modified());
    }
}
