//! Developer reports for unexpected faults.

use std::sync::Arc;

use serde::Serialize;

use dinebot_core::inbound::Inbound;
use dinebot_core::transport::{Content, Transport};
use dinebot_core::types::ChatId;

use crate::error::BotError;
use crate::session::Session;

/// Telegram rejects messages longer than 4096 characters.
const MAX_REPORT_CHARS: usize = 4000;

const REPORT_HEADING: &str = "An exception was raised while handling an update";

#[derive(Clone)]
pub struct MaintenanceReporter {
    transport: Arc<dyn Transport>,
    developer_id: ChatId,
}

impl MaintenanceReporter {
    pub fn new(transport: Arc<dyn Transport>, developer_id: ChatId) -> Self {
        Self {
            transport,
            developer_id,
        }
    }

    /// Log `error` and send the update, the session snapshot and the error
    /// to the developer chat. Delivery failures are only logged.
    pub async fn report(&self, inbound: &Inbound, session: &Session, error: &BotError) {
        tracing::error!(
            error = %error,
            client_id = inbound.client.id,
            event = inbound.event.label(),
            state = ?session.state,
            "Unexpected fault while handling update"
        );

        let parts = [
            format!("{REPORT_HEADING}\nupdate = {}", pretty(inbound)),
            format!("session = {}", pretty(session)),
            error.to_string(),
        ];

        for part in parts {
            let content = Content::Monospace(truncate(&part, MAX_REPORT_CHARS));
            if let Err(e) = self.transport.send(self.developer_id, &content, None).await {
                tracing::error!(error = %e, "Failed to deliver maintenance report");
                return;
            }
        }
    }
}

// ---- private helpers ----

fn pretty<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("<unserializable: {e}>"))
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}…", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_on_char_boundaries() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("ééééé", 3), "ééé…");
    }
}
