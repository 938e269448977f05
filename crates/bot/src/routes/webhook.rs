use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::{routing::post, Json, Router};

use dinebot_telegram::convert::inbound_from_update;
use dinebot_telegram::types::Update;

use crate::state::AppState;

/// Header Telegram sets to the secret registered with `setWebhook`.
pub const SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";

/// POST /telegram/webhook -- queue one update for its session.
///
/// Always answers 200 once the secret matches so Telegram does not
/// redeliver updates the bot chose to ignore.
async fn receive_update(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(update): Json<Update>,
) -> StatusCode {
    if let Some(secret) = &state.webhook_secret {
        let provided = headers.get(SECRET_HEADER).and_then(|v| v.to_str().ok());
        if provided != Some(secret.as_ref()) {
            tracing::warn!(update_id = update.update_id, "Webhook secret mismatch");
            return StatusCode::UNAUTHORIZED;
        }
    }

    let update_id = update.update_id;
    match inbound_from_update(update) {
        Some(inbound) => state.dispatcher.dispatch(inbound),
        None => tracing::debug!(update_id, "Skipping update without sender"),
    }
    StatusCode::OK
}

pub fn router() -> Router<AppState> {
    Router::new().route("/telegram/webhook", post(receive_update))
}
