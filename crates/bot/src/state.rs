use std::sync::Arc;

use crate::dispatcher::SessionDispatcher;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Hands webhook updates to the session workers.
    pub dispatcher: SessionDispatcher,
    /// Database connection pool; `None` when running on the in-memory store.
    pub pool: Option<dinebot_db::DbPool>,
    /// Expected `X-Telegram-Bot-Api-Secret-Token` header value, if any.
    pub webhook_secret: Option<Arc<str>>,
}
