//! Telegram Bot API adapter: REST client, wire types, update conversion,
//! the [`TelegramTransport`] implementation and the long-polling loop.

pub mod api;
pub mod convert;
pub mod poller;
pub mod transport;
pub mod types;

pub use api::{BotApi, TelegramError};
pub use poller::UpdatePoller;
pub use transport::TelegramTransport;
