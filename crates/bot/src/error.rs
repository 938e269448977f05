use dinebot_core::error::CoreError;
use dinebot_core::transport::TransportError;

/// Failure of a single update handler.
///
/// Anything that reaches the dispatcher as a `BotError` is unexpected: the
/// session is left as it was before the update and the developer receives a
/// maintenance report.
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}
