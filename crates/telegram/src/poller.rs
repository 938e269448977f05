//! Long-polling update loop.
//!
//! [`UpdatePoller::run`] keeps calling `getUpdates` with an advancing offset
//! and hands every converted [`Inbound`] to a callback. Failed polls back off
//! exponentially until a poll succeeds again or the [`CancellationToken`]
//! is triggered.

use std::sync::Arc;
use std::time::Duration;

use dinebot_core::inbound::Inbound;
use tokio_util::sync::CancellationToken;

use crate::api::BotApi;
use crate::convert::inbound_from_update;

/// Tunable parameters for the exponential-backoff strategy.
#[derive(Debug, Clone)]
pub struct BackoffConfig {
    /// Delay after the first failed poll.
    pub initial_delay: Duration,
    /// Upper bound on the delay between attempts.
    pub max_delay: Duration,
    /// Factor by which the delay grows after each failure.
    pub multiplier: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

/// Next delay, clamped to [`BackoffConfig::max_delay`].
pub fn next_delay(current: Duration, config: &BackoffConfig) -> Duration {
    let next_ms = (current.as_millis() as f64 * config.multiplier) as u64;
    Duration::from_millis(next_ms).min(config.max_delay)
}

pub struct UpdatePoller {
    api: Arc<BotApi>,
    timeout_secs: u64,
    backoff: BackoffConfig,
}

impl UpdatePoller {
    pub fn new(api: Arc<BotApi>, timeout_secs: u64) -> Self {
        Self {
            api,
            timeout_secs,
            backoff: BackoffConfig::default(),
        }
    }

    pub fn with_backoff(mut self, backoff: BackoffConfig) -> Self {
        self.backoff = backoff;
        self
    }

    /// Poll until `cancel` fires.
    pub async fn run<F>(self, cancel: CancellationToken, mut on_inbound: F)
    where
        F: FnMut(Inbound),
    {
        if let Err(e) = self.api.delete_webhook().await {
            tracing::warn!(error = %e, "Failed to delete webhook before polling");
        }
        tracing::info!(timeout_secs = self.timeout_secs, "Update poller started");

        let mut offset = 0i64;
        let mut delay = self.backoff.initial_delay;

        loop {
            let polled = tokio::select! {
                _ = cancel.cancelled() => break,
                result = self.api.get_updates(offset, self.timeout_secs) => result,
            };

            match polled {
                Ok(updates) => {
                    delay = self.backoff.initial_delay;
                    for update in updates {
                        offset = offset.max(update.update_id + 1);
                        let update_id = update.update_id;
                        match inbound_from_update(update) {
                            Some(inbound) => on_inbound(inbound),
                            None => tracing::debug!(update_id, "Skipping update without sender"),
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        delay_ms = delay.as_millis() as u64,
                        "Polling updates failed",
                    );
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(delay) => {}
                    }
                    delay = next_delay(delay, &self.backoff);
                }
            }
        }

        tracing::info!("Update poller stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_delay_doubles() {
        let config = BackoffConfig::default();
        assert_eq!(next_delay(Duration::from_secs(1), &config), Duration::from_secs(2));
    }

    #[test]
    fn next_delay_clamps_at_max() {
        let config = BackoffConfig {
            max_delay: Duration::from_secs(10),
            ..Default::default()
        };
        assert_eq!(next_delay(Duration::from_secs(8), &config), Duration::from_secs(10));
    }

    #[tokio::test]
    async fn cancelled_poller_returns() {
        let api = Arc::new(BotApi::with_client(
            reqwest::Client::new(),
            "http://127.0.0.1:9",
            "0:test",
        ));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let mut seen = 0;
        UpdatePoller::new(api, 1)
            .with_backoff(BackoffConfig {
                initial_delay: Duration::from_millis(1),
                ..Default::default()
            })
            .run(cancel, |_| seen += 1)
            .await;
        assert_eq!(seen, 0);
    }
}
