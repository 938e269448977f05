use std::sync::Arc;

use dinebot_core::availability::AvailabilityGate;
use dinebot_core::catalog::{Restaurant, User};
use dinebot_core::clock::Clock;
use dinebot_core::error::CoreError;
use dinebot_core::repository::Repository;
use dinebot_core::types::{ChatId, Timestamp};

use crate::config::Settings;

/// Shared dependencies of every update handler.
///
/// Handlers read and write the store through `repo` and produce effects;
/// they never hold the transport.
pub struct BotContext {
    pub repo: Arc<dyn Repository>,
    pub clock: Arc<dyn Clock>,
    pub gate: AvailabilityGate,
    pub settings: Settings,
}

impl BotContext {
    pub fn new(repo: Arc<dyn Repository>, clock: Arc<dyn Clock>, settings: Settings) -> Self {
        Self {
            repo,
            clock,
            gate: AvailabilityGate::new(settings.utc_offset),
            settings,
        }
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Whether clients may order from `restaurant` right now. Disabled
    /// restaurants are always closed.
    pub async fn is_open(&self, restaurant: &Restaurant) -> Result<bool, CoreError> {
        if !restaurant.enabled {
            return Ok(false);
        }
        let schedule = self.repo.find_schedule(restaurant.id).await?;
        Ok(self.gate.is_open(&schedule, self.now()))
    }

    /// The user behind `id` if they hold manager or admin rights.
    pub async fn staff_member(&self, id: ChatId) -> Result<Option<User>, CoreError> {
        Ok(self.repo.find_user(id).await?.filter(User::is_staff))
    }
}
