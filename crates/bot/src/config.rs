use chrono::FixedOffset;

use dinebot_core::types::ChatId;

/// How updates reach the bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMode {
    Polling,
    Webhook,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} has invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Settings the handlers read at runtime.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Chat that receives new order requests.
    pub staff_chat_id: ChatId,
    /// Receives maintenance reports and undeliverable order requests.
    pub developer_id: ChatId,
    /// Contact behind the "Contact Manager" button.
    pub manager_id: ChatId,
    /// Local offset used for schedules and printed dates.
    pub utc_offset: FixedOffset,
    /// City named in the `/help` text.
    pub city: String,
}

/// Process configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub telegram_token: String,
    pub settings: Settings,
    /// `None` runs the bot on the in-memory store.
    pub database_url: Option<String>,
    pub update_mode: UpdateMode,
    /// Webhook listener bind address (default: `0.0.0.0`).
    pub host: String,
    /// Webhook listener port (default: `8080`).
    pub port: u16,
    /// Expected `X-Telegram-Bot-Api-Secret-Token` header value.
    pub webhook_secret: Option<String>,
    /// Long-poll timeout in seconds (default: `30`).
    pub poll_timeout_secs: u64,
    /// Minutes a session worker may stay idle before eviction (default: `30`).
    pub session_idle_minutes: u64,
}

impl BotConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var             | Default          |
    /// |---------------------|------------------|
    /// | `TELEGRAM_TOKEN`    | required         |
    /// | `STAFF_CHAT_ID`     | required         |
    /// | `DEVELOPER_ID`      | required         |
    /// | `MANAGER_ID`        | `DEVELOPER_ID`   |
    /// | `PLACE_UTC_OFFSET`  | `+03:00`         |
    /// | `PLACE_CITY`        | `your city`      |
    /// | `DATABASE_URL`      | in-memory store  |
    /// | `UPDATE_MODE`       | `polling`        |
    /// | `HOST`              | `0.0.0.0`        |
    /// | `PORT`              | `8080`           |
    /// | `WEBHOOK_SECRET`    | none             |
    /// | `POLL_TIMEOUT_SECS` | `30`             |
    /// | `SESSION_IDLE_MINUTES` | `30`          |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary lookup function.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let telegram_token = get("TELEGRAM_TOKEN").ok_or(ConfigError::Missing("TELEGRAM_TOKEN"))?;
        let staff_chat_id = parse_required(&get, "STAFF_CHAT_ID")?;
        let developer_id = parse_required(&get, "DEVELOPER_ID")?;
        let manager_id = match get("MANAGER_ID") {
            Some(value) => parse_value("MANAGER_ID", &value)?,
            None => developer_id,
        };

        let utc_offset = match get("PLACE_UTC_OFFSET") {
            Some(value) => parse_offset(&value).ok_or_else(|| ConfigError::Invalid {
                var: "PLACE_UTC_OFFSET",
                value: value.clone(),
                reason: "expected +HH:MM or -HH:MM".into(),
            })?,
            None => FixedOffset::east_opt(3 * 3600).ok_or(ConfigError::Missing("PLACE_UTC_OFFSET"))?,
        };

        let update_mode = match get("UPDATE_MODE").as_deref().map(str::to_lowercase).as_deref() {
            None | Some("polling") => UpdateMode::Polling,
            Some("webhook") => UpdateMode::Webhook,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "UPDATE_MODE",
                    value: other.to_string(),
                    reason: "expected 'polling' or 'webhook'".into(),
                })
            }
        };

        let port = match get("PORT") {
            Some(value) => parse_value("PORT", &value)?,
            None => 8080,
        };
        let poll_timeout_secs = match get("POLL_TIMEOUT_SECS") {
            Some(value) => parse_value("POLL_TIMEOUT_SECS", &value)?,
            None => 30,
        };
        let session_idle_minutes = match get("SESSION_IDLE_MINUTES") {
            Some(value) => parse_value("SESSION_IDLE_MINUTES", &value)?,
            None => 30,
        };

        Ok(Self {
            telegram_token,
            settings: Settings {
                staff_chat_id,
                developer_id,
                manager_id,
                utc_offset,
                city: get("PLACE_CITY").unwrap_or_else(|| "your city".into()),
            },
            database_url: get("DATABASE_URL"),
            update_mode,
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            webhook_secret: get("WEBHOOK_SECRET"),
            poll_timeout_secs,
            session_idle_minutes,
        })
    }
}

// ---- private helpers ----

fn parse_required<T>(
    get: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let value = get(var).ok_or(ConfigError::Missing(var))?;
    parse_value(var, &value)
}

fn parse_value<T>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

/// `+03:00`, `-05:30` or `+3`.
fn parse_offset(value: &str) -> Option<FixedOffset> {
    let value = value.trim();
    let (sign, rest) = match value.chars().next()? {
        '+' => (1, &value[1..]),
        '-' => (-1, &value[1..]),
        _ => (1, value),
    };
    let (hours, minutes) = match rest.split_once(':') {
        Some((h, m)) => (h.parse::<i32>().ok()?, m.parse::<i32>().ok()?),
        None => (rest.parse::<i32>().ok()?, 0),
    };
    if !(0..=14).contains(&hours) || !(0..60).contains(&minutes) {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
