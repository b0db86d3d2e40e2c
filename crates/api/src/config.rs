//! Application configuration loaded from environment variables.

use std::str::FromStr;
use std::time::Duration;

use event_pipeline::{ChannelConfig, RetentionPolicy};

/// Output format of the log layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `3000`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT` — `text` or `json` (default: `text`)
/// - `DATABASE_URL` — PostgreSQL audit log; in-memory when unset
/// - `ORDER_EVENTS_TOPIC` — topic order events are published on (default: `"order-events"`)
/// - `PRODUCT_EVENTS_FUNCTION` — function product events are sent to (default: `"product-events"`)
/// - `ORDER_EVENTS_RETENTION_SECS` / `PRODUCT_EVENTS_RETENTION_SECS` — audit retention (default: `300`)
/// - `CHANNEL_MAX_ATTEMPTS` — deliveries per message and subscriber (default: `3`)
/// - `CHANNEL_RETRY_BACKOFF_MS` — first redelivery delay (default: `100`)
/// - `CHANNEL_MAX_DEAD_LETTERS` — dead letters kept in memory (default: `1000`)
/// - `TTL_SWEEP_INTERVAL_SECS` — how often expired audit records are purged (default: `60`)
///
/// Unparsable values fall back to the default.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub database_url: Option<String>,
    pub order_events_topic: String,
    pub product_events_function: String,
    pub order_events_retention: Duration,
    pub product_events_retention: Duration,
    pub channel_max_attempts: u32,
    pub channel_retry_backoff: Duration,
    pub channel_max_dead_letters: usize,
    pub ttl_sweep_interval: Duration,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let parsed = |key: &str| lookup(key).and_then(|v| v.parse::<u64>().ok());

        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: lookup("LOG_FORMAT")
                .and_then(|f| f.parse().ok())
                .unwrap_or(defaults.log_format),
            database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
            order_events_topic: lookup("ORDER_EVENTS_TOPIC").unwrap_or(defaults.order_events_topic),
            product_events_function: lookup("PRODUCT_EVENTS_FUNCTION")
                .unwrap_or(defaults.product_events_function),
            order_events_retention: parsed("ORDER_EVENTS_RETENTION_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.order_events_retention),
            product_events_retention: parsed("PRODUCT_EVENTS_RETENTION_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.product_events_retention),
            channel_max_attempts: lookup("CHANNEL_MAX_ATTEMPTS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.channel_max_attempts),
            channel_retry_backoff: parsed("CHANNEL_RETRY_BACKOFF_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.channel_retry_backoff),
            channel_max_dead_letters: lookup("CHANNEL_MAX_DEAD_LETTERS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.channel_max_dead_letters),
            ttl_sweep_interval: parsed("TTL_SWEEP_INTERVAL_SECS")
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.ttl_sweep_interval),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn retention_policy(&self) -> RetentionPolicy {
        RetentionPolicy {
            order_events: self.order_events_retention,
            product_events: self.product_events_retention,
        }
    }

    pub fn channel_config(&self) -> ChannelConfig {
        ChannelConfig {
            max_attempts: self.channel_max_attempts,
            retry_backoff: self.channel_retry_backoff,
            max_dead_letters: self.channel_max_dead_letters,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let retention = RetentionPolicy::default();
        let channel = ChannelConfig::default();
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            database_url: None,
            order_events_topic: "order-events".to_string(),
            product_events_function: "product-events".to_string(),
            order_events_retention: retention.order_events,
            product_events_retention: retention.product_events,
            channel_max_attempts: channel.max_attempts,
            channel_retry_backoff: channel.retry_backoff,
            channel_max_dead_letters: channel.max_dead_letters,
            ttl_sweep_interval: Duration::from_secs(60),
        }
    }
}
