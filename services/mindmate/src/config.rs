use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Endpoint used when `MINDMATE_RELAY_URL` is not set.
pub const DEFAULT_RELAY_URL: &str = "ws://127.0.0.1:8000/ws";

const DEFAULT_RECONNECT_MS: u64 = 3000;

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub relay_url: String,
    /// Fixed delay between reconnect attempts. Deliberately not an
    /// exponential backoff; there is one client per socket.
    pub reconnect_delay: Duration,
    pub log_level: Level,
    pub input_device: Option<String>,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let relay_url =
            std::env::var("MINDMATE_RELAY_URL").unwrap_or_else(|_| DEFAULT_RELAY_URL.to_string());
        validate_url("MINDMATE_RELAY_URL", &relay_url)?;

        let reconnect_ms = match std::env::var("MINDMATE_RECONNECT_MS") {
            Ok(raw) => parse_reconnect_ms("MINDMATE_RECONNECT_MS", &raw)?,
            Err(_) => DEFAULT_RECONNECT_MS,
        };

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let input_device = std::env::var("MINDMATE_INPUT_DEVICE").ok();

        Ok(Self {
            relay_url,
            reconnect_delay: Duration::from_millis(reconnect_ms),
            log_level,
            input_device,
        })
    }

    /// Applies command-line overrides on top of the environment.
    pub fn apply_overrides(
        &mut self,
        url: Option<String>,
        reconnect_ms: Option<u64>,
    ) -> Result<(), ConfigError> {
        if let Some(url) = url {
            validate_url("--url", &url)?;
            self.relay_url = url;
        }
        if let Some(ms) = reconnect_ms {
            self.reconnect_delay = Duration::from_millis(ms);
        }
        Ok(())
    }
}

fn validate_url(source: &str, url: &str) -> Result<(), ConfigError> {
    if url.starts_with("ws://") || url.starts_with("wss://") {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue(
            source.to_string(),
            format!("'{}' is not a ws:// or wss:// URL", url),
        ))
    }
}

fn parse_reconnect_ms(source: &str, raw: &str) -> Result<u64, ConfigError> {
    raw.parse::<u64>().map_err(|_| {
        ConfigError::InvalidValue(
            source.to_string(),
            format!("'{}' is not a delay in milliseconds", raw),
        )
    })
}
