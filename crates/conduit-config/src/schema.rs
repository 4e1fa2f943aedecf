//! Configuration schema types.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use conduit_protocol::schema::ValidationMode;

/// Top-level conduit configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConduitConfig {
    /// Dispatch settings shared by every server.
    #[serde(default)]
    pub server: ServerConfig,
    /// Notes store settings.
    #[serde(default)]
    pub notes: NotesConfig,
    /// Alpha Vantage API settings (earnings and forex servers).
    #[serde(default)]
    pub alpha_vantage: AlphaVantageConfig,
    /// Alpaca API settings (order server).
    #[serde(default)]
    pub alpaca: AlpacaConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Dispatch configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Per-request handler deadline in seconds; 0 disables it.
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    /// `strict` checks types and enums; `presence` only required fields.
    #[serde(default)]
    pub validation: ValidationMode,
}

impl ServerConfig {
    /// Returns the deadline as a `Duration`, or `None` when disabled.
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_timeout_secs(),
            validation: ValidationMode::default(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

/// Notes store configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotesConfig {
    /// Directory holding `<slug>.txt` files. Created on first write.
    #[serde(default = "default_notes_dir")]
    pub directory: PathBuf,
}

impl Default for NotesConfig {
    fn default() -> Self {
        Self {
            directory: default_notes_dir(),
        }
    }
}

fn default_notes_dir() -> PathBuf {
    PathBuf::from("notes")
}

/// Alpha Vantage configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlphaVantageConfig {
    /// API root; `/query` is appended.
    #[serde(default = "default_alpha_vantage_url")]
    pub base_url: String,
    /// API key. The public `demo` key only serves a few symbols.
    #[serde(default = "default_alpha_vantage_key")]
    pub api_key: String,
}

impl Default for AlphaVantageConfig {
    fn default() -> Self {
        Self {
            base_url: default_alpha_vantage_url(),
            api_key: default_alpha_vantage_key(),
        }
    }
}

fn default_alpha_vantage_url() -> String {
    "https://www.alphavantage.co".to_string()
}
fn default_alpha_vantage_key() -> String {
    "demo".to_string()
}

/// Alpaca trading API configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlpacaConfig {
    /// API root; `/orders` is appended.
    #[serde(default = "default_alpaca_url")]
    pub base_url: String,
    /// Sent as `APCA-API-KEY-ID`.
    #[serde(default)]
    pub key_id: String,
    /// Sent as `APCA-API-SECRET-KEY`.
    #[serde(default)]
    pub secret_key: String,
}

impl Default for AlpacaConfig {
    fn default() -> Self {
        Self {
            base_url: default_alpaca_url(),
            key_id: String::new(),
            secret_key: String::new(),
        }
    }
}

fn default_alpaca_url() -> String {
    "https://paper-api.alpaca.markets/v2".to_string()
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g. "info", "debug", "conduit_mcp=trace").
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
