use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{Symbol, TradingMode};

/// Secrets and endpoints loaded from environment variables at startup.
/// Missing required variables cause an immediate panic with a clear message.
#[derive(Debug, Clone)]
pub struct Config {
    // Telegram bot token: "<bot id>:<secret>"
    pub telegram_token: String,

    // Terminal bridge
    pub bridge_url: String,
    pub bridge_api_key: String,
    pub bridge_secret: String,

    // Trading
    pub trading_mode: TradingMode,

    // Relay config file path
    pub relay_config_path: String,
}

impl Config {
    /// Load all configuration from environment variables.
    /// Loads `.env` if present. Panics on any missing required variable.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // ignore error if .env not present

        let trading_mode = match required_env("TRADING_MODE").to_lowercase().as_str() {
            "paper" => TradingMode::Paper,
            "live" => TradingMode::Live,
            other => panic!("ERROR: TRADING_MODE must be 'paper' or 'live', got: '{other}'"),
        };

        Config {
            telegram_token: required_env("TELEGRAM_TOKEN"),
            bridge_url: optional_env("BRIDGE_URL")
                .unwrap_or_else(|| "http://127.0.0.1:8090".to_string()),
            bridge_api_key: required_env("BRIDGE_API_KEY"),
            bridge_secret: required_env("BRIDGE_SECRET"),
            trading_mode,
            relay_config_path: optional_env("RELAY_CONFIG_PATH")
                .unwrap_or_else(|| "config/relay.toml".to_string()),
        }
    }
}

fn required_env(key: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| {
        panic!("Required environment variable '{key}' is not set. Check your .env file.")
    })
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Chats the signal providers post in.
pub const DEFAULT_SIGNAL_CHATS: [i64; 5] = [
    -1001763228815,
    -1001620915850,
    -1001195451019,
    -1001788360823,
    -4000930568,
];

/// Operations chat receiving one audit message per screened signal.
pub const DEFAULT_ALERTS_CHAT: i64 = -4046528690;

/// Phrases marking follow-up chatter ("TP1 HIT", "MOVE SL TO BE", ...)
/// rather than a fresh signal. Matched as substrings of the upper-cased text.
pub const DEFAULT_BLACKLIST: [&str; 9] = [
    "HOLD",
    "BE",
    "BREAKEVEN",
    "HIT",
    "RUNNING",
    "CLOSE",
    "COLLECT",
    "PIPS",
    "SUCCESS",
];

/// Relay behaviour knobs (TOML).
///
/// Every field is optional; anything omitted keeps the compiled-in default.
///
/// Example `config/relay.toml`:
/// ```toml
/// alerts_chat = -4046528690
/// symbols = ["XAUUSD", "EURUSD"]
/// server_utc_offset_hours = -3
/// lot_size = 0.01
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Chat ids whose messages are screened for signals.
    pub signal_chats: Vec<i64>,
    /// Chat id that receives the audit messages.
    pub alerts_chat: i64,
    /// Tracked symbols. Signals for anything else are ignored.
    pub symbols: Vec<Symbol>,
    pub blacklist: Vec<String>,
    /// Server wall clock = UTC + this many hours.
    pub server_utc_offset_hours: i64,
    /// Lot size of every order leg.
    pub lot_size: f64,
    /// Maximum slippage in points passed with every order leg.
    pub deviation: u32,
    /// Magic number stamped on every order leg.
    pub magic: u64,
    pub refresh_interval_secs: u64,
    /// Messages older than this (by original send time) are dropped.
    pub max_message_age_secs: i64,
    /// Fetch attempts per symbol per refresh cycle.
    pub retry_attempts: u32,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            signal_chats: DEFAULT_SIGNAL_CHATS.to_vec(),
            alerts_chat: DEFAULT_ALERTS_CHAT,
            symbols: Symbol::ALL.to_vec(),
            blacklist: DEFAULT_BLACKLIST.iter().map(|s| s.to_string()).collect(),
            server_utc_offset_hours: -3,
            lot_size: 0.01,
            deviation: 5,
            magic: 0,
            refresh_interval_secs: 600,
            max_message_age_secs: 60,
            retry_attempts: 5,
        }
    }
}

impl RelayConfig {
    /// Load from a TOML file, falling back to defaults when the file does
    /// not exist. Exits process on a file that exists but cannot be parsed.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            info!(path = %path.display(), "No relay config file, using built-in defaults");
            return Self::default();
        }
        let content = std::fs::read_to_string(path).unwrap_or_else(|e| {
            panic!("Failed to read relay config at '{}': {e}", path.display())
        });
        Self::parse(&content).unwrap_or_else(|e| {
            panic!("Failed to parse relay config at '{}': {e}", path.display())
        })
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let cfg = RelayConfig::parse("").unwrap();
        assert_eq!(cfg.symbols, Symbol::ALL.to_vec());
        assert_eq!(cfg.blacklist.len(), DEFAULT_BLACKLIST.len());
        assert_eq!(cfg.alerts_chat, DEFAULT_ALERTS_CHAT);
        assert_eq!(cfg.retry_attempts, 5);
        assert_eq!(cfg.max_message_age_secs, 60);
    }

    #[test]
    fn partial_file_overrides_only_given_fields() {
        let cfg = RelayConfig::parse(
            r#"
            symbols = ["XAUUSD", "GBPJPY"]
            lot_size = 0.05
            server_utc_offset_hours = 2
            "#,
        )
        .unwrap();
        assert_eq!(cfg.symbols, vec![Symbol::Xauusd, Symbol::Gbpjpy]);
        assert!((cfg.lot_size - 0.05).abs() < 1e-12);
        assert_eq!(cfg.server_utc_offset_hours, 2);
        assert_eq!(cfg.deviation, 5);
    }

    #[test]
    fn unknown_symbol_is_rejected() {
        assert!(RelayConfig::parse(r#"symbols = ["BTCUSD"]"#).is_err());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let cfg = RelayConfig::load("/nonexistent/relay.toml");
        assert_eq!(cfg.signal_chats, DEFAULT_SIGNAL_CHATS.to_vec());
    }
}
