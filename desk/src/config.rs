//! TOML configuration loading and validation.

use std::path::{Path, PathBuf};

use log::warn;
use orderdesk_risk::Limits;
use serde::Deserialize;

use crate::error::{Error, Result};

/// Ports TWS and IB Gateway listen on for live (real-money) sessions.
pub const LIVE_PORTS: [u16; 2] = [7496, 4001];

/// Top-level configuration. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub connection: ConnectionConfig,
    pub account: AccountConfig,
    pub storage: StorageConfig,
    pub limits: Limits,
    pub execution: ExecutionConfig,
    pub defaults: DefaultsConfig,
    pub quotes: QuotesConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub client_id: i32,
    /// How long a submission waits for the gateway's first status report.
    pub settle_ms: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 7497,
            client_id: 5,
            settle_ms: 2_000,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AccountConfig {
    pub id: String,
    pub mode: TradingMode,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradingMode {
    #[default]
    Paper,
    Live,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub history_file: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            history_file: PathBuf::from("data/order_history.json"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    pub bracket_leg_interval_ms: u64,
    pub cancel_interval_ms: u64,
    pub cancel_settle_ms: u64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            bracket_leg_interval_ms: 1_000,
            cancel_interval_ms: 500,
            cancel_settle_ms: 2_000,
        }
    }
}

/// Values pre-filled in the interactive prompts.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    pub forex_quantity: f64,
    pub stock_quantity: f64,
    pub option_quantity: f64,
    pub exchange: String,
    pub currency: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            forex_quantity: 10_000.0,
            stock_quantity: 100.0,
            option_quantity: 1.0,
            exchange: "SMART".into(),
            currency: "USD".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QuotesConfig {
    /// Pairs fetched by `quote` when none are given.
    pub pairs: Vec<String>,
    /// Concurrent gateway sessions used for a quote batch.
    pub workers: usize,
}

impl Default for QuotesConfig {
    fn default() -> Self {
        Self {
            pairs: ["EURUSD", "GBPUSD", "USDJPY", "USDCHF", "AUDUSD", "USDCAD"]
                .into_iter()
                .map(String::from)
                .collect(),
            workers: 3,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub dir: String,
    pub audit_file: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: "data/logs".into(),
            audit_file: "audit.jsonl".into(),
        }
    }
}

impl Config {
    /// Load config from a TOML file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!(
                "Config file {} not found, using defaults (paper trading on port 7497)",
                path.display()
            );
            let config = Config::default();
            config.validate()?;
            return Ok(config);
        }
        let contents = std::fs::read_to_string(path).map_err(|e| Error::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate config invariants.
    pub fn validate(&self) -> Result<()> {
        if self.connection.host.trim().is_empty() {
            return Err(Error::Config("host must not be empty".into()));
        }
        if self.connection.port == 0 {
            return Err(Error::Config("port must be > 0".into()));
        }
        if self.connection.client_id < 0 {
            return Err(Error::Config("client_id must be >= 0".into()));
        }
        if self.storage.history_file.as_os_str().is_empty() {
            return Err(Error::Config("history_file must not be empty".into()));
        }
        self.limits.validate().map_err(Error::Config)?;
        if self.quotes.workers == 0 {
            return Err(Error::Config("quotes.workers must be >= 1".into()));
        }
        for (name, qty) in [
            ("forex_quantity", self.defaults.forex_quantity),
            ("stock_quantity", self.defaults.stock_quantity),
            ("option_quantity", self.defaults.option_quantity),
        ] {
            if !qty.is_finite() || qty <= 0.0 {
                return Err(Error::Config(format!("defaults.{name} must be > 0")));
            }
        }
        Ok(())
    }

    /// IBKR connection address string.
    pub fn address(&self) -> String {
        format!("{}:{}", self.connection.host, self.connection.port)
    }

    /// Full path to the audit log file.
    pub fn audit_path(&self) -> PathBuf {
        Path::new(&self.logging.dir).join(&self.logging.audit_file)
    }

    /// A warning to confirm before touching real money, if this config
    /// could reach a live account.
    pub fn live_trading_warning(&self) -> Option<String> {
        let live_port = LIVE_PORTS.contains(&self.connection.port);
        match (self.account.mode, live_port) {
            (TradingMode::Paper, false) => None,
            (TradingMode::Live, _) => Some(format!(
                "LIVE trading mode: orders go to a real account via {}",
                self.address()
            )),
            (TradingMode::Paper, true) => Some(format!(
                "port {} is a live-trading port but mode is paper; orders may reach a real account",
                self.connection.port
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example_toml() -> &'static str {
        r#"
[connection]
host = "127.0.0.1"
port = 4002
client_id = 100

[account]
id = "DU123456"
mode = "paper"

[storage]
history_file = "data/order_history.json"

[limits]
max_order_value = 50000.0
max_position_size = 100000.0

[execution]
bracket_leg_interval_ms = 250
cancel_interval_ms = 100
cancel_settle_ms = 1000

[defaults]
forex_quantity = 25000

[quotes]
pairs = ["EURUSD", "GBPUSD"]
workers = 2

[logging]
dir = "./logs"
audit_file = "audit.jsonl"
"#
    }

    #[test]
    fn parse_example_config() {
        let config = Config::from_toml(example_toml()).unwrap();
        assert_eq!(config.connection.port, 4002);
        assert_eq!(config.connection.client_id, 100);
        assert_eq!(config.connection.settle_ms, 2_000);
        assert_eq!(config.account.mode, TradingMode::Paper);
        assert_eq!(config.execution.bracket_leg_interval_ms, 250);
        assert_eq!(config.limits.max_price, 1_000_000.0);
        assert_eq!(config.defaults.forex_quantity, 25_000.0);
        assert_eq!(config.defaults.stock_quantity, 100.0);
        assert_eq!(config.quotes.pairs, vec!["EURUSD", "GBPUSD"]);
    }

    #[test]
    fn shipped_example_parses() {
        let config = Config::from_toml(include_str!("../config.example.toml")).unwrap();
        assert_eq!(config.account.id, "DU123456");
        assert_eq!(config.quotes.workers, 3);
        assert!(config.live_trading_warning().is_none());
    }

    #[test]
    fn empty_file_is_all_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.connection.port, 7497);
        assert_eq!(
            config.storage.history_file,
            PathBuf::from("data/order_history.json")
        );
        assert_eq!(config.audit_path(), PathBuf::from("data/logs/audit.jsonl"));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config.address(), "127.0.0.1:7497");
    }

    #[test]
    fn validate_catches_bad_port() {
        let mut config = Config::from_toml(example_toml()).unwrap();
        config.connection.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_catches_bad_limits() {
        let toml = example_toml().replace("max_order_value = 50000.0", "max_order_value = -1.0");
        assert!(matches!(Config::from_toml(&toml), Err(Error::Config(_))));
    }

    #[test]
    fn validate_catches_zero_workers() {
        let toml = example_toml().replace("workers = 2", "workers = 0");
        assert!(Config::from_toml(&toml).is_err());
    }

    #[test]
    fn unknown_mode_is_parse_error() {
        let toml = example_toml().replace("\"paper\"", "\"demo\"");
        assert!(matches!(Config::from_toml(&toml), Err(Error::ConfigParse(_))));
    }

    #[test]
    fn live_warning() {
        let mut config = Config::default();
        assert!(config.live_trading_warning().is_none());

        config.connection.port = 7496;
        assert!(config.live_trading_warning().unwrap().contains("live-trading port"));

        config.connection.port = 7497;
        config.account.mode = TradingMode::Live;
        assert!(config.live_trading_warning().unwrap().starts_with("LIVE"));
    }
}
