// In crates/app-config/src/types.rs

use serde::Deserialize;

use crate::error::{Error, Result};
use indicators::IndicatorSettings;

#[derive(Deserialize, Debug, Clone)]
pub struct Settings {
    /// The application's general settings.
    pub app: AppSettings,
    /// Settings for the price data source.
    #[serde(default)]
    pub market_data: MarketDataSettings,
    /// Window lengths for the indicator engine.
    #[serde(default)]
    pub indicators: IndicatorSettings,
    /// Which oracle transport to use and how to reach it.
    pub oracle: OracleSettings,
    /// Settings for the ledger database.
    pub database: DatabaseSettings,
}

impl Settings {
    /// Rejects combinations the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        self.indicators
            .validate()
            .map_err(|e| Error::Invalid(format!("indicators: {}", e)))?;

        match self.oracle.transport {
            OracleTransportKind::Http if self.oracle.http.is_none() => {
                return Err(Error::Invalid(
                    "oracle.transport is \"http\" but [oracle.http] is missing".into(),
                ));
            }
            OracleTransportKind::File => {
                if self.oracle.file.max_polls == 0 {
                    return Err(Error::Invalid("oracle.file.max_polls must be at least 1".into()));
                }
            }
            _ => {}
        }

        if self.database.max_connections == 0 {
            return Err(Error::Invalid("database.max_connections must be at least 1".into()));
        }

        Ok(())
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct AppSettings {
    /// The environment the application is running in (e.g., "development", "production").
    pub environment: String,
    /// The log level for the application.
    pub log_level: String,
    /// Tickers analysed by `run` when none are given on the command line.
    #[serde(default)]
    pub tickers: Vec<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct MarketDataSettings {
    /// Base URL of the chart API.
    #[serde(default = "default_market_base_url")]
    pub base_url: String,
    /// Lookback range requested per fetch (e.g., "1d", "5d").
    #[serde(default = "default_range")]
    pub range: String,
    /// Sampling granularity (e.g., "5m", "1h").
    #[serde(default = "default_interval")]
    pub interval: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for MarketDataSettings {
    fn default() -> Self {
        Self {
            base_url: default_market_base_url(),
            range: default_range(),
            interval: default_interval(),
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OracleTransportKind {
    /// Prompt on stdout, reply typed on stdin.
    Console,
    /// Prompt and reply exchanged through files.
    File,
    /// OpenAI-compatible chat completions endpoint.
    Http,
}

#[derive(Deserialize, Debug, Clone)]
pub struct OracleSettings {
    pub transport: OracleTransportKind,
    #[serde(default)]
    pub file: FileRelaySettings,
    pub http: Option<HttpOracleSettings>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct FileRelaySettings {
    #[serde(default = "default_prompt_path")]
    pub prompt_path: String,
    #[serde(default = "default_response_path")]
    pub response_path: String,
    /// Delay between two reads of the response file.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Upper bound on reads before the relay gives up.
    #[serde(default = "default_max_polls")]
    pub max_polls: u32,
}

impl Default for FileRelaySettings {
    fn default() -> Self {
        Self {
            prompt_path: default_prompt_path(),
            response_path: default_response_path(),
            poll_interval_ms: default_poll_interval_ms(),
            max_polls: default_max_polls(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct HttpOracleSettings {
    /// Base URL up to and including the API version (e.g., "https://api.openai.com/v1").
    pub base_url: String,
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Deserialize, Debug, Clone)]
pub struct DatabaseSettings {
    /// The connection URL for the SQLite ledger (e.g., "sqlite://ledger.db").
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

/// Helper functions for serde defaults
fn default_market_base_url() -> String { "https://query1.finance.yahoo.com".into() }
fn default_range() -> String { "1d".into() }
fn default_interval() -> String { "5m".into() }
fn default_user_agent() -> String { "Mozilla/5.0 (compatible; decision-ledger)".into() }
fn default_prompt_path() -> String { "prompt.txt".into() }
fn default_response_path() -> String { "response.txt".into() }
fn default_poll_interval_ms() -> u64 { 2_000 }
fn default_max_polls() -> u32 { 900 }
fn default_request_timeout_secs() -> u64 { 120 }
fn default_max_connections() -> u32 { 1 }

#[cfg(test)]
mod tests {
    use super::*;
    use config::{Config, File, FileFormat};

    fn parse(toml: &str) -> Settings {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    const MINIMAL: &str = r#"
        [app]
        environment = "test"
        log_level = "debug"

        [oracle]
        transport = "console"

        [database]
        url = "sqlite::memory:"
    "#;

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let settings = parse(MINIMAL);

        assert_eq!(settings.indicators, IndicatorSettings::default());
        assert_eq!(settings.indicators.sma_window, 10);
        assert_eq!(settings.indicators.rsi_window, 14);
        assert_eq!(settings.market_data.range, "1d");
        assert_eq!(settings.market_data.interval, "5m");
        assert_eq!(settings.oracle.transport, OracleTransportKind::Console);
        assert_eq!(settings.oracle.file.prompt_path, "prompt.txt");
        assert!(settings.app.tickers.is_empty());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn http_transport_requires_its_section() {
        let toml = MINIMAL.replace("transport = \"console\"", "transport = \"http\"");
        let settings = parse(&toml);

        assert!(matches!(settings.validate(), Err(Error::Invalid(_))));
    }

    #[test]
    fn zero_windows_are_rejected() {
        let toml = format!("{}\n[indicators]\nsma_window = 0\n", MINIMAL);
        let settings = parse(&toml);

        assert!(matches!(settings.validate(), Err(Error::Invalid(msg)) if msg.contains("sma_window")));
    }
}
