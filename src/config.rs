use std::collections::HashMap;
use std::path::Path;

use config::{Config, ConfigBuilder, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

use crate::api::alpaca::{ALPACA_DATA_API_BASE, ALPACA_PAPER_API_BASE};
use crate::models::{Lookback, TimeframeUnit};
use crate::nlp::LabelMap;
use crate::pipeline::{SymbolTarget, TradeSettings};
use crate::strategy::SignalConfig;

const ENV_PREFIX: &str = "SENTITRADER";
const DEFAULT_SETTINGS_FILE: &str = "Settings";

#[derive(Debug, Deserialize, Clone)]
pub struct TwitterSettings {
    pub bearer_token: String,
    #[serde(default = "default_twitter_base")]
    pub base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HuggingFaceSettings {
    pub token: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_hf_base")]
    pub base_url: String,
    /// Model label -> positive/negative/neutral. Unset means the finance map.
    #[serde(default)]
    pub label_map: Option<HashMap<String, String>>,
}

impl HuggingFaceSettings {
    pub fn labels(&self) -> LabelMap {
        match &self.label_map {
            Some(entries) => LabelMap::new(entries.clone()),
            None => LabelMap::finance(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AlpacaSettings {
    pub api_key: String,
    pub secret_key: String,
    #[serde(default = "default_trading_base")]
    pub trading_base_url: String,
    #[serde(default = "default_data_base")]
    pub data_base_url: String,
    #[serde(default)]
    pub stock_feed: Option<String>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct TradeConfig {
    pub qty: f64,
    pub threshold_pct: f64,
    pub lookback_unit: TimeframeUnit,
    pub lookback_count: u32,
    pub dry_run: bool,
}

impl Default for TradeConfig {
    fn default() -> Self {
        Self {
            qty: 1.0,
            threshold_pct: 5.0,
            lookback_unit: TimeframeUnit::Hour,
            lookback_count: 24,
            dry_run: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub twitter: TwitterSettings,
    pub huggingface: HuggingFaceSettings,
    pub alpaca: AlpacaSettings,
    #[serde(default)]
    pub signal: SignalConfig,
    #[serde(default)]
    pub trade: TradeConfig,
    #[serde(default)]
    pub symbols: Vec<SymbolTarget>,
}

impl AppConfig {
    /// File (explicit path, or optional `Settings.*` in the working
    /// directory), then `SENTITRADER_*` environment variables with `__`
    /// between nested keys, e.g. `SENTITRADER_ALPACA__API_KEY`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(p) => File::from(p).required(true),
            None => File::with_name(DEFAULT_SETTINGS_FILE).required(false),
        };

        let builder = Config::builder().add_source(file).add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        Self::build(builder)
    }

    /// Parse TOML text only (no environment)
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        Self::build(Config::builder().add_source(File::from_str(toml, FileFormat::Toml)))
    }

    fn build(builder: ConfigBuilder<config::builder::DefaultState>) -> Result<Self, ConfigError> {
        builder.build()?.try_deserialize()
    }

    pub fn lookback(&self) -> Lookback {
        Lookback::new(self.trade.lookback_unit, self.trade.lookback_count)
    }

    pub fn trade_settings(&self) -> TradeSettings {
        TradeSettings {
            signal: self.signal.clone(),
            qty: self.trade.qty,
            threshold_pct: self.trade.threshold_pct,
            lookback: self.lookback(),
        }
    }
}

fn default_twitter_base() -> String {
    "https://api.twitter.com".to_string()
}

fn default_model() -> String {
    "StephanAkkerman/FinTwitBERT-sentiment".to_string()
}

fn default_hf_base() -> String {
    "https://api-inference.huggingface.co".to_string()
}

fn default_trading_base() -> String {
    ALPACA_PAPER_API_BASE.to_string()
}

fn default_data_base() -> String {
    ALPACA_DATA_API_BASE.to_string()
}
