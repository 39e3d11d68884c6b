use chrono::{DateTime, Duration, Months, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentiment label produced by a classifier, after label remapping
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
    /// Anything the label map could not place (kept for logging)
    Other(String),
}

impl SentimentLabel {
    /// Parse a lowercase label name; unknown names become `Other`
    pub fn from_name(name: &str) -> Self {
        match name {
            "positive" => Self::Positive,
            "negative" => Self::Negative,
            "neutral" => Self::Neutral,
            other => Self::Other(other.to_string()),
        }
    }
}

/// One classified text: label plus classifier confidence in [0, 1]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SentimentRecord {
    pub label: SentimentLabel,
    pub score: f64,
}

impl SentimentRecord {
    pub fn new(label: SentimentLabel, score: f64) -> Self {
        Self { label, score }
    }

    /// Signed sentiment: +score if positive, -score if negative, 0.0 otherwise
    pub fn signed(&self) -> f64 {
        match self.label {
            SentimentLabel::Positive => self.score,
            SentimentLabel::Negative => -self.score,
            _ => 0.0,
        }
    }
}

/// Trading signal
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Signal::Buy => "BUY",
            Signal::Sell => "SELL",
            Signal::Hold => "HOLD",
        };
        f.write_str(s)
    }
}

/// Output of sentiment aggregation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateResult {
    pub avg_sentiment: f64,
    pub signal: Signal,
    pub pos_ratio: f64,
    pub neg_ratio: f64,
    pub sample_size: usize,
}

/// A single price observation. Only timestamp and close are used.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceBar {
    pub timestamp: DateTime<Utc>,
    pub close: f64,
}

/// Reference prices derived from a window of bars
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceWindowStats {
    pub mean_close: f64,
    pub latest_close: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    Stock,
    Crypto,
}

impl AssetType {
    /// Stock orders expire at the close, crypto trades around the clock
    pub fn time_in_force(&self) -> TimeInForce {
        match self {
            AssetType::Stock => TimeInForce::Day,
            AssetType::Crypto => TimeInForce::Gtc,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TimeInForce {
    Day,
    Gtc,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeSide::Buy => f.write_str("BUY"),
            TradeSide::Sell => f.write_str("SELL"),
        }
    }
}

/// Bar granularity
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TimeframeUnit {
    Min,
    Hour,
    Day,
    Week,
    Month,
}

impl TimeframeUnit {
    /// Timeframe string understood by the market data API (one unit per bar)
    pub fn as_timeframe(&self) -> &'static str {
        match self {
            TimeframeUnit::Min => "1Min",
            TimeframeUnit::Hour => "1Hour",
            TimeframeUnit::Day => "1Day",
            TimeframeUnit::Week => "1Week",
            TimeframeUnit::Month => "1Month",
        }
    }
}

/// How far back to look when building the price window
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Lookback {
    pub unit: TimeframeUnit,
    pub count: u32,
}

impl Lookback {
    pub fn new(unit: TimeframeUnit, count: u32) -> Self {
        Self { unit, count }
    }

    /// Number of bars to ask for.
    ///
    /// Minute bars: the provider leaves out the bar that is still forming,
    /// so two extra are requested.
    pub fn bars_to_request(&self) -> u32 {
        match self.unit {
            TimeframeUnit::Min => self.count.saturating_add(2),
            _ => self.count,
        }
    }

    /// Start of the window ending at `now`
    pub fn window_start(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let n = self.bars_to_request();
        match self.unit {
            TimeframeUnit::Min => now.checked_sub_signed(Duration::minutes(n as i64)),
            TimeframeUnit::Hour => now.checked_sub_signed(Duration::hours(n as i64)),
            TimeframeUnit::Day => now.checked_sub_signed(Duration::days(n as i64)),
            TimeframeUnit::Week => now.checked_sub_signed(Duration::weeks(n as i64)),
            TimeframeUnit::Month => now.checked_sub_months(Months::new(n)),
        }
    }
}

/// Query handed to a market data source
#[derive(Debug, Clone, PartialEq)]
pub struct BarRequest {
    pub symbol: String,
    pub asset_type: AssetType,
    pub unit: TimeframeUnit,
    pub limit: u32,
    pub start: DateTime<Utc>,
}

/// Limit order as handed to the broker
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LimitOrder {
    pub symbol: String,
    pub side: TradeSide,
    pub qty: f64,
    pub limit_price: Decimal,
    pub time_in_force: TimeInForce,
}

/// Filters for the social-media search
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuerySpec {
    #[serde(default)]
    pub accounts: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default = "default_max_results")]
    pub max_results: u32,
}

fn default_max_results() -> u32 {
    10
}

impl QuerySpec {
    /// Search query: `(from:a OR from:b) OR (k1 OR k2) -is:retweet -is:reply`
    pub fn to_query(&self) -> Option<String> {
        let mut parts = Vec::new();
        if !self.accounts.is_empty() {
            let from = self
                .accounts
                .iter()
                .map(|acct| format!("from:{}", acct.trim_start_matches('@')))
                .collect::<Vec<_>>();
            parts.push(from.join(" OR "));
        }
        if !self.keywords.is_empty() {
            parts.push(self.keywords.join(" OR "));
        }
        if parts.is_empty() {
            return None;
        }

        let grouped = parts
            .iter()
            .map(|p| format!("({})", p))
            .collect::<Vec<_>>()
            .join(" OR ");
        Some(format!("{} -is:retweet -is:reply", grouped))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_signed_sentiment() {
        assert_eq!(SentimentRecord::new(SentimentLabel::Positive, 0.8).signed(), 0.8);
        assert_eq!(SentimentRecord::new(SentimentLabel::Negative, 0.8).signed(), -0.8);
        assert_eq!(SentimentRecord::new(SentimentLabel::Neutral, 0.8).signed(), 0.0);
        assert_eq!(
            SentimentRecord::new(SentimentLabel::Other("mixed".to_string()), 0.8).signed(),
            0.0
        );
    }

    #[test]
    fn test_label_from_name() {
        assert_eq!(SentimentLabel::from_name("positive"), SentimentLabel::Positive);
        assert_eq!(SentimentLabel::from_name("neutral"), SentimentLabel::Neutral);
        assert_eq!(
            SentimentLabel::from_name("label_2"),
            SentimentLabel::Other("label_2".to_string())
        );
    }

    #[test]
    fn test_time_in_force_by_asset() {
        assert_eq!(AssetType::Stock.time_in_force(), TimeInForce::Day);
        assert_eq!(AssetType::Crypto.time_in_force(), TimeInForce::Gtc);
    }

    #[test]
    fn test_minute_lookback_requests_two_extra_bars() {
        let lookback = Lookback::new(TimeframeUnit::Min, 15);
        assert_eq!(lookback.bars_to_request(), 17);

        let now = Utc.with_ymd_and_hms(2024, 3, 1, 15, 0, 0).unwrap();
        let start = lookback.window_start(now).unwrap();
        assert_eq!(now - start, Duration::minutes(17));
    }

    #[test]
    fn test_hour_and_month_lookback() {
        let now = Utc.with_ymd_and_hms(2024, 3, 31, 12, 0, 0).unwrap();

        let hours = Lookback::new(TimeframeUnit::Hour, 24);
        assert_eq!(hours.bars_to_request(), 24);
        assert_eq!(now - hours.window_start(now).unwrap(), Duration::hours(24));

        let months = Lookback::new(TimeframeUnit::Month, 1);
        assert_eq!(
            months.window_start(now).unwrap(),
            Utc.with_ymd_and_hms(2024, 2, 29, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_signal_display() {
        assert_eq!(Signal::Buy.to_string(), "BUY");
        assert_eq!(Signal::Hold.to_string(), "HOLD");
        assert_eq!(TradeSide::Sell.to_string(), "SELL");
    }

    #[test]
    fn test_query_accounts_and_keywords() {
        let filter = QuerySpec {
            accounts: vec!["business".to_string(), "@elonmusk".to_string()],
            keywords: vec!["crypto".to_string(), "SP500".to_string()],
            max_results: 10,
        };
        assert_eq!(
            filter.to_query().unwrap(),
            "(from:business OR from:elonmusk) OR (crypto OR SP500) -is:retweet -is:reply"
        );
    }

    #[test]
    fn test_query_keywords_only() {
        let filter = QuerySpec {
            accounts: vec![],
            keywords: vec!["$TSLA".to_string()],
            max_results: 10,
        };
        assert_eq!(filter.to_query().unwrap(), "($TSLA) -is:retweet -is:reply");
    }

    #[test]
    fn test_query_requires_a_filter() {
        let filter = QuerySpec {
            accounts: vec![],
            keywords: vec![],
            max_results: 10,
        };
        assert!(filter.to_query().is_none());
    }
}
