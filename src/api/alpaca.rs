use crate::api::{BrokerClient, MarketDataSource};
use crate::error::PipelineError;
use crate::models::{AssetType, BarRequest, LimitOrder, PriceBar, TimeInForce, TradeSide};
use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

pub const ALPACA_PAPER_API_BASE: &str = "https://paper-api.alpaca.markets";
pub const ALPACA_DATA_API_BASE: &str = "https://data.alpaca.markets";
const SERVICE: &str = "alpaca";

/// Alpaca client: historical bars (stocks and crypto) and order submission
#[derive(Clone)]
pub struct AlpacaClient {
    client: Client,
    api_key: String,
    secret_key: String,
    trading_base: String,
    data_base: String,
    stock_feed: Option<String>,
}

// ============== Response Types ==============

#[derive(Debug, Deserialize)]
struct RawBar {
    t: DateTime<Utc>,
    c: f64,
}

#[derive(Debug, Deserialize)]
struct StockBarsResponse {
    #[serde(default)]
    bars: Option<Vec<RawBar>>,
}

#[derive(Debug, Deserialize)]
struct CryptoBarsResponse {
    #[serde(default)]
    bars: HashMap<String, Vec<RawBar>>,
}

#[derive(Debug, Serialize)]
struct OrderRequest<'a> {
    symbol: &'a str,
    qty: String,
    side: TradeSide,
    #[serde(rename = "type")]
    order_type: &'static str,
    time_in_force: TimeInForce,
    limit_price: String,
    client_order_id: String,
}

#[derive(Debug, Deserialize)]
struct OrderResponse {
    id: String,
    status: String,
}

impl From<RawBar> for PriceBar {
    fn from(raw: RawBar) -> Self {
        PriceBar {
            timestamp: raw.t,
            close: raw.c,
        }
    }
}

// ============== Implementation ==============

impl AlpacaClient {
    /// Paper trading endpoints by default
    pub fn new(api_key: String, secret_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            secret_key,
            trading_base: ALPACA_PAPER_API_BASE.to_string(),
            data_base: ALPACA_DATA_API_BASE.to_string(),
            stock_feed: None,
        }
    }

    pub fn with_endpoints(mut self, trading_base: String, data_base: String) -> Self {
        self.trading_base = trading_base.trim_end_matches('/').to_string();
        self.data_base = data_base.trim_end_matches('/').to_string();
        self
    }

    /// Stock data feed (`iex` for free accounts, `sip` otherwise)
    pub fn with_stock_feed(mut self, feed: Option<String>) -> Self {
        self.stock_feed = feed;
        self
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("APCA-API-KEY-ID", &self.api_key)
            .header("APCA-API-SECRET-KEY", &self.secret_key)
    }

    async fn send(&self, builder: RequestBuilder, what: &str) -> Result<reqwest::Response> {
        let response = self
            .authed(builder)
            .send()
            .await
            .map_err(|e| PipelineError::external(SERVICE, e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(PipelineError::external(
            SERVICE,
            format!("{} failed ({}): {}", what, status, error_text),
        ))
    }

    async fn stock_bars(&self, request: &BarRequest) -> Result<Vec<RawBar>> {
        let url = format!("{}/v2/stocks/{}/bars", self.data_base, request.symbol);
        let mut params = bar_params(request);
        if let Some(feed) = &self.stock_feed {
            params.push(("feed", feed.clone()));
        }

        let response = self
            .send(self.client.get(&url).query(&params), "stock bars")
            .await?;
        let parsed: StockBarsResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::external(SERVICE, format!("bad bars response: {}", e)))?;

        Ok(parsed.bars.unwrap_or_default())
    }

    async fn crypto_bars(&self, request: &BarRequest) -> Result<Vec<RawBar>> {
        let url = format!("{}/v1beta3/crypto/us/bars", self.data_base);
        let mut params = bar_params(request);
        params.push(("symbols", request.symbol.clone()));

        let response = self
            .send(self.client.get(&url).query(&params), "crypto bars")
            .await?;
        let mut parsed: CryptoBarsResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::external(SERVICE, format!("bad bars response: {}", e)))?;

        Ok(parsed.bars.remove(&request.symbol).unwrap_or_default())
    }
}

fn bar_params(request: &BarRequest) -> Vec<(&'static str, String)> {
    vec![
        ("timeframe", request.unit.as_timeframe().to_string()),
        (
            "start",
            request.start.to_rfc3339_opts(SecondsFormat::Secs, true),
        ),
        ("limit", request.limit.to_string()),
    ]
}

#[async_trait]
impl MarketDataSource for AlpacaClient {
    async fn get_bars(&self, request: &BarRequest) -> Result<Vec<PriceBar>> {
        let raw = match request.asset_type {
            AssetType::Stock => self.stock_bars(request).await?,
            AssetType::Crypto => self.crypto_bars(request).await?,
        };

        let mut bars: Vec<PriceBar> = raw.into_iter().map(PriceBar::from).collect();
        bars.sort_by_key(|bar| bar.timestamp);

        tracing::debug!(
            symbol = %request.symbol,
            count = bars.len(),
            timeframe = request.unit.as_timeframe(),
            "Fetched bars"
        );

        Ok(bars)
    }
}

#[async_trait]
impl BrokerClient for AlpacaClient {
    async fn submit_limit_order(&self, order: &LimitOrder) -> Result<()> {
        let url = format!("{}/v2/orders", self.trading_base);
        let body = OrderRequest {
            symbol: &order.symbol,
            qty: order.qty.to_string(),
            side: order.side,
            order_type: "limit",
            time_in_force: order.time_in_force,
            limit_price: order.limit_price.to_string(),
            client_order_id: Uuid::new_v4().to_string(),
        };

        let response = self
            .send(self.client.post(&url).json(&body), "order submission")
            .await?;
        let accepted: OrderResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::external(SERVICE, format!("bad order response: {}", e)))?;

        tracing::debug!(
            order_id = %accepted.id,
            status = %accepted.status,
            "Order accepted by broker"
        );

        Ok(())
    }
}
