use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::api::{BrokerClient, MarketDataSource};
use crate::error::PipelineError;
use crate::execution::order_gate::{decide, OrderAction};
use crate::execution::price_window::evaluate;
use crate::models::{AssetType, BarRequest, LimitOrder, Lookback, Signal};
use crate::Result;

/// Everything needed to act on one symbol's signal
#[derive(Debug, Clone, PartialEq)]
pub struct TradeRequest {
    pub symbol: String,
    pub signal: Signal,
    pub qty: f64,
    pub threshold_pct: f64,
    pub lookback: Lookback,
    pub asset_type: AssetType,
}

/// What happened to a trade request. Only `Submitted` sends an order.
#[derive(Debug, Clone, PartialEq)]
pub enum TradeOutcome {
    Submitted(LimitOrder),
    Held,
    Abstained { reason: String },
    /// No bars in the window, usually because the market is closed
    NoData,
}

/// Fetches recent bars, gates the signal on price, and places the limit order
pub struct Trader {
    market_data: Arc<dyn MarketDataSource>,
    broker: Arc<dyn BrokerClient>,
}

impl Trader {
    pub fn new(market_data: Arc<dyn MarketDataSource>, broker: Arc<dyn BrokerClient>) -> Self {
        Self {
            market_data,
            broker,
        }
    }

    pub async fn execute(&self, request: &TradeRequest) -> Result<TradeOutcome> {
        self.execute_at(request, Utc::now()).await
    }

    /// Same as `execute` with the window ending at `now`
    pub async fn execute_at(
        &self,
        request: &TradeRequest,
        now: DateTime<Utc>,
    ) -> Result<TradeOutcome> {
        validate(request)?;

        if request.signal == Signal::Hold {
            tracing::info!(symbol = %request.symbol, "Holding (no action taken)");
            return Ok(TradeOutcome::Held);
        }

        let start = request.lookback.window_start(now).ok_or_else(|| {
            PipelineError::InvalidInput(format!(
                "lookback of {} {:?} is out of range",
                request.lookback.count, request.lookback.unit
            ))
        })?;

        let bar_request = BarRequest {
            symbol: request.symbol.clone(),
            asset_type: request.asset_type,
            unit: request.lookback.unit,
            limit: request.lookback.bars_to_request(),
            start,
        };

        let bars = self.market_data.get_bars(&bar_request).await?;

        let stats = match evaluate(&bars) {
            Ok(stats) => stats,
            Err(e) if e.is_recoverable() => {
                tracing::info!(
                    symbol = %request.symbol,
                    count = request.lookback.count,
                    unit = ?request.lookback.unit,
                    "No bars in lookback window, market closed"
                );
                return Ok(TradeOutcome::NoData);
            }
            Err(e) => return Err(e),
        };

        tracing::info!(
            symbol = %request.symbol,
            "Latest price {:.2} (mean {:.2})",
            stats.latest_close,
            stats.mean_close
        );

        let decision = decide(request.signal, &stats, request.threshold_pct);

        let (side, limit_price) = match decision.action {
            OrderAction::Submit { side, limit_price } => (side, limit_price),
            OrderAction::Hold => return Ok(TradeOutcome::Held),
            OrderAction::Abstain => {
                tracing::info!(
                    symbol = %request.symbol,
                    "No action taken: {}",
                    decision.reason
                );
                return Ok(TradeOutcome::Abstained {
                    reason: decision.reason,
                });
            }
        };

        let order = LimitOrder {
            symbol: request.symbol.clone(),
            side,
            qty: request.qty,
            limit_price,
            time_in_force: request.asset_type.time_in_force(),
        };

        self.broker.submit_limit_order(&order).await?;

        tracing::info!(
            symbol = %order.symbol,
            "{} order placed for {} x {} @ {}",
            order.side,
            order.qty,
            order.symbol,
            order.limit_price
        );

        Ok(TradeOutcome::Submitted(order))
    }
}

fn validate(request: &TradeRequest) -> Result<()> {
    if request.symbol.trim().is_empty() {
        return Err(PipelineError::InvalidInput("symbol is empty".to_string()));
    }
    if !(request.qty.is_finite() && request.qty > 0.0) {
        return Err(PipelineError::InvalidInput(format!(
            "qty must be positive, got {}",
            request.qty
        )));
    }
    if !(request.threshold_pct.is_finite() && request.threshold_pct >= 0.0) {
        return Err(PipelineError::InvalidInput(format!(
            "threshold_pct must be >= 0, got {}",
            request.threshold_pct
        )));
    }
    if request.lookback.count == 0 {
        return Err(PipelineError::InvalidInput(
            "lookback must cover at least one bar".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PriceBar, TimeInForce, TimeframeUnit, TradeSide};
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone};
    use rust_decimal::Decimal;
    use std::sync::Mutex;

    struct FakeMarket {
        closes: Vec<f64>,
        requests: Mutex<Vec<BarRequest>>,
        fail: bool,
    }

    impl FakeMarket {
        fn with_closes(closes: &[f64]) -> Self {
            Self {
                closes: closes.to_vec(),
                requests: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                closes: vec![],
                requests: Mutex::new(Vec::new()),
                fail: true,
            }
        }
    }

    #[async_trait]
    impl MarketDataSource for FakeMarket {
        async fn get_bars(&self, request: &BarRequest) -> Result<Vec<PriceBar>> {
            self.requests.lock().unwrap().push(request.clone());
            if self.fail {
                return Err(PipelineError::external("market data", "HTTP 503"));
            }
            Ok(self
                .closes
                .iter()
                .enumerate()
                .map(|(i, &close)| PriceBar {
                    timestamp: request.start + Duration::minutes(i as i64),
                    close,
                })
                .collect())
        }
    }

    #[derive(Default)]
    struct RecordingBroker {
        orders: Mutex<Vec<LimitOrder>>,
    }

    #[async_trait]
    impl BrokerClient for RecordingBroker {
        async fn submit_limit_order(&self, order: &LimitOrder) -> Result<()> {
            self.orders.lock().unwrap().push(order.clone());
            Ok(())
        }
    }

    fn request(signal: Signal, asset_type: AssetType, unit: TimeframeUnit) -> TradeRequest {
        TradeRequest {
            symbol: "AAPL".to_string(),
            signal,
            qty: 2.0,
            threshold_pct: 5.0,
            lookback: Lookback::new(unit, 10),
            asset_type,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 6, 15, 0, 0).unwrap()
    }

    fn trader(market: Arc<FakeMarket>, broker: Arc<RecordingBroker>) -> Trader {
        Trader::new(market, broker)
    }

    #[tokio::test]
    async fn test_buy_submits_day_order_for_stock() {
        let market = Arc::new(FakeMarket::with_closes(&[98.0, 100.0, 102.0, 104.0, 96.0]));
        let broker = Arc::new(RecordingBroker::default());
        let trader = trader(market.clone(), broker.clone());

        let outcome = trader
            .execute_at(&request(Signal::Buy, AssetType::Stock, TimeframeUnit::Hour), now())
            .await
            .unwrap();

        let expected = LimitOrder {
            symbol: "AAPL".to_string(),
            side: TradeSide::Buy,
            qty: 2.0,
            limit_price: Decimal::new(10500, 2),
            time_in_force: TimeInForce::Day,
        };
        assert_eq!(outcome, TradeOutcome::Submitted(expected.clone()));
        assert_eq!(broker.orders.lock().unwrap().as_slice(), &[expected]);

        let requests = market.requests.lock().unwrap();
        assert_eq!(requests[0].limit, 10);
        assert_eq!(requests[0].start, now() - Duration::hours(10));
    }

    #[tokio::test]
    async fn test_crypto_sell_uses_gtc() {
        let market = Arc::new(FakeMarket::with_closes(&[100.0, 100.0, 100.0, 100.0]));
        let broker = Arc::new(RecordingBroker::default());
        let trader = trader(market, broker.clone());

        let mut req = request(Signal::Sell, AssetType::Crypto, TimeframeUnit::Hour);
        req.symbol = "ETH/USD".to_string();

        let outcome = trader.execute_at(&req, now()).await.unwrap();

        match outcome {
            TradeOutcome::Submitted(order) => {
                assert_eq!(order.side, TradeSide::Sell);
                assert_eq!(order.time_in_force, TimeInForce::Gtc);
                assert_eq!(order.limit_price.to_string(), "95.00");
            }
            other => panic!("expected submission, got {:?}", other),
        }
        assert_eq!(broker.orders.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_minute_lookback_requests_extra_bars() {
        let market = Arc::new(FakeMarket::with_closes(&[50.0, 50.5]));
        let broker = Arc::new(RecordingBroker::default());
        let trader = trader(market.clone(), broker);

        trader
            .execute_at(&request(Signal::Buy, AssetType::Stock, TimeframeUnit::Min), now())
            .await
            .unwrap();

        let requests = market.requests.lock().unwrap();
        assert_eq!(requests[0].limit, 12);
        assert_eq!(requests[0].start, now() - Duration::minutes(12));
        assert_eq!(requests[0].unit, TimeframeUnit::Min);
    }

    #[tokio::test]
    async fn test_hold_skips_market_data() {
        let market = Arc::new(FakeMarket::with_closes(&[100.0]));
        let broker = Arc::new(RecordingBroker::default());
        let trader = trader(market.clone(), broker.clone());

        let outcome = trader
            .execute_at(&request(Signal::Hold, AssetType::Stock, TimeframeUnit::Day), now())
            .await
            .unwrap();

        assert_eq!(outcome, TradeOutcome::Held);
        assert!(market.requests.lock().unwrap().is_empty());
        assert!(broker.orders.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_price_outside_band_abstains() {
        // mean 100, latest 110 > ceiling 105
        let market = Arc::new(FakeMarket::with_closes(&[95.0, 95.0, 100.0, 110.0]));
        let broker = Arc::new(RecordingBroker::default());
        let trader = trader(market, broker.clone());

        let outcome = trader
            .execute_at(&request(Signal::Buy, AssetType::Stock, TimeframeUnit::Hour), now())
            .await
            .unwrap();

        assert!(matches!(outcome, TradeOutcome::Abstained { .. }));
        assert!(broker.orders.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_no_bars_is_not_an_error() {
        let market = Arc::new(FakeMarket::with_closes(&[]));
        let broker = Arc::new(RecordingBroker::default());
        let trader = trader(market, broker.clone());

        let outcome = trader
            .execute_at(&request(Signal::Sell, AssetType::Stock, TimeframeUnit::Min), now())
            .await
            .unwrap();

        assert_eq!(outcome, TradeOutcome::NoData);
        assert!(broker.orders.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_market_data_failure_propagates() {
        let market = Arc::new(FakeMarket::failing());
        let broker = Arc::new(RecordingBroker::default());
        let trader = trader(market, broker.clone());

        let result = trader
            .execute_at(&request(Signal::Buy, AssetType::Stock, TimeframeUnit::Hour), now())
            .await;

        assert!(matches!(result, Err(PipelineError::ExternalService { .. })));
        assert!(broker.orders.lock().unwrap().is_empty());
    }

    #[test]
    fn test_rejects_non_positive_qty() {
        let market = Arc::new(FakeMarket::with_closes(&[100.0]));
        let broker = Arc::new(RecordingBroker::default());
        let trader = trader(market, broker);

        let mut req = request(Signal::Buy, AssetType::Stock, TimeframeUnit::Hour);
        req.qty = 0.0;

        let result = tokio_test::block_on(trader.execute_at(&req, now()));
        assert!(matches!(result, Err(PipelineError::InvalidInput(_))));

        req.qty = 1.0;
        req.threshold_pct = -1.0;
        let result = tokio_test::block_on(trader.execute_at(&req, now()));
        assert!(matches!(result, Err(PipelineError::InvalidInput(_))));
    }

    #[test]
    fn test_rejects_zero_lookback() {
        let market = Arc::new(FakeMarket::with_closes(&[100.0]));
        let broker = Arc::new(RecordingBroker::default());
        let trader = trader(market.clone(), broker);

        let mut req = request(Signal::Buy, AssetType::Stock, TimeframeUnit::Hour);
        req.lookback = Lookback::new(TimeframeUnit::Hour, 0);

        let result = tokio_test::block_on(trader.execute_at(&req, now()));
        assert!(matches!(result, Err(PipelineError::InvalidInput(_))));
        assert!(market.requests.lock().unwrap().is_empty());
    }
}
