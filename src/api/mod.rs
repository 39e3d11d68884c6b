// External collaborators: social search, sentiment model, market data, broker
pub mod alpaca;
pub mod dry_run;
pub mod huggingface;
pub mod twitter;

pub use alpaca::AlpacaClient;
pub use dry_run::DryRunBroker;
pub use huggingface::HuggingFaceClient;
pub use twitter::TwitterClient;

use crate::models::{BarRequest, LimitOrder, PriceBar, QuerySpec, SentimentRecord};
use crate::Result;
use async_trait::async_trait;

/// Source of recent posts (retweets and replies excluded)
#[async_trait]
pub trait TextSource: Send + Sync {
    async fn fetch(&self, query: &QuerySpec) -> Result<Vec<String>>;
}

/// Pretrained classifier, one record per input text
#[async_trait]
pub trait SentimentClassifier: Send + Sync {
    async fn classify(&self, texts: &[String]) -> Result<Vec<SentimentRecord>>;
}

/// Historical bars, oldest first. May be empty when the market is closed.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn get_bars(&self, request: &BarRequest) -> Result<Vec<PriceBar>>;
}

#[async_trait]
pub trait BrokerClient: Send + Sync {
    async fn submit_limit_order(&self, order: &LimitOrder) -> Result<()>;
}
