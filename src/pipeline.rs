use std::sync::Arc;

use serde::Deserialize;

use crate::api::{SentimentClassifier, TextSource};
use crate::execution::{TradeOutcome, TradeRequest, Trader};
use crate::models::{AggregateResult, AssetType, Lookback, QuerySpec};
use crate::nlp::TextCleaner;
use crate::strategy::signals::{aggregate, SignalConfig};
use crate::Result;

/// A symbol to trade and the posts that drive it
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SymbolTarget {
    pub symbol: String,
    pub asset_type: AssetType,
    /// Overrides the pipeline-wide quantity
    #[serde(default)]
    pub qty: Option<f64>,
    #[serde(flatten)]
    pub query: QuerySpec,
}

/// Settings shared by every symbol in a run
#[derive(Debug, Clone, PartialEq)]
pub struct TradeSettings {
    pub signal: SignalConfig,
    pub qty: f64,
    pub threshold_pct: f64,
    pub lookback: Lookback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineReport {
    pub symbol: String,
    pub texts_analyzed: usize,
    pub aggregate: AggregateResult,
    pub outcome: TradeOutcome,
}

/// posts -> clean -> classify -> aggregate -> trade
pub struct SignalPipeline {
    source: Arc<dyn TextSource>,
    cleaner: Arc<dyn TextCleaner>,
    classifier: Arc<dyn SentimentClassifier>,
    trader: Trader,
    settings: TradeSettings,
}

impl SignalPipeline {
    pub fn new(
        source: Arc<dyn TextSource>,
        cleaner: Arc<dyn TextCleaner>,
        classifier: Arc<dyn SentimentClassifier>,
        trader: Trader,
        settings: TradeSettings,
    ) -> Result<Self> {
        settings.signal.validate()?;
        Ok(Self {
            source,
            cleaner,
            classifier,
            trader,
            settings,
        })
    }

    pub async fn run_symbol(&self, target: &SymbolTarget) -> Result<PipelineReport> {
        let raw = self.source.fetch(&target.query).await?;

        let texts: Vec<String> = raw
            .iter()
            .map(|text| self.cleaner.clean(text))
            .filter(|text| !text.is_empty())
            .collect();

        tracing::info!(
            symbol = %target.symbol,
            fetched = raw.len(),
            kept = texts.len(),
            "Prepared posts for classification"
        );

        let records = self.classifier.classify(&texts).await?;
        let result = aggregate(&records, &self.settings.signal)?;

        tracing::info!(
            symbol = %target.symbol,
            avg_sentiment = %format!("{:.3}", result.avg_sentiment),
            pos_ratio = %format!("{:.2}", result.pos_ratio),
            neg_ratio = %format!("{:.2}", result.neg_ratio),
            signal = %result.signal,
            "Sentiment aggregated"
        );

        let request = TradeRequest {
            symbol: target.symbol.clone(),
            signal: result.signal,
            qty: target.qty.unwrap_or(self.settings.qty),
            threshold_pct: self.settings.threshold_pct,
            lookback: self.settings.lookback,
            asset_type: target.asset_type,
        };

        let outcome = self.trader.execute(&request).await?;

        Ok(PipelineReport {
            symbol: target.symbol.clone(),
            texts_analyzed: texts.len(),
            aggregate: result,
            outcome,
        })
    }

    /// Runs each target in turn. One symbol failing does not stop the rest.
    pub async fn run_all(&self, targets: &[SymbolTarget]) -> Vec<(String, Result<PipelineReport>)> {
        let mut results = Vec::with_capacity(targets.len());

        for target in targets {
            let result = self.run_symbol(target).await;
            if let Err(e) = &result {
                tracing::error!(symbol = %target.symbol, "Pipeline failed: {}", e);
            }
            results.push((target.symbol.clone(), result));
        }

        results
    }
}
