use crate::error::PipelineError;
use crate::models::{AggregateResult, SentimentRecord, Signal};
use crate::Result;
use serde::Deserialize;

/// What to do when there is nothing to aggregate
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmptyBatchPolicy {
    /// Fail with `InvalidInput`
    #[default]
    Reject,
    /// Report `(0.0, HOLD)`
    Hold,
}

/// Configuration for sentiment signal generation
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SignalConfig {
    pub buy_threshold: f64,
    pub sell_threshold: f64,
    /// Share of positive (or negative) texts that triggers a signal on its own
    pub ratio_threshold: f64,
    /// Separate share for the SELL side. `None` reuses `ratio_threshold`.
    pub sell_ratio_threshold: Option<f64>,
    pub empty_batch: EmptyBatchPolicy,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            buy_threshold: 0.3,
            sell_threshold: -0.3,
            ratio_threshold: 0.6,
            sell_ratio_threshold: None,
            empty_batch: EmptyBatchPolicy::Reject,
        }
    }
}

impl SignalConfig {
    pub fn sell_ratio(&self) -> f64 {
        self.sell_ratio_threshold.unwrap_or(self.ratio_threshold)
    }

    /// Reject threshold combinations that can never produce a sane signal
    pub fn validate(&self) -> Result<()> {
        if !self.buy_threshold.is_finite() || !self.sell_threshold.is_finite() {
            return Err(PipelineError::InvalidInput(
                "sentiment thresholds must be finite".to_string(),
            ));
        }
        if self.sell_threshold > self.buy_threshold {
            return Err(PipelineError::InvalidInput(format!(
                "sell_threshold ({}) is above buy_threshold ({})",
                self.sell_threshold, self.buy_threshold
            )));
        }
        for (name, ratio) in [
            ("ratio_threshold", self.ratio_threshold),
            ("sell_ratio_threshold", self.sell_ratio()),
        ] {
            if !(ratio > 0.0 && ratio <= 1.0) {
                return Err(PipelineError::InvalidInput(format!(
                    "{} must be in (0, 1], got {}",
                    name, ratio
                )));
            }
        }
        Ok(())
    }
}

/// Turn a batch of classified texts into an average sentiment and a signal
///
/// Rules, first match wins:
/// 1. avg > buy_threshold -> BUY
/// 2. positive share >= ratio_threshold -> BUY
/// 3. avg < sell_threshold -> SELL
/// 4. negative share >= sell ratio -> SELL
/// 5. HOLD
///
/// Non-polar records count toward the denominator.
pub fn aggregate(batch: &[SentimentRecord], config: &SignalConfig) -> Result<AggregateResult> {
    if batch.is_empty() {
        return match config.empty_batch {
            EmptyBatchPolicy::Reject => Err(PipelineError::InvalidInput(
                "cannot aggregate an empty sentiment batch".to_string(),
            )),
            EmptyBatchPolicy::Hold => Ok(AggregateResult {
                avg_sentiment: 0.0,
                signal: Signal::Hold,
                pos_ratio: 0.0,
                neg_ratio: 0.0,
                sample_size: 0,
            }),
        };
    }

    let n = batch.len() as f64;
    let mut sum = 0.0;
    let mut positives = 0usize;
    let mut negatives = 0usize;

    for record in batch {
        let value = record.signed();
        sum += value;
        if value > 0.0 {
            positives += 1;
        } else if value < 0.0 {
            negatives += 1;
        }
    }

    let avg_sentiment = sum / n;
    let pos_ratio = positives as f64 / n;
    let neg_ratio = negatives as f64 / n;

    let signal = if avg_sentiment > config.buy_threshold {
        Signal::Buy
    } else if pos_ratio >= config.ratio_threshold {
        Signal::Buy
    } else if avg_sentiment < config.sell_threshold {
        Signal::Sell
    } else if neg_ratio >= config.sell_ratio() {
        Signal::Sell
    } else {
        Signal::Hold
    };

    Ok(AggregateResult {
        avg_sentiment,
        signal,
        pos_ratio,
        neg_ratio,
        sample_size: batch.len(),
    })
}
