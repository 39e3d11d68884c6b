use crate::models::SentimentLabel;
use std::collections::HashMap;

/// Maps model-native label names onto sentiment labels.
///
/// Lookups ignore case. Anything unmapped falls back to the lowercased raw
/// label, so models that already emit `positive`/`negative`/`neutral` need
/// no entries at all.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelMap {
    entries: HashMap<String, String>,
}

impl LabelMap {
    pub fn new(entries: HashMap<String, String>) -> Self {
        let entries = entries
            .into_iter()
            .map(|(k, v)| (k.to_lowercase(), v.to_lowercase()))
            .collect();
        Self { entries }
    }

    /// Labels emitted by finance-tuned models (e.g. FinTwitBERT)
    pub fn finance() -> Self {
        let entries = [
            ("BULLISH", "positive"),
            ("BEARISH", "negative"),
            ("NEUTRAL", "neutral"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        Self::new(entries)
    }

    pub fn resolve(&self, raw: &str) -> SentimentLabel {
        let key = raw.to_lowercase();
        match self.entries.get(&key) {
            Some(mapped) => SentimentLabel::from_name(mapped),
            None => SentimentLabel::from_name(&key),
        }
    }
}
