use crate::error::PipelineError;
use crate::models::{PriceBar, PriceWindowStats};
use crate::Result;

/// Mean close over the window and the close of the last bar.
///
/// Bars must be sorted oldest first; the order is not re-checked here.
pub fn evaluate(bars: &[PriceBar]) -> Result<PriceWindowStats> {
    let latest = bars.last().ok_or_else(|| {
        PipelineError::InsufficientData("price window contains no bars".to_string())
    })?;

    let sum: f64 = bars.iter().map(|bar| bar.close).sum();

    Ok(PriceWindowStats {
        mean_close: sum / bars.len() as f64,
        latest_close: latest.close,
    })
}
