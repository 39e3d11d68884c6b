use crate::models::{PriceWindowStats, Signal, TradeSide};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

#[derive(Debug, Clone, PartialEq)]
pub enum OrderAction {
    Submit {
        side: TradeSide,
        limit_price: Decimal,
    },
    /// Signal was HOLD
    Hold,
    /// Signal asked for a trade but price is outside the allowed band
    Abstain,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderDecision {
    pub action: OrderAction,
    pub reason: String,
}

impl OrderDecision {
    /// True when no order should be sent
    pub fn is_none(&self) -> bool {
        !matches!(self.action, OrderAction::Submit { .. })
    }

    pub fn limit_price(&self) -> Option<Decimal> {
        match self.action {
            OrderAction::Submit { limit_price, .. } => Some(limit_price),
            _ => None,
        }
    }
}

/// Round to cents, half away from zero, always two decimal places
pub fn round_price(price: Decimal) -> Decimal {
    let mut rounded = price.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

/// Decide whether a signal turns into a limit order.
///
/// BUY only if the latest close is at or below `mean * (1 + pct/100)`, placed
/// at that ceiling. SELL only if the latest close is at or above
/// `mean * (1 - pct/100)`, placed at that floor.
pub fn decide(signal: Signal, stats: &PriceWindowStats, threshold_pct: f64) -> OrderDecision {
    let (side, bound, fires) = match signal {
        Signal::Hold => {
            return OrderDecision {
                action: OrderAction::Hold,
                reason: "Hold signal".to_string(),
            };
        }
        Signal::Buy => {
            let ceiling = stats.mean_close * (1.0 + threshold_pct / 100.0);
            (TradeSide::Buy, ceiling, stats.latest_close <= ceiling)
        }
        Signal::Sell => {
            let floor = stats.mean_close * (1.0 - threshold_pct / 100.0);
            (TradeSide::Sell, floor, stats.latest_close >= floor)
        }
    };

    if !fires {
        return OrderDecision {
            action: OrderAction::Abstain,
            reason: format!(
                "{} signal but latest price {:.2} is outside the {}% band (limit {:.2}, mean {:.2})",
                side, stats.latest_close, threshold_pct, bound, stats.mean_close
            ),
        };
    }

    match Decimal::from_f64(bound) {
        Some(price) => OrderDecision {
            action: OrderAction::Submit {
                side,
                limit_price: round_price(price),
            },
            reason: format!(
                "{} signal with latest price {:.2} within {}% of mean {:.2}",
                side, stats.latest_close, threshold_pct, stats.mean_close
            ),
        },
        None => OrderDecision {
            action: OrderAction::Abstain,
            reason: format!("limit price {} is not representable", bound),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(mean_close: f64, latest_close: f64) -> PriceWindowStats {
        PriceWindowStats {
            mean_close,
            latest_close,
        }
    }

    #[test]
    fn test_buy_within_ceiling() {
        let decision = decide(Signal::Buy, &stats(100.0, 104.0), 5.0);

        assert_eq!(
            decision.action,
            OrderAction::Submit {
                side: TradeSide::Buy,
                limit_price: Decimal::new(10500, 2),
            }
        );
        assert_eq!(decision.limit_price().unwrap().to_string(), "105.00");
    }

    #[test]
    fn test_buy_at_exact_ceiling_fires() {
        let decision = decide(Signal::Buy, &stats(100.0, 105.0), 5.0);
        assert!(!decision.is_none());
    }

    #[test]
    fn test_buy_above_ceiling_abstains() {
        let decision = decide(Signal::Buy, &stats(100.0, 106.0), 5.0);

        assert_eq!(decision.action, OrderAction::Abstain);
        assert!(decision.is_none());
        assert!(decision.limit_price().is_none());
        assert!(decision.reason.contains("outside"));
    }

    #[test]
    fn test_sell_above_floor() {
        let decision = decide(Signal::Sell, &stats(100.0, 96.0), 5.0);

        assert_eq!(
            decision.action,
            OrderAction::Submit {
                side: TradeSide::Sell,
                limit_price: Decimal::new(9500, 2),
            }
        );
        assert_eq!(decision.limit_price().unwrap().to_string(), "95.00");
    }

    #[test]
    fn test_sell_after_crash_abstains() {
        let decision = decide(Signal::Sell, &stats(100.0, 94.0), 5.0);
        assert_eq!(decision.action, OrderAction::Abstain);
    }

    #[test]
    fn test_hold_ignores_prices() {
        for s in [stats(100.0, 104.0), stats(100.0, 500.0), stats(f64::NAN, f64::NAN)] {
            let decision = decide(Signal::Hold, &s, 5.0);
            assert_eq!(decision.action, OrderAction::Hold);
            assert!(decision.is_none());
        }
    }

    #[test]
    fn test_zero_threshold_uses_mean() {
        let decision = decide(Signal::Buy, &stats(123.456, 120.0), 0.0);
        assert_eq!(decision.limit_price().unwrap().to_string(), "123.46");
    }

    #[test]
    fn test_limit_price_always_two_decimals() {
        for (mean, pct) in [(100.0, 5.0), (3.0, 10.0), (0.1234, 1.0), (27_123.9, 2.5)] {
            let decision = decide(Signal::Buy, &stats(mean, 0.0), pct);
            let price = decision.limit_price().unwrap();
            assert_eq!(price.scale(), 2, "{} should have 2 dp", price);
        }
    }

    #[test]
    fn test_rounding_is_half_away_from_zero() {
        assert_eq!(round_price(Decimal::new(2345, 3)).to_string(), "2.35");
        assert_eq!(round_price(Decimal::new(100125, 3)).to_string(), "100.13");
        assert_eq!(round_price(Decimal::new(100124, 3)).to_string(), "100.12");
        assert_eq!(round_price(Decimal::new(7, 0)).to_string(), "7.00");
    }
}
