// Price gating and order placement
pub mod order_gate;
pub mod price_window;
pub mod trader;

pub use order_gate::{decide, OrderAction, OrderDecision};
pub use price_window::evaluate;
pub use trader::{TradeOutcome, TradeRequest, Trader};
