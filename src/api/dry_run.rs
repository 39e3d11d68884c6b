use crate::api::BrokerClient;
use crate::models::LimitOrder;
use crate::Result;
use async_trait::async_trait;

/// Broker stand-in that logs orders instead of sending them
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunBroker;

#[async_trait]
impl BrokerClient for DryRunBroker {
    async fn submit_limit_order(&self, order: &LimitOrder) -> Result<()> {
        tracing::info!(
            symbol = %order.symbol,
            side = %order.side,
            qty = order.qty,
            limit_price = %order.limit_price,
            time_in_force = ?order.time_in_force,
            "[dry run] order not sent"
        );
        Ok(())
    }
}
