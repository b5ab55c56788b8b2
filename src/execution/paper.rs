//! Paper trading execution engine

use super::{ExecutionEngine, Fill, OrderId, OrderIntent};
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Paper trading execution engine with simulated fills
pub struct PaperEngine {
    fee_rate: Decimal,
    fills: Arc<RwLock<Vec<Fill>>>,
}

impl PaperEngine {
    /// Create a new paper trading engine
    pub fn new(fee_rate: Decimal) -> Self {
        Self {
            fee_rate,
            fills: Arc::new(RwLock::new(vec![])),
        }
    }

    pub fn fee_rate(&self) -> Decimal {
        self.fee_rate
    }
}

#[async_trait]
impl ExecutionEngine for PaperEngine {
    async fn submit(&self, intent: &OrderIntent) -> anyhow::Result<Fill> {
        if !intent.paper {
            anyhow::bail!("paper engine refused a live order for {}", intent.symbol);
        }

        // Simulate immediate fill at the intended entry
        let fill = Fill {
            order_id: OrderId::new_v4(),
            symbol: intent.symbol.clone(),
            side: intent.side,
            price: intent.entry_price,
            size: intent.size,
            timestamp: Utc::now(),
            fees: intent.notional() * self.fee_rate,
        };

        self.fills.write().await.push(fill.clone());

        tracing::info!(
            order_id = %fill.order_id,
            symbol = %fill.symbol,
            size = %fill.size,
            price = %fill.price,
            "Paper order filled"
        );
        Ok(fill)
    }

    async fn cancel(&self, id: OrderId) -> anyhow::Result<()> {
        tracing::info!(%id, "Paper order cancelled");
        Ok(())
    }

    async fn fills(&self) -> anyhow::Result<Vec<Fill>> {
        let fills = self.fills.read().await;
        Ok(fills.clone())
    }
}
