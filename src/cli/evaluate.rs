//! Evaluate command implementation

use clap::Args;
use rust_decimal::Decimal;

use crate::config::Config;
use crate::risk::{RiskEngine, Side, TradeCandidate};

#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Symbol to trade
    #[arg(long)]
    pub symbol: String,

    /// Trade side: long/buy or short/sell
    #[arg(long)]
    pub side: Side,

    /// Intended entry price
    #[arg(long)]
    pub price: Decimal,

    /// Volatility estimate (0 for none)
    #[arg(long, default_value = "0")]
    pub volatility: Decimal,

    /// Account balance, overrides the session config
    #[arg(long)]
    pub balance: Option<Decimal>,
}

impl EvaluateArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let balance = self.balance.unwrap_or(config.session.initial_balance);
        let engine = RiskEngine::new(balance, config.risk.clone(), config.audit.capacity)?;

        let candidate = TradeCandidate::new(
            self.symbol.clone(),
            self.side,
            self.price,
            self.volatility,
        );
        let decision = engine.evaluate(&candidate).await?;

        tracing::info!(
            symbol = %candidate.symbol,
            approved = decision.approved(),
            size = %decision.sizing.size,
            "Candidate evaluated"
        );
        println!("{}", serde_json::to_string_pretty(&decision)?);
        Ok(())
    }
}
