//! Position records

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{RiskError, Side};

/// An open position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Position identifier
    pub id: Uuid,
    /// Traded symbol, unique among open positions
    pub symbol: String,
    /// Trade side
    pub side: Side,
    /// Position size in base-asset units
    pub size: Decimal,
    /// Entry price
    pub entry_price: Decimal,
    pub stop_loss: Decimal,
    pub take_profit: Decimal,
    /// Entry timestamp
    pub opened_at: DateTime<Utc>,
}

impl Position {
    /// Create a position opened now
    pub fn new(
        symbol: impl Into<String>,
        side: Side,
        size: Decimal,
        entry_price: Decimal,
        stop_loss: Decimal,
        take_profit: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            symbol: symbol.into(),
            side,
            size,
            entry_price,
            stop_loss,
            take_profit,
            opened_at: Utc::now(),
        }
    }

    /// Reject non-positive size or entry price
    pub fn check(&self) -> Result<(), RiskError> {
        if self.size <= dec!(0) {
            return Err(RiskError::InvalidSize(self.size));
        }
        if self.entry_price <= dec!(0) {
            return Err(RiskError::InvalidPrice {
                field: "entry_price",
                value: self.entry_price,
            });
        }
        Ok(())
    }

    /// Capital committed at entry
    pub fn notional(&self) -> Decimal {
        self.size.saturating_mul(self.entry_price)
    }

    /// P&L if the position were closed at `price`, saturating at the decimal range
    pub fn pnl_at(&self, price: Decimal) -> Decimal {
        let move_ = match self.side {
            Side::Long => price.saturating_sub(self.entry_price),
            Side::Short => self.entry_price.saturating_sub(price),
        };
        move_.saturating_mul(self.size)
    }

    /// Loss if the stop is hit
    pub fn risk_amount(&self) -> Decimal {
        (self.entry_price - self.stop_loss).abs().saturating_mul(self.size)
    }
}

/// A closed position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedPosition {
    /// Original position
    pub position: Position,
    /// Exit price, absent when the position was dropped without a fill
    pub exit_price: Option<Decimal>,
    /// Exit timestamp
    pub closed_at: DateTime<Utc>,
    /// Realized P&L applied to the balance
    pub realized_pnl: Decimal,
}
