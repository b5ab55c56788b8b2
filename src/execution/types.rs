//! Execution types

use crate::risk::Side;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Order identifier
pub type OrderId = Uuid;

/// An approved trade handed to the execution layer
///
/// Sizes are not snapped to venue lot sizes here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderIntent {
    /// Traded symbol
    pub symbol: String,
    /// Trade side
    pub side: Side,
    /// Size in base-asset units
    pub size: Decimal,
    /// Intended entry price
    pub entry_price: Decimal,
    /// Protective stop
    pub stop_loss: Decimal,
    /// Profit target
    pub take_profit: Decimal,
    /// Route to the paper engine
    pub paper: bool,
}

impl OrderIntent {
    /// Notional value at the intended entry
    pub fn notional(&self) -> Decimal {
        self.size * self.entry_price
    }
}

/// A fill (executed trade)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    /// Order ID
    pub order_id: OrderId,
    /// Symbol
    pub symbol: String,
    /// Trade side
    pub side: Side,
    /// Fill price
    pub price: Decimal,
    /// Fill size
    pub size: Decimal,
    /// Fill timestamp
    pub timestamp: DateTime<Utc>,
    /// Fees paid
    pub fees: Decimal,
}
