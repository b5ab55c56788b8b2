//! Risk management types

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Direction of a trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// Profit when price rises
    #[serde(alias = "buy")]
    Long,
    /// Profit when price falls
    #[serde(alias = "sell")]
    Short,
}

impl Side {
    /// +1 for long, -1 for short
    pub fn direction(&self) -> Decimal {
        match self {
            Side::Long => Decimal::ONE,
            Side::Short => Decimal::NEGATIVE_ONE,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Long => "long",
            Side::Short => "short",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "long" | "buy" => Ok(Side::Long),
            "short" | "sell" => Ok(Side::Short),
            other => Err(format!("unknown side '{other}', expected long or short")),
        }
    }
}

/// Session-wide trading halt state
///
/// Both halted states are terminal until an explicit operator reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HaltState {
    /// Trading allowed
    #[default]
    None,
    /// Realized loss today reached the daily limit
    DailyLoss,
    /// Drawdown from peak reached the emergency threshold
    Emergency,
}

impl HaltState {
    pub fn is_halted(&self) -> bool {
        !matches!(self, HaltState::None)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HaltState::None => "none",
            HaltState::DailyLoss => "daily_loss",
            HaltState::Emergency => "emergency",
        }
    }
}

impl fmt::Display for HaltState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Risk management errors
///
/// Malformed numeric input is reported as an error and never clamped.
/// Ordinary trade rejections are not errors, see [`ValidationResult`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RiskError {
    /// Non-positive or otherwise unusable price
    #[error("Invalid {field}: {value}")]
    InvalidPrice { field: &'static str, value: Decimal },
    /// Stop loss on the wrong side of (or equal to) the entry
    #[error("Invalid stop loss {stop_loss} for {side} entry at {entry_price}")]
    InvalidStop {
        side: Side,
        entry_price: Decimal,
        stop_loss: Decimal,
    },
    /// Non-positive position size
    #[error("Invalid size: {0}")]
    InvalidSize(Decimal),
    /// Negative account balance supplied
    #[error("Invalid balance: {0}")]
    InvalidBalance(Decimal),
    /// Negative volatility estimate
    #[error("Invalid volatility: {0}")]
    InvalidVolatility(Decimal),
    /// Multiplier outside its allowed range
    #[error("Invalid multiplier: {0}")]
    InvalidMultiplier(Decimal),
    /// Inputs too large to compute with
    #[error("Arithmetic overflow computing {0}")]
    Overflow(&'static str),
    /// Maximum concurrent positions reached
    #[error("Maximum open positions reached ({0})")]
    MaxPositionsReached(usize),
    /// Trading has been halted
    #[error("Trading halted: {0}")]
    TradingHalted(HaltState),
    /// A position is already open for the symbol
    #[error("Position already open for {0}")]
    DuplicatePosition(String),
    /// No open position for the symbol
    #[error("No open position for {0}")]
    PositionNotFound(String),
}

impl RiskError {
    /// Capacity-class failures: the ledger cannot take another position
    pub fn is_capacity(&self) -> bool {
        matches!(
            self,
            RiskError::MaxPositionsReached(_) | RiskError::TradingHalted(_)
        )
    }

    /// Malformed numeric input, an upstream data bug
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            RiskError::InvalidPrice { .. }
                | RiskError::InvalidStop { .. }
                | RiskError::InvalidSize(_)
                | RiskError::InvalidBalance(_)
                | RiskError::InvalidVolatility(_)
                | RiskError::Overflow(_)
                | RiskError::InvalidMultiplier(_)
        )
    }
}

/// A trade idea to be sized and validated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeCandidate {
    pub symbol: String,
    pub side: Side,
    pub entry_price: Decimal,
    /// Volatility estimate as a fraction (0.05 = 5%)
    #[serde(default)]
    pub volatility: Decimal,
}

impl TradeCandidate {
    pub fn new(
        symbol: impl Into<String>,
        side: Side,
        entry_price: Decimal,
        volatility: Decimal,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            entry_price,
            volatility,
        }
    }
}

/// A fully specified trade submitted for validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeProposal {
    pub symbol: String,
    pub side: Side,
    pub size: Decimal,
    pub entry_price: Decimal,
    pub stop_loss: Decimal,
    pub take_profit: Decimal,
}

impl TradeProposal {
    /// Notional value of the proposed trade
    ///
    /// Saturates at `Decimal::MAX`, which no balance can cover.
    pub fn notional(&self) -> Decimal {
        self.size.saturating_mul(self.entry_price)
    }

    /// Take-profit distance over stop-loss distance, `None` for a degenerate stop
    pub fn risk_reward_ratio(&self) -> Option<Decimal> {
        let risk = self.entry_price.saturating_sub(self.stop_loss).abs();
        if risk.is_zero() {
            return None;
        }
        let reward = self.take_profit.saturating_sub(self.entry_price).abs();
        Some(reward.checked_div(risk).unwrap_or(Decimal::MAX))
    }
}

/// Output of position sizing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizingResult {
    /// Size in base-asset units
    pub size: Decimal,
    pub stop_loss: Decimal,
    pub take_profit: Decimal,
    /// Quote amount lost if the stop is hit
    pub risk_amount: Decimal,
    pub risk_reward_ratio: Decimal,
}

/// Outcome of trade validation
///
/// `reason` is present iff the trade was rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub proposal: TradeProposal,
}

impl ValidationResult {
    pub fn accepted(proposal: TradeProposal) -> Self {
        Self {
            valid: true,
            reason: None,
            proposal,
        }
    }

    pub fn rejected(proposal: TradeProposal, reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            reason: Some(reason.into()),
            proposal,
        }
    }
}
