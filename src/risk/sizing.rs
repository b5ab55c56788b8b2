//! Position sizing
//!
//! Fixed-fractional risk sizing: the amount lost if the stop is hit equals a
//! fixed fraction of the balance, scaled down for volatile markets.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::{RiskError, RiskLimits, Side};

/// Risk-based position sizer
#[derive(Debug, Clone, Default)]
pub struct PositionSizer;

impl PositionSizer {
    pub fn new() -> Self {
        Self
    }

    /// Calculate position size in base-asset units
    ///
    /// `size = balance * max_position_size * size_multiplier / |entry - stop|`
    pub fn size(
        &self,
        balance: Decimal,
        entry_price: Decimal,
        stop_loss: Decimal,
        side: Side,
        limits: &RiskLimits,
        size_multiplier: Decimal,
    ) -> Result<Decimal, RiskError> {
        if balance < dec!(0) {
            return Err(RiskError::InvalidBalance(balance));
        }
        if entry_price <= dec!(0) {
            return Err(RiskError::InvalidPrice {
                field: "entry_price",
                value: entry_price,
            });
        }
        if stop_loss <= dec!(0) {
            return Err(RiskError::InvalidPrice {
                field: "stop_loss",
                value: stop_loss,
            });
        }
        if size_multiplier <= dec!(0) || size_multiplier > Decimal::ONE {
            return Err(RiskError::InvalidMultiplier(size_multiplier));
        }

        // Positive only when the stop sits on the losing side of the entry
        let stop_distance = entry_price
            .checked_sub(stop_loss)
            .ok_or(RiskError::Overflow("stop distance"))?
            * side.direction();
        if stop_distance <= dec!(0) {
            return Err(RiskError::InvalidStop {
                side,
                entry_price,
                stop_loss,
            });
        }

        let risk_budget = self.risk_budget(balance, limits, size_multiplier)?;
        risk_budget
            .checked_div(stop_distance)
            .ok_or(RiskError::Overflow("position size"))
    }

    /// Quote amount the trade may lose at its stop
    pub fn risk_budget(
        &self,
        balance: Decimal,
        limits: &RiskLimits,
        size_multiplier: Decimal,
    ) -> Result<Decimal, RiskError> {
        balance
            .checked_mul(limits.max_position_size)
            .and_then(|budget| budget.checked_mul(size_multiplier))
            .ok_or(RiskError::Overflow("risk budget"))
    }

    /// Largest size whose notional stays within the position fraction
    pub fn max_notional_size(
        &self,
        balance: Decimal,
        entry_price: Decimal,
        limits: &RiskLimits,
    ) -> Result<Decimal, RiskError> {
        if entry_price <= dec!(0) {
            return Err(RiskError::InvalidPrice {
                field: "entry_price",
                value: entry_price,
            });
        }
        limits
            .max_notional(balance.max(dec!(0)))
            .checked_div(entry_price)
            .ok_or(RiskError::Overflow("notional cap"))
    }
}
