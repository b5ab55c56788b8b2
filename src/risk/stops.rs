//! Stop-loss and take-profit derivation

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{RiskError, RiskLimits, Side};

/// Protective exit levels for a trade
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StopLevels {
    pub stop_loss: Decimal,
    pub take_profit: Decimal,
    /// Take-profit distance over stop-loss distance
    pub risk_reward_ratio: Decimal,
    /// Take profit was pushed out to meet the minimum ratio
    pub widened: bool,
}

/// Computes stop levels from entry, side and volatility width
#[derive(Debug, Clone, Default)]
pub struct StopLevelCalculator;

impl StopLevelCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Compute stop-loss and take-profit for an entry
    ///
    /// If the base percentages give a risk/reward below the minimum, the take
    /// profit is widened to exactly the minimum ratio rather than failing.
    pub fn compute(
        &self,
        entry_price: Decimal,
        side: Side,
        limits: &RiskLimits,
        width_multiplier: Decimal,
    ) -> Result<StopLevels, RiskError> {
        if entry_price <= Decimal::ZERO {
            return Err(RiskError::InvalidPrice {
                field: "entry_price",
                value: entry_price,
            });
        }
        if width_multiplier < Decimal::ONE {
            return Err(RiskError::InvalidMultiplier(width_multiplier));
        }

        let distance = |pct: Decimal| {
            entry_price
                .checked_mul(pct)
                .and_then(|d| d.checked_mul(width_multiplier))
        };
        let sl_distance =
            distance(limits.stop_loss_percentage).ok_or(RiskError::Overflow("stop loss"))?;
        let mut tp_distance =
            distance(limits.take_profit_percentage).ok_or(RiskError::Overflow("take profit"))?;
        // Rounds to zero for sub-precision prices
        if sl_distance.is_zero() {
            return Err(RiskError::InvalidStop {
                side,
                entry_price,
                stop_loss: entry_price,
            });
        }

        let mut widened = false;
        let min_tp_distance = sl_distance
            .checked_mul(limits.min_risk_reward_ratio)
            .ok_or(RiskError::Overflow("take profit"))?;
        if tp_distance < min_tp_distance {
            tp_distance = min_tp_distance;
            widened = true;
        }

        let direction = side.direction();
        let stop_loss = entry_price
            .checked_sub(direction * sl_distance)
            .ok_or(RiskError::Overflow("stop loss"))?;
        let take_profit = entry_price
            .checked_add(direction * tp_distance)
            .ok_or(RiskError::Overflow("take profit"))?;

        if stop_loss <= Decimal::ZERO {
            return Err(RiskError::InvalidPrice {
                field: "stop_loss",
                value: stop_loss,
            });
        }
        if take_profit <= Decimal::ZERO {
            return Err(RiskError::InvalidPrice {
                field: "take_profit",
                value: take_profit,
            });
        }

        Ok(StopLevels {
            stop_loss,
            take_profit,
            risk_reward_ratio: tp_distance
                .checked_div(sl_distance)
                .ok_or(RiskError::Overflow("risk/reward"))?,
            widened,
        })
    }
}
