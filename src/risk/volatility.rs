//! Volatility-based adjustment of size and stop width

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::{RiskError, RiskLimits};

/// Multipliers derived from a volatility estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolatilityAdjustment {
    /// Scales the risk budget, in (0, 1]
    pub size_multiplier: Decimal,
    /// Widens stop-loss and take-profit distances, in [1, 3]
    pub width_multiplier: Decimal,
}

impl VolatilityAdjustment {
    /// No adjustment
    pub const NEUTRAL: Self = Self {
        size_multiplier: Decimal::ONE,
        width_multiplier: Decimal::ONE,
    };
}

impl Default for VolatilityAdjustment {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

/// Maps volatility to size and width multipliers
///
/// Higher volatility widens stops and shrinks positions:
/// - width = 1 + 0.5 * vol, clamped to [1, 3]
/// - size = 1 - 2 * vol, clamped to [0.5, 1]
#[derive(Debug, Clone)]
pub struct VolatilityAdjuster {
    pub width_slope: Decimal,
    pub size_slope: Decimal,
    pub max_width: Decimal,
    pub min_size: Decimal,
}

impl Default for VolatilityAdjuster {
    fn default() -> Self {
        Self {
            width_slope: dec!(0.5),
            size_slope: dec!(2),
            max_width: dec!(3),
            min_size: dec!(0.5),
        }
    }
}

impl VolatilityAdjuster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute multipliers for a volatility estimate
    pub fn adjust(
        &self,
        volatility: Decimal,
        limits: &RiskLimits,
    ) -> Result<VolatilityAdjustment, RiskError> {
        if volatility < Decimal::ZERO {
            return Err(RiskError::InvalidVolatility(volatility));
        }
        if !limits.volatility_adjustment {
            return Ok(VolatilityAdjustment::NEUTRAL);
        }

        // Overflow only happens far beyond the clamp bounds
        let width = volatility
            .checked_mul(self.width_slope)
            .and_then(|w| w.checked_add(Decimal::ONE))
            .unwrap_or(self.max_width)
            .max(Decimal::ONE)
            .min(self.max_width);
        let size = volatility
            .checked_mul(self.size_slope)
            .and_then(|s| Decimal::ONE.checked_sub(s))
            .unwrap_or(self.min_size)
            .max(self.min_size)
            .min(Decimal::ONE);

        Ok(VolatilityAdjustment {
            size_multiplier: size,
            width_multiplier: width,
        })
    }
}
