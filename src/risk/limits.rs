//! Risk limits and drawdown controls

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::HaltState;

/// Immutable bundle of risk thresholds
///
/// Every field can be overridden independently; missing fields take the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskLimits {
    /// Per-trade risk budget as a fraction of balance
    pub max_position_size: Decimal,
    /// Daily realized loss limit as a fraction of the start-of-day balance
    pub max_daily_loss: Decimal,
    /// Base stop-loss distance as a fraction of entry
    pub stop_loss_percentage: Decimal,
    /// Base take-profit distance as a fraction of entry
    pub take_profit_percentage: Decimal,
    /// Maximum concurrent open positions
    pub max_open_positions: usize,
    /// Minimum take-profit to stop-loss distance ratio
    pub min_risk_reward_ratio: Decimal,
    /// Scale size and stop width by volatility
    pub volatility_adjustment: bool,
    /// Drawdown from peak that halts all trading
    pub emergency_stop_loss: Decimal,
    /// Route order intents to the paper engine
    pub paper_trading: bool,
}

impl Default for RiskLimits {
    fn default() -> Self {
        Self {
            max_position_size: dec!(0.05),
            max_daily_loss: dec!(0.02),
            stop_loss_percentage: dec!(0.02),
            take_profit_percentage: dec!(0.06),
            max_open_positions: 3,
            min_risk_reward_ratio: dec!(2.0),
            volatility_adjustment: true,
            emergency_stop_loss: dec!(0.10),
            paper_trading: false,
        }
    }
}

/// Out-of-range risk limit
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LimitsError {
    #[error("{field} must be in (0, 1], got {value}")]
    FractionOutOfRange { field: &'static str, value: Decimal },
    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: Decimal },
    #[error("min_risk_reward_ratio must be non-negative, got {0}")]
    NegativeRiskReward(Decimal),
    #[error("max_open_positions must be at least 1")]
    NoPositionSlots,
}

impl RiskLimits {
    /// Check every threshold is within its documented range
    pub fn validate(&self) -> Result<(), LimitsError> {
        let fractions = [
            ("max_position_size", self.max_position_size),
            ("max_daily_loss", self.max_daily_loss),
            ("emergency_stop_loss", self.emergency_stop_loss),
        ];
        for (field, value) in fractions {
            if value <= Decimal::ZERO || value > Decimal::ONE {
                return Err(LimitsError::FractionOutOfRange { field, value });
            }
        }

        let percentages = [
            ("stop_loss_percentage", self.stop_loss_percentage),
            ("take_profit_percentage", self.take_profit_percentage),
        ];
        for (field, value) in percentages {
            if value <= Decimal::ZERO {
                return Err(LimitsError::NotPositive { field, value });
            }
        }

        if self.min_risk_reward_ratio < Decimal::ZERO {
            return Err(LimitsError::NegativeRiskReward(self.min_risk_reward_ratio));
        }
        if self.max_open_positions == 0 {
            return Err(LimitsError::NoPositionSlots);
        }
        Ok(())
    }

    /// Largest notional a single trade may carry at the given balance
    pub fn max_notional(&self, balance: Decimal) -> Decimal {
        balance.saturating_mul(self.max_position_size)
    }
}

/// Tracks balance, peak and daily PnL and decides when to halt
#[derive(Debug, Clone, PartialEq)]
pub struct DrawdownMonitor {
    /// Highest balance seen this session
    pub peak_balance: Decimal,
    /// Current balance
    pub balance: Decimal,
    /// Balance at the start of the trading day
    pub day_start_balance: Decimal,
    /// Realized P&L since the start of the day
    pub realized_pnl_today: Decimal,
}

impl DrawdownMonitor {
    /// Create a new drawdown monitor
    pub fn new(initial_balance: Decimal) -> Self {
        Self {
            peak_balance: initial_balance,
            balance: initial_balance,
            day_start_balance: initial_balance,
            realized_pnl_today: dec!(0),
        }
    }

    /// Apply a balance change, flooring the balance at zero
    ///
    /// Returns the delta actually applied.
    pub fn apply(&mut self, delta: Decimal) -> Decimal {
        let new_balance = self.balance.saturating_add(delta).max(Decimal::ZERO);
        let applied = new_balance - self.balance;

        self.balance = new_balance;
        self.realized_pnl_today = self.realized_pnl_today.saturating_add(applied);
        if new_balance > self.peak_balance {
            self.peak_balance = new_balance;
        }
        applied
    }

    /// Fractional decline from the peak balance
    pub fn current_drawdown(&self) -> Decimal {
        if self.peak_balance <= dec!(0) {
            return dec!(0);
        }
        (self.peak_balance - self.balance) / self.peak_balance
    }

    /// Loss threshold for today in quote currency (a negative number)
    pub fn daily_loss_threshold(&self, limits: &RiskLimits) -> Decimal {
        -limits.max_daily_loss * self.day_start_balance
    }

    /// Halt state implied by the current figures
    ///
    /// Emergency takes precedence when both thresholds are crossed.
    pub fn breach(&self, limits: &RiskLimits) -> HaltState {
        if self.peak_balance > dec!(0) && self.current_drawdown() >= limits.emergency_stop_loss {
            return HaltState::Emergency;
        }

        if self.day_start_balance > dec!(0)
            && self.realized_pnl_today <= self.daily_loss_threshold(limits)
        {
            return HaltState::DailyLoss;
        }

        HaltState::None
    }

    /// Reset for new trading day
    pub fn reset_daily(&mut self) {
        self.day_start_balance = self.balance;
        self.realized_pnl_today = dec!(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let limits = RiskLimits::default();
        assert_eq!(limits.max_position_size, dec!(0.05));
        assert_eq!(limits.max_daily_loss, dec!(0.02));
        assert_eq!(limits.stop_loss_percentage, dec!(0.02));
        assert_eq!(limits.take_profit_percentage, dec!(0.06));
        assert_eq!(limits.max_open_positions, 3);
        assert_eq!(limits.min_risk_reward_ratio, dec!(2.0));
        assert!(limits.volatility_adjustment);
        assert_eq!(limits.emergency_stop_loss, dec!(0.10));
        assert!(!limits.paper_trading);
        assert!(limits.validate().is_ok());
    }

    #[test]
    fn test_partial_override() {
        let limits: RiskLimits = toml::from_str(
            r#"
            max_open_positions = 5
            paper_trading = true
            "#,
        )
        .unwrap();
        assert_eq!(limits.max_open_positions, 5);
        assert!(limits.paper_trading);
        assert_eq!(limits.max_position_size, dec!(0.05));
        assert_eq!(limits.emergency_stop_loss, dec!(0.10));
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let limits = RiskLimits {
            max_position_size: dec!(1.5),
            ..Default::default()
        };
        assert!(matches!(
            limits.validate(),
            Err(LimitsError::FractionOutOfRange {
                field: "max_position_size",
                ..
            })
        ));

        let limits = RiskLimits {
            stop_loss_percentage: dec!(0),
            ..Default::default()
        };
        assert!(matches!(
            limits.validate(),
            Err(LimitsError::NotPositive { .. })
        ));

        let limits = RiskLimits {
            max_open_positions: 0,
            ..Default::default()
        };
        assert_eq!(limits.validate(), Err(LimitsError::NoPositionSlots));

        let limits = RiskLimits {
            min_risk_reward_ratio: dec!(-1),
            ..Default::default()
        };
        assert!(matches!(
            limits.validate(),
            Err(LimitsError::NegativeRiskReward(_))
        ));
    }

    #[test]
    fn test_drawdown_monitor() {
        let mut monitor = DrawdownMonitor::new(dec!(1000));

        monitor.apply(dec!(100)); // New peak
        assert_eq!(monitor.peak_balance, dec!(1100));
        assert_eq!(monitor.current_drawdown(), dec!(0));

        monitor.apply(dec!(-110)); // Drawdown
        assert_eq!(monitor.current_drawdown(), dec!(0.10)); // 10%
        assert_eq!(monitor.realized_pnl_today, dec!(-10));
    }

    #[test]
    fn test_apply_floors_at_zero() {
        let mut monitor = DrawdownMonitor::new(dec!(100));
        let applied = monitor.apply(dec!(-250));
        assert_eq!(applied, dec!(-100));
        assert_eq!(monitor.balance, dec!(0));
        assert_eq!(monitor.realized_pnl_today, dec!(-100));
    }

    #[test]
    fn test_apply_saturates_at_max() {
        let mut monitor = DrawdownMonitor::new(Decimal::MAX);
        let applied = monitor.apply(Decimal::MAX);
        assert_eq!(applied, dec!(0));
        assert_eq!(monitor.balance, Decimal::MAX);
        assert_eq!(monitor.realized_pnl_today, dec!(0));

        let applied = monitor.apply(Decimal::MIN);
        assert_eq!(applied, -Decimal::MAX);
        assert_eq!(monitor.balance, dec!(0));
        assert_eq!(monitor.current_drawdown(), dec!(1));
    }

    #[test]
    fn test_daily_loss_breach() {
        let limits = RiskLimits::default();
        let mut monitor = DrawdownMonitor::new(dec!(10000));

        monitor.apply(dec!(-200));
        // Threshold is inclusive: -200 <= -200
        assert_eq!(monitor.breach(&limits), HaltState::DailyLoss);

        let mut monitor = DrawdownMonitor::new(dec!(10000));
        monitor.apply(dec!(-199));
        assert_eq!(monitor.breach(&limits), HaltState::None);
    }

    #[test]
    fn test_emergency_takes_precedence() {
        let limits = RiskLimits::default();
        let mut monitor = DrawdownMonitor::new(dec!(10000));

        monitor.apply(dec!(-1100));
        assert_eq!(monitor.breach(&limits), HaltState::Emergency);
    }

    #[test]
    fn test_drawdown_after_daily_reset() {
        let limits = RiskLimits::default();
        let mut monitor = DrawdownMonitor::new(dec!(1000));

        monitor.apply(dec!(-50));
        monitor.reset_daily();
        assert_eq!(monitor.day_start_balance, dec!(950));
        assert_eq!(monitor.realized_pnl_today, dec!(0));

        // Daily loss is measured against the new day start
        monitor.apply(dec!(-19));
        assert_eq!(monitor.breach(&limits), HaltState::DailyLoss);
    }

    #[test]
    fn test_zero_peak_never_halts_on_drawdown() {
        let limits = RiskLimits::default();
        let monitor = DrawdownMonitor::new(dec!(0));
        assert_eq!(monitor.current_drawdown(), dec!(0));
        assert_eq!(monitor.breach(&limits), HaltState::None);
    }
}
