//! Prometheus metrics

use metrics::{counter, gauge};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::risk::{AccountSnapshot, HaltState, RiskLimits};

/// Gauge metric types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GaugeMetric {
    /// Current balance
    Balance,
    /// Realized P&L since the start of the trading day
    DailyPnl,
    /// Open position count
    OpenPositions,
    /// Total open notional
    TotalExposure,
    /// Drawdown from peak, as a fraction
    Drawdown,
    /// 0 none, 1 daily loss, 2 emergency
    HaltState,
}

impl GaugeMetric {
    pub fn name(&self) -> &'static str {
        match self {
            GaugeMetric::Balance => "zeus_risk_balance",
            GaugeMetric::DailyPnl => "zeus_risk_daily_pnl",
            GaugeMetric::OpenPositions => "zeus_risk_open_positions",
            GaugeMetric::TotalExposure => "zeus_risk_total_exposure",
            GaugeMetric::Drawdown => "zeus_risk_drawdown_ratio",
            GaugeMetric::HaltState => "zeus_risk_halt_state",
        }
    }
}

pub const VALIDATIONS_TOTAL: &str = "zeus_risk_validations_total";
pub const HALTS_TOTAL: &str = "zeus_risk_halts_total";

/// Set a gauge value
pub fn set_gauge(metric: GaugeMetric, value: f64) {
    gauge!(metric.name()).set(value);
}

fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}

fn halt_code(halt: HaltState) -> f64 {
    match halt {
        HaltState::None => 0.0,
        HaltState::DailyLoss => 1.0,
        HaltState::Emergency => 2.0,
    }
}

/// Publish ledger gauges after a mutation
pub fn publish_account(snapshot: &AccountSnapshot, limits: &RiskLimits) {
    let metrics = snapshot.metrics(limits);
    set_gauge(GaugeMetric::Balance, to_f64(metrics.balance));
    set_gauge(GaugeMetric::DailyPnl, to_f64(metrics.daily_pnl));
    set_gauge(GaugeMetric::OpenPositions, metrics.open_positions as f64);
    set_gauge(GaugeMetric::TotalExposure, to_f64(metrics.total_exposure));
    set_gauge(GaugeMetric::Drawdown, to_f64(metrics.drawdown));
    set_gauge(GaugeMetric::HaltState, halt_code(metrics.halt));
}

/// Count a validation outcome
pub fn record_validation(valid: bool) {
    let outcome = if valid { "accepted" } else { "rejected" };
    counter!(VALIDATIONS_TOTAL, "outcome" => outcome).increment(1);
}

/// Count a halt transition
pub fn record_halt(halt: HaltState) {
    if halt.is_halted() {
        counter!(HALTS_TOTAL, "state" => halt.as_str()).increment(1);
    }
    set_gauge(GaugeMetric::HaltState, halt_code(halt));
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_gauge_names_are_prefixed() {
        for metric in [
            GaugeMetric::Balance,
            GaugeMetric::DailyPnl,
            GaugeMetric::OpenPositions,
            GaugeMetric::TotalExposure,
            GaugeMetric::Drawdown,
            GaugeMetric::HaltState,
        ] {
            assert!(metric.name().starts_with("zeus_risk_"));
        }
    }

    #[test]
    fn test_halt_code_ordering() {
        assert!(halt_code(HaltState::None) < halt_code(HaltState::DailyLoss));
        assert!(halt_code(HaltState::DailyLoss) < halt_code(HaltState::Emergency));
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_validation(true);
        record_halt(HaltState::Emergency);
        assert_eq!(to_f64(dec!(1.5)), 1.5);
    }
}
