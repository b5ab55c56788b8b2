//! Risk management module
//!
//! Position sizing, stop levels, trade validation, and the shared account
//! ledger with its drawdown halts.

mod account;
mod engine;
mod limits;
mod position;
mod sizing;
mod stops;
mod types;
mod validator;
mod volatility;

pub use account::{AccountSnapshot, AccountState, RiskMetrics};
pub use engine::{RiskEngine, RiskReport, TradeDecision, REASON_ZERO_SIZE};
pub use limits::{DrawdownMonitor, LimitsError, RiskLimits};
pub use position::{ClosedPosition, Position};
pub use sizing::PositionSizer;
pub use stops::{StopLevelCalculator, StopLevels};
pub use types::{
    HaltState, RiskError, Side, SizingResult, TradeCandidate, TradeProposal, ValidationResult,
};
pub use validator::{
    TradeValidator, NOTIONAL_TOLERANCE, REASON_ALREADY_OPEN, REASON_MAX_POSITIONS,
    REASON_RISK_REWARD, REASON_SIZE_EXCEEDS,
};
pub use volatility::{VolatilityAdjuster, VolatilityAdjustment};
