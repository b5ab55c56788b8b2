//! Trade validation against risk limits

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::{AccountSnapshot, AccountState, RiskError, RiskLimits, TradeProposal, ValidationResult};

/// Relative slack on the notional check, absorbs decimal rounding in sizing
pub const NOTIONAL_TOLERANCE: Decimal = dec!(0.0001);

pub const REASON_MAX_POSITIONS: &str = "max open positions reached";
pub const REASON_ALREADY_OPEN: &str = "position already open for symbol";
pub const REASON_SIZE_EXCEEDS: &str = "size exceeds max position fraction";
pub const REASON_RISK_REWARD: &str = "risk/reward below minimum";

/// Accepts or rejects a proposed trade
///
/// Checks run cheapest first and stop at the first failure. Validation never
/// mutates the ledger and makes no reservation.
#[derive(Debug, Clone, Default)]
pub struct TradeValidator;

impl TradeValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validate against a fresh snapshot of the account
    pub async fn validate(
        &self,
        proposal: &TradeProposal,
        account: &AccountState,
    ) -> Result<ValidationResult, RiskError> {
        // Malformed input fails before touching the ledger
        check_inputs(proposal)?;
        let snapshot = account.snapshot().await;
        self.validate_snapshot(proposal, &snapshot, account.limits())
    }

    /// Validate against an already-taken snapshot
    pub fn validate_snapshot(
        &self,
        proposal: &TradeProposal,
        snapshot: &AccountSnapshot,
        limits: &RiskLimits,
    ) -> Result<ValidationResult, RiskError> {
        check_inputs(proposal)?;
        let reject = |reason: String| -> Result<ValidationResult, RiskError> {
            Ok(ValidationResult::rejected(proposal.clone(), reason))
        };

        if let Some(reason) = self.account_rejection(&proposal.symbol, snapshot, limits) {
            return reject(reason);
        }

        let max_notional = limits
            .max_notional(snapshot.balance)
            .saturating_mul(Decimal::ONE + NOTIONAL_TOLERANCE);
        if proposal.notional() > max_notional {
            return reject(REASON_SIZE_EXCEEDS.to_string());
        }

        match proposal.risk_reward_ratio() {
            Some(ratio) if ratio >= limits.min_risk_reward_ratio => {}
            _ => return reject(REASON_RISK_REWARD.to_string()),
        }

        Ok(ValidationResult::accepted(proposal.clone()))
    }

    /// Account-level checks that hold for any size or price
    ///
    /// Halt first, then capacity, then the open-symbol check.
    pub fn account_rejection(
        &self,
        symbol: &str,
        snapshot: &AccountSnapshot,
        limits: &RiskLimits,
    ) -> Option<String> {
        if snapshot.halt.is_halted() {
            return Some(format!("trading halted: {}", snapshot.halt));
        }

        let already_open = snapshot.is_open(symbol);
        if snapshot.open_count() >= limits.max_open_positions && !already_open {
            return Some(REASON_MAX_POSITIONS.to_string());
        }

        // No pyramiding
        if already_open {
            return Some(REASON_ALREADY_OPEN.to_string());
        }
        None
    }
}

fn check_inputs(proposal: &TradeProposal) -> Result<(), RiskError> {
    if proposal.size <= dec!(0) {
        return Err(RiskError::InvalidSize(proposal.size));
    }
    if proposal.entry_price <= dec!(0) {
        return Err(RiskError::InvalidPrice {
            field: "entry_price",
            value: proposal.entry_price,
        });
    }
    Ok(())
}
