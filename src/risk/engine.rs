//! Risk engine
//!
//! Runs a candidate through stop levels, sizing and validation in that order,
//! auditing each step, and turns approved trades into order intents.

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use super::{
    AccountSnapshot, AccountState, ClosedPosition, PositionSizer, Position, RiskError,
    RiskLimits, RiskMetrics, SizingResult, StopLevelCalculator, StopLevels, TradeCandidate,
    TradeProposal, TradeValidator, ValidationResult, VolatilityAdjuster, VolatilityAdjustment,
};
use crate::audit::{AuditEvent, AuditFilter, AuditLog, AuditReport, BalanceUpdate, SizingRecord};
use crate::execution::OrderIntent;
use crate::telemetry;

pub const REASON_ZERO_SIZE: &str = "computed size is zero";

/// Full outcome of evaluating a candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeDecision {
    pub candidate: TradeCandidate,
    pub sizing: SizingResult,
    pub validation: ValidationResult,
    /// Present iff the trade was approved
    pub intent: Option<OrderIntent>,
}

impl TradeDecision {
    pub fn approved(&self) -> bool {
        self.validation.valid
    }
}

/// Exportable session report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskReport {
    pub generated_at: DateTime<Utc>,
    pub limits: RiskLimits,
    pub account: AccountSnapshot,
    pub metrics: RiskMetrics,
    pub closed_positions: Vec<ClosedPosition>,
    pub audit: AuditReport,
}

/// Entry point of the risk core
pub struct RiskEngine {
    limits: Arc<RiskLimits>,
    account: Arc<AccountState>,
    audit: Arc<AuditLog>,
    adjuster: VolatilityAdjuster,
    stops: StopLevelCalculator,
    sizer: PositionSizer,
    validator: TradeValidator,
}

impl RiskEngine {
    /// Build an engine with a fresh ledger and audit log
    pub fn new(
        initial_balance: Decimal,
        limits: RiskLimits,
        audit_capacity: usize,
    ) -> anyhow::Result<Self> {
        limits.validate()?;
        let limits = Arc::new(limits);
        let audit = Arc::new(AuditLog::new(audit_capacity));
        let account = Arc::new(AccountState::new(
            initial_balance,
            limits.clone(),
            audit.clone(),
        )?);

        info!(
            %initial_balance,
            max_position_size = %limits.max_position_size,
            max_open_positions = limits.max_open_positions,
            paper_trading = limits.paper_trading,
            "Risk engine initialized"
        );
        Ok(Self::with_account(account))
    }

    /// Build an engine around an existing ledger
    pub fn with_account(account: Arc<AccountState>) -> Self {
        Self {
            limits: Arc::new(account.limits().clone()),
            audit: account.audit().clone(),
            account,
            adjuster: VolatilityAdjuster::new(),
            stops: StopLevelCalculator::new(),
            sizer: PositionSizer::new(),
            validator: TradeValidator::new(),
        }
    }

    pub fn limits(&self) -> &RiskLimits {
        &self.limits
    }

    pub fn account(&self) -> &Arc<AccountState> {
        &self.account
    }

    pub fn audit(&self) -> &Arc<AuditLog> {
        &self.audit
    }

    /// Stop levels for an entry, widened for volatility
    pub fn stop_levels(
        &self,
        side: super::Side,
        entry_price: Decimal,
        volatility: Decimal,
    ) -> Result<StopLevels, RiskError> {
        let adjustment = self.adjuster.adjust(volatility, &self.limits)?;
        self.stops
            .compute(entry_price, side, &self.limits, adjustment.width_multiplier)
    }

    /// Size a candidate against the current balance
    ///
    /// The risk-based size is capped so the notional stays within the
    /// position fraction.
    pub async fn size_trade(&self, candidate: &TradeCandidate) -> Result<SizingResult, RiskError> {
        let balance = self.account.snapshot().await.balance;
        self.size_and_record(candidate, balance)
    }

    fn size_and_record(
        &self,
        candidate: &TradeCandidate,
        balance: Decimal,
    ) -> Result<SizingResult, RiskError> {
        let record = self.size_at_balance(candidate, balance)?;
        let result = record.result.clone();

        debug!(
            symbol = %candidate.symbol,
            size = %result.size,
            stop_loss = %result.stop_loss,
            take_profit = %result.take_profit,
            capped = record.notional_capped,
            "Trade sized"
        );
        self.audit.append(AuditEvent::Sizing(record));
        self.audit.report_eviction();
        Ok(result)
    }

    fn size_at_balance(
        &self,
        candidate: &TradeCandidate,
        balance: Decimal,
    ) -> Result<SizingRecord, RiskError> {
        let adjustment: VolatilityAdjustment =
            self.adjuster.adjust(candidate.volatility, &self.limits)?;
        let levels = self.stops.compute(
            candidate.entry_price,
            candidate.side,
            &self.limits,
            adjustment.width_multiplier,
        )?;

        let risk_size = self.sizer.size(
            balance,
            candidate.entry_price,
            levels.stop_loss,
            candidate.side,
            &self.limits,
            adjustment.size_multiplier,
        )?;
        let max_size = self
            .sizer
            .max_notional_size(balance, candidate.entry_price, &self.limits)?;
        let size = risk_size.min(max_size);

        Ok(SizingRecord {
            symbol: candidate.symbol.clone(),
            side: candidate.side,
            entry_price: candidate.entry_price,
            volatility: candidate.volatility,
            adjustment,
            notional_capped: size < risk_size,
            result: SizingResult {
                size,
                stop_loss: levels.stop_loss,
                take_profit: levels.take_profit,
                risk_amount: size.saturating_mul((candidate.entry_price - levels.stop_loss).abs()),
                risk_reward_ratio: levels.risk_reward_ratio,
            },
        })
    }

    /// Validate a proposal and audit the outcome
    pub async fn validate(&self, proposal: &TradeProposal) -> Result<ValidationResult, RiskError> {
        let result = self.validator.validate(proposal, &self.account).await?;
        self.record_validation(&result);
        Ok(result)
    }

    fn record_validation(&self, result: &ValidationResult) {
        match &result.reason {
            None => debug!(symbol = %result.proposal.symbol, "Trade approved"),
            Some(reason) => info!(symbol = %result.proposal.symbol, %reason, "Trade rejected"),
        }
        telemetry::record_validation(result.valid);
        self.audit.append(AuditEvent::Validation(result.clone()));
        self.audit.report_eviction();
    }

    /// Stop levels, then sizing, then validation for one candidate
    ///
    /// Sizing and every check read the same snapshot. A zero size is only
    /// reported when the account itself would accept the symbol, so a halted
    /// or full book is named as such even at zero balance.
    pub async fn evaluate(&self, candidate: &TradeCandidate) -> Result<TradeDecision, RiskError> {
        let snapshot = self.account.snapshot().await;
        let sizing = self.size_and_record(candidate, snapshot.balance)?;
        let proposal = TradeProposal {
            symbol: candidate.symbol.clone(),
            side: candidate.side,
            size: sizing.size,
            entry_price: candidate.entry_price,
            stop_loss: sizing.stop_loss,
            take_profit: sizing.take_profit,
        };

        let validation = if sizing.size <= dec!(0) {
            let reason = self
                .validator
                .account_rejection(&proposal.symbol, &snapshot, &self.limits)
                .unwrap_or_else(|| REASON_ZERO_SIZE.to_string());
            ValidationResult::rejected(proposal, reason)
        } else {
            self.validator
                .validate_snapshot(&proposal, &snapshot, &self.limits)?
        };
        self.record_validation(&validation);

        let intent = validation.valid.then(|| OrderIntent {
            symbol: candidate.symbol.clone(),
            side: candidate.side,
            size: sizing.size,
            entry_price: candidate.entry_price,
            stop_loss: sizing.stop_loss,
            take_profit: sizing.take_profit,
            paper: self.limits.paper_trading,
        });

        Ok(TradeDecision {
            candidate: candidate.clone(),
            sizing,
            validation,
            intent,
        })
    }

    /// Evaluate independent candidates concurrently
    ///
    /// Results keep the input order. Each evaluation reads its own snapshot;
    /// none reserves capacity, so approvals must still go through
    /// [`RiskEngine::open_position`].
    pub async fn evaluate_batch(
        &self,
        candidates: &[TradeCandidate],
    ) -> Vec<Result<TradeDecision, RiskError>> {
        join_all(candidates.iter().map(|candidate| self.evaluate(candidate))).await
    }

    /// Record an executed intent as an open position
    pub async fn open_position(&self, intent: &OrderIntent) -> Result<Position, RiskError> {
        let position = Position::new(
            intent.symbol.clone(),
            intent.side,
            intent.size,
            intent.entry_price,
            intent.stop_loss,
            intent.take_profit,
        );
        self.account.add_position(position.clone()).await?;
        Ok(position)
    }

    pub async fn close_position(
        &self,
        symbol: &str,
        exit_price: Option<Decimal>,
    ) -> Result<ClosedPosition, RiskError> {
        self.account.remove_position(symbol, exit_price).await
    }

    pub async fn update_balance(&self, delta: Decimal) -> BalanceUpdate {
        self.account.update_balance(delta).await
    }

    /// Report of limits, ledger state, history and audit trail
    pub async fn report(&self, filter: &AuditFilter) -> RiskReport {
        let (account, closed_positions) = self.account.snapshot_with_history().await;
        let metrics = account.metrics(&self.limits);

        RiskReport {
            generated_at: Utc::now(),
            limits: (*self.limits).clone(),
            account,
            metrics,
            closed_positions,
            audit: self.audit.export_report(filter),
        }
    }
}
