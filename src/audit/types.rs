//! Audit record types

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::risk::{
    ClosedPosition, HaltState, Position, Side, SizingResult, ValidationResult,
    VolatilityAdjustment,
};

/// Kind tag of an audit entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditKind {
    Sizing,
    Validation,
    PositionOpened,
    PositionClosed,
    HaltTriggered,
    BalanceUpdated,
    DailyReset,
    HaltReset,
}

/// Inputs and result of a sizing decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizingRecord {
    pub symbol: String,
    pub side: Side,
    pub entry_price: Decimal,
    pub volatility: Decimal,
    pub adjustment: VolatilityAdjustment,
    /// Risk-based size was reduced to the notional cap
    pub notional_capped: bool,
    pub result: SizingResult,
}

/// Ledger figures at the moment a halt tripped
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HaltRecord {
    pub halt: HaltState,
    pub balance: Decimal,
    pub peak_balance: Decimal,
    pub drawdown: Decimal,
    pub day_start_balance: Decimal,
    pub realized_pnl_today: Decimal,
}

/// A balance mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceUpdate {
    /// Requested change
    pub delta: Decimal,
    /// Change actually applied after flooring the balance at zero
    pub applied: Decimal,
    pub balance: Decimal,
    pub realized_pnl_today: Decimal,
}

/// Start of a new trading day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyReset {
    pub trading_day: NaiveDate,
    pub previous_pnl: Decimal,
    pub day_start_balance: Decimal,
}

/// Operator cleared a halt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HaltReset {
    pub previous: HaltState,
}

/// Payload of an audit entry, tagged by kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum AuditEvent {
    Sizing(SizingRecord),
    Validation(ValidationResult),
    PositionOpened(Position),
    PositionClosed(ClosedPosition),
    HaltTriggered(HaltRecord),
    BalanceUpdated(BalanceUpdate),
    DailyReset(DailyReset),
    HaltReset(HaltReset),
}

impl AuditEvent {
    pub fn kind(&self) -> AuditKind {
        match self {
            AuditEvent::Sizing(_) => AuditKind::Sizing,
            AuditEvent::Validation(_) => AuditKind::Validation,
            AuditEvent::PositionOpened(_) => AuditKind::PositionOpened,
            AuditEvent::PositionClosed(_) => AuditKind::PositionClosed,
            AuditEvent::HaltTriggered(_) => AuditKind::HaltTriggered,
            AuditEvent::BalanceUpdated(_) => AuditKind::BalanceUpdated,
            AuditEvent::DailyReset(_) => AuditKind::DailyReset,
            AuditEvent::HaltReset(_) => AuditKind::HaltReset,
        }
    }
}

/// One record of the audit trail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Position in the session's trail, strictly increasing
    pub seq: u64,
    /// Never earlier than the previous entry's timestamp
    pub timestamp: DateTime<Utc>,
    pub event: AuditEvent,
}

impl AuditEntry {
    pub fn kind(&self) -> AuditKind {
        self.event.kind()
    }
}
