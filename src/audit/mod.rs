//! Audit trail
//!
//! Append-only record of every sizing, validation and ledger decision,
//! exportable as JSON lines.

mod log;
mod types;

pub use log::{
    read_jsonl, write_jsonl, AuditFilter, AuditLog, AuditReport, DEFAULT_AUDIT_CAPACITY,
};
pub use types::{
    AuditEntry, AuditEvent, AuditKind, BalanceUpdate, DailyReset, HaltRecord, HaltReset,
    SizingRecord,
};
