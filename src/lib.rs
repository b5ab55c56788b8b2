//! zeus-risk: Risk management core for the Zeus trading bot
//!
//! This library provides:
//! - Volatility-aware stop-loss and take-profit levels
//! - Fixed-fractional position sizing
//! - Trade validation against portfolio limits
//! - A shared account ledger with daily-loss and emergency halts
//! - A bounded, exportable audit trail of every risk decision
//! - Paper execution of approved order intents

pub mod audit;
pub mod cli;
pub mod config;
pub mod execution;
pub mod risk;
pub mod telemetry;
