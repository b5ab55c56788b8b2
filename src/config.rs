//! Configuration types for zeus-risk

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::audit::DEFAULT_AUDIT_CAPACITY;
use crate::risk::RiskLimits;
use crate::telemetry::LogFormat;

/// Root configuration structure
///
/// Every section is optional and falls back to its defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub session: SessionConfig,
    pub risk: RiskLimits,
    pub audit: AuditConfig,
    pub execution: ExecutionConfig,
    pub telemetry: TelemetryConfig,
}

/// Trading session configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub initial_balance: Decimal,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            initial_balance: dec!(10000),
        }
    }
}

/// Audit log configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Entries kept in memory before the oldest are evicted
    pub capacity: usize,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_AUDIT_CAPACITY,
        }
    }
}

/// Execution engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Fee charged by the paper engine, as a fraction of notional
    pub fee_rate: Decimal,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            fee_rate: dec!(0.001),
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub log_format: LogFormat,
    pub metrics_port: Option<u16>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_port: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse and check a TOML document
    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.risk.validate()?;
        if config.session.initial_balance < Decimal::ZERO {
            anyhow::bail!(
                "initial_balance must be non-negative, got {}",
                config.session.initial_balance
            );
        }
        if config.execution.fee_rate < Decimal::ZERO {
            anyhow::bail!(
                "fee_rate must be non-negative, got {}",
                config.execution.fee_rate
            );
        }
        Ok(config)
    }
}
