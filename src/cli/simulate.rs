//! Simulate command implementation
//!
//! Replays a JSON-lines session script through the risk engine, filling
//! approved trades on the paper engine.

use clap::Args;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter};
use std::path::PathBuf;
use tracing::{info, warn};

use crate::audit::{write_jsonl, AuditFilter};
use crate::config::Config;
use crate::execution::{ExecutionEngine, PaperEngine};
use crate::risk::{HaltState, RiskEngine, Side, TradeCandidate};

/// One step of a session script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SessionAction {
    /// Evaluate a candidate and open it if approved
    Open {
        symbol: String,
        side: Side,
        price: Decimal,
        #[serde(default)]
        volatility: Decimal,
    },
    /// Close an open position at a price
    Close { symbol: String, price: Decimal },
    /// Apply a realized balance change
    Balance { delta: Decimal },
    /// Operator reset of a trading halt
    ResetHalt,
    /// Start a new trading day
    ResetDaily,
}

/// Outcome counts of a replay
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub steps: usize,
    pub opened: usize,
    pub rejected: usize,
    pub closed: usize,
    pub errors: usize,
    pub fees_paid: Decimal,
    pub final_balance: Decimal,
    pub halt: HaltState,
    pub audit_entries: usize,
}

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// JSON-lines session script
    pub script: PathBuf,

    /// Write the audit trail as JSON lines to this file
    #[arg(long)]
    pub audit_out: Option<PathBuf>,

    /// Starting balance, overrides the session config
    #[arg(long)]
    pub balance: Option<Decimal>,
}

impl SimulateArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let actions = read_script(BufReader::new(File::open(&self.script)?))?;
        info!(steps = actions.len(), script = ?self.script, "Loaded session script");

        // Replays only ever fill on the paper engine
        let mut limits = config.risk.clone();
        limits.paper_trading = true;

        let balance = self.balance.unwrap_or(config.session.initial_balance);
        let engine = RiskEngine::new(balance, limits, config.audit.capacity)?;
        let executor = PaperEngine::new(config.execution.fee_rate);

        let summary = replay(&engine, &executor, &actions).await?;

        if let Some(path) = &self.audit_out {
            let report = engine.audit().export_report(&AuditFilter::all());
            write_jsonl(&report.entries, BufWriter::new(File::create(path)?))?;
            info!(entries = report.entries.len(), path = ?path, "Audit trail written");
        }

        println!("{}", serde_json::to_string_pretty(&summary)?);
        Ok(())
    }
}

/// Parse a session script, skipping blank lines and `#` comments
pub fn read_script<R: BufRead>(reader: R) -> anyhow::Result<Vec<SessionAction>> {
    let mut actions = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let action = serde_json::from_str(line)
            .map_err(|e| anyhow::anyhow!("script line {}: {}", index + 1, e))?;
        actions.push(action);
    }
    Ok(actions)
}

/// Run every action in order
///
/// Rejections and per-step risk errors are counted and the replay goes on;
/// only execution failures abort it.
pub async fn replay(
    engine: &RiskEngine,
    executor: &dyn ExecutionEngine,
    actions: &[SessionAction],
) -> anyhow::Result<SimulationSummary> {
    let mut summary = SimulationSummary::default();

    for action in actions {
        summary.steps += 1;
        match action {
            SessionAction::Open {
                symbol,
                side,
                price,
                volatility,
            } => {
                let candidate = TradeCandidate::new(symbol.clone(), *side, *price, *volatility);
                let decision = match engine.evaluate(&candidate).await {
                    Ok(decision) => decision,
                    Err(e) => {
                        warn!(%symbol, error = %e, "Candidate refused");
                        summary.errors += 1;
                        continue;
                    }
                };

                let Some(intent) = decision.intent else {
                    summary.rejected += 1;
                    continue;
                };

                let fill = executor.submit(&intent).await?;
                match engine.open_position(&intent).await {
                    Ok(_) => {
                        summary.opened += 1;
                        if fill.fees > Decimal::ZERO {
                            engine.update_balance(-fill.fees).await;
                            summary.fees_paid += fill.fees;
                        }
                    }
                    Err(e) => {
                        warn!(%symbol, error = %e, "Filled intent could not be recorded");
                        executor.cancel(fill.order_id).await?;
                        summary.errors += 1;
                    }
                }
            }
            SessionAction::Close { symbol, price } => {
                match engine.close_position(symbol, Some(*price)).await {
                    Ok(_) => summary.closed += 1,
                    Err(e) => {
                        warn!(%symbol, error = %e, "Close failed");
                        summary.errors += 1;
                    }
                }
            }
            SessionAction::Balance { delta } => {
                engine.update_balance(*delta).await;
            }
            SessionAction::ResetHalt => {
                engine.account().reset_halt().await;
            }
            SessionAction::ResetDaily => {
                engine.account().reset_daily().await;
            }
        }
    }

    let snapshot = engine.account().snapshot().await;
    summary.final_balance = snapshot.balance;
    summary.halt = snapshot.halt;
    summary.audit_entries = engine.audit().len();

    info!(
        steps = summary.steps,
        opened = summary.opened,
        rejected = summary.rejected,
        closed = summary.closed,
        balance = %summary.final_balance,
        halt = %summary.halt,
        "Session replay finished"
    );
    Ok(summary)
}
