//! CLI interface for zeus-risk
//!
//! Provides subcommands for:
//! - `evaluate`: Size and validate a single trade candidate
//! - `simulate`: Replay a session script through the engine
//! - `limits`: Show the effective risk limits

mod evaluate;
mod simulate;

pub use evaluate::EvaluateArgs;
pub use simulate::{read_script, replay, SessionAction, SimulateArgs, SimulationSummary};

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "zeus-risk")]
#[command(about = "Risk engine for the Zeus trading bot")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Size and validate one trade candidate
    Evaluate(EvaluateArgs),
    /// Replay a JSON-lines session script
    Simulate(SimulateArgs),
    /// Show the effective risk limits
    Limits,
}
