//! Session replay tests

use rust_decimal_macros::dec;
use std::fs::File;
use std::io::BufReader;
use zeus_risk::cli::{read_script, replay, SessionAction, SimulationSummary};
use zeus_risk::execution::{ExecutionEngine, PaperEngine};
use zeus_risk::risk::{HaltState, RiskEngine, RiskLimits};

fn demo_script() -> Vec<SessionAction> {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/demos/session.jsonl");
    let file = BufReader::new(File::open(path).unwrap());
    read_script(file).unwrap()
}

#[tokio::test]
async fn test_demo_session_replays() {
    let limits = RiskLimits {
        paper_trading: true,
        ..Default::default()
    };
    let engine = RiskEngine::new(dec!(10000), limits, 1024).unwrap();
    let executor = PaperEngine::new(dec!(0));

    let actions = demo_script();
    let summary: SimulationSummary = replay(&engine, &executor, &actions).await.unwrap();

    assert_eq!(summary.steps, actions.len());
    // BTC and ETH open, the second BTC entry is a duplicate,
    // SOL is refused while halted and accepted after the reset
    assert_eq!(summary.opened, 3);
    assert_eq!(summary.rejected, 2);
    assert_eq!(summary.closed, 2);
    assert_eq!(summary.errors, 0);
    assert_eq!(summary.halt, HaltState::None);
    assert_eq!(executor.fills().await.unwrap().len(), 3);
    assert_eq!(engine.account().snapshot().await.open_count(), 1);
}
