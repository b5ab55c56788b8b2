//! End-to-end integration tests

use rust_decimal_macros::dec;
use std::sync::Arc;
use zeus_risk::audit::{AuditFilter, AuditKind, AuditLog};
use zeus_risk::config::Config;
use zeus_risk::risk::{
    AccountState, HaltState, Position, PositionSizer, RiskEngine, RiskError, RiskLimits, Side,
    TradeCandidate, TradeProposal, TradeValidator, REASON_MAX_POSITIONS,
};

fn position(symbol: &str) -> Position {
    Position::new(symbol, Side::Long, dec!(0.01), dec!(100), dec!(98), dec!(106))
}

fn ledger(balance: rust_decimal::Decimal, limits: RiskLimits) -> AccountState {
    AccountState::new(balance, Arc::new(limits), Arc::new(AuditLog::new(4096))).unwrap()
}

#[test]
fn test_config_example_exists() {
    let config = Config::parse(include_str!("../../config.toml.example")).unwrap();
    assert_eq!(config.session.initial_balance, dec!(10000));
    assert_eq!(config.risk.max_open_positions, 3);
}

#[test]
fn test_fixed_fractional_sizing() {
    let size = PositionSizer::new()
        .size(
            dec!(10000),
            dec!(50000),
            dec!(49000),
            Side::Long,
            &RiskLimits::default(),
            dec!(1),
        )
        .unwrap();
    assert_eq!(size, dec!(0.5));
}

#[tokio::test]
async fn test_daily_loss_halt_blocks_new_positions() {
    let account = ledger(dec!(10000), RiskLimits::default());
    account.update_balance(dec!(-120)).await;
    account.update_balance(dec!(-81)).await;

    let snapshot = account.snapshot().await;
    assert_eq!(snapshot.realized_pnl_today, dec!(-201));
    assert_eq!(snapshot.halt, HaltState::DailyLoss);

    assert_eq!(
        account.add_position(position("BTC/USDT")).await,
        Err(RiskError::TradingHalted(HaltState::DailyLoss))
    );
}

#[tokio::test]
async fn test_emergency_halt_on_drawdown() {
    let account = ledger(dec!(10000), RiskLimits::default());
    account.update_balance(dec!(-1100)).await;

    let snapshot = account.snapshot().await;
    assert_eq!(snapshot.peak_balance, dec!(10000));
    assert_eq!(snapshot.balance, dec!(8900));
    assert_eq!(snapshot.halt, HaltState::Emergency);

    // Halts are terminal until an operator reset
    account.update_balance(dec!(5000)).await;
    assert_eq!(account.halt_state().await, HaltState::Emergency);
    assert_eq!(account.reset_halt().await, HaltState::Emergency);
    assert_eq!(account.halt_state().await, HaltState::None);
}

#[tokio::test]
async fn test_max_open_positions_rejects_any_trade() {
    let account = ledger(dec!(10000), RiskLimits::default());
    for symbol in ["BTC/USDT", "ETH/USDT", "SOL/USDT"] {
        account.add_position(position(symbol)).await.unwrap();
    }

    let validator = TradeValidator::new();
    for (size, price) in [(dec!(0.001), dec!(10)), (dec!(5), dec!(3000)), (dec!(1), dec!(1))] {
        let proposal = TradeProposal {
            symbol: "XRP/USDT".to_string(),
            side: Side::Long,
            size,
            entry_price: price,
            stop_loss: price * dec!(0.98),
            take_profit: price * dec!(1.06),
        };
        let result = validator.validate(&proposal, &account).await.unwrap();
        assert!(!result.valid);
        assert_eq!(result.reason.as_deref(), Some(REASON_MAX_POSITIONS));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_adds_respect_capacity() {
    let capacity = 8;
    let limits = RiskLimits {
        max_open_positions: capacity,
        ..Default::default()
    };
    let account = Arc::new(ledger(dec!(100000), limits));

    let handles: Vec<_> = (0..=capacity)
        .map(|i| {
            let account = account.clone();
            tokio::spawn(async move { account.add_position(position(&format!("SYM{i}"))).await })
        })
        .collect();

    let mut ok = 0;
    let mut full = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(()) => ok += 1,
            Err(e) => {
                assert!(e.is_capacity());
                full += 1;
            }
        }
    }

    assert_eq!(ok, capacity);
    assert_eq!(full, 1);
    assert_eq!(account.snapshot().await.open_count(), capacity);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_balance_updates_are_not_lost() {
    let account = Arc::new(ledger(dec!(10000), RiskLimits::default()));

    let handles: Vec<_> = (0..50)
        .map(|_| {
            let account = account.clone();
            tokio::spawn(async move { account.update_balance(dec!(1)).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap();
    }

    let snapshot = account.snapshot().await;
    assert_eq!(snapshot.balance, dec!(10050));
    assert_eq!(snapshot.peak_balance, dec!(10050));
}

#[tokio::test]
async fn test_engine_full_trade_lifecycle() {
    let engine = RiskEngine::new(dec!(10000), RiskLimits::default(), 4096).unwrap();

    let decision = engine
        .evaluate(&TradeCandidate::new("BTC/USDT", Side::Long, dec!(50000), dec!(0.02)))
        .await
        .unwrap();
    assert!(decision.approved());
    let intent = decision.intent.unwrap();
    engine.open_position(&intent).await.unwrap();

    let closed = engine
        .close_position("BTC/USDT", Some(decision.sizing.take_profit))
        .await
        .unwrap();
    assert!(closed.realized_pnl > dec!(0));

    let report = engine.report(&AuditFilter::all()).await;
    let kinds: Vec<AuditKind> = report.audit.entries.iter().map(|e| e.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            AuditKind::Sizing,
            AuditKind::Validation,
            AuditKind::PositionOpened,
            AuditKind::PositionClosed,
        ]
    );
    assert_eq!(report.account.balance, dec!(10000) + closed.realized_pnl);
    assert_eq!(report.metrics.open_positions, 0);
}

#[tokio::test]
async fn test_batch_evaluation_does_not_reserve_capacity() {
    let limits = RiskLimits {
        max_open_positions: 1,
        ..Default::default()
    };
    let engine = RiskEngine::new(dec!(10000), limits, 4096).unwrap();
    let candidates = vec![
        TradeCandidate::new("BTC/USDT", Side::Long, dec!(50000), dec!(0)),
        TradeCandidate::new("ETH/USDT", Side::Long, dec!(2000), dec!(0)),
    ];

    let decisions: Vec<_> = engine
        .evaluate_batch(&candidates)
        .await
        .into_iter()
        .map(|d| d.unwrap())
        .collect();
    assert!(decisions.iter().all(|d| d.approved()));

    // Only the first approval fits
    engine
        .open_position(decisions[0].intent.as_ref().unwrap())
        .await
        .unwrap();
    let err = engine
        .open_position(decisions[1].intent.as_ref().unwrap())
        .await
        .unwrap_err();
    assert_eq!(err, RiskError::MaxPositionsReached(1));
}
