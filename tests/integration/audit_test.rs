//! Audit trail export tests

use rust_decimal_macros::dec;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use zeus_risk::audit::{read_jsonl, write_jsonl, AuditEvent, AuditFilter, AuditKind};
use zeus_risk::risk::{HaltState, RiskEngine, RiskLimits, Side, TradeCandidate};

#[tokio::test]
async fn test_export_to_file_and_back() {
    let engine = RiskEngine::new(dec!(10000), RiskLimits::default(), 256).unwrap();
    engine
        .evaluate(&TradeCandidate::new("BTC/USDT", Side::Long, dec!(50000), dec!(0.01)))
        .await
        .unwrap();
    engine.update_balance(dec!(-1200)).await;

    let report = engine.audit().export_report(&AuditFilter::all());
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audit.jsonl");
    write_jsonl(&report.entries, BufWriter::new(File::create(&path).unwrap())).unwrap();

    let entries = read_jsonl(BufReader::new(File::open(&path).unwrap())).unwrap();
    assert_eq!(entries, report.entries);

    let seqs: Vec<u64> = entries.iter().map(|e| e.seq).collect();
    assert!(seqs.windows(2).all(|w| w[0] < w[1]));
    assert!(entries.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
}

#[tokio::test]
async fn test_halt_entries_survive_eviction() {
    let engine = RiskEngine::new(dec!(10000), RiskLimits::default(), 4).unwrap();
    engine.update_balance(dec!(-300)).await;

    // Flood the ring well past capacity
    for _ in 0..10 {
        engine.update_balance(dec!(1)).await;
    }

    let audit = engine.audit();
    assert_eq!(audit.len(), 4);
    assert!(audit.dropped() > 0);

    let halts = audit.export_report(&AuditFilter::halts_only());
    assert_eq!(halts.entries.len(), 1);
    match &halts.entries[0].event {
        AuditEvent::HaltTriggered(record) => {
            assert_eq!(record.halt, HaltState::DailyLoss);
            assert_eq!(record.realized_pnl_today, dec!(-300));
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[tokio::test]
async fn test_filter_by_kind_and_time() {
    let engine = RiskEngine::new(dec!(10000), RiskLimits::default(), 256).unwrap();
    let before = chrono::Utc::now();
    engine
        .evaluate(&TradeCandidate::new("ETH/USDT", Side::Short, dec!(2000), dec!(0)))
        .await
        .unwrap();
    let after = chrono::Utc::now();

    let filter = AuditFilter::all()
        .between(before, after)
        .with_kinds([AuditKind::Validation]);
    let report = engine.audit().export_report(&filter);
    assert_eq!(report.entries.len(), 1);
    assert_eq!(report.entries[0].kind(), AuditKind::Validation);

    let later = after + chrono::Duration::hours(1);
    let empty = engine
        .audit()
        .export_report(&AuditFilter::all().between(later, later + chrono::Duration::hours(1)));
    assert!(empty.entries.is_empty());
}
