//! Benchmarks for the sizing pipeline

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rust_decimal_macros::dec;
use tokio::runtime::Runtime;
use zeus_risk::risk::{
    PositionSizer, RiskEngine, RiskLimits, Side, StopLevelCalculator, TradeCandidate,
};

fn benchmark_position_size(c: &mut Criterion) {
    let sizer = PositionSizer::new();
    let limits = RiskLimits::default();

    c.bench_function("position_size", |b| {
        b.iter(|| {
            sizer.size(
                black_box(dec!(10000)),
                black_box(dec!(50000)),
                black_box(dec!(49000)),
                Side::Long,
                &limits,
                dec!(1),
            )
        })
    });
}

fn benchmark_stop_levels(c: &mut Criterion) {
    let calculator = StopLevelCalculator::new();
    let limits = RiskLimits::default();

    c.bench_function("stop_levels_widened", |b| {
        b.iter(|| calculator.compute(black_box(dec!(2000)), Side::Short, &limits, dec!(1.4)))
    });
}

fn benchmark_evaluate(c: &mut Criterion) {
    let runtime = Runtime::new().unwrap();
    // Large ring so the bench measures steady-state appends
    let engine = RiskEngine::new(dec!(10000), RiskLimits::default(), 1_000_000).unwrap();
    let candidate = TradeCandidate::new("BTC/USDT", Side::Long, dec!(50000), dec!(0.03));

    c.bench_function("engine_evaluate", |b| {
        b.to_async(&runtime)
            .iter(|| async { engine.evaluate(black_box(&candidate)).await })
    });
}

criterion_group!(
    benches,
    benchmark_position_size,
    benchmark_stop_levels,
    benchmark_evaluate
);
criterion_main!(benches);
