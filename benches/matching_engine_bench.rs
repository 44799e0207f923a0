use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use uuid::Uuid;

use stock_matcher::workload::{PriceDistribution, Workload};
use stock_matcher::{MatchingEngine, NotificationReader, Order, notification_channel};

const PAIRS: usize = 10_000;

fn setup_engine(capacity: usize) -> (MatchingEngine, NotificationReader, Uuid) {
    let instrument_id = Uuid::new_v4();
    let (writer, reader) = notification_channel(capacity).unwrap();
    (MatchingEngine::new(instrument_id, writer), reader, instrument_id)
}

fn bench_workload(c: &mut Criterion, name: &str, distribution: PriceDistribution) {
    let mut group = c.benchmark_group(name);
    group.throughput(Throughput::Elements((PAIRS * 2) as u64));

    // Nobody reads the channel here, so a two-slot ring just keeps overwriting.
    group.bench_function("interleaved_pairs", |b| {
        b.iter_batched(
            || {
                let (engine, reader, instrument_id) = setup_engine(2);
                let workload =
                    Workload::generate(PAIRS, 1_000, 1_500, distribution, instrument_id, 1).unwrap();
                (engine, reader, workload)
            },
            |(mut engine, _reader, workload)| {
                for (buy, sell) in workload.buys.into_iter().zip(workload.sells) {
                    black_box(engine.submit_buy(buy).unwrap());
                    black_box(engine.submit_sell(sell).unwrap());
                }
                engine
            },
            BatchSize::LargeInput,
        )
    });

    group.finish();
}

fn bench_flat_workload(c: &mut Criterion) {
    bench_workload(c, "flat_workload", PriceDistribution::Flat);
}

fn bench_pyramid_workload(c: &mut Criterion) {
    bench_workload(c, "pyramid_workload", PriceDistribution::Pyramid);
}

fn bench_sweep_deep_book(c: &mut Criterion) {
    let mut group = c.benchmark_group("sweep_deep_book");

    // 50 levels of 20 single-unit sells; one buy takes the first ten levels.
    group.bench_function("buy_through_ten_levels", |b| {
        b.iter_batched(
            || {
                let (mut engine, reader, instrument_id) = setup_engine(1_024);
                let mut order_id = 0;
                for level in 0..50 {
                    for _ in 0..20 {
                        let sell = Order::sell(100 + level, 1, 1, order_id, instrument_id).unwrap();
                        engine.submit_sell(sell).unwrap();
                        order_id += 1;
                    }
                }
                let buy = Order::buy(109, 200, 2, order_id, instrument_id).unwrap();
                (engine, reader, buy)
            },
            |(mut engine, reader, buy)| {
                black_box(engine.submit_buy(buy).unwrap());
                (engine, reader)
            },
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

fn bench_resting_only(c: &mut Criterion) {
    let mut group = c.benchmark_group("resting_only");
    group.throughput(Throughput::Elements(PAIRS as u64));

    group.bench_function("non_crossing_buys", |b| {
        b.iter_batched(
            || setup_engine(2),
            |(mut engine, reader, instrument_id)| {
                for i in 0..PAIRS as u64 {
                    let buy = Order::buy(1_000 + (i % 500) as i64, 1, i, i, instrument_id).unwrap();
                    black_box(engine.submit_buy(buy).unwrap());
                }
                (engine, reader)
            },
            BatchSize::LargeInput,
        )
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_flat_workload,
    bench_pyramid_workload,
    bench_sweep_deep_book,
    bench_resting_only
);
criterion_main!(benches);
