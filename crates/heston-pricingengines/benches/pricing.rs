use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use heston_core::OptionType;
use heston_models::ModelParameters;
use heston_pricingengines::{AnalyticHestonEngine, AnalyticHestonGreeks};
use std::hint::black_box;

fn atm() -> ModelParameters {
    ModelParameters::new(100.0, 100.0, 1.0, 0.04, 0.05, 0.04, 2.0, 0.3, -0.7)
        .expect("benchmark parameters should be valid")
}

fn bench_european_call(c: &mut Criterion) {
    let params = atm();
    let engine = AnalyticHestonEngine::new();

    c.bench_function("heston_european_call", |b| {
        b.iter(|| {
            let px = engine
                .european_call(black_box(&params))
                .expect("pricing should succeed");
            black_box(px)
        })
    });
}

fn bench_call_by_accuracy(c: &mut Criterion) {
    let params = atm();
    let mut group = c.benchmark_group("heston_call_accuracy");
    for accuracy in [1e-6, 1e-8, 1e-10] {
        let engine = AnalyticHestonEngine::with_accuracy(accuracy, 100_000);
        group.bench_with_input(BenchmarkId::from_parameter(accuracy), &accuracy, |b, _| {
            b.iter(|| {
                black_box(
                    engine
                        .european_call(black_box(&params))
                        .expect("pricing should succeed"),
                )
            })
        });
    }
    group.finish();
}

fn bench_greek_bundle(c: &mut Criterion) {
    let params = atm();
    let greeks = AnalyticHestonGreeks::new();

    c.bench_function("heston_greeks_bundle", |b| {
        b.iter(|| {
            let g = greeks
                .greeks(OptionType::Call, black_box(&params))
                .expect("greeks should succeed");
            black_box(g)
        })
    });
}

criterion_group!(benches, bench_european_call, bench_call_by_accuracy, bench_greek_bundle);
criterion_main!(benches);
