//! Benchmarks for candidate fitting and the stepwise order search.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use salescast::core::{Month, MonthlySeries};
use salescast::models::{FitConfig, FittedSarima, OrderSearch, SarimaSpec, SearchConfig};

fn monthly_series(n: usize) -> MonthlySeries {
    let mut months = vec![Month::new(2010, 1).unwrap()];
    while months.len() < n {
        months.push(months.last().unwrap().succ());
    }
    let values: Vec<f64> = (0..n)
        .map(|i| {
            40_000.0
                + 500.0 * i as f64
                + 5_000.0 * (2.0 * std::f64::consts::PI * i as f64 / 12.0).sin()
                + ((i * 17 + 13) % 97) as f64 * 10.0
        })
        .collect();
    MonthlySeries::from_parts(months, values).unwrap()
}

fn bench_single_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("sarima_fit");
    let config = FitConfig::default();

    for size in [48, 96, 192].iter() {
        let series = monthly_series(*size);
        group.bench_with_input(BenchmarkId::new("arima_210", size), size, |b, _| {
            b.iter(|| {
                FittedSarima::fit(black_box(&series), SarimaSpec::new(2, 1, 0), &config).unwrap()
            })
        });
    }
    group.finish();
}

fn bench_order_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("order_search");
    group.sample_size(10);

    let series = monthly_series(96);

    group.bench_function("nonseasonal", |b| {
        let search = OrderSearch::new(SearchConfig::default());
        b.iter(|| search.search(black_box(&series)).unwrap())
    });

    group.bench_function("seasonal_12", |b| {
        let search = OrderSearch::new(SearchConfig::default().with_seasonal_period(12));
        b.iter(|| search.search(black_box(&series)).unwrap())
    });

    group.finish();
}

criterion_group!(benches, bench_single_fit, bench_order_search);
criterion_main!(benches);
