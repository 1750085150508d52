//! Benchmark logistic regression fitting with k-fold cross-validation
//!
//! Run with: cargo bench --bench fit_benchmark

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use polars::prelude::*;
use rand::prelude::*;
use rand::SeedableRng;

use glmstep::pipeline::{drop_and_refit, fit, FitConfig, ValidationConfig};

/// Generate a noisy logistic problem: the target depends on the first half
/// of the features, the rest are noise.
fn generate_test_dataframe(n_rows: usize, n_features: usize, seed: u64) -> (DataFrame, Vec<String>) {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);

    let names: Vec<String> = (0..n_features).map(|i| format!("feature_{}", i)).collect();
    let features: Vec<Vec<f64>> = (0..n_features)
        .map(|_| (0..n_rows).map(|_| rng.gen::<f64>() * 2.0 - 1.0).collect())
        .collect();

    let target: Vec<i32> = (0..n_rows)
        .map(|row| {
            let eta: f64 = features
                .iter()
                .take(n_features.div_ceil(2))
                .map(|f| 1.5 * f[row])
                .sum();
            let p = 1.0 / (1.0 + (-eta).exp());
            i32::from(rng.gen::<f64>() < p)
        })
        .collect();

    let mut columns: Vec<Column> = names
        .iter()
        .zip(features)
        .map(|(name, values)| Column::new(name.as_str().into(), values))
        .collect();
    columns.push(Column::new("target".into(), target));

    (
        DataFrame::new(columns).expect("Failed to create DataFrame"),
        names,
    )
}

/// Fit time for varying predictor counts
fn benchmark_fit_by_predictors(c: &mut Criterion) {
    let mut group = c.benchmark_group("fit_by_predictors");
    group.sample_size(20);

    let n_rows = 5_000;
    let config = FitConfig::default();

    for n_features in [2, 4, 8, 16] {
        let (df, predictors) = generate_test_dataframe(n_rows, n_features, 42);
        group.throughput(Throughput::Elements(n_rows as u64));

        group.bench_with_input(
            BenchmarkId::new("ten_fold", n_features),
            &(&df, &predictors),
            |b, (df, predictors)| {
                b.iter(|| {
                    let _ = fit(black_box(*df), black_box(*predictors), "target", &config);
                });
            },
        );
    }

    group.finish();
}

/// Fit time for varying fold counts on a fixed problem
fn benchmark_fit_by_folds(c: &mut Criterion) {
    let mut group = c.benchmark_group("fit_by_folds");
    group.sample_size(20);

    let (df, predictors) = generate_test_dataframe(5_000, 6, 7);

    for folds in [2, 5, 10, 20] {
        let config = FitConfig {
            validation: ValidationConfig::new(folds),
            ..Default::default()
        };
        group.bench_with_input(BenchmarkId::new("folds", folds), &config, |b, config| {
            b.iter(|| {
                let _ = fit(black_box(&df), black_box(&predictors), "target", config);
            });
        });
    }

    group.finish();
}

/// One elimination step: drop a noise predictor and refit
fn benchmark_drop_and_refit(c: &mut Criterion) {
    let (df, predictors) = generate_test_dataframe(5_000, 8, 11);
    let config = FitConfig::default();
    let model = fit(&df, &predictors, "target", &config)
        .expect("Failed to fit benchmark model")
        .model;
    let to_drop = vec![predictors[predictors.len() - 1].clone()];

    c.bench_function("drop_and_refit", |b| {
        b.iter(|| {
            let _ = drop_and_refit(black_box(&model), black_box(&df), &to_drop, &config);
        });
    });
}

criterion_group!(
    benches,
    benchmark_fit_by_predictors,
    benchmark_fit_by_folds,
    benchmark_drop_and_refit
);
criterion_main!(benches);
