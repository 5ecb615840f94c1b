//! Criterion benchmarks for the analytics hot paths: model training, batch
//! churn scoring and the budget parser.

use std::hint::black_box;

use chrono::Utc;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};

use sprintboard::config::AnalyticsConfig;
use sprintboard::lifecycle::{ModelSet, churn_risk_customers};
use sprintboard::model::Customer;
use sprintboard::seed::seed_demo;
use sprintboard::sprint::parse_budget;
use sprintboard::storage::Database;

/// Demo customers repeated `copies` times with distinct ids and emails.
fn customers(copies: usize) -> Vec<Customer> {
    let db = Database::open_in_memory().unwrap();
    seed_demo(&db, 42, Utc::now()).unwrap();
    let base = db.all_customers().unwrap();
    (0..copies)
        .flat_map(|copy| {
            base.iter().map(move |c| Customer {
                id: c.id + (copy * 10_000) as i64,
                email: format!("{copy}-{}", c.email),
                ..c.clone()
            })
        })
        .collect()
}

fn training_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("train_all");
    let config = AnalyticsConfig::default();

    for copies in [1, 4, 16] {
        let rows = customers(copies);
        group.throughput(Throughput::Elements(rows.len() as u64));
        group.bench_with_input(BenchmarkId::new("rows", rows.len()), &rows, |b, rows| {
            b.iter(|| {
                let mut models = ModelSet::new(&config);
                models.train_all(black_box(rows), &config)
            })
        });
    }

    group.finish();
}

fn churn_scoring_benchmarks(c: &mut Criterion) {
    let config = AnalyticsConfig::default();
    let db = Database::open_in_memory().unwrap();
    let now = Utc::now();
    for customer in customers(8) {
        db.insert_customer(&customer, now).unwrap();
    }
    let mut models = ModelSet::new(&config);
    models.train_all(&db.all_customers().unwrap(), &config);

    c.bench_function("churn_risk_customers", |b| {
        b.iter(|| churn_risk_customers(&db, &models, black_box(0.5)).unwrap())
    });
}

fn budget_parser_benchmarks(c: &mut Criterion) {
    let inputs = ["$50,000", "50k-100k", "1.2M", "around 250 thousand", "TBD"];
    c.bench_function("parse_budget", |b| {
        b.iter(|| {
            inputs
                .iter()
                .map(|s| parse_budget(black_box(s)))
                .sum::<f64>()
        })
    });
}

criterion_group!(
    benches,
    training_benchmarks,
    churn_scoring_benchmarks,
    budget_parser_benchmarks,
);

criterion_main!(benches);
