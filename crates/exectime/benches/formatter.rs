//! Benchmark building log properties for the built-in formatter.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use exectime::formatter::build_properties;
use exectime::{QueryLog, Verbosity};
use serde_json::{Value, json};

fn pipeline(stages: usize) -> Vec<Value> {
    (0..stages)
        .map(|i| json!({"$match": {"field": i, "nested": {"in": [1, 2, 3]}}}))
        .collect()
}

fn bench_build_properties(c: &mut Criterion) {
    let filter = json!({"status": "active", "age": {"$gte": 18}});
    let update = json!({"$set": {"lastSeen": "2026-01-01T00:00:00Z"}});
    let extra = json!({"requestId": "r-42"});
    let stack = "Trace\n   0: app::handler\n   1: app::main";

    let mut group = c.benchmark_group("build_properties");
    for verbosity in [Verbosity::Normal, Verbosity::High] {
        group.bench_with_input(
            BenchmarkId::new("find", format!("{verbosity:?}")),
            &verbosity,
            |b, &verbosity| {
                let log = QueryLog {
                    operation: "find",
                    collection_name: "users",
                    execution_time_ms: 3,
                    filter: Some(&filter),
                    update: Some(&update),
                    additional_log_properties: Some(&extra),
                    aggregation_pipeline: None,
                    query_stack: Some(stack),
                };
                b.iter(|| build_properties(black_box(verbosity), black_box(&log)))
            },
        );
    }

    for stages in [1, 10, 50] {
        let stages_vec = pipeline(stages);
        group.bench_with_input(
            BenchmarkId::new("aggregate", stages),
            &stages_vec,
            |b, stages_vec| {
                let log = QueryLog {
                    operation: "aggregate",
                    collection_name: "orders",
                    execution_time_ms: 9,
                    filter: None,
                    update: None,
                    additional_log_properties: None,
                    aggregation_pipeline: Some(stages_vec.as_slice()),
                    query_stack: None,
                };
                b.iter(|| build_properties(Verbosity::High, black_box(&log)))
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_build_properties);
criterion_main!(benches);
