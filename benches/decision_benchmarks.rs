//! Decision benchmarks for vane

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use serde_json::json;
use std::hint::black_box;
use std::sync::Arc;

use vane::prelude::*;
use vane::vane_decision::generate_bucket_value;

fn datafile(rules: usize) -> ProjectConfig {
    let mut rollout_rules: Vec<_> = (0..rules)
        .map(|i| {
            json!({
                "id": format!("rule_{i}"), "key": format!("segment_{i}"), "status": "Running",
                "audienceConditions": ["or", "segment"],
                "variations": [{"id": format!("v_{i}"), "key": format!("on_{i}"), "featureEnabled": true}],
                "trafficAllocation": [{"entityId": format!("v_{i}"), "endOfRange": 10000}]
            })
        })
        .collect();
    rollout_rules.push(json!({
        "id": "rule_all", "key": "everyone", "status": "Running",
        "variations": [{"id": "v_all", "key": "off", "featureEnabled": false}],
        "trafficAllocation": [{"entityId": "v_all", "endOfRange": 10000}]
    }));

    ProjectConfig::from_value(json!({
        "version": "4",
        "experiments": [{
            "id": "exp", "key": "checkout_test", "status": "Running",
            "audienceConditions": ["and", "mobile", ["not", "segment"]],
            "variations": [
                {"id": "a", "key": "control", "featureEnabled": false},
                {"id": "b", "key": "treatment", "featureEnabled": true}
            ],
            "trafficAllocation": [
                {"entityId": "a", "endOfRange": 5000},
                {"entityId": "b", "endOfRange": 10000}
            ]
        }],
        "rollouts": [{"id": "ro", "experiments": rollout_rules}],
        "featureFlags": [{
            "id": "f", "key": "checkout", "experimentIds": ["exp"], "rolloutId": "ro",
            "variables": [{"id": "var", "key": "discount", "type": "integer", "defaultValue": "0"}]
        }],
        "typedAudiences": [
            {"id": "mobile", "name": "Mobile",
             "conditions": ["and", {"name": "platform", "type": "custom_attribute", "match": "exact", "value": "ios"},
                                   {"name": "app_version", "type": "custom_attribute", "match": "semver_ge", "value": "4.2"}]},
            {"id": "segment", "name": "Segment",
             "conditions": ["or", {"name": "tier", "type": "custom_attribute", "match": "exact", "value": "gold"}]}
        ]
    }))
    .unwrap()
}

fn attributes(platform: &str) -> UserAttributes {
    UserAttributes::from([
        ("platform".to_string(), AttributeValue::from(platform)),
        ("app_version".to_string(), AttributeValue::from("4.3.1")),
    ])
}

fn bucketing_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("bucketing");
    group.throughput(Throughput::Elements(1));

    group.bench_function("generate_bucket_value", |b| {
        b.iter(|| black_box(generate_bucket_value(black_box("user-123456exp"))));
    });

    group.finish();
}

fn decide_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("decide");
    group.throughput(Throughput::Elements(1));

    let engine = DecisionEngine::new(datafile(3));

    let experiment_user = engine.create_user_context("user-1", attributes("ios"));
    group.bench_function("experiment", |b| {
        b.iter(|| black_box(experiment_user.decide(black_box("checkout"), &[])));
    });

    let rollout_user = engine.create_user_context("user-2", attributes("android"));
    group.bench_function("rollout_catch_all", |b| {
        b.iter(|| black_box(rollout_user.decide(black_box("checkout"), &[])));
    });

    group.bench_function("with_reasons", |b| {
        b.iter(|| {
            black_box(rollout_user.decide(black_box("checkout"), &[DecideOption::IncludeReasons]))
        });
    });

    group.finish();
}

fn rollout_depth_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("rollout_depth");

    for rules in [1, 10, 50] {
        let engine = DecisionEngine::new(datafile(rules));
        let user = engine.create_user_context("user-3", attributes("android"));

        group.bench_with_input(BenchmarkId::new("rules", rules), &rules, |b, _| {
            b.iter(|| black_box(user.decide(black_box("checkout"), &[])));
        });
    }

    group.finish();
}

fn sticky_store_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("sticky_store");
    group.throughput(Throughput::Elements(1));

    let engine = DecisionEngine::builder()
        .config(datafile(3))
        .sticky_store(Arc::new(InMemoryStickyStore::new()))
        .build();
    let user = engine.create_user_context("user-4", attributes("ios"));
    user.decide("checkout", &[]);

    group.bench_function("recall", |b| {
        b.iter(|| black_box(user.decide(black_box("checkout"), &[])));
    });

    let mut counter = 0u64;
    group.bench_function("fresh_user", |b| {
        b.iter(|| {
            counter += 1;
            let user = engine.create_user_context(format!("fresh-{counter}"), attributes("ios"));
            black_box(user.decide("checkout", &[]))
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bucketing_benchmark,
    decide_benchmark,
    rollout_depth_benchmark,
    sticky_store_benchmark,
);

criterion_main!(benches);
