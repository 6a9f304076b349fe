//! Performance benchmarks for item upgrades
//!
//! Run with: `cargo bench -p encoded-upgrade`
//!
//! - Set-field deduplication on large alias lists
//! - Full registry upgrade of a batch of v1 quality metrics

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use encoded_upgrade::services::upgrades::samtools_stats_quality_metric::ITEM_TYPE;
use encoded_upgrade::utils::dedupe_field;
use encoded_upgrade::{default_registry, Item, Record, UpgradeConfig};
use serde_json::json;

/// Record with `count` aliases drawn from `distinct` values
fn record_with_aliases(count: usize, distinct: usize) -> Record {
    let aliases: Vec<String> = (0..count)
        .map(|i| format!("encode:alias-{}", i % distinct))
        .collect();
    json!({"schema_version": "1", "aliases": aliases})
        .as_object()
        .cloned()
        .unwrap()
}

fn bench_dedupe_field(c: &mut Criterion) {
    let record = record_with_aliases(10_000, 500);

    c.bench_function("dedupe_field_10k_aliases", |b| {
        b.iter(|| {
            let mut rec = record.clone();
            dedupe_field(black_box(&mut rec), "aliases").unwrap();
            rec
        })
    });
}

fn bench_upgrade_batch(c: &mut Criterion) {
    let registry = default_registry(UpgradeConfig::default());
    let items: Vec<Item> = (0..1_000)
        .map(|_| Item::new(ITEM_TYPE, serde_json::Value::Object(record_with_aliases(20, 5))))
        .collect();

    c.bench_function("upgrade_batch_1000_items", |b| {
        b.iter(|| {
            let mut batch = items.clone();
            let report = registry.upgrade_batch(black_box(&mut batch));
            assert!(report.is_success());
        })
    });
}

criterion_group!(benches, bench_dedupe_field, bench_upgrade_batch);
criterion_main!(benches);
