use encoded_upgrade::services::upgrades::samtools_stats_quality_metric::{
    CURRENT_VERSION, ITEM_TYPE,
};
use encoded_upgrade::{default_registry, ErrorPolicy, Item, UpgradeConfig, UpgradeError};
use serde_json::{json, Value};
use std::collections::HashSet;

fn string_set(value: &Value) -> HashSet<&str> {
    value
        .as_array()
        .expect("field should be an array")
        .iter()
        .map(|v| v.as_str().expect("element should be a string"))
        .collect()
}

fn quality_metric(properties: Value) -> Item {
    Item::new(ITEM_TYPE, properties)
}

#[test]
fn test_upgrades_v1_item_to_current_version() {
    let registry = default_registry(UpgradeConfig::default());

    let mut item = quality_metric(json!({
        "schema_version": "1",
        "aliases": ["encode:sqm-1", "encode:sqm-2", "encode:sqm-1"],
        "quality_metric_of": ["/files/ENCFF100AAA/", "/files/ENCFF100AAA/"],
        "step_run": "/analysis-step-runs/0a1b/",
        "average length": 100
    }))
    .with_uuid("6f3b1e4c-1111-4222-8333-944455556666");

    let outcome = registry.upgrade_item(&mut item).unwrap();

    assert_eq!(outcome.from.as_str(), "1");
    assert_eq!(outcome.to.as_str(), CURRENT_VERSION);
    assert_eq!(item.properties["schema_version"], CURRENT_VERSION);
    assert_eq!(
        string_set(&item.properties["aliases"]),
        HashSet::from(["encode:sqm-1", "encode:sqm-2"])
    );
    assert_eq!(item.properties["aliases"].as_array().unwrap().len(), 2);
    assert_eq!(item.properties["quality_metric_of"], json!(["/files/ENCFF100AAA/"]));
    assert_eq!(item.properties["step_run"], "/analysis-step-runs/0a1b/");
    assert_eq!(item.properties["average length"], 100);
}

#[test]
fn test_item_without_version_is_treated_as_v1() {
    let registry = default_registry(UpgradeConfig::default());

    let mut item = quality_metric(json!({"quality_metric_of": ["y", "y", "y"]}));
    registry.upgrade_item(&mut item).unwrap();

    assert_eq!(
        item.properties,
        json!({"schema_version": "2", "quality_metric_of": ["y"]})
    );
}

#[test]
fn test_current_item_is_left_alone() {
    let registry = default_registry(UpgradeConfig::default());

    // Already at v2: duplicates here are not this upgrade's concern
    let properties = json!({"schema_version": "2", "aliases": ["a", "a"]});
    let mut item = quality_metric(properties.clone());
    let outcome = registry.upgrade_item(&mut item).unwrap();

    assert!(outcome.is_noop());
    assert_eq!(item.properties, properties);
}

#[test]
fn test_malformed_aliases_fail_with_context() {
    let registry = default_registry(UpgradeConfig::default());

    let mut item = quality_metric(json!({"schema_version": "1", "aliases": {"a": 1}}));
    let err = registry.upgrade_item(&mut item).unwrap_err();

    assert!(err.to_string().contains(ITEM_TYPE));
    assert!(matches!(
        err.root_cause(),
        UpgradeError::InvalidField { field, .. } if field == "aliases"
    ));
}

#[test]
fn test_batch_skip_reports_bad_items_and_upgrades_rest() {
    let registry = default_registry(UpgradeConfig {
        on_error: ErrorPolicy::Skip,
        ..UpgradeConfig::default()
    });

    let mut items = vec![
        quality_metric(json!({"schema_version": "1", "aliases": ["a", "a"]})),
        quality_metric(json!({"schema_version": "1", "quality_metric_of": "ENCFF1"}))
            .with_uuid("bad-item"),
        quality_metric(json!({"schema_version": "2"})),
        quality_metric(json!({"schema_version": "1", "quality_metric_of": ["b", "c", "b"]})),
    ];
    let report = registry.upgrade_batch(&mut items);

    assert_eq!(report.upgraded, 2);
    assert_eq!(report.unchanged, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].label, "bad-item");
    assert!(!report.aborted);

    assert_eq!(items[0].properties["aliases"], json!(["a"]));
    assert_eq!(items[1].properties["schema_version"], "1");
    assert_eq!(items[3].properties["quality_metric_of"], json!(["b", "c"]));
}

#[test]
fn test_batch_report_serializes() {
    let registry = default_registry(UpgradeConfig::default());

    let mut items = vec![quality_metric(json!({"schema_version": "1"}))];
    let report = registry.upgrade_batch(&mut items);
    let value = serde_json::to_value(&report).unwrap();

    assert_eq!(value["upgraded"], 1);
    assert_eq!(value["failures"], json!([]));
    assert!(value["started_at"].is_string());
}
