// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::model::TargetConfig;
use crate::state::Status;

fn target(id: &str, tags: &[(&str, &str)]) -> TargetSnapshot {
    TargetSnapshot {
        config: TargetConfig {
            id: id.to_owned(),
            name: id.to_owned(),
            driver_cmd: "true".into(),
            tags: tags.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            labels: HashMap::new(),
            variables: HashMap::new(),
            visual: serde_json::Value::Null,
        },
        status: Status::Disconnected,
        connection: crate::model::ConnectionInfo::default(),
        error: None,
        last_checked: None,
    }
}

fn group_by() -> Vec<String> {
    vec!["environment".into(), "region".into(), "name".into()]
}

#[test]
fn primary_and_replica_land_in_the_same_group() {
    let primary = target(
        "db-1",
        &[("env", "prod"), ("environment", "prod"), ("region", "us"), ("name", "db"), ("variant", "primary")],
    );
    let replica = target(
        "db-2",
        &[("environment", "prod"), ("region", "us"), ("name", "db"), ("variant", "replica")],
    );

    let groups = aggregate(&[primary, replica], &group_by());
    assert_eq!(groups.len(), 1);
    let group = &groups[0];
    assert_eq!(group.key, "prod|us|db");
    assert_eq!(group.values.get("environment"), Some(&"prod".to_owned()));
    assert_eq!(group.values.get("region"), Some(&"us".to_owned()));
    assert_eq!(group.values.get("name"), Some(&"db".to_owned()));
    assert!(group.targets.contains_key("primary"));
    assert!(group.targets.contains_key("replica"));
}

#[test]
fn missing_tag_dimension_becomes_unknown() {
    let lonely = target("solo", &[("name", "cache")]);
    let groups = aggregate(&[lonely], &group_by());
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].key, "unknown|unknown|cache");
}

#[test]
fn target_without_variant_tag_defaults_to_default_slot() {
    let t = target("x", &[("environment", "prod"), ("region", "us"), ("name", "svc")]);
    let groups = aggregate(&[t], &group_by());
    assert!(groups[0].targets.contains_key("default"));
}

#[test]
fn distinct_group_keys_produce_distinct_groups() {
    let a = target("a", &[("environment", "prod"), ("region", "us"), ("name", "db")]);
    let b = target("b", &[("environment", "staging"), ("region", "us"), ("name", "db")]);
    let groups = aggregate(&[a, b], &group_by());
    assert_eq!(groups.len(), 2);
}

#[test]
fn format_composite_key_joins_in_dimension_order() {
    let mut values = HashMap::new();
    values.insert("environment".to_owned(), "prod".to_owned());
    values.insert("region".to_owned(), "us".to_owned());
    values.insert("name".to_owned(), "db".to_owned());
    assert_eq!(format_composite_key(&group_by(), &values), "prod|us|db");
}

#[test]
fn format_then_parse_composite_key_round_trips() {
    let mut values = HashMap::new();
    values.insert("environment".to_owned(), "prod".to_owned());
    values.insert("region".to_owned(), "us".to_owned());
    values.insert("name".to_owned(), "db".to_owned());

    let key = format_composite_key(&group_by(), &values);
    let parsed = parse_composite_key(&group_by(), &key);
    assert_eq!(parsed, values);
}

#[test]
fn aggregate_partitions_every_input_target_exactly_once() {
    let targets = vec![
        target("a", &[("environment", "prod"), ("region", "us"), ("name", "db"), ("variant", "primary")]),
        target("b", &[("environment", "prod"), ("region", "us"), ("name", "db"), ("variant", "replica")]),
        target("c", &[("environment", "staging"), ("region", "eu"), ("name", "cache")]),
    ];
    let groups = aggregate(&targets, &group_by());
    let total: usize = groups.iter().map(|g| g.targets.len()).sum();
    assert_eq!(total, targets.len());
}

#[test]
fn result_order_is_deterministic_across_repeated_calls() {
    let targets = vec![
        target("a", &[("environment", "prod"), ("region", "us"), ("name", "db")]),
        target("b", &[("environment", "staging"), ("region", "eu"), ("name", "cache")]),
    ];
    let first: Vec<String> = aggregate(&targets, &group_by()).into_iter().map(|g| g.key).collect();
    let second: Vec<String> = aggregate(&targets, &group_by()).into_iter().map(|g| g.key).collect();
    assert_eq!(first, second);
}
