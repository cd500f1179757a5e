// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn sample(ids: &[&str]) -> String {
    let targets: Vec<String> = ids
        .iter()
        .map(|id| format!(r#"{{"id":"{id}","driver_cmd":"true","tags":{{"environment":"{id}"}}}}"#))
        .collect();
    format!(r#"{{"group_by":["environment"],"targets":[{}],"variables":[]}}"#, targets.join(","))
}

#[test]
fn loads_well_formed_document() {
    let document = Document::load(&sample(&["db-1", "db-2"]), None).unwrap();
    assert_eq!(document.targets.len(), 2);
    assert_eq!(document.group_by, vec!["environment".to_owned()]);
}

#[test]
fn missing_group_by_defaults_to_environment_region_name() {
    let raw = r#"{"targets":[{"id":"t1","driver_cmd":"true"}]}"#;
    let document = Document::load(raw, None).unwrap();
    assert_eq!(document.group_by, vec!["environment", "region", "name"]);
}

#[test]
fn rejects_duplicate_target_ids() {
    let err = Document::load(&sample(&["db-1", "db-1"]), None).unwrap_err();
    assert!(matches!(err, ConfigError::DuplicateTargetId(id) if id == "db-1"));
}

#[test]
fn rejects_empty_target_id() {
    let err = Document::load(&sample(&[""]), None).unwrap_err();
    assert!(matches!(err, ConfigError::EmptyTargetId));
}

#[test]
fn rejects_empty_driver_cmd() {
    let raw = r#"{"targets":[{"id":"t1","driver_cmd":""}]}"#;
    let err = Document::load(raw, None).unwrap_err();
    assert!(matches!(err, ConfigError::EmptyDriverCmd(id) if id == "t1"));
}

#[test]
fn rejects_malformed_json() {
    let err = Document::load("not json", None).unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn glob_pattern_filters_targets_by_composite_group_key() {
    let document = Document::load(&sample(&["db-1", "cache-1"]), Some("db-*")).unwrap();
    assert_eq!(document.targets.len(), 1);
    assert_eq!(document.targets[0].id, "db-1");
}

#[test]
fn empty_pattern_loads_everything() {
    let document = Document::load(&sample(&["db-1", "cache-1"]), Some("")).unwrap();
    assert_eq!(document.targets.len(), 2);
}

#[test]
fn star_pattern_loads_everything() {
    let document = Document::load(&sample(&["db-1", "cache-1"]), Some("*")).unwrap();
    assert_eq!(document.targets.len(), 2);
}

#[test]
fn missing_tag_falls_back_to_unknown_for_glob_matching() {
    let raw = r#"{"group_by":["environment"],"targets":[{"id":"solo","driver_cmd":"true"}]}"#;
    let document = Document::load(raw, Some("unknown")).unwrap();
    assert_eq!(document.targets.len(), 1);
}

#[test]
fn empty_match_set_after_filtering_is_an_error() {
    let err = Document::load(&sample(&["db-1"]), Some("cache-*")).unwrap_err();
    assert!(matches!(err, ConfigError::NoTargetsMatched));
}

#[test]
fn zero_configured_targets_loads_fine_without_a_pattern() {
    let raw = r#"{"targets":[]}"#;
    let document = Document::load(raw, None).unwrap();
    assert!(document.targets.is_empty());
}
