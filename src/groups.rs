// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pure function: target set → groups keyed by tag tuple.

use std::collections::HashMap;

use serde::Serialize;

use crate::state::TargetSnapshot;

/// Separator used to join tag values into a composite key. Must not appear
/// in tag values; callers are responsible for that invariant.
pub const KEY_SEPARATOR: char = '|';

/// A group of targets sharing the same values across `group_by` dimensions,
/// indexed within the group by the `variant` tag.
#[derive(Debug, Clone, Serialize)]
pub struct Group {
    pub key: String,
    pub values: HashMap<String, String>,
    pub targets: HashMap<String, TargetSnapshot>,
}

/// Compose a composite key from `group_by` dimensions, substituting
/// `"unknown"` for any tag missing from `values`.
pub fn format_composite_key(group_by: &[String], values: &HashMap<String, String>) -> String {
    group_by
        .iter()
        .map(|dim| values.get(dim).map(String::as_str).unwrap_or("unknown"))
        .collect::<Vec<_>>()
        .join(&KEY_SEPARATOR.to_string())
}

/// Split a composite key back into its per-dimension values, in order.
///
/// Inverse of [`format_composite_key`] for any tuple of values that does not
/// itself contain the separator character.
pub fn parse_composite_key(group_by: &[String], key: &str) -> HashMap<String, String> {
    key.split(KEY_SEPARATOR)
        .zip(group_by.iter())
        .map(|(value, dim)| (dim.clone(), value.to_owned()))
        .collect()
}

/// Aggregate a snapshot of targets into groups keyed by `group_by`
/// dimensions. Result order is unspecified but each call over the same
/// input set is deterministic (stable iteration over a sorted key set).
pub fn aggregate(targets: &[TargetSnapshot], group_by: &[String]) -> Vec<Group> {
    let mut buckets: HashMap<String, (HashMap<String, String>, HashMap<String, TargetSnapshot>)> =
        HashMap::new();

    for target in targets {
        let values: HashMap<String, String> = group_by
            .iter()
            .map(|dim| (dim.clone(), target.config.tag_or_unknown(dim).to_owned()))
            .collect();
        let key = format_composite_key(group_by, &values);
        let variant = target.config.variant().to_owned();

        let bucket = buckets.entry(key).or_insert_with(|| (values, HashMap::new()));
        bucket.1.insert(variant, target.clone());
    }

    let mut groups: Vec<Group> = buckets
        .into_iter()
        .map(|(key, (values, targets))| Group { key, values, targets })
        .collect();
    groups.sort_by(|a, b| a.key.cmp(&b.key));
    groups
}

#[cfg(test)]
#[path = "groups_tests.rs"]
mod tests;
