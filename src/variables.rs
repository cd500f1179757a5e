// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pure rule engine: target tags → derived variables.

use std::collections::HashMap;

use crate::model::{TargetConfig, VariableRule};

/// Resolve a target's variables against an ordered rule set.
///
/// Seeds the result with the target's own `variables`, then applies each
/// rule in order: if every key in `rule.when` equals the target's tag of
/// the same key, `rule.then` is merged in (later matching rules overwrite
/// earlier ones). Pure — no I/O, no mutation of either argument.
pub fn resolve(
    target: &TargetConfig,
    rules: &[VariableRule],
) -> HashMap<String, serde_json::Value> {
    let mut result = target.variables.clone();

    for rule in rules {
        if rule_matches(target, rule) {
            for (key, value) in &rule.then {
                result.insert(key.clone(), value.clone());
            }
        }
    }

    result
}

fn rule_matches(target: &TargetConfig, rule: &VariableRule) -> bool {
    rule.when.iter().all(|(key, value)| target.tags.get(key) == Some(value))
}

#[cfg(test)]
#[path = "variables_tests.rs"]
mod tests;
