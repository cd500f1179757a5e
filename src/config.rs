// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-level settings (clap/env) and the target/variable-rule document
//! they point at.

use std::collections::HashSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::groups::format_composite_key;
use crate::model::{TargetConfig, VariableRule};

/// Process-level settings, sourced from CLI flags or environment variables.
#[derive(Debug, Clone, clap::Parser)]
#[command(name = "opsnotebook-core", about = "Multi-target connection broker")]
pub struct Settings {
    /// Path to the target/variable configuration document.
    #[arg(long, default_value = "config.json", env = "CONFIG_PATH")]
    pub config_path: PathBuf,

    /// Glob pattern used to filter targets by composite group key.
    /// Matches every target when unset, empty, or the literal `*`.
    #[arg(long, env = "TARGET_PATTERN")]
    pub target_pattern: Option<String>,

    /// Directory of static assets served alongside the Control API, if any.
    #[arg(long, env = "STATIC_DIR")]
    pub static_dir: Option<PathBuf>,

    /// Host to bind on.
    #[arg(long, default_value = "127.0.0.1", env = "OPSNOTEBOOK_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 8900, env = "OPSNOTEBOOK_PORT")]
    pub port: u16,
}

/// Default grouping dimensions when the document omits `group_by`.
fn default_group_by() -> Vec<String> {
    vec!["environment".to_owned(), "region".to_owned(), "name".to_owned()]
}

/// The on-disk configuration document: targets, grouping dimensions, and
/// derived-variable rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    #[serde(default = "default_group_by")]
    pub group_by: Vec<String>,
    pub targets: Vec<TargetConfig>,
    #[serde(default)]
    pub variables: Vec<VariableRule>,
}

impl Document {
    /// Parse and validate a document from its raw JSON text, then apply the
    /// optional glob filter over each target's composite group key. An empty
    /// pattern or the literal `*` loads everything.
    pub fn load(raw: &str, pattern: Option<&str>) -> Result<Self, ConfigError> {
        let mut document: Document =
            serde_json::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;

        document.validate_ids()?;

        if let Some(pattern) = pattern {
            if !pattern.is_empty() && pattern != "*" {
                let matcher = glob::Pattern::new(pattern)
                    .map_err(|e| ConfigError::Parse(format!("invalid target pattern: {e}")))?;
                let group_by = document.group_by.clone();
                document.targets.retain(|target| {
                    let values: std::collections::HashMap<String, String> = group_by
                        .iter()
                        .map(|dim| (dim.clone(), target.tag_or_unknown(dim).to_owned()))
                        .collect();
                    matcher.matches(&format_composite_key(&group_by, &values))
                });

                if document.targets.is_empty() {
                    return Err(ConfigError::NoTargetsMatched);
                }
            }
        }

        Ok(document)
    }

    fn validate_ids(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for target in &self.targets {
            if target.id.trim().is_empty() {
                return Err(ConfigError::EmptyTargetId);
            }
            if target.driver_cmd.trim().is_empty() {
                return Err(ConfigError::EmptyDriverCmd(target.id.clone()));
            }
            if !seen.insert(target.id.clone()) {
                return Err(ConfigError::DuplicateTargetId(target.id.clone()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
