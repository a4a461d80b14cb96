// /////////////////////////////////////////////////////////////////////////////
// Mimir Pipeline Platform
// Licensed under the BSD-3-Clause license.
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Pipeline Document
//!
//! The declarative YAML shape an operator authors:
//!
//! ```yaml
//! name: my-pipeline
//! steps:
//!   - name: read
//!     plugin: Input.csv
//!     config: { path: "./in.csv" }
//!     output: rows
//! ```
//!
//! Unknown top-level keys are preserved (via `serde_yaml`'s default
//! behavior of ignoring them during struct deserialization) but otherwise
//! have no effect — the parser does not round-trip the document.

use std::collections::HashMap;

use mimir_domain::{MimirError, MimirResult, StepConfig};
use serde::Deserialize;
use serde_json::Value as Json;

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineDocument {
    pub name: String,
    pub steps: Vec<RawStep>,
}

/// A step as it appears in YAML, before `plugin_ref` validation.
#[derive(Debug, Clone, Deserialize)]
pub struct RawStep {
    pub name: String,
    pub plugin: String,
    #[serde(default)]
    pub config: HashMap<String, Json>,
    #[serde(default)]
    pub output: Option<String>,
}

impl From<RawStep> for StepConfig {
    fn from(raw: RawStep) -> Self {
        StepConfig { name: raw.name, plugin_ref: raw.plugin, config: raw.config, output_key: raw.output }
    }
}

impl PipelineDocument {
    pub fn parse_yaml(yaml: &str) -> MimirResult<Self> {
        serde_yaml::from_str(yaml).map_err(|e| MimirError::config_invalid(format!("invalid pipeline document: {e}")))
    }

    pub fn steps(&self) -> Vec<StepConfig> {
        self.steps.iter().cloned().map(StepConfig::from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_pipeline() {
        let yaml = r#"
name: demo
steps:
  - name: read
    plugin: Input.csv
    config:
      path: "./fixture.csv"
    output: rows
  - name: save
    plugin: Output.json
    config:
      input: rows
"#;
        let doc = PipelineDocument::parse_yaml(yaml).unwrap();
        assert_eq!(doc.name, "demo");
        let steps = doc.steps();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].plugin_ref, "Input.csv");
        assert_eq!(steps[0].output_key.as_deref(), Some("rows"));
        assert_eq!(steps[1].resolved_output_key(), "save_output");
    }

    #[test]
    fn rejects_malformed_yaml() {
        assert!(PipelineDocument::parse_yaml("not: [valid").is_err());
    }
}
