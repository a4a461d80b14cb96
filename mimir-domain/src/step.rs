// /////////////////////////////////////////////////////////////////////////////
// Mimir Pipeline Platform
// Licensed under the BSD-3-Clause license.
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Step, Task, and Result Shapes
//!
//! The declarative shapes that travel from an operator-authored pipeline
//! document, through the task queue, into a worker, and back out as a
//! result: [`StepConfig`] (one step in a pipeline), [`Task`] (one unit of
//! work published to the broker), and [`TaskResult`] (what a worker stores
//! and publishes when a task finishes, successfully or not).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use uuid::Uuid;

/// One step of a declarative pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepConfig {
    pub name: String,
    /// `"<type>.<name>"`, e.g. `"Input.csv"`.
    pub plugin_ref: String,
    #[serde(default)]
    pub config: HashMap<String, Json>,
    #[serde(default)]
    pub output_key: Option<String>,
}

impl StepConfig {
    /// Splits `plugin_ref` into its `(type_tag, name)` halves.
    pub fn plugin_type_and_name(&self) -> Option<(&str, &str)> {
        self.plugin_ref.split_once('.')
    }

    /// The key a step's output should be written under: the configured
    /// `output_key`, or a synthesized default when absent.
    pub fn resolved_output_key(&self) -> String {
        match &self.output_key {
            Some(key) if !key.is_empty() => key.clone(),
            _ => format!("{}_output", self.name),
        }
    }
}

/// The kind of work a [`Task`] performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Pipeline,
    DigitalTwin,
}

/// A unit of work published to the broker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub kind: TaskKind,
    #[serde(default)]
    pub pipeline_file: Option<String>,
    #[serde(default)]
    pub pipeline_yaml: Option<String>,
    #[serde(default)]
    pub seed_context: Option<HashMap<String, Json>>,
    pub created_at: DateTime<Utc>,
}

impl Task {
    pub fn new_pipeline_file(path: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            kind: TaskKind::Pipeline,
            pipeline_file: Some(path.into()),
            pipeline_yaml: None,
            seed_context: None,
            created_at: Utc::now(),
        }
    }

    pub fn new_pipeline_yaml(yaml: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            kind: TaskKind::Pipeline,
            pipeline_file: None,
            pipeline_yaml: Some(yaml.into()),
            seed_context: None,
            created_at: Utc::now(),
        }
    }

    pub fn new_digital_twin() -> Self {
        Self {
            id: Uuid::now_v7(),
            kind: TaskKind::DigitalTwin,
            pipeline_file: None,
            pipeline_yaml: None,
            seed_context: None,
            created_at: Utc::now(),
        }
    }
}

/// What a worker stores and publishes when a task completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResult {
    pub id: Uuid,
    pub success: bool,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub failed_step: Option<String>,
    #[serde(default)]
    pub final_context: Option<HashMap<String, Json>>,
    pub executed_at: DateTime<Utc>,
    pub worker_id: String,
}

impl TaskResult {
    pub fn success(id: Uuid, worker_id: impl Into<String>, final_context: HashMap<String, Json>) -> Self {
        Self {
            id,
            success: true,
            error_message: None,
            failed_step: None,
            final_context: Some(final_context),
            executed_at: Utc::now(),
            worker_id: worker_id.into(),
        }
    }

    pub fn failure(id: Uuid, worker_id: impl Into<String>, failed_step: Option<String>, error_message: impl Into<String>) -> Self {
        Self {
            id,
            success: false,
            error_message: Some(error_message.into()),
            failed_step,
            final_context: None,
            executed_at: Utc::now(),
            worker_id: worker_id.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plugin_ref_splits_on_first_dot() {
        let step = StepConfig { name: "read".into(), plugin_ref: "Input.csv".into(), config: HashMap::new(), output_key: None };
        assert_eq!(step.plugin_type_and_name(), Some(("Input", "csv")));
    }

    #[test]
    fn default_output_key_is_synthesized() {
        let step = StepConfig { name: "read".into(), plugin_ref: "Input.csv".into(), config: HashMap::new(), output_key: None };
        assert_eq!(step.resolved_output_key(), "read_output");
    }

    #[test]
    fn failure_result_always_has_error_message() {
        let result = TaskResult::failure(Uuid::now_v7(), "host-1", Some("save".into()), "missing input");
        assert!(!result.success);
        assert!(result.error_message.is_some());
    }
}
