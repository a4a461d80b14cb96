// /////////////////////////////////////////////////////////////////////////////
// Mimir Pipeline Platform
// Licensed under the BSD-3-Clause license.
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Durable Entity Shapes
//!
//! Plain data shapes for the artifacts the persistence backend stores:
//! ontologies, digital twins, classifier models, training runs, predictions,
//! anomalies, and workflow jobs. These types carry no behavior of their own;
//! `mimir-storage` is the only crate that knows how to read or write them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OntologyStatus {
    Active,
    Inactive,
}

impl OntologyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "inactive" => Some(Self::Inactive),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ontology {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub version: String,
    pub file_path: Option<String>,
    pub graph_uri: Option<String>,
    pub format: Option<String>,
    pub status: OntologyStatus,
    pub auto_version: bool,
    #[serde(default)]
    pub metadata: Json,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigitalTwin {
    pub id: String,
    pub ontology_id: String,
    pub name: String,
    pub description: Option<String>,
    pub model_type: String,
    #[serde(default)]
    pub base_state: Json,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierModel {
    pub id: String,
    pub ontology_id: String,
    pub name: String,
    pub target_class: String,
    pub algorithm: String,
    #[serde(default)]
    pub hyperparameters: Json,
    #[serde(default)]
    pub feature_columns: Json,
    #[serde(default)]
    pub class_labels: Json,
    pub train_accuracy: Option<f64>,
    pub validate_accuracy: Option<f64>,
    pub precision: Option<f64>,
    pub recall: Option<f64>,
    pub f1: Option<f64>,
    #[serde(default)]
    pub confusion_matrix: Json,
    pub model_artifact_path: Option<String>,
    pub model_size_bytes: Option<i64>,
    pub training_rows: Option<i64>,
    pub validation_rows: Option<i64>,
    #[serde(default)]
    pub feature_importance: Json,
    pub is_active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainingRunStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl TrainingRunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingRun {
    pub id: String,
    pub model_id: String,
    pub status: TrainingRunStatus,
    pub error_message: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub id: String,
    pub model_id: String,
    #[serde(default)]
    pub input: Json,
    #[serde(default)]
    pub output: Json,
    pub confidence: Option<f64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalySeverity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyStatus {
    Open,
    Acknowledged,
    Resolved,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Anomaly {
    pub id: String,
    pub model_id: String,
    pub severity: AnomalySeverity,
    pub status: AnomalyStatus,
    pub description: String,
    #[serde(default)]
    pub details: Json,
    pub created_at: DateTime<Utc>,
}

/// The fixed chain of stages an autonomous workflow runs through, in order.
pub const WORKFLOW_STEP_NAMES: [&str; 6] = [
    "schema_inference",
    "ontology_creation",
    "entity_extraction",
    "ml_training",
    "twin_creation",
    "monitoring_setup",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl WorkflowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl StageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowStep {
    pub workflow_id: String,
    pub step_name: String,
    pub step_order: i64,
    pub status: StageStatus,
    pub error_message: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowArtifact {
    pub id: String,
    pub workflow_id: String,
    pub step_name: String,
    pub artifact_type: String,
    pub artifact_id: String,
    pub artifact_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowJob {
    pub id: String,
    pub name: String,
    pub import_id: Option<String>,
    pub status: WorkflowStatus,
    pub current_step: Option<String>,
    pub total_steps: i64,
    pub completed_steps: i64,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub steps: Vec<WorkflowStep>,
    #[serde(default)]
    pub artifacts: Vec<WorkflowArtifact>,
}

impl WorkflowJob {
    pub fn new_default_chain(id: impl Into<String>, name: impl Into<String>, import_id: Option<String>) -> Self {
        let now = Utc::now();
        let id = id.into();
        let steps = WORKFLOW_STEP_NAMES
            .iter()
            .enumerate()
            .map(|(i, step_name)| WorkflowStep {
                workflow_id: id.clone(),
                step_name: step_name.to_string(),
                step_order: i as i64,
                status: StageStatus::Pending,
                error_message: None,
                started_at: None,
                completed_at: None,
            })
            .collect();
        Self {
            id,
            name: name.into(),
            import_id,
            status: WorkflowStatus::Pending,
            current_step: None,
            total_steps: WORKFLOW_STEP_NAMES.len() as i64,
            completed_steps: 0,
            error_message: None,
            created_at: now,
            completed_at: None,
            steps,
            artifacts: Vec::new(),
        }
    }
}

pub fn new_id() -> String {
    Uuid::now_v7().to_string()
}
