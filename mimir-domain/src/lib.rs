// /////////////////////////////////////////////////////////////////////////////
// Mimir Pipeline Platform
// Licensed under the BSD-3-Clause license.
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Mimir Domain
//!
//! Pure, dependency-light domain types for the pipeline execution substrate:
//! the typed dataflow [`context`], the [`value`] model it carries, the
//! [`error`] taxonomy every layer classifies failures into, the [`step`]
//! shapes that move through the queue, and the durable [`entities`] the
//! persistence backend stores.
//!
//! Nothing in this crate talks to a network, a filesystem, or a database —
//! those concerns live in `mimir-plugin`, `mimir-codec`, `mimir-queue`, and
//! `mimir-storage` respectively, all of which depend on this crate rather
//! than the other way around.

pub mod context;
pub mod entities;
pub mod error;
pub mod step;
pub mod value;

pub use context::{Context, FastContext};
pub use entities::{
    new_id, Anomaly, AnomalySeverity, AnomalyStatus, ClassifierModel, DigitalTwin, Ontology, OntologyStatus, Prediction, StageStatus,
    TrainingRun, TrainingRunStatus, WorkflowArtifact, WorkflowJob, WorkflowStatus, WorkflowStep, WORKFLOW_STEP_NAMES,
};
pub use error::{MimirError, MimirResult};
pub use step::{StepConfig, Task, TaskKind, TaskResult};
pub use value::{BinaryValue, CustomValue, DataValue, ImageValue, StructuredValue, TimeSeriesPoint, TimeSeriesValue};
