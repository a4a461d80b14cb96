// /////////////////////////////////////////////////////////////////////////////
// Mimir Pipeline Platform
// Licensed under the BSD-3-Clause license.
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Stage
//!
//! One link of the fixed six-stage chain. The engine itself knows nothing
//! about schema inference, ontology building, or ML training — those stay
//! collaborators implementing this trait, registered by `step_name`.

use async_trait::async_trait;
use mimir_domain::MimirResult;
use mimir_storage::Store;

/// One artifact a stage produced, before it is assigned an id and
/// timestamp by the engine.
pub struct EmittedArtifact {
    pub artifact_type: String,
    pub artifact_id: String,
    pub artifact_name: String,
}

impl EmittedArtifact {
    pub fn new(artifact_type: impl Into<String>, artifact_id: impl Into<String>, artifact_name: impl Into<String>) -> Self {
        Self { artifact_type: artifact_type.into(), artifact_id: artifact_id.into(), artifact_name: artifact_name.into() }
    }
}

/// The capability every workflow stage implements.
#[async_trait]
pub trait Stage: Send + Sync {
    /// Matches one of `mimir_domain::WORKFLOW_STEP_NAMES`.
    fn step_name(&self) -> &str;

    /// Runs the stage's work for `job_id`. Idempotent stages may be
    /// re-run safely on retry without re-emitting duplicate artifacts;
    /// non-idempotent stages are responsible for their own dedup logic if
    /// they care, since the engine does not retry a completed stage.
    async fn run(&self, job_id: &str, store: &Store) -> MimirResult<Vec<EmittedArtifact>>;
}
