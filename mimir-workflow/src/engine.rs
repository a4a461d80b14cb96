// /////////////////////////////////////////////////////////////////////////////
// Mimir Pipeline Platform
// Licensed under the BSD-3-Clause license.
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Workflow Engine
//!
//! Runs a [`WorkflowJob`]'s six fixed stages in order. A run halts at the
//! first stage that fails; already-completed stages are never re-run.
//! `retry` is just `run` called again on an existing job id — it resumes
//! from the first stage that is not `completed`, which is the failed
//! stage from the previous run (not the beginning).

use mimir_domain::{new_id, MimirResult, StageStatus, WorkflowArtifact, WorkflowJob};
use mimir_storage::Store;

use crate::registry::StageRegistry;

pub struct Engine<'a> {
    store: &'a Store,
    stages: &'a StageRegistry,
}

impl<'a> Engine<'a> {
    pub fn new(store: &'a Store, stages: &'a StageRegistry) -> Self {
        Self { store, stages }
    }

    /// Creates a new job with the default six-stage chain, all stages
    /// `pending`, and persists it.
    pub async fn submit(&self, name: impl Into<String>, import_id: Option<String>) -> MimirResult<WorkflowJob> {
        let job = WorkflowJob::new_default_chain(new_id(), name, import_id);
        self.store.create_workflow_job(&job).await?;
        Ok(job)
    }

    /// Runs `job_id`'s chain starting from its first non-`completed`
    /// stage, halting at the first failure. Safe to call again on a
    /// `failed` job — that is the documented retry path.
    pub async fn run(&self, job_id: &str) -> MimirResult<WorkflowJob> {
        let job = self.store.get_workflow_job(job_id).await?;

        for step in &job.steps {
            if step.status == StageStatus::Completed {
                continue;
            }

            self.store.transition_workflow_step(job_id, &step.step_name, StageStatus::Running, None).await?;

            let stage = match self.stages.get(&step.step_name) {
                Ok(stage) => stage,
                Err(err) => {
                    self.store.transition_workflow_step(job_id, &step.step_name, StageStatus::Failed, Some(&err.to_string())).await?;
                    return self.store.get_workflow_job(job_id).await;
                }
            };

            match stage.run(job_id, self.store).await {
                Ok(emitted) => {
                    for artifact in emitted {
                        let record = WorkflowArtifact {
                            id: new_id(),
                            workflow_id: job_id.to_string(),
                            step_name: step.step_name.clone(),
                            artifact_type: artifact.artifact_type,
                            artifact_id: artifact.artifact_id,
                            artifact_name: artifact.artifact_name,
                            created_at: chrono::Utc::now(),
                        };
                        self.store.record_workflow_artifact(&record).await?;
                    }
                    self.store.transition_workflow_step(job_id, &step.step_name, StageStatus::Completed, None).await?;
                }
                Err(err) => {
                    tracing::warn!(job_id, step = %step.step_name, error = %err, "workflow stage failed");
                    self.store.transition_workflow_step(job_id, &step.step_name, StageStatus::Failed, Some(&err.to_string())).await?;
                    return self.store.get_workflow_job(job_id).await;
                }
            }
        }

        self.store.get_workflow_job(job_id).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use mimir_domain::{MimirError, MimirResult as Res, WorkflowStatus};

    use super::*;
    use crate::stage::{EmittedArtifact, Stage};

    struct OkStage {
        name: &'static str,
    }

    #[async_trait]
    impl Stage for OkStage {
        fn step_name(&self) -> &str {
            self.name
        }

        async fn run(&self, _job_id: &str, _store: &Store) -> Res<Vec<EmittedArtifact>> {
            Ok(vec![EmittedArtifact::new("ontology", "art-1", self.name)])
        }
    }

    struct FlakyStage {
        name: &'static str,
        fail_until_call: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Stage for FlakyStage {
        fn step_name(&self) -> &str {
            self.name
        }

        async fn run(&self, _job_id: &str, _store: &Store) -> Res<Vec<EmittedArtifact>> {
            let remaining = self.fail_until_call.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| if n == 0 { None } else { Some(n - 1) });
            match remaining {
                Ok(_) => Err(MimirError::internal("entity extraction boom")),
                Err(_) => Ok(vec![]),
            }
        }
    }

    async fn ephemeral_store() -> Store {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mimir.db");
        let store = Store::open(&format!("sqlite://{}", path.display())).await.unwrap();
        std::mem::forget(dir);
        store
    }

    #[tokio::test]
    async fn chain_halts_at_failing_stage_then_resumes_on_retry() {
        let store = ephemeral_store().await;
        let flaky_budget = Arc::new(AtomicUsize::new(1));

        let mut stages = StageRegistry::new();
        stages.register(Arc::new(OkStage { name: "schema_inference" }));
        stages.register(Arc::new(OkStage { name: "ontology_creation" }));
        stages.register(Arc::new(FlakyStage { name: "entity_extraction", fail_until_call: flaky_budget.clone() }));
        stages.register(Arc::new(OkStage { name: "ml_training" }));
        stages.register(Arc::new(OkStage { name: "twin_creation" }));
        stages.register(Arc::new(OkStage { name: "monitoring_setup" }));

        let engine = Engine::new(&store, &stages);
        let job = engine.submit("demo", None).await.unwrap();

        let after_first_run = engine.run(&job.id).await.unwrap();
        assert_eq!(after_first_run.status, WorkflowStatus::Failed);
        assert_eq!(after_first_run.completed_steps, 2);
        assert_eq!(after_first_run.current_step.as_deref(), Some("entity_extraction"));

        let after_retry = engine.run(&job.id).await.unwrap();
        assert_eq!(after_retry.status, WorkflowStatus::Completed);
        assert_eq!(after_retry.completed_steps, 6);

        let artifacts = store.get_workflow_job(&job.id).await.unwrap().artifacts;
        // stage 1 and 2 each emitted one artifact; they were never re-emitted on retry.
        assert_eq!(artifacts.iter().filter(|a| a.step_name == "schema_inference").count(), 1);
        assert_eq!(artifacts.iter().filter(|a| a.step_name == "ontology_creation").count(), 1);
    }
}
