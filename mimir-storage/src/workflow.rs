// /////////////////////////////////////////////////////////////////////////////
// Mimir Pipeline Platform
// Licensed under the BSD-3-Clause license.
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Workflow Job Repository
//!
//! Persists a [`WorkflowJob`] and its child `workflow_steps` /
//! `workflow_artifacts` rows. `current_step` and `completed_steps` are
//! updated in the same transaction as the stage row that changed, so a
//! reader polling the job never observes the two out of sync. An artifact's
//! `step_name` is enforced to name a real step of the same workflow by a
//! composite foreign key onto `workflow_steps (workflow_id, step_name)`, not
//! just by construction.

use chrono::{DateTime, Utc};
use mimir_domain::{MimirResult, StageStatus, WorkflowArtifact, WorkflowJob, WorkflowStatus, WorkflowStep};
use sqlx::FromRow;

use crate::store::{map_sqlx_err, Store};

#[derive(FromRow)]
struct WorkflowJobRow {
    id: String,
    name: String,
    import_id: Option<String>,
    status: String,
    current_step: Option<String>,
    total_steps: i64,
    completed_steps: i64,
    error_message: Option<String>,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

#[derive(FromRow)]
struct WorkflowStepRow {
    workflow_id: String,
    step_name: String,
    step_order: i64,
    status: String,
    error_message: Option<String>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
}

impl WorkflowStepRow {
    fn into_domain(self) -> WorkflowStep {
        WorkflowStep {
            workflow_id: self.workflow_id,
            step_name: self.step_name,
            step_order: self.step_order,
            status: StageStatus::parse(&self.status).unwrap_or(StageStatus::Failed),
            error_message: self.error_message,
            started_at: self.started_at,
            completed_at: self.completed_at,
        }
    }
}

#[derive(FromRow)]
struct WorkflowArtifactRow {
    id: String,
    workflow_id: String,
    step_name: String,
    artifact_type: String,
    artifact_id: String,
    artifact_name: String,
    created_at: DateTime<Utc>,
}

impl WorkflowArtifactRow {
    fn into_domain(self) -> WorkflowArtifact {
        WorkflowArtifact {
            id: self.id,
            workflow_id: self.workflow_id,
            step_name: self.step_name,
            artifact_type: self.artifact_type,
            artifact_id: self.artifact_id,
            artifact_name: self.artifact_name,
            created_at: self.created_at,
        }
    }
}

impl Store {
    /// Inserts the job row plus every pending stage row from
    /// `job.steps`, in one transaction.
    pub async fn create_workflow_job(&self, job: &WorkflowJob) -> MimirResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_err)?;

        sqlx::query(
            "INSERT INTO workflow_jobs (id, name, import_id, status, current_step, total_steps, completed_steps, \
             error_message, created_at, completed_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&job.id)
        .bind(&job.name)
        .bind(&job.import_id)
        .bind(job.status.as_str())
        .bind(&job.current_step)
        .bind(job.total_steps)
        .bind(job.completed_steps)
        .bind(&job.error_message)
        .bind(job.created_at)
        .bind(job.completed_at)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_err)?;

        for step in &job.steps {
            sqlx::query(
                "INSERT INTO workflow_steps (workflow_id, step_name, step_order, status, error_message, started_at, completed_at) \
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&step.workflow_id)
            .bind(&step.step_name)
            .bind(step.step_order)
            .bind(step.status.as_str())
            .bind(&step.error_message)
            .bind(step.started_at)
            .bind(step.completed_at)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_err)?;
        }

        tx.commit().await.map_err(map_sqlx_err)?;
        Ok(())
    }

    pub async fn get_workflow_job(&self, id: &str) -> MimirResult<WorkflowJob> {
        let row: WorkflowJobRow =
            sqlx::query_as("SELECT * FROM workflow_jobs WHERE id = ?").bind(id).fetch_one(&self.pool).await.map_err(map_sqlx_err)?;

        let step_rows: Vec<WorkflowStepRow> = sqlx::query_as("SELECT * FROM workflow_steps WHERE workflow_id = ? ORDER BY step_order")
            .bind(id)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        let artifact_rows: Vec<WorkflowArtifactRow> = sqlx::query_as("SELECT * FROM workflow_artifacts WHERE workflow_id = ? ORDER BY created_at")
            .bind(id)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        Ok(WorkflowJob {
            id: row.id,
            name: row.name,
            import_id: row.import_id,
            status: WorkflowStatus::parse(&row.status).unwrap_or(WorkflowStatus::Failed),
            current_step: row.current_step,
            total_steps: row.total_steps,
            completed_steps: row.completed_steps,
            error_message: row.error_message,
            created_at: row.created_at,
            completed_at: row.completed_at,
            steps: step_rows.into_iter().map(WorkflowStepRow::into_domain).collect(),
            artifacts: artifact_rows.into_iter().map(WorkflowArtifactRow::into_domain).collect(),
        })
    }

    /// Transitions one stage and refreshes the parent job's
    /// `current_step`/`completed_steps`/`status` projection in the same
    /// transaction, per the no-torn-read guarantee of section 4.I.
    pub async fn transition_workflow_step(
        &self,
        workflow_id: &str,
        step_name: &str,
        status: StageStatus,
        error_message: Option<&str>,
    ) -> MimirResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_err)?;
        let now = Utc::now();

        let (started_at, completed_at): (Option<DateTime<Utc>>, Option<DateTime<Utc>>) = match status {
            StageStatus::Running => (Some(now), None),
            StageStatus::Completed | StageStatus::Failed => (None, Some(now)),
            StageStatus::Pending => (None, None),
        };

        sqlx::query(
            "UPDATE workflow_steps SET status = ?, error_message = ?, \
             started_at = COALESCE(?, started_at), completed_at = COALESCE(?, completed_at) \
             WHERE workflow_id = ? AND step_name = ?",
        )
        .bind(status.as_str())
        .bind(error_message)
        .bind(started_at)
        .bind(completed_at)
        .bind(workflow_id)
        .bind(step_name)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_err)?;

        let step_rows: Vec<(String,)> = sqlx::query_as("SELECT status FROM workflow_steps WHERE workflow_id = ?")
            .bind(workflow_id)
            .fetch_all(&mut *tx)
            .await
            .map_err(map_sqlx_err)?;
        let statuses: Vec<&str> = step_rows.iter().map(|(s,)| s.as_str()).collect();

        let completed_count = statuses.iter().filter(|s| **s == "completed").count() as i64;
        let job_status = if statuses.iter().any(|s| *s == "failed") {
            WorkflowStatus::Failed
        } else if statuses.iter().all(|s| *s == "completed") {
            WorkflowStatus::Completed
        } else if statuses.iter().any(|s| *s == "running") {
            WorkflowStatus::Running
        } else {
            WorkflowStatus::Pending
        };
        let job_completed_at = matches!(job_status, WorkflowStatus::Completed | WorkflowStatus::Failed).then(Utc::now);

        sqlx::query(
            "UPDATE workflow_jobs SET status = ?, current_step = ?, completed_steps = ?, error_message = ?, completed_at = COALESCE(?, completed_at) WHERE id = ?",
        )
        .bind(job_status.as_str())
        .bind(step_name)
        .bind(completed_count)
        .bind(if status == StageStatus::Failed { error_message } else { None })
        .bind(job_completed_at)
        .bind(workflow_id)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_err)?;

        tx.commit().await.map_err(map_sqlx_err)?;
        Ok(())
    }

    pub async fn record_workflow_artifact(&self, artifact: &WorkflowArtifact) -> MimirResult<()> {
        sqlx::query(
            "INSERT INTO workflow_artifacts (id, workflow_id, step_name, artifact_type, artifact_id, artifact_name, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&artifact.id)
        .bind(&artifact.workflow_id)
        .bind(&artifact.step_name)
        .bind(&artifact.artifact_type)
        .bind(&artifact.artifact_id)
        .bind(&artifact.artifact_name)
        .bind(artifact.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ephemeral_store;

    #[tokio::test]
    async fn transition_keeps_job_projection_consistent() {
        let store = ephemeral_store().await;
        let job = WorkflowJob::new_default_chain("w1", "demo", None);
        store.create_workflow_job(&job).await.unwrap();

        store.transition_workflow_step("w1", "schema_inference", StageStatus::Running, None).await.unwrap();
        let running = store.get_workflow_job("w1").await.unwrap();
        assert_eq!(running.status, WorkflowStatus::Running);
        assert_eq!(running.current_step.as_deref(), Some("schema_inference"));

        store.transition_workflow_step("w1", "schema_inference", StageStatus::Completed, None).await.unwrap();
        let after_one = store.get_workflow_job("w1").await.unwrap();
        assert_eq!(after_one.completed_steps, 1);
        assert_eq!(after_one.status, WorkflowStatus::Running);

        store.transition_workflow_step("w1", "ontology_creation", StageStatus::Failed, Some("boom")).await.unwrap();
        let failed = store.get_workflow_job("w1").await.unwrap();
        assert_eq!(failed.status, WorkflowStatus::Failed);
        assert_eq!(failed.error_message.as_deref(), Some("boom"));
        // stage 1's artifact commitment is untouched by stage 2's failure.
        assert_eq!(failed.completed_steps, 1);
    }

    #[tokio::test]
    async fn artifact_naming_an_unknown_step_is_rejected() {
        let store = ephemeral_store().await;
        let job = WorkflowJob::new_default_chain("w2", "demo", None);
        store.create_workflow_job(&job).await.unwrap();

        let artifact = WorkflowArtifact {
            id: "a1".to_string(),
            workflow_id: "w2".to_string(),
            step_name: "not_a_real_step".to_string(),
            artifact_type: "ontology".to_string(),
            artifact_id: "o1".to_string(),
            artifact_name: "Test Ontology".to_string(),
            created_at: Utc::now(),
        };

        let err = store.record_workflow_artifact(&artifact).await.unwrap_err();
        assert!(matches!(err, mimir_domain::MimirError::ConstraintViolation(_)));
    }

    #[tokio::test]
    async fn artifact_naming_a_real_step_is_accepted() {
        let store = ephemeral_store().await;
        let job = WorkflowJob::new_default_chain("w3", "demo", None);
        store.create_workflow_job(&job).await.unwrap();

        let artifact = WorkflowArtifact {
            id: "a2".to_string(),
            workflow_id: "w3".to_string(),
            step_name: "schema_inference".to_string(),
            artifact_type: "ontology".to_string(),
            artifact_id: "o1".to_string(),
            artifact_name: "Test Ontology".to_string(),
            created_at: Utc::now(),
        };

        store.record_workflow_artifact(&artifact).await.unwrap();
    }
}
