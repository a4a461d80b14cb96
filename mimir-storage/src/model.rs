// /////////////////////////////////////////////////////////////////////////////
// Mimir Pipeline Platform
// Licensed under the BSD-3-Clause license.
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Classifier Model, Training Run, Prediction, and Anomaly Repositories
//!
//! `create_classifier_model` / `get_classifier_model` /
//! `update_classifier_model_status` / `list_classifier_models` /
//! `delete_classifier_model`; `create_training_run` /
//! `update_training_run_status`; `create_prediction`; `create_anomaly` /
//! `list_anomalies`; and `save_ml_model_direct`, the one-shot atomic
//! creation used by the autonomous training stage.

use chrono::{DateTime, Utc};
use mimir_domain::{Anomaly, AnomalySeverity, AnomalyStatus, ClassifierModel, MimirResult, Prediction, TrainingRun, TrainingRunStatus};
use serde_json::Value as Json;
use sqlx::FromRow;

use crate::store::{map_sqlx_err, Store};

#[derive(FromRow)]
struct ClassifierModelRow {
    id: String,
    ontology_id: String,
    name: String,
    target_class: String,
    algorithm: String,
    hyperparameters: String,
    feature_columns: String,
    class_labels: String,
    train_accuracy: Option<f64>,
    validate_accuracy: Option<f64>,
    precision: Option<f64>,
    recall: Option<f64>,
    f1: Option<f64>,
    confusion_matrix: String,
    model_artifact_path: Option<String>,
    model_size_bytes: Option<i64>,
    training_rows: Option<i64>,
    validation_rows: Option<i64>,
    feature_importance: String,
    is_active: i64,
}

fn parse_json(raw: &str) -> Json {
    serde_json::from_str(raw).unwrap_or(Json::Null)
}

impl ClassifierModelRow {
    fn into_domain(self) -> ClassifierModel {
        ClassifierModel {
            id: self.id,
            ontology_id: self.ontology_id,
            name: self.name,
            target_class: self.target_class,
            algorithm: self.algorithm,
            hyperparameters: parse_json(&self.hyperparameters),
            feature_columns: parse_json(&self.feature_columns),
            class_labels: parse_json(&self.class_labels),
            train_accuracy: self.train_accuracy,
            validate_accuracy: self.validate_accuracy,
            precision: self.precision,
            recall: self.recall,
            f1: self.f1,
            confusion_matrix: parse_json(&self.confusion_matrix),
            model_artifact_path: self.model_artifact_path,
            model_size_bytes: self.model_size_bytes,
            training_rows: self.training_rows,
            validation_rows: self.validation_rows,
            feature_importance: parse_json(&self.feature_importance),
            is_active: self.is_active != 0,
        }
    }
}

#[derive(FromRow)]
struct TrainingRunRow {
    id: String,
    model_id: String,
    status: String,
    error_message: Option<String>,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl TrainingRunRow {
    fn into_domain(self) -> TrainingRun {
        TrainingRun {
            id: self.id,
            model_id: self.model_id,
            status: TrainingRunStatus::parse(&self.status).unwrap_or(TrainingRunStatus::Failed),
            error_message: self.error_message,
            started_at: self.started_at,
            completed_at: self.completed_at,
        }
    }
}

#[derive(FromRow)]
struct AnomalyRow {
    id: String,
    model_id: String,
    severity: String,
    status: String,
    description: String,
    details: String,
    created_at: DateTime<Utc>,
}

fn parse_severity(s: &str) -> AnomalySeverity {
    match s {
        "low" => AnomalySeverity::Low,
        "medium" => AnomalySeverity::Medium,
        "high" => AnomalySeverity::High,
        _ => AnomalySeverity::Critical,
    }
}

fn severity_str(s: AnomalySeverity) -> &'static str {
    match s {
        AnomalySeverity::Low => "low",
        AnomalySeverity::Medium => "medium",
        AnomalySeverity::High => "high",
        AnomalySeverity::Critical => "critical",
    }
}

fn parse_anomaly_status(s: &str) -> AnomalyStatus {
    match s {
        "open" => AnomalyStatus::Open,
        "acknowledged" => AnomalyStatus::Acknowledged,
        _ => AnomalyStatus::Resolved,
    }
}

fn anomaly_status_str(s: AnomalyStatus) -> &'static str {
    match s {
        AnomalyStatus::Open => "open",
        AnomalyStatus::Acknowledged => "acknowledged",
        AnomalyStatus::Resolved => "resolved",
    }
}

impl AnomalyRow {
    fn into_domain(self) -> Anomaly {
        Anomaly {
            id: self.id,
            model_id: self.model_id,
            severity: parse_severity(&self.severity),
            status: parse_anomaly_status(&self.status),
            description: self.description,
            details: parse_json(&self.details),
            created_at: self.created_at,
        }
    }
}

impl Store {
    pub async fn create_classifier_model(&self, m: &ClassifierModel) -> MimirResult<()> {
        sqlx::query(
            "INSERT INTO classifier_models (id, ontology_id, name, target_class, algorithm, hyperparameters, \
             feature_columns, class_labels, train_accuracy, validate_accuracy, precision, recall, f1, \
             confusion_matrix, model_artifact_path, model_size_bytes, training_rows, validation_rows, \
             feature_importance, is_active) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&m.id)
        .bind(&m.ontology_id)
        .bind(&m.name)
        .bind(&m.target_class)
        .bind(&m.algorithm)
        .bind(serde_json::to_string(&m.hyperparameters).unwrap_or_else(|_| "{}".into()))
        .bind(serde_json::to_string(&m.feature_columns).unwrap_or_else(|_| "[]".into()))
        .bind(serde_json::to_string(&m.class_labels).unwrap_or_else(|_| "[]".into()))
        .bind(m.train_accuracy)
        .bind(m.validate_accuracy)
        .bind(m.precision)
        .bind(m.recall)
        .bind(m.f1)
        .bind(serde_json::to_string(&m.confusion_matrix).unwrap_or_else(|_| "{}".into()))
        .bind(&m.model_artifact_path)
        .bind(m.model_size_bytes)
        .bind(m.training_rows)
        .bind(m.validation_rows)
        .bind(serde_json::to_string(&m.feature_importance).unwrap_or_else(|_| "{}".into()))
        .bind(m.is_active as i64)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Ok(())
    }

    pub async fn get_classifier_model(&self, id: &str) -> MimirResult<ClassifierModel> {
        let row: ClassifierModelRow =
            sqlx::query_as("SELECT * FROM classifier_models WHERE id = ?").bind(id).fetch_one(&self.pool).await.map_err(map_sqlx_err)?;
        Ok(row.into_domain())
    }

    pub async fn update_classifier_model_status(&self, id: &str, active: bool) -> MimirResult<()> {
        let result = sqlx::query("UPDATE classifier_models SET is_active = ? WHERE id = ?")
            .bind(active as i64)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        if result.rows_affected() == 0 {
            return Err(mimir_domain::MimirError::not_found("row not found"));
        }
        Ok(())
    }

    pub async fn list_classifier_models(&self, ontology_id: Option<&str>, active_only: bool) -> MimirResult<Vec<ClassifierModel>> {
        let rows: Vec<ClassifierModelRow> = match (ontology_id, active_only) {
            (Some(oid), true) => sqlx::query_as("SELECT * FROM classifier_models WHERE ontology_id = ? AND is_active = 1 ORDER BY id")
                .bind(oid)
                .fetch_all(&self.pool)
                .await
                .map_err(map_sqlx_err)?,
            (Some(oid), false) => {
                sqlx::query_as("SELECT * FROM classifier_models WHERE ontology_id = ? ORDER BY id").bind(oid).fetch_all(&self.pool).await.map_err(map_sqlx_err)?
            }
            (None, true) => sqlx::query_as("SELECT * FROM classifier_models WHERE is_active = 1 ORDER BY id").fetch_all(&self.pool).await.map_err(map_sqlx_err)?,
            (None, false) => sqlx::query_as("SELECT * FROM classifier_models ORDER BY id").fetch_all(&self.pool).await.map_err(map_sqlx_err)?,
        };
        Ok(rows.into_iter().map(ClassifierModelRow::into_domain).collect())
    }

    pub async fn delete_classifier_model(&self, id: &str) -> MimirResult<()> {
        let result = sqlx::query("DELETE FROM classifier_models WHERE id = ?").bind(id).execute(&self.pool).await.map_err(map_sqlx_err)?;
        if result.rows_affected() == 0 {
            return Err(mimir_domain::MimirError::not_found("row not found"));
        }
        Ok(())
    }

    pub async fn create_training_run(&self, run: &TrainingRun) -> MimirResult<()> {
        sqlx::query("INSERT INTO training_runs (id, model_id, status, error_message, started_at, completed_at) VALUES (?, ?, ?, ?, ?, ?)")
            .bind(&run.id)
            .bind(&run.model_id)
            .bind(run.status.as_str())
            .bind(&run.error_message)
            .bind(run.started_at)
            .bind(run.completed_at)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        Ok(())
    }

    pub async fn update_training_run_status(&self, id: &str, status: TrainingRunStatus, error: Option<&str>) -> MimirResult<()> {
        let completed_at = matches!(status, TrainingRunStatus::Completed | TrainingRunStatus::Failed).then(Utc::now);
        let result = sqlx::query("UPDATE training_runs SET status = ?, error_message = ?, completed_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(error)
            .bind(completed_at)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        if result.rows_affected() == 0 {
            return Err(mimir_domain::MimirError::not_found("row not found"));
        }
        Ok(())
    }

    pub async fn create_prediction(&self, p: &Prediction) -> MimirResult<()> {
        sqlx::query("INSERT INTO predictions (id, model_id, input, output, confidence, created_at) VALUES (?, ?, ?, ?, ?, ?)")
            .bind(&p.id)
            .bind(&p.model_id)
            .bind(serde_json::to_string(&p.input).unwrap_or_else(|_| "{}".into()))
            .bind(serde_json::to_string(&p.output).unwrap_or_else(|_| "{}".into()))
            .bind(p.confidence)
            .bind(p.created_at)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        Ok(())
    }

    pub async fn create_anomaly(&self, a: &Anomaly) -> MimirResult<()> {
        sqlx::query("INSERT INTO anomalies (id, model_id, severity, status, description, details, created_at) VALUES (?, ?, ?, ?, ?, ?, ?)")
            .bind(&a.id)
            .bind(&a.model_id)
            .bind(severity_str(a.severity))
            .bind(anomaly_status_str(a.status))
            .bind(&a.description)
            .bind(serde_json::to_string(&a.details).unwrap_or_else(|_| "{}".into()))
            .bind(a.created_at)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        Ok(())
    }

    pub async fn list_anomalies(
        &self,
        model_id: Option<&str>,
        status: Option<AnomalyStatus>,
        severity: Option<AnomalySeverity>,
        limit: i64,
    ) -> MimirResult<Vec<Anomaly>> {
        let mut sql = "SELECT * FROM anomalies WHERE 1 = 1".to_string();
        if model_id.is_some() {
            sql.push_str(" AND model_id = ?");
        }
        if status.is_some() {
            sql.push_str(" AND status = ?");
        }
        if severity.is_some() {
            sql.push_str(" AND severity = ?");
        }
        sql.push_str(" ORDER BY created_at DESC LIMIT ?");

        let mut query = sqlx::query_as::<_, AnomalyRow>(&sql);
        if let Some(model_id) = model_id {
            query = query.bind(model_id);
        }
        if let Some(status) = status {
            query = query.bind(anomaly_status_str(status));
        }
        if let Some(severity) = severity {
            query = query.bind(severity_str(severity));
        }
        query = query.bind(limit);

        let rows = query.fetch_all(&self.pool).await.map_err(map_sqlx_err)?;
        Ok(rows.into_iter().map(AnomalyRow::into_domain).collect())
    }

    /// Atomically creates a classifier model row from the three blobs the
    /// autonomous training stage produces, inside one transaction so a
    /// crash mid-write never leaves a model row with no metrics.
    pub async fn save_ml_model_direct(&self, id: &str, ontology_id: &str, model_json: &Json, config_json: &Json, metrics_json: &Json) -> MimirResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_err)?;
        let algorithm = config_json.get("algorithm").and_then(Json::as_str).unwrap_or("unknown").to_string();
        let target_class = config_json.get("target_class").and_then(Json::as_str).unwrap_or("unknown").to_string();
        let name = model_json.get("name").and_then(Json::as_str).unwrap_or(id).to_string();

        sqlx::query(
            "INSERT INTO classifier_models (id, ontology_id, name, target_class, algorithm, hyperparameters, \
             feature_columns, class_labels, confusion_matrix, feature_importance, is_active) \
             VALUES (?, ?, ?, ?, ?, ?, '[]', '[]', ?, '{}', 1)",
        )
        .bind(id)
        .bind(ontology_id)
        .bind(name)
        .bind(target_class)
        .bind(algorithm)
        .bind(serde_json::to_string(config_json).unwrap_or_else(|_| "{}".into()))
        .bind(serde_json::to_string(metrics_json).unwrap_or_else(|_| "{}".into()))
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_err)?;

        tx.commit().await.map_err(map_sqlx_err)?;
        Ok(())
    }
}
