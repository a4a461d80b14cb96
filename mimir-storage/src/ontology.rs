// /////////////////////////////////////////////////////////////////////////////
// Mimir Pipeline Platform
// Licensed under the BSD-3-Clause license.
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Ontology Repository
//!
//! `create_ontology` / `get_ontology` / `update_ontology` /
//! `update_ontology_status` / `list_ontologies` / `delete_ontology`
//! (cascade, via the schema's `ON DELETE CASCADE` foreign keys).

use chrono::{DateTime, Utc};
use mimir_domain::{MimirResult, Ontology, OntologyStatus};
use sqlx::FromRow;

use crate::store::{map_sqlx_err, Store};

#[derive(FromRow)]
struct OntologyRow {
    id: String,
    name: String,
    description: Option<String>,
    version: String,
    file_path: Option<String>,
    graph_uri: Option<String>,
    format: Option<String>,
    status: String,
    auto_version: i64,
    metadata: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    created_by: Option<String>,
}

impl OntologyRow {
    fn into_domain(self) -> Ontology {
        Ontology {
            id: self.id,
            name: self.name,
            description: self.description,
            version: self.version,
            file_path: self.file_path,
            graph_uri: self.graph_uri,
            format: self.format,
            status: OntologyStatus::parse(&self.status).unwrap_or(OntologyStatus::Inactive),
            auto_version: self.auto_version != 0,
            metadata: serde_json::from_str(&self.metadata).unwrap_or(serde_json::Value::Null),
            created_at: self.created_at,
            updated_at: self.updated_at,
            created_by: self.created_by,
        }
    }
}

impl Store {
    pub async fn create_ontology(&self, o: &Ontology) -> MimirResult<()> {
        let metadata = serde_json::to_string(&o.metadata).unwrap_or_else(|_| "{}".to_string());
        sqlx::query(
            "INSERT INTO ontologies (id, name, description, version, file_path, graph_uri, format, status, \
             auto_version, metadata, created_at, updated_at, created_by) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&o.id)
        .bind(&o.name)
        .bind(&o.description)
        .bind(&o.version)
        .bind(&o.file_path)
        .bind(&o.graph_uri)
        .bind(&o.format)
        .bind(o.status.as_str())
        .bind(o.auto_version as i64)
        .bind(metadata)
        .bind(o.created_at)
        .bind(o.updated_at)
        .bind(&o.created_by)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Ok(())
    }

    pub async fn get_ontology(&self, id: &str) -> MimirResult<Ontology> {
        let row: OntologyRow = sqlx::query_as("SELECT * FROM ontologies WHERE id = ?").bind(id).fetch_one(&self.pool).await.map_err(map_sqlx_err)?;
        Ok(row.into_domain())
    }

    pub async fn update_ontology(&self, o: &Ontology) -> MimirResult<()> {
        let metadata = serde_json::to_string(&o.metadata).unwrap_or_else(|_| "{}".to_string());
        let updated_at = Utc::now();
        let result = sqlx::query(
            "UPDATE ontologies SET name = ?, description = ?, version = ?, file_path = ?, graph_uri = ?, \
             format = ?, status = ?, auto_version = ?, metadata = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&o.name)
        .bind(&o.description)
        .bind(&o.version)
        .bind(&o.file_path)
        .bind(&o.graph_uri)
        .bind(&o.format)
        .bind(o.status.as_str())
        .bind(o.auto_version as i64)
        .bind(metadata)
        .bind(updated_at)
        .bind(&o.id)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        require_one_row_affected(result.rows_affected())
    }

    pub async fn update_ontology_status(&self, id: &str, status: OntologyStatus) -> MimirResult<()> {
        let updated_at = Utc::now();
        let result = sqlx::query("UPDATE ontologies SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(updated_at)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;
        require_one_row_affected(result.rows_affected())
    }

    pub async fn list_ontologies(&self, status_filter: Option<OntologyStatus>) -> MimirResult<Vec<Ontology>> {
        let rows: Vec<OntologyRow> = match status_filter {
            Some(status) => sqlx::query_as("SELECT * FROM ontologies WHERE status = ? ORDER BY created_at")
                .bind(status.as_str())
                .fetch_all(&self.pool)
                .await
                .map_err(map_sqlx_err)?,
            None => sqlx::query_as("SELECT * FROM ontologies ORDER BY created_at").fetch_all(&self.pool).await.map_err(map_sqlx_err)?,
        };
        Ok(rows.into_iter().map(OntologyRow::into_domain).collect())
    }

    /// Deletes the ontology and, via `ON DELETE CASCADE`, every digital
    /// twin and classifier model (and their training runs, predictions,
    /// and anomalies) hanging off it.
    pub async fn delete_ontology(&self, id: &str) -> MimirResult<()> {
        let result = sqlx::query("DELETE FROM ontologies WHERE id = ?").bind(id).execute(&self.pool).await.map_err(map_sqlx_err)?;
        require_one_row_affected(result.rows_affected())
    }
}

fn require_one_row_affected(rows_affected: u64) -> MimirResult<()> {
    if rows_affected == 0 {
        return Err(mimir_domain::MimirError::not_found("row not found"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::test_support::ephemeral_store;

    fn sample(id: &str) -> Ontology {
        let now = Utc::now();
        Ontology {
            id: id.to_string(),
            name: "Test".to_string(),
            description: None,
            version: "1.0.0".to_string(),
            file_path: None,
            graph_uri: None,
            format: None,
            status: OntologyStatus::Active,
            auto_version: false,
            metadata: json!({}),
            created_at: now,
            updated_at: now,
            created_by: None,
        }
    }

    #[tokio::test]
    async fn create_get_update_status_list_delete_round_trip() {
        let store = ephemeral_store().await;
        let ontology = sample("o1");
        store.create_ontology(&ontology).await.unwrap();

        let fetched = store.get_ontology("o1").await.unwrap();
        assert_eq!(fetched.name, "Test");
        assert_eq!(fetched.status, OntologyStatus::Active);

        store.update_ontology_status("o1", OntologyStatus::Inactive).await.unwrap();

        let active = store.list_ontologies(Some(OntologyStatus::Active)).await.unwrap();
        assert!(active.is_empty());
        let inactive = store.list_ontologies(Some(OntologyStatus::Inactive)).await.unwrap();
        assert_eq!(inactive.len(), 1);
        assert_eq!(inactive[0].id, "o1");

        store.delete_ontology("o1").await.unwrap();
        let err = store.get_ontology("o1").await.unwrap_err();
        assert!(matches!(err, mimir_domain::MimirError::NotFound(_)));
    }

    #[tokio::test]
    async fn deleting_ontology_cascades_to_digital_twins() {
        let store = ephemeral_store().await;
        store.create_ontology(&sample("o2")).await.unwrap();
        let twin = mimir_domain::DigitalTwin {
            id: "t1".to_string(),
            ontology_id: "o2".to_string(),
            name: "Twin".to_string(),
            description: None,
            model_type: "sensor".to_string(),
            base_state: json!({}),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        store.create_digital_twin(&twin).await.unwrap();

        store.delete_ontology("o2").await.unwrap();

        let err = store.get_digital_twin("t1").await.unwrap_err();
        assert!(matches!(err, mimir_domain::MimirError::NotFound(_)));
    }
}
