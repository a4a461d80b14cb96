// /////////////////////////////////////////////////////////////////////////////
// Mimir Pipeline Platform
// Licensed under the BSD-3-Clause license.
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Digital Twin Repository
//!
//! `create_digital_twin` / `get_digital_twin` / `list_digital_twins`.

use chrono::{DateTime, Utc};
use mimir_domain::{DigitalTwin, MimirResult};
use sqlx::FromRow;

use crate::store::{map_sqlx_err, Store};

#[derive(FromRow)]
struct DigitalTwinRow {
    id: String,
    ontology_id: String,
    name: String,
    description: Option<String>,
    model_type: String,
    base_state: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl DigitalTwinRow {
    fn into_domain(self) -> DigitalTwin {
        DigitalTwin {
            id: self.id,
            ontology_id: self.ontology_id,
            name: self.name,
            description: self.description,
            model_type: self.model_type,
            base_state: serde_json::from_str(&self.base_state).unwrap_or(serde_json::Value::Null),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl Store {
    pub async fn create_digital_twin(&self, twin: &DigitalTwin) -> MimirResult<()> {
        let base_state = serde_json::to_string(&twin.base_state).unwrap_or_else(|_| "{}".to_string());
        sqlx::query(
            "INSERT INTO digital_twins (id, ontology_id, name, description, model_type, base_state, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&twin.id)
        .bind(&twin.ontology_id)
        .bind(&twin.name)
        .bind(&twin.description)
        .bind(&twin.model_type)
        .bind(base_state)
        .bind(twin.created_at)
        .bind(twin.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Ok(())
    }

    pub async fn get_digital_twin(&self, id: &str) -> MimirResult<DigitalTwin> {
        let row: DigitalTwinRow =
            sqlx::query_as("SELECT * FROM digital_twins WHERE id = ?").bind(id).fetch_one(&self.pool).await.map_err(map_sqlx_err)?;
        Ok(row.into_domain())
    }

    pub async fn list_digital_twins(&self) -> MimirResult<Vec<DigitalTwin>> {
        let rows: Vec<DigitalTwinRow> =
            sqlx::query_as("SELECT * FROM digital_twins ORDER BY created_at").fetch_all(&self.pool).await.map_err(map_sqlx_err)?;
        Ok(rows.into_iter().map(DigitalTwinRow::into_domain).collect())
    }
}
