// /////////////////////////////////////////////////////////////////////////////
// Mimir Pipeline Platform
// Licensed under the BSD-3-Clause license.
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Store
//!
//! `Store` wraps a `SqlitePool` and exposes the persistence contract of
//! section 4.H as plain async methods, grouped by entity across
//! [`crate::ontology`], [`crate::twin`], [`crate::model`], and
//! [`crate::workflow`]. Every method maps `sqlx::Error::RowNotFound` to
//! `MimirError::NotFound`, a foreign-key or unique-constraint violation to
//! `MimirError::ConstraintViolation`, and anything else to
//! `MimirError::Internal`.

use mimir_domain::{MimirError, MimirResult};
use sqlx::error::DatabaseError;
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct Store {
    pub(crate) pool: SqlitePool,
}

impl Store {
    pub async fn open(path: &str) -> MimirResult<Self> {
        let pool = crate::pool::open(path).await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn health(&self) -> MimirResult<()> {
        crate::pool::health(&self.pool).await
    }

    /// Access to the underlying pool, for callers composing several store
    /// operations inside one explicit transaction (e.g. the autonomous
    /// workflow engine's stage transitions).
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Begins an explicit transaction. Internal composite operations
    /// (`save_ml_model_direct`, `transition_workflow_step`) use their own
    /// private transactions; this is for external callers that need to
    /// span more than one `Store` method atomically.
    pub async fn begin(&self) -> MimirResult<sqlx::Transaction<'_, sqlx::Sqlite>> {
        self.pool.begin().await.map_err(map_sqlx_err)
    }
}

pub(crate) fn map_sqlx_err(err: sqlx::Error) -> MimirError {
    match err {
        sqlx::Error::RowNotFound => MimirError::not_found("row not found"),
        sqlx::Error::Database(db) if db.is_foreign_key_violation() || db.is_unique_violation() => {
            MimirError::constraint_violation(db.to_string())
        }
        other => MimirError::internal(other.to_string()),
    }
}
