// /////////////////////////////////////////////////////////////////////////////
// Mimir Pipeline Platform
// Licensed under the BSD-3-Clause license.
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Pool Setup
//!
//! Opens the SQLite database with the four invariant pragmas and runs
//! embedded migrations. Re-opening an existing database is idempotent:
//! `sqlx::migrate!` tracks which migrations already applied.

use std::str::FromStr;
use std::time::Duration;

use mimir_domain::{MimirError, MimirResult};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;

/// Opens (creating if necessary) the database at `path`, applies the four
/// invariant pragmas, and runs pending migrations.
pub async fn open(path: &str) -> MimirResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str(path)
        .map_err(|e| MimirError::config_invalid(format!("invalid database path '{path}': {e}")))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(30))
        .synchronous(SqliteSynchronous::Normal);

    let pool = SqlitePoolOptions::new()
        .connect_with(options)
        .await
        .map_err(|e| MimirError::internal(format!("failed to open database: {e}")))?;

    sqlx::migrate!("./migrations").run(&pool).await.map_err(|e| MimirError::internal(format!("migration failed: {e}")))?;

    tracing::info!(path, "database schema is up to date");
    Ok(pool)
}

/// Lightweight liveness probe: `SELECT 1`.
pub async fn health(pool: &SqlitePool) -> MimirResult<()> {
    sqlx::query("SELECT 1").execute(pool).await.map_err(|e| MimirError::internal(format!("health probe failed: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn opening_twice_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mimir.db");
        let url = format!("sqlite://{}", path.display());

        let pool1 = open(&url).await.unwrap();
        health(&pool1).await.unwrap();
        pool1.close().await;

        let pool2 = open(&url).await.unwrap();
        health(&pool2).await.unwrap();
    }
}
