// /////////////////////////////////////////////////////////////////////////////
// Mimir Pipeline Platform
// Licensed under the BSD-3-Clause license.
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Worker Configuration
//!
//! Layered configuration: compiled defaults, optionally overridden by a TOML
//! file, finally overridden by environment variables. Validation happens
//! once at startup; an invalid value is a fatal startup error.

use std::path::Path;

use serde::Deserialize;

use crate::logger::LogFormat;

#[derive(Debug, Clone, Deserialize)]
pub struct WorkerSettings {
    #[serde(default = "default_redis_url")]
    pub redis_url: String,
    #[serde(default = "default_concurrency")]
    pub worker_concurrency: usize,
    #[serde(default = "default_db_path")]
    pub db_path: String,
    #[serde(default = "default_log_format")]
    pub log_format: String,
    #[serde(default = "default_grace_secs")]
    pub shutdown_grace_secs: u64,
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_concurrency() -> usize {
    5
}

fn default_db_path() -> String {
    "./mimir.db".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_grace_secs() -> u64 {
    5
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            redis_url: default_redis_url(),
            worker_concurrency: default_concurrency(),
            db_path: default_db_path(),
            log_format: default_log_format(),
            shutdown_grace_secs: default_grace_secs(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to load configuration: {0}")]
    Load(String),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl WorkerSettings {
    /// Loads settings from compiled defaults, an optional TOML file, then
    /// environment variables (`REDIS_URL`, `WORKER_CONCURRENCY`,
    /// `MIMIR_DB_PATH`, `MIMIR_LOG_FORMAT`, `MIMIR_SHUTDOWN_GRACE_SECS`), in
    /// that order of increasing precedence.
    pub fn load(config_file: Option<&Path>) -> Result<Self, SettingsError> {
        let mut builder = config::Config::builder()
            .set_default("redis_url", default_redis_url())
            .map_err(|e| SettingsError::Load(e.to_string()))?
            .set_default("worker_concurrency", default_concurrency() as i64)
            .map_err(|e| SettingsError::Load(e.to_string()))?
            .set_default("db_path", default_db_path())
            .map_err(|e| SettingsError::Load(e.to_string()))?
            .set_default("log_format", default_log_format())
            .map_err(|e| SettingsError::Load(e.to_string()))?
            .set_default("shutdown_grace_secs", default_grace_secs() as i64)
            .map_err(|e| SettingsError::Load(e.to_string()))?;

        if let Some(path) = config_file {
            builder = builder.add_source(config::File::from(path));
        }

        builder = builder
            .add_source(config::Environment::default().prefix_separator("_").try_parsing(true).with_list_parse_key("none"))
            .add_source(config::Environment::with_prefix("MIMIR").try_parsing(true));

        // REDIS_URL and WORKER_CONCURRENCY are canonical, unprefixed names
        // alongside the MIMIR_-prefixed ones.
        if let Ok(redis_url) = std::env::var("REDIS_URL") {
            builder = builder.set_override("redis_url", redis_url).map_err(|e| SettingsError::Load(e.to_string()))?;
        }
        if let Ok(concurrency) = std::env::var("WORKER_CONCURRENCY") {
            let parsed: i64 = concurrency
                .parse()
                .map_err(|_| SettingsError::Invalid(format!("WORKER_CONCURRENCY must be an integer, got {concurrency:?}")))?;
            builder = builder.set_override("worker_concurrency", parsed).map_err(|e| SettingsError::Load(e.to_string()))?;
        }

        let config = builder.build().map_err(|e| SettingsError::Load(e.to_string()))?;
        let settings: WorkerSettings = config.try_deserialize().map_err(|e| SettingsError::Load(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), SettingsError> {
        if self.worker_concurrency == 0 {
            return Err(SettingsError::Invalid("worker_concurrency must be >= 1".to_string()));
        }
        if self.redis_url.is_empty() {
            return Err(SettingsError::Invalid("redis_url must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn log_format(&self) -> LogFormat {
        LogFormat::from_env_value(&self.log_format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let settings = WorkerSettings::default();
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let mut settings = WorkerSettings::default();
        settings.worker_concurrency = 0;
        assert!(settings.validate().is_err());
    }
}
