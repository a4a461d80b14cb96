// /////////////////////////////////////////////////////////////////////////////
// Mimir Pipeline Platform
// Licensed under the BSD-3-Clause license.
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Structured Logging
//!
//! Installs the global `tracing` subscriber for the worker process. Output
//! format is chosen by [`LogFormat`]: `pretty` for interactive use, `json`
//! for log aggregation in production. Verbosity is driven by the standard
//! `RUST_LOG` environment variable through `tracing_subscriber::EnvFilter`,
//! defaulting to `info` when unset.

use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    pub fn from_env_value(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Pretty,
        }
    }
}

/// Installs the global tracing subscriber. Must be called once, as early as
/// possible in `main`, before any other component logs.
pub fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = fmt().with_env_filter(filter).with_target(true);

    match format {
        LogFormat::Pretty => {
            subscriber.init();
        }
        LogFormat::Json => {
            subscriber.json().init();
        }
    }
}
