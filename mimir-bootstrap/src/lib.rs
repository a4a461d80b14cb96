// /////////////////////////////////////////////////////////////////////////////
// Mimir Pipeline Platform
// Licensed under the BSD-3-Clause license.
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Bootstrap Layer
//!
//! Sits outside the domain/plugin/executor/storage layers and provides:
//!
//! - **CLI parsing** ([`cli`]) — the worker's minimal `--version`/`--config` surface
//! - **Configuration** ([`config`]) — layered defaults -> file -> environment
//! - **Structured logging** ([`logger`]) — the global `tracing` subscriber
//! - **Graceful shutdown** ([`shutdown`]) — cooperative cancellation and the
//!   `ready -> draining -> stopped` grace window
//! - **Exit codes** ([`exit_code`]) — Unix exit code mapping for fatal startup errors
//! - **Metrics** ([`metrics`]) — task throughput/duration/in-flight gauges, logged
//!   periodically rather than scraped over HTTP
//!
//! Enterprise layers (domain, plugin, executor, storage, worker) depend on
//! this crate for [`shutdown::CancellationScope`]; this crate never depends
//! on them.

pub mod cli;
pub mod config;
pub mod exit_code;
pub mod logger;
pub mod metrics;
pub mod shutdown;

pub use cli::Cli;
pub use config::WorkerSettings;
pub use exit_code::ExitCode;
pub use logger::{init_tracing, LogFormat};
pub use metrics::WorkerMetrics;
pub use shutdown::{CancellationScope, ShutdownCoordinator};
